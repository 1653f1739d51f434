use crate::constants::{
    FALLBACK_BAUD_RATE, FALLBACK_PORT_NAME, FALLBACK_PRE_READ_DELAY_MS,
};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Termination policy selecting when a frame is considered complete.
///
/// Each read attempt runs exactly one strategy; the mode is part of the
/// reader's static configuration, not per-attempt state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadMode {
    /// Accumulate until a target length is reached, bounded by a one-second
    /// wall clock. A short read is still a successful read.
    FixedLength,

    /// Accumulate one byte at a time until the configured delimiter
    /// substring appears. The delimiter stays in the returned text.
    UntilDelimiter,

    /// Accumulate until the cancellation flag is raised. No timeout.
    UntilCancelled,

    /// Accumulate for a configured duration.
    ForInterval,
}

impl ReadMode {
    /// Whether frames read in this mode go through structural validation
    /// before dispatch.
    ///
    /// Only fixed-length reads carry a frame structure worth validating;
    /// every other mode hands the payload through as-is.
    #[must_use]
    pub fn requires_validation(&self) -> bool {
        matches!(self, ReadMode::FixedLength)
    }
}

impl fmt::Display for ReadMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mode = match self {
            ReadMode::FixedLength => "FixedLength",
            ReadMode::UntilDelimiter => "UntilDelimiter",
            ReadMode::UntilCancelled => "UntilCancelled",
            ReadMode::ForInterval => "ForInterval",
        };
        write!(f, "{}", mode)
    }
}

/// Processing state of one read attempt.
///
/// The state is linear per attempt: every attempt starts at `Init` and ends
/// in exactly one of the three terminal states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingState {
    /// Attempt constructed, nothing read yet.
    Init,

    /// Terminal: the strategy completed and produced a frame.
    Read,

    /// Terminal: the strategy signaled an internal fault.
    ReadError,

    /// Terminal: the connection or setup faulted before or during the
    /// strategy run.
    LinkError,
}

impl ProcessingState {
    /// Whether this state ends the attempt.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ProcessingState::Init)
    }

    /// Whether this state represents a fault.
    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self, ProcessingState::ReadError | ProcessingState::LinkError)
    }
}

impl fmt::Display for ProcessingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self {
            ProcessingState::Init => "Init",
            ProcessingState::Read => "Read",
            ProcessingState::ReadError => "ReadError",
            ProcessingState::LinkError => "LinkError",
        };
        write!(f, "{}", state)
    }
}

/// Number of data bits per serial character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataBits {
    Five,
    Six,
    Seven,
    Eight,
}

impl Default for DataBits {
    fn default() -> Self {
        DataBits::Eight
    }
}

impl fmt::Display for DataBits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bits = match self {
            DataBits::Five => 5,
            DataBits::Six => 6,
            DataBits::Seven => 7,
            DataBits::Eight => 8,
        };
        write!(f, "{}", bits)
    }
}

/// Parity checking mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Parity {
    None,
    Odd,
    Even,
}

impl Default for Parity {
    fn default() -> Self {
        Parity::None
    }
}

impl fmt::Display for Parity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parity = match self {
            Parity::None => "N",
            Parity::Odd => "O",
            Parity::Even => "E",
        };
        write!(f, "{}", parity)
    }
}

/// Number of stop bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopBits {
    One,
    Two,
}

impl Default for StopBits {
    fn default() -> Self {
        StopBits::One
    }
}

impl fmt::Display for StopBits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bits = match self {
            StopBits::One => 1,
            StopBits::Two => 2,
        };
        write!(f, "{}", bits)
    }
}

/// Static serial-line configuration for one reader identity.
///
/// Resolved once per reader and reused across scans; a scan attempt never
/// mutates it. The [`Default`] value is the hard-coded fallback used when
/// configuration lookup misses the reader identity.
///
/// # Examples
///
/// ```
/// use scanlink_core::SerialLinkConfig;
///
/// let fallback = SerialLinkConfig::fallback();
/// assert_eq!(fallback.port_name, "COM1");
/// assert_eq!(fallback.baud_rate, 9600);
/// assert_eq!(fallback.pre_read_delay.as_millis(), 900);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerialLinkConfig {
    /// Port identifier (e.g. "COM1", "/dev/ttyUSB0").
    pub port_name: String,

    /// Baud rate in bits per second.
    pub baud_rate: u32,

    /// Data bits per character.
    pub data_bits: DataBits,

    /// Parity mode.
    pub parity: Parity,

    /// Stop bits.
    pub stop_bits: StopBits,

    /// Delay slept before each attempt touches the port. Rate-limits
    /// repeated physical scans.
    #[serde(with = "duration_millis")]
    pub pre_read_delay: Duration,

    /// Whether queued input is discarded before the attempt's strategy runs.
    pub clear_input: bool,

    /// Human-readable description for diagnostics.
    pub description: String,
}

impl SerialLinkConfig {
    /// The hard-coded fallback returned when configuration lookup misses a
    /// reader identity.
    #[must_use]
    pub fn fallback() -> Self {
        Self {
            port_name: FALLBACK_PORT_NAME.to_string(),
            baud_rate: FALLBACK_BAUD_RATE,
            data_bits: DataBits::Eight,
            parity: Parity::None,
            stop_bits: StopBits::One,
            pre_read_delay: Duration::from_millis(FALLBACK_PRE_READ_DELAY_MS),
            clear_input: true,
            description: "unconfigured reader".to_string(),
        }
    }
}

impl Default for SerialLinkConfig {
    fn default() -> Self {
        Self::fallback()
    }
}

impl fmt::Display for SerialLinkConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} @ {} {}-{}-{} ({})",
            self.port_name,
            self.baud_rate,
            self.data_bits,
            self.parity,
            self.stop_bits,
            self.description
        )
    }
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(d)?))
    }
}

/// Descriptor of one expected frame type.
///
/// The fixed-length strategy reads up to the longest configured kind; the
/// validator receives the full set to decide which kind a payload matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameKind {
    /// Kind name for diagnostics (e.g. "production-label").
    pub name: String,

    /// Expected payload length in bytes.
    pub length: usize,
}

impl FrameKind {
    /// Create a new frame kind descriptor.
    pub fn new(name: impl Into<String>, length: usize) -> Self {
        Self {
            name: name.into(),
            length,
        }
    }
}

/// Point-in-time capture of link settings, attached to every
/// [`FrameResult`] for troubleshooting.
///
/// Every field is optional: a link that never opened snapshots as
/// unavailable rather than failing the attempt that asked for diagnostics.
/// The snapshot reflects the port state after the attempt, not before.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkSnapshot {
    /// Port identifier, when a handle exists.
    pub port_name: Option<String>,

    /// Configured baud rate.
    pub baud_rate: Option<u32>,

    /// Configured data bits.
    pub data_bits: Option<DataBits>,

    /// Configured parity.
    pub parity: Option<Parity>,

    /// Configured stop bits.
    pub stop_bits: Option<StopBits>,

    /// Trimmed payload of the attempt the snapshot belongs to.
    pub payload: Option<String>,

    /// When the snapshot was captured.
    pub captured_at: DateTime<Local>,
}

impl LinkSnapshot {
    /// Snapshot of a link with no open handle.
    #[must_use]
    pub fn unavailable() -> Self {
        Self {
            port_name: None,
            baud_rate: None,
            data_bits: None,
            parity: None,
            stop_bits: None,
            payload: None,
            captured_at: Local::now(),
        }
    }

    /// Whether the snapshot captured an open handle.
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.port_name.is_some()
    }

    /// Attach the attempt's payload to the snapshot.
    #[must_use]
    pub fn with_payload(mut self, payload: impl Into<String>) -> Self {
        self.payload = Some(payload.into());
        self
    }
}

impl Default for LinkSnapshot {
    fn default() -> Self {
        Self::unavailable()
    }
}

impl fmt::Display for LinkSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn opt<T: fmt::Display>(v: &Option<T>) -> String {
            v.as_ref()
                .map_or_else(|| "none".to_string(), ToString::to_string)
        }

        writeln!(f, "Payload: {}", opt(&self.payload))?;
        writeln!(f, "PortName: {}", opt(&self.port_name))?;
        writeln!(f, "BaudRate: {}", opt(&self.baud_rate))?;
        writeln!(f, "DataBits: {}", opt(&self.data_bits))?;
        writeln!(f, "Parity: {}", opt(&self.parity))?;
        write!(f, "StopBits: {}", opt(&self.stop_bits))
    }
}

/// Fully-populated outcome of one read attempt.
///
/// A `FrameResult` is constructed fresh for every attempt and is always
/// complete: `raw` is empty (never absent) when nothing arrived, `trimmed`
/// always equals `raw.trim()`, and `error` is empty unless a fault occurred.
///
/// # Examples
///
/// ```
/// use scanlink_core::{FrameResult, LinkSnapshot, ProcessingState};
///
/// let result = FrameResult::read("12345\r", LinkSnapshot::unavailable());
/// assert_eq!(result.state, ProcessingState::Read);
/// assert_eq!(result.raw, "12345\r");
/// assert_eq!(result.trimmed, "12345");
/// assert!(result.error.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameResult {
    /// Bytes of the frame as decoded characters, delimiter and padding
    /// included verbatim.
    pub raw: String,

    /// `raw` with leading and trailing whitespace removed.
    pub trimmed: String,

    /// Terminal classification of the attempt.
    pub state: ProcessingState,

    /// Fault message; empty unless the attempt faulted.
    pub error: String,

    /// Link settings captured after the attempt.
    pub link_info: LinkSnapshot,
}

impl FrameResult {
    /// Build a result, deriving `trimmed` from `raw`.
    pub fn new(
        raw: impl Into<String>,
        state: ProcessingState,
        error: impl Into<String>,
        link_info: LinkSnapshot,
    ) -> Self {
        let raw = raw.into();
        let trimmed = raw.trim().to_string();
        Self {
            raw,
            trimmed,
            state,
            error: error.into(),
            link_info,
        }
    }

    /// Successful read of `raw`.
    pub fn read(raw: impl Into<String>, link_info: LinkSnapshot) -> Self {
        Self::new(raw, ProcessingState::Read, "", link_info)
    }

    /// Strategy fault: `raw` carries the accumulated text with the fault
    /// message appended, `error` carries the message alone.
    pub fn read_error(
        raw: impl Into<String>,
        message: impl Into<String>,
        link_info: LinkSnapshot,
    ) -> Self {
        let message = message.into();
        Self::new(raw, ProcessingState::ReadError, message, link_info)
    }

    /// Connection or setup fault before or during the strategy run.
    pub fn link_error(message: impl Into<String>, link_info: LinkSnapshot) -> Self {
        Self::new("", ProcessingState::LinkError, message, link_info)
    }
}

/// Cooperative cancellation flag for a scan session.
///
/// The flag is set by the session owner and polled by the reading loops,
/// once per iteration. It is never pushed: worst-case observation latency is
/// one polling quantum, except while a strategy is blocked waiting for a
/// single byte.
///
/// # Examples
///
/// ```
/// use scanlink_core::CancelFlag;
///
/// let flag = CancelFlag::new();
/// let observer = flag.clone();
///
/// assert!(!observer.is_cancelled());
/// flag.request();
/// assert!(observer.is_cancelled());
/// flag.clear();
/// assert!(!observer.is_cancelled());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// Create a new, unraised flag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Observed by reading loops on their next poll.
    pub fn request(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Lower the flag, typically between scan sessions.
    pub fn clear(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    /// Poll the flag.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
