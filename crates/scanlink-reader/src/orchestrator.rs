//! One-attempt read orchestration.
//!
//! [`ReadOrchestrator::wait_for_frame`] sequences a single scan attempt end
//! to end and always produces a well-formed [`FrameResult`] — it is a total
//! function over device state. Faults from port setup or the first-byte
//! wait become `LinkError` results; faults inside a strategy become
//! `ReadError` results; neither ever propagates to the caller.

use crate::config::ConfigSource;
use crate::frame::{
    self, FrameOutcome, fixed_length, for_interval, until_cancelled, until_delimiter,
};
use scanlink_core::constants::{DEFAULT_DELIMITER, DEFAULT_READ_INTERVAL_MS, POLL_QUANTUM_MS};
use scanlink_core::{
    CancelFlag, FrameKind, FrameResult, NoopLog, ProcessingState, ReadMode, ScanLog,
    SerialLinkConfig,
};
use scanlink_link::{LinkError, SerialLink};
use std::sync::Arc;
use std::time::Duration;

/// Operation identifier handed to the log sink and fault reporter.
pub const OP_WAIT_FOR_FRAME: &str = "wait_for_frame";

/// Static per-reader settings: identity, termination policy and the policy
/// parameters.
///
/// # Examples
///
/// ```
/// use scanlink_core::{FrameKind, ReadMode};
/// use scanlink_reader::ReaderSettings;
///
/// let settings = ReaderSettings::new("line-3-entry", ReadMode::FixedLength)
///     .with_frame_kinds(vec![FrameKind::new("production-label", 32)]);
/// assert_eq!(settings.mode, ReadMode::FixedLength);
/// ```
#[derive(Debug, Clone)]
pub struct ReaderSettings {
    /// Reader identity used for configuration lookup.
    pub reader_id: String,

    /// Termination policy for every attempt of this reader.
    pub mode: ReadMode,

    /// Escape-encoded delimiter literal for [`ReadMode::UntilDelimiter`].
    pub delimiter: String,

    /// Read duration for [`ReadMode::ForInterval`].
    pub read_interval: Duration,

    /// Expected frame kinds; drives the fixed-length target and structural
    /// validation.
    pub frame_kinds: Vec<FrameKind>,
}

impl ReaderSettings {
    /// Settings with default delimiter, interval, and no frame kinds.
    pub fn new(reader_id: impl Into<String>, mode: ReadMode) -> Self {
        Self {
            reader_id: reader_id.into(),
            mode,
            delimiter: DEFAULT_DELIMITER.to_string(),
            read_interval: Duration::from_millis(DEFAULT_READ_INTERVAL_MS),
            frame_kinds: Vec::new(),
        }
    }

    /// Set the delimiter literal.
    #[must_use]
    pub fn with_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = delimiter.into();
        self
    }

    /// Set the interval-mode read duration.
    #[must_use]
    pub fn with_read_interval(mut self, interval: Duration) -> Self {
        self.read_interval = interval;
        self
    }

    /// Set the expected frame kinds.
    #[must_use]
    pub fn with_frame_kinds(mut self, kinds: Vec<FrameKind>) -> Self {
        self.frame_kinds = kinds;
        self
    }
}

/// Sequences one read attempt: resolve configuration, rate-limit, open,
/// flush, wait for the first byte, run the strategy, classify.
///
/// The orchestrator owns the link and keeps it open across attempts. The
/// resolved configuration is cached after the first lookup and reused for
/// the reader's lifetime. At most one attempt may be in flight at a time;
/// that is the caller's contract, not something the orchestrator defends
/// against.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use scanlink_core::{ProcessingState, ReadMode};
/// use scanlink_link::MockLink;
/// use scanlink_reader::{ReadOrchestrator, ReaderSettings, StaticConfigSource};
///
/// #[tokio::main]
/// async fn main() {
///     let (link, handle) = MockLink::new();
///     let settings = ReaderSettings::new("demo", ReadMode::UntilDelimiter);
///     let mut orchestrator =
///         ReadOrchestrator::new(settings, link, StaticConfigSource::new());
///
///     // Lands after the fallback pre-read delay and input flush.
///     handle.push_str_after(Duration::from_millis(950), "12345\r");
///     let result = orchestrator.wait_for_frame().await;
///
///     assert_eq!(result.state, ProcessingState::Read);
///     assert_eq!(result.trimmed, "12345");
/// }
/// ```
pub struct ReadOrchestrator<L, C> {
    settings: ReaderSettings,
    link: L,
    config_source: C,
    resolved: Option<SerialLinkConfig>,
    cancel: CancelFlag,
    log: Arc<dyn ScanLog>,
}

impl<L, C> ReadOrchestrator<L, C>
where
    L: SerialLink,
    C: ConfigSource,
{
    /// Create an orchestrator with a no-op log sink.
    pub fn new(settings: ReaderSettings, link: L, config_source: C) -> Self {
        Self {
            settings,
            link,
            config_source,
            resolved: None,
            cancel: CancelFlag::new(),
            log: Arc::new(NoopLog),
        }
    }

    /// Substitute the log sink.
    #[must_use]
    pub fn with_log(mut self, log: Arc<dyn ScanLog>) -> Self {
        self.log = log;
        self
    }

    /// The session's cancellation flag; clones observe the same flag.
    #[must_use]
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    /// The reader's static settings.
    #[must_use]
    pub fn settings(&self) -> &ReaderSettings {
        &self.settings
    }

    /// The configuration this reader resolved to, once an attempt ran.
    #[must_use]
    pub fn resolved_config(&self) -> Option<&SerialLinkConfig> {
        self.resolved.as_ref()
    }

    /// Run one read attempt end to end.
    ///
    /// Always returns a fully-populated [`FrameResult`]; never errors, never
    /// panics. The diagnostic snapshot reflects the link state *after* the
    /// attempt.
    pub async fn wait_for_frame(&mut self) -> FrameResult {
        let config = self.resolve_config();
        tokio::time::sleep(config.pre_read_delay).await;

        match self.attempt().await {
            Ok(FrameOutcome::Complete(raw)) => {
                self.log.record(
                    OP_WAIT_FOR_FRAME,
                    ProcessingState::Read,
                    &format!("frame read: {:?}", raw),
                );
                let snapshot = self.link.snapshot().with_payload(raw.trim());
                FrameResult::read(raw, snapshot)
            }
            Ok(FrameOutcome::Fault { partial, message }) => {
                self.log.record(
                    OP_WAIT_FOR_FRAME,
                    ProcessingState::ReadError,
                    &format!("frame read problem: {message}"),
                );
                // Legacy surface: the fault message rides along in the raw
                // text as well as in the error field.
                let raw = format!("{partial}{message}");
                let snapshot = self.link.snapshot().with_payload(raw.trim());
                FrameResult::read_error(raw, message, snapshot)
            }
            Err(e) => {
                let message = e.to_string();
                self.log.record(
                    OP_WAIT_FOR_FRAME,
                    ProcessingState::LinkError,
                    &format!("reader problem: {message}"),
                );
                FrameResult::link_error(message, self.link.snapshot())
            }
        }
    }

    /// Resolve and cache the link configuration for this reader identity.
    fn resolve_config(&mut self) -> SerialLinkConfig {
        if self.resolved.is_none() {
            let config = self
                .config_source
                .resolve(&self.settings.reader_id)
                .unwrap_or_else(SerialLinkConfig::fallback);
            self.resolved = Some(config);
        }
        // Cached just above; clone keeps the borrow short.
        self.resolved.clone().unwrap_or_else(SerialLinkConfig::fallback)
    }

    async fn attempt(&mut self) -> Result<FrameOutcome, LinkError> {
        let config = self.resolve_config();

        self.link.ensure_open(&config).await?;
        if config.clear_input {
            self.link.discard_input().await?;
        }

        self.log.record(
            OP_WAIT_FOR_FRAME,
            ProcessingState::Init,
            &format!("{config} - waiting for data"),
        );

        if !self.wait_for_first_byte().await? {
            // Cancelled before any byte arrived; an empty successful frame
            // lets the pipeline discard the attempt without a handler run.
            return Ok(FrameOutcome::Complete(String::new()));
        }

        Ok(self.run_strategy().await)
    }

    /// Poll until at least one byte is buffered.
    ///
    /// Returns `false` when cancellation was observed before any byte
    /// arrived. There is no timeout on this wait.
    async fn wait_for_first_byte(&mut self) -> Result<bool, LinkError> {
        loop {
            if self.cancel.is_cancelled() {
                return Ok(false);
            }
            let pending = self.link.bytes_available().await?;
            if pending > 0 {
                self.log.record(
                    OP_WAIT_FOR_FRAME,
                    ProcessingState::Init,
                    &format!("data detected: {pending} bytes"),
                );
                return Ok(true);
            }
            tokio::time::sleep(Duration::from_millis(POLL_QUANTUM_MS)).await;
        }
    }

    async fn run_strategy(&mut self) -> FrameOutcome {
        match self.settings.mode {
            ReadMode::FixedLength => {
                let target = frame::target_length(&self.settings.frame_kinds);
                fixed_length(&mut self.link, target, &self.cancel).await
            }
            ReadMode::UntilDelimiter => {
                until_delimiter(&mut self.link, &self.settings.delimiter, &self.cancel).await
            }
            ReadMode::UntilCancelled => until_cancelled(&mut self.link, &self.cancel).await,
            ReadMode::ForInterval => {
                for_interval(&mut self.link, self.settings.read_interval, &self.cancel).await
            }
        }
    }
}
