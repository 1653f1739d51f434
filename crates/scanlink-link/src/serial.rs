//! Physical serial link over the `serialport` crate.

use crate::error::{LinkError, Result};
use crate::traits::SerialLink;
use scanlink_core::constants::POLL_QUANTUM_MS;
use scanlink_core::{DataBits, LinkSnapshot, Parity, SerialLinkConfig, StopBits};
use std::io::Read;
use std::time::Duration;

/// Serial link backed by a real port.
///
/// The handle is opened on first use and kept open across scan attempts.
/// When a read primitive reports a hard fault the handle is dropped, so the
/// next [`ensure_open`](SerialLink::ensure_open) re-opens the device instead
/// of reusing a dead descriptor.
///
/// # Examples
///
/// ```no_run
/// use scanlink_core::SerialLinkConfig;
/// use scanlink_link::{SerialLink, SerialPortLink};
///
/// # async fn example() -> scanlink_link::Result<()> {
/// let mut link = SerialPortLink::new();
/// let config = SerialLinkConfig {
///     port_name: "/dev/ttyUSB0".to_string(),
///     ..SerialLinkConfig::fallback()
/// };
///
/// link.ensure_open(&config).await?;
/// link.discard_input().await?;
/// # Ok(())
/// # }
/// ```
pub struct SerialPortLink {
    /// Open handle, present between a successful open and a hard fault.
    port: Option<Box<dyn serialport::SerialPort>>,

    /// Configuration the handle was opened with.
    config: Option<SerialLinkConfig>,
}

impl SerialPortLink {
    /// Create a link with no handle; the port opens on first
    /// [`ensure_open`](SerialLink::ensure_open).
    #[must_use]
    pub fn new() -> Self {
        Self {
            port: None,
            config: None,
        }
    }

    /// Whether a handle is currently open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.port.is_some()
    }

    fn port_mut(&mut self) -> Result<&mut Box<dyn serialport::SerialPort>> {
        self.port.as_mut().ok_or(LinkError::NotOpen)
    }

    /// Drop the handle after a hard fault so the next attempt re-opens.
    fn mark_faulted(&mut self) {
        self.port = None;
    }

    fn configured_port_name(&self) -> String {
        self.config
            .as_ref()
            .map_or_else(|| "unknown".to_string(), |c| c.port_name.clone())
    }
}

impl Default for SerialPortLink {
    fn default() -> Self {
        Self::new()
    }
}

// The port handle is a trait object without Debug; report open state instead.
impl std::fmt::Debug for SerialPortLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialPortLink")
            .field("open", &self.is_open())
            .field("config", &self.config)
            .finish()
    }
}

impl SerialLink for SerialPortLink {
    async fn ensure_open(&mut self, config: &SerialLinkConfig) -> Result<()> {
        if self.port.is_some() {
            return Ok(());
        }

        let port = serialport::new(config.port_name.clone(), config.baud_rate)
            .data_bits(to_serialport_data_bits(config.data_bits))
            .parity(to_serialport_parity(config.parity))
            .stop_bits(to_serialport_stop_bits(config.stop_bits))
            .timeout(Duration::from_millis(POLL_QUANTUM_MS))
            .open()
            .map_err(|e| LinkError::open_failed(&config.port_name, e.to_string()))?;

        self.port = Some(port);
        self.config = Some(config.clone());
        Ok(())
    }

    async fn discard_input(&mut self) -> Result<()> {
        let port = self.port_mut()?;
        port.clear(serialport::ClearBuffer::Input)
            .map_err(|e| LinkError::read_failed(e.to_string()))
    }

    async fn bytes_available(&mut self) -> Result<usize> {
        let port_name = self.configured_port_name();
        let port = self.port_mut()?;
        match port.bytes_to_read() {
            Ok(n) => Ok(n as usize),
            Err(_) => {
                self.mark_faulted();
                Err(LinkError::disconnected(port_name))
            }
        }
    }

    async fn read_available(&mut self) -> Result<String> {
        let pending = self.bytes_available().await?;
        if pending == 0 {
            return Ok(String::new());
        }

        let port = self.port_mut()?;
        let mut buf = vec![0u8; pending];
        match port.read(&mut buf) {
            Ok(n) => Ok(decode_bytes(&buf[..n])),
            Err(e) if e.kind() == std::io::ErrorKind::TimedOut => Ok(String::new()),
            Err(e) => {
                self.mark_faulted();
                Err(LinkError::read_failed(e.to_string()))
            }
        }
    }

    async fn read_byte(&mut self) -> Result<u8> {
        loop {
            if self.bytes_available().await? > 0 {
                let port = self.port_mut()?;
                let mut buf = [0u8; 1];
                match port.read_exact(&mut buf) {
                    Ok(()) => return Ok(buf[0]),
                    Err(e) if e.kind() == std::io::ErrorKind::TimedOut => {}
                    Err(e) => {
                        self.mark_faulted();
                        return Err(LinkError::read_failed(e.to_string()));
                    }
                }
            }
            tokio::time::sleep(Duration::from_millis(POLL_QUANTUM_MS)).await;
        }
    }

    fn snapshot(&self) -> LinkSnapshot {
        match &self.config {
            Some(config) if self.port.is_some() => LinkSnapshot {
                port_name: Some(config.port_name.clone()),
                baud_rate: Some(config.baud_rate),
                data_bits: Some(config.data_bits),
                parity: Some(config.parity),
                stop_bits: Some(config.stop_bits),
                payload: None,
                captured_at: chrono::Local::now(),
            },
            _ => LinkSnapshot::unavailable(),
        }
    }
}

/// Decode raw bytes one character per byte, so any byte value survives the
/// round trip into the frame text verbatim.
pub(crate) fn decode_bytes(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

fn to_serialport_data_bits(bits: DataBits) -> serialport::DataBits {
    match bits {
        DataBits::Five => serialport::DataBits::Five,
        DataBits::Six => serialport::DataBits::Six,
        DataBits::Seven => serialport::DataBits::Seven,
        DataBits::Eight => serialport::DataBits::Eight,
    }
}

fn to_serialport_parity(parity: Parity) -> serialport::Parity {
    match parity {
        Parity::None => serialport::Parity::None,
        Parity::Odd => serialport::Parity::Odd,
        Parity::Even => serialport::Parity::Even,
    }
}

fn to_serialport_stop_bits(bits: StopBits) -> serialport::StopBits {
    match bits {
        StopBits::One => serialport::StopBits::One,
        StopBits::Two => serialport::StopBits::Two,
    }
}
