//! Enum wrapper for serial-link dispatch.
//!
//! Native `async fn` in traits (RPITIT) is not object-safe, so a
//! `Box<dyn SerialLink>` is not available. [`AnySerialLink`] provides
//! concrete dispatch between the shipped implementations at zero cost,
//! the same pattern the rest of the workspace uses for pluggable hardware.

use crate::error::Result;
use crate::mock::MockLink;
use crate::serial::SerialPortLink;
use crate::traits::SerialLink;
use scanlink_core::{LinkSnapshot, SerialLinkConfig};

/// Enum wrapper for serial-link dispatch.
///
/// # Examples
///
/// ```
/// use scanlink_link::{AnySerialLink, MockLink, SerialLink};
/// use scanlink_core::SerialLinkConfig;
///
/// #[tokio::main]
/// async fn main() -> scanlink_link::Result<()> {
///     let (link, handle) = MockLink::new();
///     let mut any_link = AnySerialLink::Mock(link);
///
///     any_link.ensure_open(&SerialLinkConfig::fallback()).await?;
///     handle.push_str("frame");
///     assert_eq!(any_link.read_available().await?, "frame");
///     Ok(())
/// }
/// ```
#[derive(Debug)]
#[non_exhaustive]
pub enum AnySerialLink {
    /// Real port over the `serialport` crate.
    Serial(SerialPortLink),

    /// Scriptable in-memory link for development and testing.
    Mock(MockLink),
}

impl SerialLink for AnySerialLink {
    async fn ensure_open(&mut self, config: &SerialLinkConfig) -> Result<()> {
        match self {
            Self::Serial(link) => link.ensure_open(config).await,
            Self::Mock(link) => link.ensure_open(config).await,
        }
    }

    async fn discard_input(&mut self) -> Result<()> {
        match self {
            Self::Serial(link) => link.discard_input().await,
            Self::Mock(link) => link.discard_input().await,
        }
    }

    async fn bytes_available(&mut self) -> Result<usize> {
        match self {
            Self::Serial(link) => link.bytes_available().await,
            Self::Mock(link) => link.bytes_available().await,
        }
    }

    async fn read_available(&mut self) -> Result<String> {
        match self {
            Self::Serial(link) => link.read_available().await,
            Self::Mock(link) => link.read_available().await,
        }
    }

    async fn read_byte(&mut self) -> Result<u8> {
        match self {
            Self::Serial(link) => link.read_byte().await,
            Self::Mock(link) => link.read_byte().await,
        }
    }

    fn snapshot(&self) -> LinkSnapshot {
        match self {
            Self::Serial(link) => link.snapshot(),
            Self::Mock(link) => link.snapshot(),
        }
    }
}
