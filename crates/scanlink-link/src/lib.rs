//! Serial-link abstraction for the scanlink frame reader.
//!
//! This crate owns the persistent, lazily-opened serial handle and exposes
//! the byte-level primitives the read strategies are built on. The
//! [`SerialLink`] trait is the seam between the accumulation logic and the
//! physical device: [`SerialPortLink`] drives real hardware through the
//! `serialport` crate, while [`MockLink`] is a scriptable in-memory link for
//! development and testing.
//!
//! # Design
//!
//! - **Async-first**: all I/O operations return `Send` futures (RPITIT with
//!   an explicit bound); no `async_trait` macro. Implementations write plain
//!   `async fn` bodies.
//! - **Polling, not blocking**: even the "blocking" single-byte read is
//!   implemented as a 1 ms polling loop so a read never parks a runtime
//!   worker thread.
//! - **Total diagnostics**: [`SerialLink::snapshot`] never fails; a link
//!   with no open handle reports itself as unavailable.
//!
//! # Object Safety
//!
//! RPITIT traits are not object-safe, so `Box<dyn SerialLink>` is not
//! available. Use generic parameters, or [`AnySerialLink`] for concrete
//! dispatch between the shipped implementations.
//!
//! # Examples
//!
//! ```
//! use scanlink_core::SerialLinkConfig;
//! use scanlink_link::{MockLink, SerialLink};
//!
//! #[tokio::main]
//! async fn main() -> scanlink_link::Result<()> {
//!     let (mut link, handle) = MockLink::new();
//!     handle.push_str("4902B\r");
//!
//!     link.ensure_open(&SerialLinkConfig::fallback()).await?;
//!     assert_eq!(link.bytes_available().await?, 6);
//!     assert_eq!(link.read_available().await?, "4902B\r");
//!     Ok(())
//! }
//! ```

pub mod devices;
pub mod error;
pub mod mock;
pub mod serial;
pub mod traits;

pub use devices::AnySerialLink;
pub use error::{LinkError, Result};
pub use mock::{MockLink, MockLinkHandle};
pub use serial::SerialPortLink;
pub use traits::SerialLink;
