//! Serial-link trait definition.
//!
//! [`SerialLink`] is the contract between the frame-read strategies and the
//! physical (or simulated) serial device. It deliberately exposes only the
//! byte-level primitives the accumulation loops need; framing, timeouts and
//! cancellation live one layer up in `scanlink-reader`.
//!
//! The trait declares its operations RPITIT-style with an explicit `Send`
//! bound, so a read attempt can be offloaded to a spawned task;
//! implementations keep plain `async fn` bodies. It is not object-safe; see
//! [`crate::devices::AnySerialLink`] for concrete dispatch.

use crate::error::Result;
use scanlink_core::{LinkSnapshot, SerialLinkConfig};
use std::future::Future;

/// A persistent, reusable serial-line handle.
///
/// The handle is opened lazily and kept open across scan attempts; a fault
/// may force a re-open on next use, which [`ensure_open`](Self::ensure_open)
/// performs transparently. Implementations are single-owner: the caller
/// guarantees at most one attempt uses the link at a time.
pub trait SerialLink: Send {
    /// Open the link if no handle exists or the handle has gone stale.
    ///
    /// A no-op when the link is already open.
    ///
    /// # Errors
    ///
    /// Returns [`LinkError::OpenFailed`](crate::LinkError::OpenFailed) if
    /// the underlying device cannot be opened.
    fn ensure_open(
        &mut self,
        config: &SerialLinkConfig,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Drop any bytes queued before the current attempt began.
    ///
    /// Prevents stale data from a prior attempt leaking into a new frame.
    ///
    /// # Errors
    ///
    /// Returns [`LinkError::NotOpen`](crate::LinkError::NotOpen) if the link
    /// has not been opened.
    fn discard_input(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// Number of bytes currently buffered and readable without blocking.
    fn bytes_available(&mut self) -> impl Future<Output = Result<usize>> + Send;

    /// Read whatever is currently buffered, possibly nothing.
    ///
    /// Bytes are decoded one character per byte; the returned string is
    /// empty when no data is pending. Never waits.
    fn read_available(&mut self) -> impl Future<Output = Result<String>> + Send;

    /// Read exactly one byte, waiting until it arrives or the link faults.
    ///
    /// The wait is a polling loop, so a pending `read_byte` does not park a
    /// runtime worker; it still does not observe cancellation, by contract —
    /// callers poll their own flag between bytes.
    fn read_byte(&mut self) -> impl Future<Output = Result<u8>> + Send;

    /// Capture the current link settings for diagnostics.
    ///
    /// Never fails: a link with no open handle reports an unavailable
    /// snapshot.
    fn snapshot(&self) -> LinkSnapshot;
}
