//! Scriptable in-memory serial link for testing and development.
//!
//! [`MockLink`] simulates the byte-level behavior of a barcode scanner on a
//! serial line: bytes pushed through the [`MockLinkHandle`] become available
//! to the link's read primitives exactly as if the device had sent them.
//! The handle can also script faults (open failures, read faults, a dropped
//! link) to exercise every failure path without hardware.

use crate::error::{LinkError, Result};
use crate::serial::decode_bytes;
use crate::traits::SerialLink;
use scanlink_core::constants::POLL_QUANTUM_MS;
use scanlink_core::{LinkSnapshot, SerialLinkConfig};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// Shared script state between a [`MockLink`] and its handle.
#[derive(Debug, Default)]
struct MockState {
    /// Bytes "sent by the device", consumed by the read primitives.
    buffer: VecDeque<u8>,

    /// Whether the link is currently open.
    open: bool,

    /// Configuration of the last successful open.
    opened_with: Option<SerialLinkConfig>,

    /// One-shot fault raised by the next read primitive.
    read_fault: Option<String>,

    /// One-shot failure raised by the next open.
    open_fault: Option<String>,

    /// How many times the input buffer was discarded.
    discards: usize,
}

/// In-memory serial link driven by a [`MockLinkHandle`].
///
/// # Examples
///
/// ```
/// use scanlink_core::SerialLinkConfig;
/// use scanlink_link::{MockLink, SerialLink};
///
/// #[tokio::main]
/// async fn main() -> scanlink_link::Result<()> {
///     let (mut link, handle) = MockLink::new();
///     link.ensure_open(&SerialLinkConfig::fallback()).await?;
///
///     handle.push_str("12345\r");
///     assert_eq!(link.read_available().await?, "12345\r");
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockLink {
    state: Arc<Mutex<MockState>>,
}

impl MockLink {
    /// Create a mock link and the handle that scripts it.
    #[must_use]
    pub fn new() -> (Self, MockLinkHandle) {
        let state = Arc::new(Mutex::new(MockState::default()));
        let link = Self {
            state: Arc::clone(&state),
        };
        let handle = MockLinkHandle { state };
        (link, handle)
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Default for MockLink {
    fn default() -> Self {
        Self::new().0
    }
}

impl SerialLink for MockLink {
    async fn ensure_open(&mut self, config: &SerialLinkConfig) -> Result<()> {
        let mut state = self.lock();
        if let Some(message) = state.open_fault.take() {
            return Err(LinkError::open_failed(&config.port_name, message));
        }
        if !state.open {
            state.open = true;
            state.opened_with = Some(config.clone());
        }
        Ok(())
    }

    async fn discard_input(&mut self) -> Result<()> {
        let mut state = self.lock();
        if !state.open {
            return Err(LinkError::NotOpen);
        }
        state.buffer.clear();
        state.discards += 1;
        Ok(())
    }

    async fn bytes_available(&mut self) -> Result<usize> {
        let state = self.lock();
        if !state.open {
            return Err(LinkError::NotOpen);
        }
        Ok(state.buffer.len())
    }

    async fn read_available(&mut self) -> Result<String> {
        let mut state = self.lock();
        if let Some(message) = state.read_fault.take() {
            return Err(LinkError::read_failed(message));
        }
        if !state.open {
            return Err(LinkError::NotOpen);
        }
        let bytes: Vec<u8> = state.buffer.drain(..).collect();
        Ok(decode_bytes(&bytes))
    }

    async fn read_byte(&mut self) -> Result<u8> {
        loop {
            {
                let mut state = self.lock();
                if let Some(message) = state.read_fault.take() {
                    return Err(LinkError::read_failed(message));
                }
                if !state.open {
                    return Err(LinkError::NotOpen);
                }
                if let Some(byte) = state.buffer.pop_front() {
                    return Ok(byte);
                }
            }
            tokio::time::sleep(Duration::from_millis(POLL_QUANTUM_MS)).await;
        }
    }

    fn snapshot(&self) -> LinkSnapshot {
        let state = self.lock();
        match (&state.opened_with, state.open) {
            (Some(config), true) => LinkSnapshot {
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

/// Handle for scripting a [`MockLink`].
///
/// Cloneable; clones share the same link state.
#[derive(Debug, Clone)]
pub struct MockLinkHandle {
    state: Arc<Mutex<MockState>>,
}

impl MockLinkHandle {
    fn lock(&self) -> MutexGuard<'_, MockState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Make `bytes` available to the link immediately.
    pub fn push_bytes(&self, bytes: &[u8]) {
        self.lock().buffer.extend(bytes.iter().copied());
    }

    /// Make `text` available to the link immediately.
    pub fn push_str(&self, text: &str) {
        self.push_bytes(text.as_bytes());
    }

    /// Make `text` available to the link after `delay`.
    ///
    /// Spawns a timer task; useful for scripting arrival timing against the
    /// strategies' wall-clock bounds.
    pub fn push_str_after(&self, delay: Duration, text: &str) {
        let handle = self.clone();
        let text = text.to_string();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            handle.push_str(&text);
        });
    }

    /// Fail the next read primitive with `message`.
    pub fn inject_read_fault(&self, message: impl Into<String>) {
        self.lock().read_fault = Some(message.into());
    }

    /// Fail the next open with `message`.
    pub fn inject_open_fault(&self, message: impl Into<String>) {
        self.lock().open_fault = Some(message.into());
    }

    /// Drop the link as if the device disappeared.
    ///
    /// Subsequent primitives return [`LinkError::NotOpen`] until the link is
    /// re-opened.
    pub fn force_close(&self) {
        self.lock().open = false;
    }

    /// Number of bytes currently queued.
    #[must_use]
    pub fn buffered_len(&self) -> usize {
        self.lock().buffer.len()
    }

    /// How many times the link discarded its input buffer.
    #[must_use]
    pub fn discard_count(&self) -> usize {
        self.lock().discards
    }

    /// Configuration of the last successful open, if any.
    #[must_use]
    pub fn opened_config(&self) -> Option<SerialLinkConfig> {
        self.lock().opened_with.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_push_and_read_available() {
        let (mut link, handle) = MockLink::new();
        link.ensure_open(&SerialLinkConfig::fallback()).await.unwrap();

        handle.push_str("AB12\r");
        assert_eq!(link.bytes_available().await.unwrap(), 5);
        assert_eq!(link.read_available().await.unwrap(), "AB12\r");
        assert_eq!(link.read_available().await.unwrap(), "");
    }

    #[tokio::test]
    async fn test_read_byte_waits_for_data() {
        let (mut link, handle) = MockLink::new();
        link.ensure_open(&SerialLinkConfig::fallback()).await.unwrap();

        handle.push_str_after(Duration::from_millis(5), "X");
        let byte = link.read_byte().await.unwrap();
        assert_eq!(byte, b'X');
    }

    // Link futures must be able to cross a task boundary.
    #[tokio::test]
    async fn test_read_runs_on_a_spawned_task() {
        let (mut link, handle) = MockLink::new();
        link.ensure_open(&SerialLinkConfig::fallback()).await.unwrap();
        handle.push_str("K");

        let byte = tokio::spawn(async move { link.read_byte().await })
            .await
            .unwrap()
            .unwrap();
        assert_eq!(byte, b'K');
    }

    #[tokio::test]
    async fn test_discard_clears_queued_bytes() {
        let (mut link, handle) = MockLink::new();
        link.ensure_open(&SerialLinkConfig::fallback()).await.unwrap();

        handle.push_str("stale");
        link.discard_input().await.unwrap();
        assert_eq!(link.bytes_available().await.unwrap(), 0);
        assert_eq!(handle.discard_count(), 1);
    }

    #[tokio::test]
    async fn test_injected_read_fault_is_one_shot() {
        let (mut link, handle) = MockLink::new();
        link.ensure_open(&SerialLinkConfig::fallback()).await.unwrap();

        handle.inject_read_fault("device removed");
        let error = link.read_available().await.unwrap_err();
        assert_eq!(error.to_string(), "Read failed: device removed");

        handle.push_str("ok");
        assert_eq!(link.read_available().await.unwrap(), "ok");
    }

    #[tokio::test]
    async fn test_injected_open_fault() {
        let (mut link, handle) = MockLink::new();
        handle.inject_open_fault("permission denied");

        let error = link
            .ensure_open(&SerialLinkConfig::fallback())
            .await
            .unwrap_err();
        assert!(matches!(error, LinkError::OpenFailed { .. }));

        // Next open succeeds.
        link.ensure_open(&SerialLinkConfig::fallback()).await.unwrap();
        assert!(link.snapshot().is_available());
    }

    #[tokio::test]
    async fn test_force_close_drops_link() {
        let (mut link, handle) = MockLink::new();
        link.ensure_open(&SerialLinkConfig::fallback()).await.unwrap();

        handle.force_close();
        assert!(matches!(
            link.bytes_available().await,
            Err(LinkError::NotOpen)
        ));
        assert!(!link.snapshot().is_available());
    }

    #[tokio::test]
    async fn test_snapshot_reflects_opened_config() {
        let (mut link, _handle) = MockLink::new();
        let config = SerialLinkConfig {
            port_name: "COM7".to_string(),
            ..SerialLinkConfig::fallback()
        };
        link.ensure_open(&config).await.unwrap();

        let snapshot = link.snapshot();
        assert_eq!(snapshot.port_name.as_deref(), Some("COM7"));
        assert_eq!(snapshot.baud_rate, Some(9600));
    }
}
