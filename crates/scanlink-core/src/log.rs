//! Pluggable log sink for scan diagnostics.
//!
//! The reader and pipeline report progress as `(operation, state, message)`
//! tuples through the [`ScanLog`] trait. A host application substitutes its
//! own sink; [`NoopLog`] drops everything without altering behavior, and
//! [`TracingLog`] forwards to the `tracing` ecosystem.

use crate::types::ProcessingState;

/// Receiver for scan progress and fault messages.
///
/// Implementations must be cheap and non-blocking: sinks are called from
/// inside the read loops' orchestration path.
pub trait ScanLog: Send + Sync {
    /// Record one event from the named originating operation.
    fn record(&self, operation: &str, state: ProcessingState, message: &str);
}

/// Sink that discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopLog;

impl ScanLog for NoopLog {
    fn record(&self, _operation: &str, _state: ProcessingState, _message: &str) {}
}

/// Sink that forwards events to `tracing`.
///
/// Fault states are logged at `warn`, everything else at `debug`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLog;

impl ScanLog for TracingLog {
    fn record(&self, operation: &str, state: ProcessingState, message: &str) {
        if state.is_error() {
            tracing::warn!(operation, state = %state, message);
        } else {
            tracing::debug!(operation, state = %state, message);
        }
    }
}
