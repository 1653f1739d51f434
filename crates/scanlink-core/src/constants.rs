//! Timing and fallback constants shared across the scanlink workspace.
//!
//! All waiting in scanlink is cooperative polling: a loop sleeps for one
//! quantum, appends whatever bytes the link buffered in the meantime, and
//! re-evaluates its termination condition. The quantum therefore bounds both
//! cancellation latency and timeout precision.
//!
//! # Usage
//!
//! ```
//! use scanlink_core::constants::*;
//! use std::time::Duration;
//!
//! let quantum = Duration::from_millis(POLL_QUANTUM_MS);
//! assert_eq!(quantum, Duration::from_millis(1));
//! ```

// ============================================================================
// Polling and timeouts
// ============================================================================

/// Sleep quantum for every accumulation loop, in milliseconds.
///
/// Each strategy iteration yields for this long before appending newly
/// buffered bytes and re-checking its termination condition. Cancellation is
/// observed at the same granularity.
pub const POLL_QUANTUM_MS: u64 = 1;

/// Wall-clock bound for the fixed-length strategy, in milliseconds.
///
/// A fixed-length read that has not reached its target length by this bound
/// terminates with whatever accumulated. A short read is not a failure.
pub const FIXED_LENGTH_TIMEOUT_MS: u64 = 1_000;

/// Default duration for the interval strategy, in milliseconds.
pub const DEFAULT_READ_INTERVAL_MS: u64 = 200;

// ============================================================================
// Frame defaults
// ============================================================================

/// Target length used by the fixed-length strategy when no frame kinds are
/// configured.
pub const DEFAULT_TARGET_LENGTH: usize = 1;

/// Default frame delimiter as an escape-encoded literal (carriage return).
///
/// Delimiters are configured as escape sequences and decoded before use, so
/// the two characters `\r` configure a single 0x0D byte.
pub const DEFAULT_DELIMITER: &str = "\\r";

// ============================================================================
// Link configuration fallback
// ============================================================================

/// Port used when configuration lookup misses the reader identity.
pub const FALLBACK_PORT_NAME: &str = "COM1";

/// Baud rate of the fallback configuration (and the common scanner default).
pub const FALLBACK_BAUD_RATE: u32 = 9_600;

/// Pre-read delay of the fallback configuration, in milliseconds.
///
/// The delay rate-limits repeated physical scans before each attempt touches
/// the port.
pub const FALLBACK_PRE_READ_DELAY_MS: u64 = 900;
