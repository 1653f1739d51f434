//! Frame-termination strategies.
//!
//! Each strategy consumes bytes from a [`SerialLink`] and produces a
//! [`FrameOutcome`]: either the completed frame text, or a fault carrying
//! the partial accumulation and the fault message as separate fields. A
//! strategy never returns an error and never panics — faults from the link
//! are captured, not propagated.
//!
//! All strategies share one accumulation technique: sleep one polling
//! quantum to yield the processor, append whatever bytes the link buffered
//! in the meantime (or block for exactly one byte, for the delimiter
//! strategy), then re-evaluate the termination condition. The cancellation
//! flag is polled once per iteration; observing it terminates the loop with
//! whatever accumulated so far, as a *successful* outcome.

use scanlink_core::constants::{
    DEFAULT_DELIMITER, DEFAULT_TARGET_LENGTH, FIXED_LENGTH_TIMEOUT_MS, POLL_QUANTUM_MS,
};
use scanlink_core::{CancelFlag, FrameKind};
use scanlink_link::SerialLink;
use std::time::Duration;
use tokio::time::Instant;

/// Outcome of one strategy run.
///
/// Data and diagnostics are never conflated: a fault carries the partial
/// frame text and the fault message separately, instead of smuggling the
/// message into the data channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameOutcome {
    /// The strategy terminated normally (condition met, timeout elapsed, or
    /// cancellation observed) with the accumulated frame text.
    Complete(String),

    /// The link faulted mid-read.
    Fault {
        /// Text accumulated before the fault.
        partial: String,

        /// The fault's message.
        message: String,
    },
}

impl FrameOutcome {
    /// Whether the strategy terminated normally.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        matches!(self, FrameOutcome::Complete(_))
    }
}

fn quantum() -> Duration {
    Duration::from_millis(POLL_QUANTUM_MS)
}

/// Read until the accumulated length reaches `target_len`, bounded by a
/// one-second wall clock.
///
/// A short read inside the bound is **not** an error: the outcome is
/// `Complete` regardless of whether the target length was reached.
/// Cancellation terminates the loop with whatever accumulated.
pub async fn fixed_length<L: SerialLink>(
    link: &mut L,
    target_len: usize,
    cancel: &CancelFlag,
) -> FrameOutcome {
    let bound = Duration::from_millis(FIXED_LENGTH_TIMEOUT_MS);
    let started = Instant::now();
    let mut text = String::new();

    while text.chars().count() < target_len && started.elapsed() < bound {
        tokio::time::sleep(quantum()).await;
        match link.read_available().await {
            Ok(chunk) => text.push_str(&chunk),
            Err(e) => {
                return FrameOutcome::Fault {
                    partial: text,
                    message: e.to_string(),
                };
            }
        }
        if cancel.is_cancelled() {
            break;
        }
    }

    FrameOutcome::Complete(text)
}

/// Read one byte at a time until the escape-decoded `delimiter` substring
/// appears in the accumulated text.
///
/// The delimiter bytes remain in the returned text. Because each iteration
/// blocks for a byte, cancellation is only observed *between* bytes — under
/// no-traffic conditions a cancelled read stays pending until the next byte
/// arrives or the link faults.
pub async fn until_delimiter<L: SerialLink>(
    link: &mut L,
    delimiter: &str,
    cancel: &CancelFlag,
) -> FrameOutcome {
    let literal = if delimiter.is_empty() {
        DEFAULT_DELIMITER
    } else {
        delimiter
    };
    let delimiter = decode_escapes(literal);
    let mut text = String::new();

    while !text.contains(&delimiter) {
        match link.read_byte().await {
            Ok(byte) => text.push(byte as char),
            Err(e) => {
                return FrameOutcome::Fault {
                    partial: text,
                    message: e.to_string(),
                };
            }
        }
        if cancel.is_cancelled() {
            break;
        }
    }

    FrameOutcome::Complete(text)
}

/// Read until the cancellation flag is raised.
///
/// There is no timeout: the only sources of termination are the flag and a
/// link fault. A session that never cancels keeps this strategy pending
/// forever — bounding the read is the session owner's responsibility.
pub async fn until_cancelled<L: SerialLink>(link: &mut L, cancel: &CancelFlag) -> FrameOutcome {
    let mut text = String::new();

    loop {
        tokio::time::sleep(quantum()).await;
        match link.read_available().await {
            Ok(chunk) => text.push_str(&chunk),
            Err(e) => {
                return FrameOutcome::Fault {
                    partial: text,
                    message: e.to_string(),
                };
            }
        }
        if cancel.is_cancelled() {
            break;
        }
    }

    FrameOutcome::Complete(text)
}

/// Read for `duration`, then terminate with whatever accumulated.
pub async fn for_interval<L: SerialLink>(
    link: &mut L,
    duration: Duration,
    cancel: &CancelFlag,
) -> FrameOutcome {
    let started = Instant::now();
    let mut text = String::new();

    while started.elapsed() < duration {
        tokio::time::sleep(quantum()).await;
        match link.read_available().await {
            Ok(chunk) => text.push_str(&chunk),
            Err(e) => {
                return FrameOutcome::Fault {
                    partial: text,
                    message: e.to_string(),
                };
            }
        }
        if cancel.is_cancelled() {
            break;
        }
    }

    FrameOutcome::Complete(text)
}

/// Target length for the fixed-length strategy: the maximum over all
/// configured frame kinds, or the default when none are configured.
#[must_use]
pub fn target_length(kinds: &[FrameKind]) -> usize {
    kinds
        .iter()
        .map(|kind| kind.length)
        .max()
        .unwrap_or(DEFAULT_TARGET_LENGTH)
}

/// Decode a delimiter configured as an escape-encoded literal.
///
/// The two-character sequence `\r` configures a single carriage-return
/// byte. Supported escapes: `\r`, `\n`, `\t`, `\0`, `\\` and `\xHH`; an
/// unrecognized escape is kept verbatim rather than rejected, since the
/// delimiter comes from configuration that may predate this reader.
#[must_use]
pub fn decode_escapes(literal: &str) -> String {
    let mut decoded = String::with_capacity(literal.len());
    let mut chars = literal.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            decoded.push(c);
            continue;
        }
        match chars.next() {
            Some('r') => decoded.push('\r'),
            Some('n') => decoded.push('\n'),
            Some('t') => decoded.push('\t'),
            Some('0') => decoded.push('\0'),
            Some('\\') => decoded.push('\\'),
            Some('x') => {
                let hi = chars.next();
                let lo = chars.next();
                match (hi, lo) {
                    (Some(h), Some(l)) if h.is_ascii_hexdigit() && l.is_ascii_hexdigit() => {
                        let mut value = 0u8;
                        for d in [h, l] {
                            // is_ascii_hexdigit guarantees to_digit succeeds
                            if let Some(digit) = d.to_digit(16) {
                                value = value * 16 + digit as u8;
                            }
                        }
                        decoded.push(value as char);
                    }
                    _ => {
                        decoded.push_str("\\x");
                        if let Some(h) = hi {
                            decoded.push(h);
                        }
                        if let Some(l) = lo {
                            decoded.push(l);
                        }
                    }
                }
            }
            Some(other) => {
                decoded.push('\\');
                decoded.push(other);
            }
            None => decoded.push('\\'),
        }
    }

    decoded
}
