//! Frame-read state machine for the scanlink serial barcode reader.
//!
//! This crate holds the algorithmic core of the workspace:
//!
//! - [`frame`] — the four frame-termination strategies. Each strategy
//!   accumulates bytes from a [`SerialLink`](scanlink_link::SerialLink) and
//!   decides when enough have arrived to constitute a complete frame, under
//!   a soft wall-clock bound and a polled cancellation flag.
//! - [`orchestrator`] — [`ReadOrchestrator`], which sequences one read
//!   attempt end to end (resolve config → pre-read delay → open → flush →
//!   wait for first byte → strategy → classify) and always returns a
//!   fully-populated [`FrameResult`](scanlink_core::FrameResult), never an
//!   error.
//! - [`config`] — the configuration lookup seam with its in-memory
//!   implementation and the hard-coded fallback.
//!
//! # Termination policies
//!
//! | Mode | Terminates on |
//! |------|---------------|
//! | `FixedLength` | target length reached, 1 s elapsed, or cancellation |
//! | `UntilDelimiter` | delimiter substring seen, or cancellation |
//! | `UntilCancelled` | cancellation only (no timeout) |
//! | `ForInterval` | configured duration elapsed, or cancellation |
//!
//! Cancellation truncates, it never fails: a cancelled strategy completes
//! with whatever it accumulated. A short fixed-length read inside the
//! wall-clock bound is likewise a success.

pub mod config;
pub mod frame;
pub mod orchestrator;

pub use config::{ConfigSource, StaticConfigSource};
pub use frame::{
    FrameOutcome, decode_escapes, fixed_length, for_interval, target_length, until_cancelled,
    until_delimiter,
};
pub use orchestrator::{ReadOrchestrator, ReaderSettings};
