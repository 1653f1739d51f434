//! Per-scan dispatch pipeline.
//!
//! [`ScanPipeline`] drives one scan attempt end to end: it invokes the
//! orchestrator, classifies the resulting
//! [`FrameResult`](scanlink_core::FrameResult), and dispatches to exactly
//! one of three
//! caller-supplied handlers — success, content-invalid, or link/reader
//! error — followed by a post-scan hook. A cancelled attempt is silently
//! abandoned: no handler, no hook.
//!
//! The pipeline is the last absorption boundary: any error a collaborator
//! returns is funneled to a [`FaultReporter`] instead of escaping to the
//! caller. `run_scan` has no failure mode.
//!
//! # States
//!
//! `Idle → Reading → Classifying → {DispatchOk | DispatchContentError |
//! DispatchLinkError} → PostTask → Idle`, with `Reading → Idle` as the
//! cancellation short-circuit.

pub mod pipeline;
pub mod state;

pub use pipeline::{
    AcceptAll, FaultReporter, FrameValidator, NoopReporter, ScanArtifact, ScanHandlers,
    ScanPipeline, TracingReporter,
};
pub use state::{ScanState, ScanStateMachine, StateTransition};
