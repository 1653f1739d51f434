//! Scan execution and handler dispatch.

use crate::state::{ScanState, ScanStateMachine};
use scanlink_core::{Error, FrameKind, FrameResult, NoopLog, ProcessingState, Result, ScanLog};
use scanlink_link::SerialLink;
use scanlink_reader::{ConfigSource, ReadOrchestrator};
use std::future::Future;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Operation identifier handed to the log sink and fault reporter.
pub const OP_RUN_SCAN: &str = "run_scan";

/// A classified frame: the trimmed payload plus the structural verdict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanArtifact {
    /// Trimmed frame text.
    pub data: String,

    /// Whether the content passed structural validation.
    pub accepted: bool,
}

impl ScanArtifact {
    /// Artifact that passed validation.
    pub fn accepted(data: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            accepted: true,
        }
    }

    /// Artifact that failed validation.
    pub fn rejected(data: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            accepted: false,
        }
    }
}

/// Structural validator for frame content.
///
/// Only consulted when the reader's mode calls for validation; the other
/// modes accept every frame as-is.
pub trait FrameValidator: Send + Sync {
    /// Classify `text` against the expected frame kinds.
    fn build(&self, text: &str, kinds: &[FrameKind]) -> ScanArtifact;
}

/// Validator that accepts every frame.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl FrameValidator for AcceptAll {
    fn build(&self, text: &str, _kinds: &[FrameKind]) -> ScanArtifact {
        ScanArtifact::accepted(text)
    }
}

/// Caller-supplied reactions to a classified scan.
///
/// Exactly one of the three dispatch methods runs per non-cancelled attempt,
/// then `post_scan` runs unconditionally. Errors returned here are reported
/// through the pipeline's [`FaultReporter`]; they never abort the scan loop.
///
/// Methods are declared RPITIT-style with a `Send` bound so a scan can run
/// on a spawned task; implementations keep plain `async fn` bodies.
pub trait ScanHandlers: Send {
    /// A frame was read and its content accepted.
    fn on_frame_accepted(
        &mut self,
        artifact: ScanArtifact,
    ) -> impl Future<Output = Result<()>> + Send;

    /// A frame was read but its content failed validation.
    fn on_content_rejected(
        &mut self,
        artifact: ScanArtifact,
    ) -> impl Future<Output = Result<()>> + Send;

    /// The attempt failed at the link or during the read itself.
    fn on_link_error(&mut self, result: FrameResult) -> impl Future<Output = Result<()>> + Send;

    /// Runs after every dispatched attempt, regardless of outcome.
    fn post_scan(&mut self) -> impl Future<Output = Result<()>> + Send;
}

/// Receiver for errors the pipeline absorbs.
pub trait FaultReporter: Send + Sync {
    /// Report one absorbed error from the named operation.
    fn report(&self, operation: &str, error: &Error);
}

/// Reporter that discards every fault.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopReporter;

impl FaultReporter for NoopReporter {
    fn report(&self, _operation: &str, _error: &Error) {}
}

/// Reporter that forwards faults to `tracing` at error level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl FaultReporter for TracingReporter {
    fn report(&self, operation: &str, error: &Error) {
        tracing::error!(operation, %error, "scan fault absorbed");
    }
}

/// Drives one scan attempt end to end and dispatches the outcome.
///
/// The pipeline owns a [`ReadOrchestrator`] and, per attempt: reads a frame,
/// classifies it, runs exactly one handler, then the post-scan hook. Every
/// error from a collaborator is absorbed and reported;
/// [`ScanPipeline::run_scan`] has no failure mode.
///
/// A cancelled attempt is discarded silently: no handler, no post-scan hook,
/// the machine returns to `Idle`.
pub struct ScanPipeline<L, C, V, H, R> {
    orchestrator: ReadOrchestrator<L, C>,
    validator: V,
    handlers: H,
    reporter: R,
    log: Arc<dyn ScanLog>,
    machine: ScanStateMachine,
    last_artifact: Option<ScanArtifact>,
}

impl<L, C, V, H, R> ScanPipeline<L, C, V, H, R>
where
    L: SerialLink + 'static,
    C: ConfigSource + 'static,
    V: FrameValidator + 'static,
    H: ScanHandlers + 'static,
    R: FaultReporter + 'static,
{
    /// Create a pipeline with a no-op log sink.
    pub fn new(orchestrator: ReadOrchestrator<L, C>, validator: V, handlers: H, reporter: R) -> Self {
        Self {
            orchestrator,
            validator,
            handlers,
            reporter,
            log: Arc::new(NoopLog),
            machine: ScanStateMachine::new(),
            last_artifact: None,
        }
    }

    /// Substitute the log sink.
    #[must_use]
    pub fn with_log(mut self, log: Arc<dyn ScanLog>) -> Self {
        self.log = log;
        self
    }

    /// Current pipeline state.
    #[must_use]
    pub fn state(&self) -> &ScanState {
        self.machine.current_state()
    }

    /// The session's cancellation flag; clones observe the same flag.
    #[must_use]
    pub fn cancel_flag(&self) -> scanlink_core::CancelFlag {
        self.orchestrator.cancel_flag()
    }

    /// Artifact from the most recent classified attempt, if any.
    #[must_use]
    pub fn last_artifact(&self) -> Option<&ScanArtifact> {
        self.last_artifact.as_ref()
    }

    /// Run one scan attempt.
    ///
    /// Never fails: anything a collaborator returns as an error is handed to
    /// the fault reporter and the machine is reset to `Idle`.
    pub async fn run_scan(&mut self) {
        if let Err(e) = self.scan_attempt().await {
            self.reporter.report(OP_RUN_SCAN, &e);
            self.machine.reset();
        }
    }

    /// Run one scan on a spawned task, returning the pipeline when done.
    pub fn spawn_scan(mut self) -> JoinHandle<Self>
    where
        Self: Send,
    {
        tokio::spawn(async move {
            self.run_scan().await;
            self
        })
    }

    async fn scan_attempt(&mut self) -> Result<()> {
        self.last_artifact = None;
        self.machine.transition_to(ScanState::Reading)?;

        let result = self.orchestrator.wait_for_frame().await;

        if self.orchestrator.cancel_flag().is_cancelled() {
            // Abandoned attempt: nothing to dispatch, nothing to run after.
            self.log.record(
                OP_RUN_SCAN,
                result.state,
                "scan cancelled, attempt discarded",
            );
            self.machine.reset();
            return Ok(());
        }

        self.machine.transition_to(ScanState::Classifying)?;
        let artifact = if self.orchestrator.settings().mode.requires_validation() {
            self.validator
                .build(&result.trimmed, &self.orchestrator.settings().frame_kinds)
        } else {
            ScanArtifact::accepted(result.trimmed.clone())
        };
        self.last_artifact = Some(artifact.clone());

        match result.state {
            ProcessingState::Read if artifact.accepted => {
                self.machine.transition_to(ScanState::DispatchOk)?;
                self.log
                    .record(OP_RUN_SCAN, result.state, "dispatching accepted frame");
                self.handlers.on_frame_accepted(artifact).await?;
            }
            ProcessingState::Read => {
                self.machine.transition_to(ScanState::DispatchContentError)?;
                self.log
                    .record(OP_RUN_SCAN, result.state, "dispatching rejected frame");
                self.handlers.on_content_rejected(artifact).await?;
            }
            _ => {
                self.machine.transition_to(ScanState::DispatchLinkError)?;
                self.log
                    .record(OP_RUN_SCAN, result.state, "dispatching failed attempt");
                self.handlers.on_link_error(result).await?;
            }
        }

        self.machine.transition_to(ScanState::PostTask)?;
        self.handlers.post_scan().await?;

        self.machine.transition_to(ScanState::Idle)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artifact_constructors() {
        let ok = ScanArtifact::accepted("ABC");
        assert!(ok.accepted);
        assert_eq!(ok.data, "ABC");

        let bad = ScanArtifact::rejected("??");
        assert!(!bad.accepted);
    }

    #[test]
    fn test_accept_all_ignores_kinds() {
        let validator = AcceptAll;
        let kinds = vec![FrameKind::new("label", 12)];
        let artifact = validator.build("short", &kinds);
        assert!(artifact.accepted);
        assert_eq!(artifact.data, "short");
    }

    #[test]
    fn test_reporters_are_object_safe() {
        let reporters: Vec<Box<dyn FaultReporter>> =
            vec![Box::new(NoopReporter), Box::new(TracingReporter)];
        let error = Error::handler("success", "boom");
        for reporter in &reporters {
            reporter.report(OP_RUN_SCAN, &error);
        }
    }
}
