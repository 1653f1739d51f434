//! End-to-end pipeline dispatch tests over the mock link.
//!
//! All tests run with paused tokio time. The read attempt flushes the
//! link's input buffer before waiting for data, so frames are scripted
//! with `push_str_after` to land after the flush.

use scanlink_core::{
    CancelFlag, Error, FrameKind, FrameResult, ReadMode, Result, SerialLinkConfig,
};
use scanlink_link::{MockLink, MockLinkHandle};
use scanlink_pipeline::{
    AcceptAll, FaultReporter, FrameValidator, ScanArtifact, ScanHandlers, ScanPipeline, ScanState,
};
use scanlink_reader::{ReadOrchestrator, ReaderSettings, StaticConfigSource};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const AFTER_FLUSH: Duration = Duration::from_millis(5);

/// Handlers that append event names to a shared journal.
struct RecordingHandlers {
    journal: Arc<Mutex<Vec<String>>>,
    fail_on_accept: bool,
}

impl RecordingHandlers {
    fn new() -> (Self, Arc<Mutex<Vec<String>>>) {
        let journal = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                journal: Arc::clone(&journal),
                fail_on_accept: false,
            },
            journal,
        )
    }

    fn failing_on_accept() -> (Self, Arc<Mutex<Vec<String>>>) {
        let (mut handlers, journal) = Self::new();
        handlers.fail_on_accept = true;
        (handlers, journal)
    }

    fn push(&self, event: impl Into<String>) {
        self.journal.lock().unwrap().push(event.into());
    }
}

impl ScanHandlers for RecordingHandlers {
    async fn on_frame_accepted(&mut self, artifact: ScanArtifact) -> Result<()> {
        self.push(format!("accepted:{}", artifact.data));
        if self.fail_on_accept {
            return Err(Error::handler("success", "downstream unavailable"));
        }
        Ok(())
    }

    async fn on_content_rejected(&mut self, artifact: ScanArtifact) -> Result<()> {
        self.push(format!("rejected:{}", artifact.data));
        Ok(())
    }

    async fn on_link_error(&mut self, result: FrameResult) -> Result<()> {
        self.push(format!("link_error:{}", result.error));
        Ok(())
    }

    async fn post_scan(&mut self) -> Result<()> {
        self.push("post_scan");
        Ok(())
    }
}

/// Validator accepting only frames of an expected kind's exact length.
struct LengthValidator;

impl FrameValidator for LengthValidator {
    fn build(&self, text: &str, kinds: &[FrameKind]) -> ScanArtifact {
        if kinds.iter().any(|k| k.length == text.chars().count()) {
            ScanArtifact::accepted(text)
        } else {
            ScanArtifact::rejected(text)
        }
    }
}

/// Reporter that appends absorbed faults to a shared journal.
#[derive(Clone)]
struct RecordingReporter {
    faults: Arc<Mutex<Vec<String>>>,
}

impl RecordingReporter {
    fn new() -> (Self, Arc<Mutex<Vec<String>>>) {
        let faults = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                faults: Arc::clone(&faults),
            },
            faults,
        )
    }
}

impl FaultReporter for RecordingReporter {
    fn report(&self, operation: &str, error: &Error) {
        self.faults
            .lock()
            .unwrap()
            .push(format!("{operation}:{error}"));
    }
}

fn fast_config() -> SerialLinkConfig {
    SerialLinkConfig {
        pre_read_delay: Duration::ZERO,
        ..SerialLinkConfig::fallback()
    }
}

fn orchestrator(
    mode: ReadMode,
    kinds: Vec<FrameKind>,
) -> (ReadOrchestrator<MockLink, StaticConfigSource>, MockLinkHandle, CancelFlag) {
    let (link, handle) = MockLink::new();
    let source = StaticConfigSource::new().with("bench", fast_config());
    let settings = ReaderSettings::new("bench", mode).with_frame_kinds(kinds);
    let orchestrator = ReadOrchestrator::new(settings, link, source);
    let cancel = orchestrator.cancel_flag();
    (orchestrator, handle, cancel)
}

#[tokio::test(start_paused = true)]
async fn successful_frame_runs_accept_then_post_scan() {
    let (orch, handle, _cancel) = orchestrator(ReadMode::UntilDelimiter, Vec::new());
    let (handlers, journal) = RecordingHandlers::new();
    let (reporter, faults) = RecordingReporter::new();
    let mut pipeline = ScanPipeline::new(orch, AcceptAll, handlers, reporter);

    handle.push_str_after(AFTER_FLUSH, "CRATE-042\r");
    pipeline.run_scan().await;

    assert_eq!(
        *journal.lock().unwrap(),
        vec!["accepted:CRATE-042".to_string(), "post_scan".to_string()]
    );
    assert!(faults.lock().unwrap().is_empty());
    assert_eq!(pipeline.state(), &ScanState::Idle);
}

#[tokio::test(start_paused = true)]
async fn invalid_content_runs_rejected_handler_only() {
    let kinds = vec![FrameKind::new("production-label", 9)];
    let (orch, handle, _cancel) = orchestrator(ReadMode::FixedLength, kinds);
    let (handlers, journal) = RecordingHandlers::new();
    let (reporter, _faults) = RecordingReporter::new();
    let mut pipeline = ScanPipeline::new(orch, LengthValidator, handlers, reporter);

    // Five bytes against a nine-char expectation; the wall-clock bound
    // closes the read short and the validator rejects the content.
    handle.push_str_after(AFTER_FLUSH, "SHORT");
    pipeline.run_scan().await;

    assert_eq!(
        *journal.lock().unwrap(),
        vec!["rejected:SHORT".to_string(), "post_scan".to_string()]
    );
    assert_eq!(pipeline.state(), &ScanState::Idle);
}

#[tokio::test(start_paused = true)]
async fn open_fault_runs_link_error_handler() {
    let (orch, handle, _cancel) = orchestrator(ReadMode::UntilDelimiter, Vec::new());
    let (handlers, journal) = RecordingHandlers::new();
    let (reporter, faults) = RecordingReporter::new();
    let mut pipeline = ScanPipeline::new(orch, AcceptAll, handlers, reporter);

    handle.inject_open_fault("no such port");
    pipeline.run_scan().await;

    let journal = journal.lock().unwrap();
    assert_eq!(journal.len(), 2);
    assert!(journal[0].starts_with("link_error:"));
    assert!(journal[0].contains("no such port"));
    assert_eq!(journal[1], "post_scan");
    assert!(faults.lock().unwrap().is_empty());
    assert_eq!(pipeline.state(), &ScanState::Idle);
}

#[tokio::test(start_paused = true)]
async fn cancelled_attempt_skips_handlers_and_post_scan() {
    let (orch, _handle, cancel) = orchestrator(ReadMode::UntilDelimiter, Vec::new());
    let (handlers, journal) = RecordingHandlers::new();
    let (reporter, faults) = RecordingReporter::new();
    let mut pipeline = ScanPipeline::new(orch, AcceptAll, handlers, reporter);

    cancel.request();
    pipeline.run_scan().await;

    assert!(journal.lock().unwrap().is_empty());
    assert!(faults.lock().unwrap().is_empty());
    assert_eq!(pipeline.state(), &ScanState::Idle);
    assert!(pipeline.last_artifact().is_none());
}

#[tokio::test(start_paused = true)]
async fn handler_error_is_reported_not_propagated() {
    let (orch, handle, _cancel) = orchestrator(ReadMode::UntilDelimiter, Vec::new());
    let (handlers, journal) = RecordingHandlers::failing_on_accept();
    let (reporter, faults) = RecordingReporter::new();
    let mut pipeline = ScanPipeline::new(orch, AcceptAll, handlers, reporter);

    handle.push_str_after(AFTER_FLUSH, "BAD-HOP\r");
    pipeline.run_scan().await;

    // The failing handler ran, post-scan did not, and the fault landed in
    // the reporter instead of escaping run_scan.
    assert_eq!(*journal.lock().unwrap(), vec!["accepted:BAD-HOP".to_string()]);
    let faults = faults.lock().unwrap();
    assert_eq!(faults.len(), 1);
    assert!(faults[0].contains("downstream unavailable"));
    assert_eq!(pipeline.state(), &ScanState::Idle);
}

#[tokio::test(start_paused = true)]
async fn artifact_survives_attempt_and_clears_on_cancellation() {
    let (orch, handle, cancel) = orchestrator(ReadMode::UntilDelimiter, Vec::new());
    let (handlers, _journal) = RecordingHandlers::new();
    let (reporter, _faults) = RecordingReporter::new();
    let mut pipeline = ScanPipeline::new(orch, AcceptAll, handlers, reporter);

    handle.push_str_after(AFTER_FLUSH, "FIRST\r");
    pipeline.run_scan().await;
    assert_eq!(
        pipeline.last_artifact(),
        Some(&ScanArtifact::accepted("FIRST"))
    );

    cancel.request();
    pipeline.run_scan().await;
    assert!(pipeline.last_artifact().is_none());
}

#[tokio::test(start_paused = true)]
async fn pipeline_can_run_on_a_spawned_task() {
    let (orch, handle, _cancel) = orchestrator(ReadMode::UntilDelimiter, Vec::new());
    let (handlers, journal) = RecordingHandlers::new();
    let (reporter, _faults) = RecordingReporter::new();
    let pipeline = ScanPipeline::new(orch, AcceptAll, handlers, reporter);

    handle.push_str_after(AFTER_FLUSH, "SPAWNED\r");
    let pipeline = pipeline.spawn_scan().await.unwrap();

    assert_eq!(
        *journal.lock().unwrap(),
        vec!["accepted:SPAWNED".to_string(), "post_scan".to_string()]
    );
    assert_eq!(pipeline.state(), &ScanState::Idle);
}
