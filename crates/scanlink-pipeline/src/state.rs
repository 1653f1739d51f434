//! Scan pipeline state machine.
//!
//! Tracks where a scan attempt is in its `Idle → Reading → Classifying →
//! Dispatch → PostTask → Idle` flow, enforces valid transitions, and keeps
//! a bounded transition history for diagnostics.
//!
//! # Examples
//!
//! ```
//! use scanlink_pipeline::{ScanState, ScanStateMachine};
//!
//! let mut machine = ScanStateMachine::new();
//! assert_eq!(machine.current_state(), &ScanState::Idle);
//!
//! machine.transition_to(ScanState::Reading).unwrap();
//! machine.transition_to(ScanState::Classifying).unwrap();
//! assert_eq!(machine.history().len(), 2);
//! ```

use scanlink_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::time::{Duration, Instant};

/// Maximum number of state transitions to keep in history.
///
/// A complete non-cancelled attempt is five transitions, so 50 covers the
/// last ten scans — enough to reconstruct a misbehaving session without
/// unbounded growth.
const MAX_HISTORY_SIZE: usize = 50;

/// States of one scan attempt.
///
/// The flow is linear with a three-way branch at classification; the only
/// backward edge outside the normal loop is `Reading → Idle`, taken when a
/// cancelled attempt is discarded without dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanState {
    /// Waiting for the next scan trigger.
    Idle,

    /// Read attempt in progress.
    Reading,

    /// Classifying the frame result and building the artifact.
    Classifying,

    /// Dispatching to the success handler.
    DispatchOk,

    /// Dispatching to the content-error handler.
    DispatchContentError,

    /// Dispatching to the link/reader-error handler.
    DispatchLinkError,

    /// Running the post-scan hook.
    PostTask,
}

impl fmt::Display for ScanState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self {
            ScanState::Idle => "Idle",
            ScanState::Reading => "Reading",
            ScanState::Classifying => "Classifying",
            ScanState::DispatchOk => "DispatchOk",
            ScanState::DispatchContentError => "DispatchContentError",
            ScanState::DispatchLinkError => "DispatchLinkError",
            ScanState::PostTask => "PostTask",
        };
        write!(f, "{}", state)
    }
}

impl ScanState {
    /// Check if transition to target state is valid from this state.
    ///
    /// # Examples
    ///
    /// ```
    /// use scanlink_pipeline::ScanState;
    ///
    /// assert!(ScanState::Idle.can_transition_to(&ScanState::Reading));
    /// assert!(!ScanState::Idle.can_transition_to(&ScanState::PostTask));
    /// ```
    #[must_use]
    pub fn can_transition_to(&self, target: &ScanState) -> bool {
        matches!(
            (self, target),
            // From Idle
            (ScanState::Idle, ScanState::Reading)
            // From Reading: classify, or discard a cancelled attempt
            | (ScanState::Reading, ScanState::Classifying | ScanState::Idle)
            // From Classifying
            | (
                ScanState::Classifying,
                ScanState::DispatchOk
                    | ScanState::DispatchContentError
                    | ScanState::DispatchLinkError
            )
            // From any dispatch
            | (
                ScanState::DispatchOk
                    | ScanState::DispatchContentError
                    | ScanState::DispatchLinkError,
                ScanState::PostTask
            )
            // From PostTask
            | (ScanState::PostTask, ScanState::Idle)
        )
    }
}

/// A single recorded state transition.
#[derive(Debug, Clone)]
pub struct StateTransition {
    /// The state transitioned from.
    pub from: ScanState,

    /// The state transitioned to.
    pub to: ScanState,

    /// When the transition occurred.
    pub timestamp: Instant,
}

impl StateTransition {
    fn new(from: ScanState, to: ScanState) -> Self {
        Self {
            from,
            to,
            timestamp: Instant::now(),
        }
    }

    /// Elapsed time since this transition occurred.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.timestamp.elapsed()
    }
}

/// State machine enforcing the scan attempt flow.
///
/// Not thread-safe by design: one pipeline owns one machine, and the
/// pipeline itself assumes at most one scan in flight.
#[derive(Debug)]
pub struct ScanStateMachine {
    current_state: ScanState,
    state_entered_at: Instant,
    history: VecDeque<StateTransition>,
}

impl ScanStateMachine {
    /// Create a machine in the `Idle` state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            current_state: ScanState::Idle,
            state_entered_at: Instant::now(),
            history: VecDeque::with_capacity(MAX_HISTORY_SIZE),
        }
    }

    /// The current state.
    #[must_use]
    pub fn current_state(&self) -> &ScanState {
        &self.current_state
    }

    /// How long the machine has been in the current state.
    #[must_use]
    pub fn time_in_state(&self) -> Duration {
        self.state_entered_at.elapsed()
    }

    /// Recorded transitions, oldest first, bounded.
    #[must_use]
    pub fn history(&self) -> &VecDeque<StateTransition> {
        &self.history
    }

    /// Transition to `target`, validating the edge.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidStateTransition`] when the flow does not
    /// allow the edge.
    pub fn transition_to(&mut self, target: ScanState) -> Result<()> {
        if !self.current_state.can_transition_to(&target) {
            return Err(Error::InvalidStateTransition {
                from: self.current_state.to_string(),
                to: target.to_string(),
            });
        }
        self.record(target);
        Ok(())
    }

    /// Force the machine back to `Idle`, recording the jump.
    ///
    /// Used when an attempt is abandoned mid-flow (cancellation, or a fault
    /// absorbed at the pipeline boundary); validation would reject most of
    /// these edges, and the machine must never be stuck.
    pub fn reset(&mut self) {
        if self.current_state != ScanState::Idle {
            self.record(ScanState::Idle);
        }
    }

    fn record(&mut self, target: ScanState) {
        if self.history.len() >= MAX_HISTORY_SIZE {
            self.history.pop_front();
        }
        self.history
            .push_back(StateTransition::new(self.current_state, target));
        self.current_state = target;
        self.state_entered_at = Instant::now();
    }
}

impl Default for ScanStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_success_flow() {
        let mut machine = ScanStateMachine::new();

        machine.transition_to(ScanState::Reading).unwrap();
        machine.transition_to(ScanState::Classifying).unwrap();
        machine.transition_to(ScanState::DispatchOk).unwrap();
        machine.transition_to(ScanState::PostTask).unwrap();
        machine.transition_to(ScanState::Idle).unwrap();

        assert_eq!(machine.current_state(), &ScanState::Idle);
        assert_eq!(machine.history().len(), 5);
    }

    #[test]
    fn test_cancellation_short_circuit() {
        let mut machine = ScanStateMachine::new();

        machine.transition_to(ScanState::Reading).unwrap();
        machine.transition_to(ScanState::Idle).unwrap();

        assert_eq!(machine.current_state(), &ScanState::Idle);
    }

    #[test]
    fn test_invalid_transition_rejected() {
        let mut machine = ScanStateMachine::new();

        let result = machine.transition_to(ScanState::PostTask);
        assert!(result.is_err());
        assert_eq!(machine.current_state(), &ScanState::Idle);
    }

    #[test]
    fn test_each_dispatch_leads_to_post_task() {
        for dispatch in [
            ScanState::DispatchOk,
            ScanState::DispatchContentError,
            ScanState::DispatchLinkError,
        ] {
            let mut machine = ScanStateMachine::new();
            machine.transition_to(ScanState::Reading).unwrap();
            machine.transition_to(ScanState::Classifying).unwrap();
            machine.transition_to(dispatch).unwrap();
            machine.transition_to(ScanState::PostTask).unwrap();
        }
    }

    #[test]
    fn test_reset_from_any_state() {
        let mut machine = ScanStateMachine::new();
        machine.transition_to(ScanState::Reading).unwrap();
        machine.transition_to(ScanState::Classifying).unwrap();

        machine.reset();
        assert_eq!(machine.current_state(), &ScanState::Idle);

        // Resetting an idle machine records nothing.
        let before = machine.history().len();
        machine.reset();
        assert_eq!(machine.history().len(), before);
    }

    #[test]
    fn test_history_is_bounded() {
        let mut machine = ScanStateMachine::new();
        for _ in 0..30 {
            machine.transition_to(ScanState::Reading).unwrap();
            machine.transition_to(ScanState::Idle).unwrap();
        }
        assert_eq!(machine.history().len(), 50);
    }

    #[test]
    fn test_state_serde_round_trip() {
        let json = serde_json::to_string(&ScanState::DispatchContentError).unwrap();
        assert_eq!(json, "\"dispatch_content_error\"");
        let state: ScanState = serde_json::from_str(&json).unwrap();
        assert_eq!(state, ScanState::DispatchContentError);
    }
}
