//! Procedure session state machine.
//!
//! Every mutation goes through [`SessionState::apply`] (operator commands) or
//! [`SessionState::tick`] (the one-second session clock). Commands that cannot
//! take effect leave the state unchanged.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::autocontinue::{AutoContinue, AutoContinueScheduler};
use crate::error::TrainerError;
use crate::procedure::{StepId, find_sub_item};
use crate::scoring::{Performance, ScoringPolicy, score};
use crate::status::{StepStatus, step_status};

/// Operator command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Complete(u8),
    Fail(u8),
    Skip(u8),
    Back(u8),
    Reset,
    ToggleSubStep(String),
    /// Manual "Continue": restarts the countdown when auto-continue is on,
    /// otherwise completes the current step.
    Continue,
    SetAutoContinue(AutoContinue),
    StartRecording,
    PauseRecording,
}

/// What a command did to the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Changed,
    /// Accepted but had nothing to do.
    Unchanged,
    /// Recording went from paused to running; the owner resets its sample window.
    RecordingStarted,
    /// Session returned to its initial state.
    Reset,
}

/// Result of one session-clock tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TickOutcome {
    /// Countdown seconds left after this tick, when armed.
    pub remaining_s: Option<u64>,
    /// Step completed by an expiring countdown.
    pub auto_completed: Option<StepId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Completed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionState {
    current_step: StepId,
    completed: BTreeSet<StepId>,
    failed: BTreeSet<StepId>,
    skipped: BTreeSet<StepId>,
    completed_sub_steps: BTreeSet<&'static str>,
    transport_connected: bool,
    recording: bool,
    session_duration_s: u64,
    auto_continue: AutoContinueScheduler,
    /// Setting the session started with; Reset returns to it.
    #[serde(skip)]
    initial_auto_continue: AutoContinue,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            current_step: StepId::FIRST,
            completed: BTreeSet::new(),
            failed: BTreeSet::new(),
            skipped: BTreeSet::new(),
            completed_sub_steps: BTreeSet::new(),
            transport_connected: false,
            recording: false,
            session_duration_s: 0,
            auto_continue: AutoContinueScheduler::default(),
            initial_auto_continue: AutoContinue::Off,
        }
    }
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fresh session whose auto-continue starts at `setting`, armed at duration 0.
    pub fn with_auto_continue(setting: AutoContinue) -> Self {
        let mut state = Self::default();
        state.auto_continue.configure(setting, 0);
        state.initial_auto_continue = setting;
        state
    }

    pub fn current_step(&self) -> StepId {
        self.current_step
    }

    pub fn completed(&self) -> &BTreeSet<StepId> {
        &self.completed
    }

    pub fn failed(&self) -> &BTreeSet<StepId> {
        &self.failed
    }

    pub fn skipped(&self) -> &BTreeSet<StepId> {
        &self.skipped
    }

    pub fn completed_sub_steps(&self) -> &BTreeSet<&'static str> {
        &self.completed_sub_steps
    }

    pub fn is_transport_connected(&self) -> bool {
        self.transport_connected
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    pub fn session_duration_s(&self) -> u64 {
        self.session_duration_s
    }

    pub fn auto_continue(&self) -> AutoContinue {
        self.auto_continue.setting()
    }

    pub fn countdown_anchor_s(&self) -> Option<u64> {
        self.auto_continue.anchor_s()
    }

    /// Seconds left on the auto-continue countdown, when armed.
    pub fn countdown_remaining_s(&self) -> Option<u64> {
        self.auto_continue.remaining(self.session_duration_s)
    }

    pub fn step_status(&self, id: StepId) -> StepStatus {
        step_status(
            id,
            self.current_step,
            &self.completed,
            &self.failed,
            &self.skipped,
        )
    }

    pub fn statuses(&self) -> impl Iterator<Item = (StepId, StepStatus)> + '_ {
        StepId::all().map(|id| (id, self.step_status(id)))
    }

    /// True once every step has been completed.
    pub fn all_steps_completed(&self) -> bool {
        self.completed.len() == StepId::all().count()
    }

    /// True once every step has been either completed or failed.
    pub fn all_steps_processed(&self) -> bool {
        StepId::all().all(|id| self.has_outcome(id))
    }

    /// Fraction of completed steps, in `0.0..=1.0`.
    pub fn progress(&self) -> f64 {
        self.completed.len() as f64 / StepId::all().count() as f64
    }

    pub fn performance(&self, policy: ScoringPolicy) -> Performance {
        score(
            self.completed.len(),
            self.failed.len(),
            self.skipped.len(),
            policy,
        )
    }

    /// Apply an operator command. On error the state is unchanged.
    pub fn apply(&mut self, command: &Command) -> Result<Applied, TrainerError> {
        let applied = match command {
            Command::Complete(id) => self.record(StepId::new(*id)?, Outcome::Completed),
            Command::Fail(id) => self.record(StepId::new(*id)?, Outcome::Failed),
            Command::Skip(id) => self.skip(StepId::new(*id)?),
            Command::Back(id) => self.back(StepId::new(*id)?),
            Command::Reset => {
                self.reset();
                Applied::Reset
            }
            Command::ToggleSubStep(sub) => self.toggle_sub_step(sub)?,
            Command::Continue => {
                if self.auto_continue.rearm(self.session_duration_s) {
                    Applied::Changed
                } else {
                    self.record(self.current_step, Outcome::Completed)
                }
            }
            Command::SetAutoContinue(setting) => {
                self.auto_continue
                    .configure(*setting, self.session_duration_s);
                Applied::Changed
            }
            Command::StartRecording => {
                if !self.transport_connected {
                    return Err(TrainerError::NotConnected);
                }
                if self.recording {
                    Applied::Unchanged
                } else {
                    self.recording = true;
                    Applied::RecordingStarted
                }
            }
            Command::PauseRecording => {
                if self.recording {
                    self.recording = false;
                    Applied::Changed
                } else {
                    Applied::Unchanged
                }
            }
        };
        tracing::debug!(?command, ?applied, current = %self.current_step, "command applied");
        Ok(applied)
    }

    /// Advance the session clock by one second and run the auto-continue check.
    pub fn tick(&mut self) -> TickOutcome {
        self.session_duration_s = self.session_duration_s.saturating_add(1);
        let mut outcome = TickOutcome {
            remaining_s: self.countdown_remaining_s(),
            auto_completed: None,
        };
        if self.auto_continue.poll_expired(self.session_duration_s) {
            outcome.remaining_s = None;
            let current = self.current_step;
            if current < StepId::LAST
                && self.record(current, Outcome::Completed) == Applied::Changed
            {
                tracing::info!(step = %current, "auto-continue completed step");
                outcome.auto_completed = Some(current);
            }
        }
        outcome
    }

    pub(crate) fn set_transport_connected(&mut self, connected: bool) {
        self.transport_connected = connected;
        if !connected {
            self.recording = false;
        }
    }

    fn has_outcome(&self, id: StepId) -> bool {
        self.completed.contains(&id) || self.failed.contains(&id)
    }

    fn record(&mut self, id: StepId, outcome: Outcome) -> Applied {
        if id != self.current_step || self.has_outcome(id) {
            tracing::debug!(step = %id, current = %self.current_step, ?outcome, "ignored: not the open current step");
            return Applied::Unchanged;
        }
        self.skipped.remove(&id);
        match outcome {
            Outcome::Completed => self.completed.insert(id),
            Outcome::Failed => self.failed.insert(id),
        };
        if let Some(next) = id.next() {
            self.current_step = next;
        }
        Applied::Changed
    }

    fn skip(&mut self, id: StepId) -> Applied {
        if self.has_outcome(id) || !self.skipped.insert(id) {
            return Applied::Unchanged;
        }
        Applied::Changed
    }

    fn back(&mut self, id: StepId) -> Applied {
        let target = id.prev_clamped();
        self.completed.remove(&target);
        self.failed.remove(&target);
        self.skipped.remove(&target);
        self.current_step = target;
        Applied::Changed
    }

    fn toggle_sub_step(&mut self, sub: &str) -> Result<Applied, TrainerError> {
        let (_, item) =
            find_sub_item(sub).ok_or_else(|| TrainerError::UnknownSubStep(sub.to_owned()))?;
        if !self.completed_sub_steps.remove(item.id) {
            self.completed_sub_steps.insert(item.id);
        }
        Ok(Applied::Changed)
    }

    fn reset(&mut self) {
        let connected = self.transport_connected;
        *self = Self {
            transport_connected: connected,
            ..Self::with_auto_continue(self.initial_auto_continue)
        };
    }
}
