//! Trainer: session state plus the telemetry pipeline.
//!
//! Owns the frame assembler, the rolling window and the session state machine,
//! and applies one event at a time. Chunks, ticks and commands may arrive in
//! any interleaving.

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use venitrain_traits::clock::Clock;

use crate::config::SessionCfg;
use crate::error::TrainerError;
use crate::framing::{FrameAssembler, RawLineLog};
use crate::procedure::{StepId, step};
use crate::scoring::{Performance, ScoringPolicy};
use crate::session::{Applied, Command, SessionState, TickOutcome};
use crate::status::StepStatus;
use crate::telemetry::{TelemetrySample, parse_line};
use crate::util::format_duration;
use crate::window::{AngleZone, RollingWindow, ValueRange, angle_zone};

/// What one chunk produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ChunkReport {
    pub lines: usize,
    pub accepted: usize,
    pub rejected: usize,
}

/// Running totals across the trainer's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct FeedCounters {
    pub chunks: u64,
    pub lines: u64,
    pub accepted: u64,
    pub rejected: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct StepView {
    pub id: StepId,
    pub title: &'static str,
    pub status: StepStatus,
}

/// Read-only view of everything an operator console renders.
#[derive(Debug, Clone, Serialize)]
pub struct TrainerSnapshot {
    pub current_step: StepId,
    pub steps: Vec<StepView>,
    pub completed_sub_steps: Vec<&'static str>,
    pub session_duration_s: u64,
    pub session_duration: String,
    pub auto_continue_s: u64,
    pub countdown_remaining_s: Option<u64>,
    pub transport_connected: bool,
    pub recording: bool,
    pub past_initial_period: bool,
    pub samples: usize,
    pub latest: Option<TelemetrySample>,
    pub angle_range: Option<ValueRange>,
    pub pressure_range: Option<ValueRange>,
    pub angle_zone: Option<AngleZone>,
    pub progress: f64,
    pub performance: Performance,
    pub all_steps_completed: bool,
    pub all_steps_processed: bool,
}

pub struct Trainer {
    state: SessionState,
    assembler: FrameAssembler,
    window: RollingWindow,
    clock: Arc<dyn Clock + Send + Sync>,
    recording_started: Option<Instant>,
    scoring: ScoringPolicy,
    warmup_s: u64,
    counters: FeedCounters,
}

impl core::fmt::Debug for Trainer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Trainer")
            .field("state", &self.state)
            .field("samples", &self.window.len())
            .field("raw_lines", &self.assembler.raw_lines().len())
            .field("scoring", &self.scoring)
            .finish_non_exhaustive()
    }
}

impl Trainer {
    /// Start building a Trainer.
    pub fn builder() -> crate::builder::TrainerBuilder {
        crate::builder::TrainerBuilder::default()
    }

    pub(crate) fn from_parts(
        cfg: &SessionCfg,
        scoring: ScoringPolicy,
        clock: Arc<dyn Clock + Send + Sync>,
    ) -> Self {
        Self {
            state: SessionState::with_auto_continue(cfg.auto_continue),
            assembler: FrameAssembler::with_raw_capacity(cfg.raw_line_capacity),
            window: RollingWindow::with_capacity(cfg.window_capacity),
            clock,
            recording_started: None,
            scoring,
            warmup_s: cfg.warmup_s,
            counters: FeedCounters::default(),
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn window(&self) -> &RollingWindow {
        &self.window
    }

    pub fn raw_lines(&self) -> &RawLineLog {
        self.assembler.raw_lines()
    }

    /// Text received after the last line terminator.
    pub fn pending_fragment(&self) -> &str {
        self.assembler.pending()
    }

    pub fn latest_reading(&self) -> Option<&TelemetrySample> {
        self.window.latest()
    }

    pub fn counters(&self) -> FeedCounters {
        self.counters
    }

    pub fn scoring_policy(&self) -> ScoringPolicy {
        self.scoring
    }

    pub fn performance(&self) -> Performance {
        self.state.performance(self.scoring)
    }

    /// Seconds since recording last started; 0 when it never started.
    pub fn elapsed_recording_s(&self) -> f64 {
        self.recording_started
            .map_or(0.0, |t| self.clock.secs_since(t))
    }

    /// True once the current recording run is older than the warm-up period.
    pub fn past_initial_period(&self) -> bool {
        self.state.is_recording() && self.elapsed_recording_s() > self.warmup_s as f64
    }

    /// Apply an operator command, including its effects on the telemetry pipeline.
    pub fn apply(&mut self, command: &Command) -> Result<Applied, TrainerError> {
        let applied = self.state.apply(command)?;
        match applied {
            Applied::RecordingStarted => {
                self.window.clear();
                self.assembler.raw_lines_mut().mark_processed();
                self.recording_started = Some(self.clock.now());
                tracing::info!(step = %self.state.current_step(), "recording started");
            }
            Applied::Reset => {
                self.window.clear();
                self.assembler.clear();
                self.recording_started = None;
                tracing::info!("session reset");
            }
            Applied::Changed if matches!(command, Command::PauseRecording) => {
                tracing::info!(samples = self.window.len(), "recording paused");
            }
            Applied::Changed => {
                tracing::info!(?command, current = %self.state.current_step(), "session updated");
            }
            Applied::Unchanged => {}
        }
        Ok(applied)
    }

    /// Feed one transport chunk. Complete lines are echoed to the raw log and,
    /// while recording, parsed into the window. Rejected lines are dropped.
    pub fn on_chunk(&mut self, chunk: &[u8]) -> ChunkReport {
        let recording = self.state.is_recording();
        let elapsed_s = self.elapsed_recording_s();
        let mut report = ChunkReport::default();
        for line in self.assembler.feed(chunk) {
            report.lines += 1;
            if !recording {
                continue;
            }
            match parse_line(&line, elapsed_s) {
                Ok(sample) => {
                    self.window.append(sample);
                    report.accepted += 1;
                }
                Err(reason) => {
                    tracing::debug!(%reason, line = %line, "telemetry line dropped");
                    report.rejected += 1;
                }
            }
        }
        // Lines seen while paused are stale once recording resumes.
        self.assembler.raw_lines_mut().mark_processed();

        self.counters.chunks += 1;
        self.counters.lines += report.lines as u64;
        self.counters.accepted += report.accepted as u64;
        self.counters.rejected += report.rejected as u64;
        tracing::trace!(bytes = chunk.len(), ?report, "chunk processed");
        report
    }

    /// One session-clock tick.
    pub fn on_tick(&mut self) -> TickOutcome {
        self.state.tick()
    }

    pub fn on_connected(&mut self) -> Result<(), TrainerError> {
        if self.state.is_transport_connected() {
            return Err(TrainerError::AlreadyConnected);
        }
        self.state.set_transport_connected(true);
        tracing::info!("transport connected");
        Ok(())
    }

    /// Mark the transport gone; recording stops, the window is kept.
    pub fn on_disconnected(&mut self) {
        if self.state.is_transport_connected() {
            tracing::info!(recording = self.state.is_recording(), "transport disconnected");
        }
        self.state.set_transport_connected(false);
    }

    pub fn on_transport_failed(&mut self, error: &TrainerError) {
        tracing::error!(%error, "transport failed");
        self.on_disconnected();
    }

    /// Empty the raw-line echo and drop any partial line.
    pub fn clear_raw_lines(&mut self) {
        self.assembler.clear();
    }

    pub fn snapshot(&self) -> TrainerSnapshot {
        let latest = self.window.latest().copied();
        TrainerSnapshot {
            current_step: self.state.current_step(),
            steps: self
                .state
                .statuses()
                .map(|(id, status)| StepView {
                    id,
                    title: step(id).title,
                    status,
                })
                .collect(),
            completed_sub_steps: self.state.completed_sub_steps().iter().copied().collect(),
            session_duration_s: self.state.session_duration_s(),
            session_duration: format_duration(self.state.session_duration_s()),
            auto_continue_s: self.state.auto_continue().into(),
            countdown_remaining_s: self.state.countdown_remaining_s(),
            transport_connected: self.state.is_transport_connected(),
            recording: self.state.is_recording(),
            past_initial_period: self.past_initial_period(),
            samples: self.window.len(),
            latest,
            angle_range: self.window.angle_range(),
            pressure_range: self.window.pressure_range(),
            angle_zone: latest.map(|s| angle_zone(s.angle_processed)),
            progress: self.state.progress(),
            performance: self.performance(),
            all_steps_completed: self.state.all_steps_completed(),
            all_steps_processed: self.state.all_steps_processed(),
        }
    }
}
