#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Core venipuncture training logic (hardware-agnostic).
//!
//! This crate turns a raw byte stream from the training arm into validated
//! telemetry samples and tracks the operator's progress through the five-step
//! procedure. All device I/O goes through `venitrain_traits::Transport`.
//!
//! ## Architecture
//!
//! - **Framing**: streaming UTF-8 decode and line reassembly (`framing`)
//! - **Telemetry**: line grammar and sample validation (`telemetry`)
//! - **Window**: bounded rolling store with aggregates (`window`)
//! - **Procedure**: static step catalog, session state machine, derived
//!   status, auto-continue countdown and scoring
//! - **Trainer**: owns all of the above and applies events one at a time
//! - **Runner**: reader thread plus the select loop that drives a `Trainer`
//!
//! The session clock ticks once per `SessionCfg::tick`; the auto-continue
//! countdown is measured in those ticks, not in wall time.

pub mod atomic;
pub mod autocontinue;
pub mod builder;
pub mod config;
pub mod conversions;
pub mod error;
pub mod framing;
pub mod mocks;
pub mod procedure;
pub mod reader;
pub mod runner;
pub mod scoring;
pub mod session;
pub mod status;
pub mod telemetry;
pub mod trainer;
pub mod transport_error;
pub mod util;
pub mod window;

pub use autocontinue::AutoContinue;
pub use builder::{RunnerBuilder, TrainerBuilder};
pub use config::{SessionCfg, TransportCfg};
pub use error::{BuildError, Report, Result, TrainerError};
pub use framing::FrameAssembler;
pub use procedure::{PROCEDURE_STEPS, STEP_COUNT, StepId};
pub use runner::{Control, EndReason, Notice, RunOptions, SessionRunner, SessionSummary, TransportFactory};
pub use scoring::{Performance, PerformanceLabel, ScoringPolicy};
pub use session::{Applied, Command, SessionState};
pub use status::StepStatus;
pub use telemetry::{TelemetrySample, parse_line};
pub use trainer::{Trainer, TrainerSnapshot};
pub use window::RollingWindow;
