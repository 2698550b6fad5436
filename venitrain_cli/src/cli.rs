//! CLI argument definitions and shared statics.

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

pub fn json_mode() -> bool {
    JSON_MODE.get().copied().unwrap_or(false)
}

#[derive(Parser, Debug)]
#[command(name = "venitrain", version, about = "Venipuncture training arm console")]
pub struct Cli {
    /// Path to config TOML (typed); a missing file means defaults
    #[arg(long, value_name = "FILE", default_value = "etc/venitrain.toml")]
    pub config: PathBuf,

    /// Emit JSON lines instead of text
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace); overrides [logging] level
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

/// Scoring policy override.
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum ScoringArg {
    /// 20 points per completed step
    CompletedOnly,
    /// Completed points minus the configured skip/fail penalties
    Penalized,
}

#[derive(Args, Debug, Clone)]
#[group(multiple = false)]
pub struct SourceArgs {
    /// Serial device of the training arm (requires the `hardware` feature)
    #[arg(long, value_name = "PATH")]
    pub device: Option<PathBuf>,

    /// Use the built-in simulated arm
    #[arg(long, action = ArgAction::SetTrue)]
    pub simulate: bool,

    /// Replay a captured byte stream; the run ends with the file
    #[arg(long, value_name = "FILE")]
    pub replay: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Auto-continue period in seconds (0, 10, 20 or 30); overrides the config
    #[arg(long, value_name = "SECS")]
    pub auto_continue: Option<u64>,

    /// Scoring policy; overrides [scoring] policy
    #[arg(long, value_enum, value_name = "POLICY")]
    pub scoring: Option<ScoringArg>,

    /// Start recording as soon as the transport is connected
    #[arg(long, action = ArgAction::SetTrue)]
    pub record: bool,

    /// Stop after this many seconds
    #[arg(long, value_name = "SECS")]
    pub max_duration_s: Option<u64>,

    /// Stop the simulated arm after this many records
    #[arg(long, value_name = "N", requires = "simulate")]
    pub sim_records: Option<u64>,

    /// Delay between replayed chunks in ms (0 = as fast as possible)
    #[arg(long, value_name = "MS", default_value_t = 0, requires = "replay")]
    pub replay_pace_ms: u64,

    /// Write the recorded window to this CSV file when the run ends
    #[arg(long, value_name = "FILE")]
    pub export: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run an interactive training session (commands are read from stdin)
    Run(RunArgs),
    /// Parse a captured telemetry file offline and print samples as JSON lines
    Parse {
        /// Capture file (raw bytes as received from the arm)
        file: PathBuf,
        /// Seconds between records used for the `time_s` column, in ms
        #[arg(long, value_name = "MS", default_value_t = 100)]
        interval_ms: u64,
    },
    /// Validate the config, list candidate devices and exercise the simulator
    SelfCheck,
}
