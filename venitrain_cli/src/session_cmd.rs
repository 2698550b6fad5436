//! `venitrain run`: wire a transport, the stdin console and the runner together.

use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crossbeam_channel as xch;
use eyre::WrapErr;
use venitrain_config::Config;
use venitrain_core::window::{RangeDisplay, angle_gauge_percent};
use venitrain_core::{
    AutoContinue, Control, Notice, RunOptions, ScoringPolicy, SessionCfg, SessionRunner,
    SessionSummary, StepStatus, TelemetrySample, Trainer, TrainerSnapshot, TransportCfg,
    TrainerError, TransportFactory,
};
use venitrain_hardware::{ReplayTransport, SimulatedTransport};
use venitrain_traits::Transport;

use crate::cli::{RunArgs, ScoringArg, json_mode};
use crate::console::{self, Input};

/// Chunk size used when replaying a capture.
const REPLAY_CHUNK_BYTES: usize = 64;

/// Transport factory plus whether its stream ends by itself.
struct Source {
    factory: TransportFactory,
    label: String,
    finite: bool,
}

type Opened = Result<Box<dyn Transport + Send>, TrainerError>;

fn boxed<T: Transport + Send + 'static>(t: T) -> Opened {
    Ok(Box::new(t))
}

#[cfg(feature = "hardware")]
fn device_factory(path: PathBuf, cfg: &Config) -> eyre::Result<TransportFactory> {
    use venitrain_hardware::TtyTransport;
    let baud = cfg.transport.baud_rate;
    let timeout = Duration::from_millis(cfg.transport.read_timeout_ms);
    Ok(Box::new(move || -> Opened {
        boxed(TtyTransport::new(path.clone(), baud, timeout))
    }))
}

#[cfg(not(feature = "hardware"))]
fn device_factory(path: PathBuf, _cfg: &Config) -> eyre::Result<TransportFactory> {
    eyre::bail!(
        "built without hardware support; cannot open {}",
        path.display()
    )
}

fn select_source(cfg: &Config, args: &RunArgs) -> eyre::Result<Source> {
    let src = &args.source;
    if src.simulate {
        let sim = cfg.simulator.clone();
        let limit = args.sim_records;
        return Ok(Source {
            factory: Box::new(move || -> Opened {
                let t = SimulatedTransport::new(sim.sample_rate_hz, sim.chunk_bytes, sim.seed);
                boxed(match limit {
                    Some(n) => t.limit(n),
                    None => t,
                })
            }),
            label: "simulated arm".to_string(),
            finite: limit.is_some(),
        });
    }
    if let Some(path) = &src.replay {
        let path = path.clone();
        let label = format!("replay of {}", path.display());
        let pace = (args.replay_pace_ms > 0).then(|| Duration::from_millis(args.replay_pace_ms));
        return Ok(Source {
            factory: Box::new(move || -> Opened {
                let t = ReplayTransport::from_file(&path, REPLAY_CHUNK_BYTES);
                boxed(match pace {
                    Some(d) => t.paced(d),
                    None => t,
                })
            }),
            label,
            finite: true,
        });
    }
    let device = src
        .device
        .clone()
        .or_else(|| cfg.transport.device.as_ref().map(PathBuf::from))
        .ok_or_else(|| eyre::eyre!("no transport selected"))?;
    Ok(Source {
        label: device.display().to_string(),
        factory: device_factory(device, cfg)?,
        finite: false,
    })
}

fn scoring_policy(cfg: &Config, arg: Option<ScoringArg>) -> ScoringPolicy {
    match arg {
        None => ScoringPolicy::from(&cfg.scoring),
        Some(ScoringArg::CompletedOnly) => ScoringPolicy::CompletedOnly,
        Some(ScoringArg::Penalized) => ScoringPolicy::Penalized {
            per_skip: cfg.scoring.penalty_per_skip,
            per_fail: cfg.scoring.penalty_per_fail,
        },
    }
}

/// Read console lines from stdin until EOF or `quit`. The thread is detached;
/// it may stay blocked on stdin after the run ends.
fn spawn_console(tx: xch::Sender<Control>) {
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            match console::parse_input(&line) {
                Ok(Input::Control(control)) => {
                    let quit = control == Control::Quit;
                    if tx.send(control).is_err() || quit {
                        break;
                    }
                }
                Ok(Input::Help) => eprintln!("{}", console::HELP),
                Ok(Input::Empty) => {}
                Err(msg) => eprintln!("{msg}"),
            }
        }
        tracing::debug!("console input closed");
    });
}

fn status_tag(status: StepStatus) -> &'static str {
    match status {
        StepStatus::Failed => "failed",
        StepStatus::Completed => "completed",
        StepStatus::Skipped => "skipped",
        StepStatus::Current => "current",
        StepStatus::Missed => "missed",
        StepStatus::Upcoming => "upcoming",
    }
}

pub fn render_status(s: &TrainerSnapshot) -> String {
    let mut out = String::new();
    let countdown = match (s.auto_continue_s, s.countdown_remaining_s) {
        (0, _) => "auto off".to_string(),
        (secs, Some(left)) => format!("auto {secs}s ({left}s left)"),
        (secs, None) => format!("auto {secs}s"),
    };
    let link = match (s.transport_connected, s.recording) {
        (false, _) => "disconnected",
        (true, false) => "connected",
        (true, true) => "recording",
    };
    out.push_str(&format!(
        "step {}/{} | {} | {countdown} | {link}\n",
        s.current_step,
        s.steps.len(),
        s.session_duration
    ));
    for step in &s.steps {
        out.push_str(&format!(
            "  [{:<9}] {} {}\n",
            status_tag(step.status),
            step.id,
            step.title
        ));
    }
    if !s.completed_sub_steps.is_empty() {
        out.push_str(&format!("  checked: {}\n", s.completed_sub_steps.join(", ")));
    }
    out.push_str(&format!(
        "samples {} | angle {} | pressure {}",
        s.samples,
        RangeDisplay(s.angle_range),
        RangeDisplay(s.pressure_range)
    ));
    if let (Some(latest), Some(zone)) = (s.latest, s.angle_zone) {
        out.push_str(&format!(
            " | latest {:.1} deg ({zone:?}, gauge {:.0}%)",
            latest.angle_processed,
            angle_gauge_percent(latest.angle_processed)
        ));
    }
    if s.recording && !s.past_initial_period {
        out.push_str(" | settling");
    }
    out.push('\n');
    out.push_str(&format!(
        "progress {:.0}% | performance {}% {}",
        s.progress * 100.0,
        s.performance.level,
        s.performance.label
    ));
    out
}

fn print_notice(notice: Notice) {
    use serde_json::json;
    if json_mode() {
        let v = match notice {
            Notice::Status(snap) => json!({ "event": "status", "session": snap }),
            Notice::Rejected { control, error } => json!({
                "event": "rejected",
                "control": format!("{control:?}"),
                "error": error.to_string(),
            }),
            Notice::AutoCompleted(step) => json!({ "event": "auto-completed", "step": step }),
            Notice::Connected => json!({ "event": "connected" }),
            Notice::TransportEnded { error } => json!({
                "event": "transport-ended",
                "error": error.map(|e| e.to_string()),
            }),
        };
        println!("{v}");
        return;
    }
    match notice {
        Notice::Status(snap) => println!("{}", render_status(&snap)),
        Notice::Rejected { control, error } => println!("rejected {control:?}: {error}"),
        Notice::AutoCompleted(step) => println!("step {step} auto-completed"),
        Notice::Connected => println!("connected"),
        Notice::TransportEnded { error: None } => println!("transport closed"),
        Notice::TransportEnded { error: Some(e) } => println!("transport lost: {e}"),
    }
}

/// Write samples as CSV (header row included) via a temp file and rename.
pub fn export_csv(path: &Path, samples: &[TelemetrySample]) -> eyre::Result<()> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    for sample in samples {
        wtr.serialize(sample)?;
    }
    let bytes = wtr
        .into_inner()
        .map_err(|e| eyre::eyre!("flush csv: {}", e.error()))?;
    venitrain_core::atomic::write_atomic(path, &bytes)
        .wrap_err_with(|| format!("write {}", path.display()))?;
    Ok(())
}

fn print_summary(summary: &SessionSummary) -> eyre::Result<()> {
    if json_mode() {
        println!("{}", serde_json::to_string(summary)?);
        return Ok(());
    }
    let count = |want: StepStatus| {
        summary
            .session
            .steps
            .iter()
            .filter(|s| s.status == want)
            .count()
    };
    let ended_by = match summary.ended_by {
        venitrain_core::EndReason::Quit => "quit",
        venitrain_core::EndReason::Deadline => "deadline",
        venitrain_core::EndReason::EndOfStream => "end of stream",
    };
    println!(
        "session ended by {ended_by} after {}",
        summary.session.session_duration
    );
    println!(
        "steps: {} completed, {} failed, {} skipped",
        count(StepStatus::Completed),
        count(StepStatus::Failed),
        count(StepStatus::Skipped)
    );
    println!(
        "performance: {}% ({})",
        summary.session.performance.level, summary.session.performance.label
    );
    println!(
        "telemetry: {} lines, {} accepted, {} rejected",
        summary.counters.lines, summary.counters.accepted, summary.counters.rejected
    );
    if let Some(err) = &summary.transport_error {
        println!("transport error: {err}");
    }
    Ok(())
}

pub fn run_session(cfg: &Config, args: &RunArgs) -> eyre::Result<()> {
    let mut session = SessionCfg::try_from(&cfg.session)?;
    if let Some(secs) = args.auto_continue {
        session.auto_continue = AutoContinue::try_from(secs)?;
    }
    let policy = scoring_policy(cfg, args.scoring);
    let source = select_source(cfg, args)?;

    let trainer = Trainer::builder()
        .session(session.clone())
        .scoring(policy)
        .build()?;
    let (notice_tx, notice_rx) = xch::unbounded::<Notice>();
    let runner = SessionRunner::builder()
        .trainer(trainer)
        .session(session)
        .transport_cfg(TransportCfg::from(&cfg.transport))
        .transport_factory(source.factory)
        .build()?
        .with_notices(notice_tx);

    let (control_tx, control_rx) = xch::unbounded::<Control>();
    let ctrlc_tx = control_tx.clone();
    ctrlc::set_handler(move || {
        let _ = ctrlc_tx.send(Control::Quit);
    })
    .wrap_err("install Ctrl-C handler")?;
    spawn_console(control_tx);

    let printer = std::thread::spawn(move || {
        for notice in notice_rx {
            print_notice(notice);
        }
    });

    tracing::info!(source = %source.label, ?policy, "session start");
    if !json_mode() {
        eprintln!("using {}; type `help` for commands", source.label);
    }
    let opts = RunOptions {
        connect_on_start: true,
        record_on_start: args.record,
        stop_on_end_of_stream: source.finite,
        max_duration: args.max_duration_s.map(Duration::from_secs),
    };
    let summary = runner.run(control_rx, opts);
    // The runner owned the only notice sender; the printer drains and exits.
    printer
        .join()
        .map_err(|_| eyre::eyre!("notice printer panicked"))?;
    let summary = summary?;

    if let Some(path) = &args.export {
        export_csv(path, &summary.samples)?;
        tracing::info!(path = %path.display(), samples = summary.samples.len(), "window exported");
    }
    print_summary(&summary)
}
