//! Offline commands: capture parsing and the self-check.

use std::io::Write;
use std::path::Path;
use std::time::Duration;

use eyre::WrapErr;
use venitrain_config::Config;
use venitrain_core::FrameAssembler;
use venitrain_core::parse_line;
use venitrain_hardware::SimulatedTransport;
use venitrain_traits::{ReadOutcome, Transport};

use crate::cli::json_mode;

/// Records pulled from the simulator by the self-check.
const SELF_CHECK_RECORDS: u64 = 20;

/// Parse a capture file and print accepted samples as JSON lines on stdout.
///
/// `time_s` is synthesized from the record index since a capture carries no
/// host timestamps.
pub fn parse_capture(file: &Path, interval_ms: u64) -> eyre::Result<()> {
    let bytes = std::fs::read(file).wrap_err_with(|| format!("read capture {}", file.display()))?;
    let mut assembler = FrameAssembler::new();
    let lines: Vec<String> = assembler.feed(&bytes).collect();
    if !assembler.pending().is_empty() {
        tracing::warn!(
            bytes = assembler.pending().len(),
            "capture ends without a line terminator; trailing fragment ignored"
        );
    }

    let interval_s = interval_ms as f64 / 1000.0;
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let mut accepted = 0usize;
    let mut rejected = 0usize;
    for line in &lines {
        match parse_line(line, accepted as f64 * interval_s) {
            Ok(sample) => {
                writeln!(out, "{}", serde_json::to_string(&sample)?)?;
                accepted += 1;
            }
            Err(reason) => {
                tracing::debug!(%reason, line = %line, "telemetry line dropped");
                rejected += 1;
            }
        }
    }
    out.flush()?;
    tracing::info!(lines = lines.len(), accepted, rejected, "capture parsed");
    if !json_mode() {
        eprintln!(
            "parsed {} lines: {accepted} accepted, {rejected} rejected",
            lines.len()
        );
    }
    Ok(())
}

/// Pull a few records from the simulator through the framing and parser.
fn simulator_round_trip(cfg: &Config) -> eyre::Result<(usize, usize)> {
    let mut sim = SimulatedTransport::new(
        cfg.simulator.sample_rate_hz,
        cfg.simulator.chunk_bytes,
        cfg.simulator.seed,
    )
    .limit(SELF_CHECK_RECORDS)
    .unpaced();
    let to_report = |e: Box<dyn std::error::Error + Send + Sync>| eyre::eyre!("{e}");
    sim.open().map_err(to_report)?;
    let mut assembler = FrameAssembler::new();
    let (mut accepted, mut rejected) = (0, 0);
    loop {
        match sim.read(Duration::from_millis(10)).map_err(to_report)? {
            ReadOutcome::Data(chunk) => {
                for line in assembler.feed(&chunk) {
                    match parse_line(&line, 0.0) {
                        Ok(_) => accepted += 1,
                        Err(_) => rejected += 1,
                    }
                }
            }
            ReadOutcome::Idle => {}
            ReadOutcome::EndOfStream => break,
        }
    }
    sim.close().map_err(to_report)?;
    Ok((accepted, rejected))
}

/// Config was validated by the caller; this reports it and probes the rest.
pub fn self_check(cfg: &Config) -> eyre::Result<()> {
    let devices = venitrain_hardware::candidate_devices(Path::new("/dev")).unwrap_or_default();
    let (accepted, rejected) = simulator_round_trip(cfg).wrap_err("simulator self-check")?;
    if accepted == 0 {
        eyre::bail!("simulator produced no parseable telemetry");
    }
    let hardware = cfg!(feature = "hardware");

    if json_mode() {
        let report = serde_json::json!({
            "config": "ok",
            "hardware_support": hardware,
            "configured_device": cfg.transport.device,
            "candidate_devices": devices.iter().map(|d| d.display().to_string()).collect::<Vec<_>>(),
            "simulator": { "accepted": accepted, "rejected": rejected },
        });
        println!("{report}");
    } else {
        println!("config: ok");
        println!(
            "hardware support: {}",
            if hardware { "yes" } else { "no (simulate/replay only)" }
        );
        match &cfg.transport.device {
            Some(dev) => println!("configured device: {dev}"),
            None => println!("configured device: none"),
        }
        if devices.is_empty() {
            println!("candidate devices: none found");
        } else {
            for d in &devices {
                println!("candidate device: {}", d.display());
            }
        }
        println!("simulator: {accepted} records parsed, {rejected} rejected");
        println!("self-check ok");
    }
    Ok(())
}
