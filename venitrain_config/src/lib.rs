#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema for the venipuncture trainer.
//!
//! Every section is optional in the TOML file and falls back to defaults.
//! Call [`Config::validate`] after loading; deserialization alone does not
//! range-check values.
use std::path::Path;

use serde::Deserialize;

/// Baud rates the trainer device firmware supports.
pub const SUPPORTED_BAUD_RATES: [u32; 5] = [9600, 19200, 38400, 57600, 115200];
/// Auto-continue periods the operator may select (0 = off).
pub const AUTO_CONTINUE_CHOICES: [u64; 4] = [0, 10, 20, 30];

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct TransportCfg {
    /// Serial device path, e.g. `/dev/ttyACM0`. Absent means "pick at run time".
    pub device: Option<String>,
    pub baud_rate: u32,
    /// Upper bound for a single blocking read (ms).
    pub read_timeout_ms: u64,
}

impl Default for TransportCfg {
    fn default() -> Self {
        Self {
            device: None,
            baud_rate: 9600,
            read_timeout_ms: 100,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SessionCfg {
    /// Initial auto-continue period in seconds: 0 (off), 10, 20 or 30.
    pub auto_continue_s: u64,
    /// Rolling window size in samples.
    pub window_capacity: usize,
    /// Raw-line echo buffer size.
    pub raw_line_capacity: usize,
    /// Session clock period (ms). 1000 in normal use; shorter for demos.
    pub tick_ms: u64,
    /// Recording time after which readings are considered settled.
    pub warmup_s: u64,
}

impl Default for SessionCfg {
    fn default() -> Self {
        Self {
            auto_continue_s: 0,
            window_capacity: 100,
            raw_line_capacity: 100,
            tick_ms: 1000,
            warmup_s: 10,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ScoringMode {
    #[default]
    CompletedOnly,
    Penalized,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ScoringCfg {
    pub policy: ScoringMode,
    /// Points deducted per skipped step (penalized policy only)
    pub penalty_per_skip: u32,
    /// Points deducted per failed step (penalized policy only)
    pub penalty_per_fail: u32,
}

impl Default for ScoringCfg {
    fn default() -> Self {
        Self {
            policy: ScoringMode::CompletedOnly,
            penalty_per_skip: 10,
            penalty_per_fail: 15,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SimulatorCfg {
    pub sample_rate_hz: u32,
    /// Bytes per delivered chunk; small values exercise line reassembly.
    pub chunk_bytes: usize,
    pub seed: u64,
}

impl Default for SimulatorCfg {
    fn default() -> Self {
        Self {
            sample_rate_hz: 10,
            chunk_bytes: 7,
            seed: 0x5eed,
        }
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct Config {
    pub transport: TransportCfg,
    pub session: SessionCfg,
    pub scoring: ScoringCfg,
    pub simulator: SimulatorCfg,
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

/// Read and parse a config file. A missing file yields the defaults.
pub fn load_path(path: &Path) -> eyre::Result<Config> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Config::default()),
        Err(e) => return Err(eyre::eyre!("read config {:?}: {}", path, e)),
    };
    load_toml(&text).map_err(|e| eyre::eyre!("parse config {:?}: {}", path, e))
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Transport
        if !SUPPORTED_BAUD_RATES.contains(&self.transport.baud_rate) {
            eyre::bail!(
                "transport.baud_rate must be one of {:?}, got {}",
                SUPPORTED_BAUD_RATES,
                self.transport.baud_rate
            );
        }
        if self.transport.read_timeout_ms == 0 {
            eyre::bail!("transport.read_timeout_ms must be >= 1");
        }
        if let Some(dev) = &self.transport.device
            && dev.trim().is_empty()
        {
            eyre::bail!("transport.device must not be empty when set");
        }

        // Session
        if !AUTO_CONTINUE_CHOICES.contains(&self.session.auto_continue_s) {
            eyre::bail!("session.auto_continue_s must be one of 0, 10, 20, 30");
        }
        if self.session.window_capacity == 0 {
            eyre::bail!("session.window_capacity must be >= 1");
        }
        if self.session.raw_line_capacity == 0 {
            eyre::bail!("session.raw_line_capacity must be >= 1");
        }
        if !(100..=10_000).contains(&self.session.tick_ms) {
            eyre::bail!("session.tick_ms must be in [100, 10000]");
        }
        if self.session.warmup_s > 10 * 60 {
            eyre::bail!("session.warmup_s is unreasonably large (>10min)");
        }

        // Scoring
        if self.scoring.penalty_per_skip > 100 || self.scoring.penalty_per_fail > 100 {
            eyre::bail!("scoring penalties must be <= 100");
        }

        // Simulator
        if self.simulator.sample_rate_hz == 0 || self.simulator.sample_rate_hz > 1000 {
            eyre::bail!("simulator.sample_rate_hz must be in [1, 1000]");
        }
        if self.simulator.chunk_bytes == 0 {
            eyre::bail!("simulator.chunk_bytes must be >= 1");
        }

        // Logging
        if let Some(rot) = self.logging.rotation.as_deref()
            && !matches!(rot, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never, daily, hourly");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let cfg = load_toml("").unwrap();
        assert_eq!(cfg.transport.baud_rate, 9600);
        assert_eq!(cfg.session.window_capacity, 100);
        assert_eq!(cfg.scoring.policy, ScoringMode::CompletedOnly);
        cfg.validate().unwrap();
    }

    #[test]
    fn policy_is_kebab_case() {
        let cfg = load_toml("[scoring]\npolicy = \"penalized\"\n").unwrap();
        assert_eq!(cfg.scoring.policy, ScoringMode::Penalized);
        assert!(load_toml("[scoring]\npolicy = \"harsh\"\n").is_err());
    }
}
