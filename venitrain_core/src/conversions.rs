//! `From` implementations bridging `venitrain_config` types to `venitrain_core` types.

use std::time::Duration;

use crate::autocontinue::AutoContinue;
use crate::config::{SessionCfg, TransportCfg};
use crate::error::TrainerError;
use crate::scoring::ScoringPolicy;

// ── SessionCfg ───────────────────────────────────────────────────────────────

impl TryFrom<&venitrain_config::SessionCfg> for SessionCfg {
    type Error = TrainerError;

    fn try_from(c: &venitrain_config::SessionCfg) -> Result<Self, Self::Error> {
        Ok(Self {
            auto_continue: AutoContinue::try_from(c.auto_continue_s)?,
            window_capacity: c.window_capacity,
            raw_line_capacity: c.raw_line_capacity,
            tick: Duration::from_millis(c.tick_ms),
            warmup_s: c.warmup_s,
        })
    }
}

// ── TransportCfg ─────────────────────────────────────────────────────────────

impl From<&venitrain_config::TransportCfg> for TransportCfg {
    fn from(c: &venitrain_config::TransportCfg) -> Self {
        Self {
            read_timeout: Duration::from_millis(c.read_timeout_ms.max(1)),
        }
    }
}

// ── ScoringPolicy ────────────────────────────────────────────────────────────

impl From<&venitrain_config::ScoringCfg> for ScoringPolicy {
    fn from(c: &venitrain_config::ScoringCfg) -> Self {
        match c.policy {
            venitrain_config::ScoringMode::CompletedOnly => ScoringPolicy::CompletedOnly,
            venitrain_config::ScoringMode::Penalized => ScoringPolicy::Penalized {
                per_skip: c.penalty_per_skip,
                per_fail: c.penalty_per_fail,
            },
        }
    }
}
