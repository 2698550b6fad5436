//! Session scoring.

use std::fmt;

use serde::Serialize;

use crate::procedure::STEP_COUNT;

/// How outcome sets turn into a performance level.
///
/// `CompletedOnly` is the shipped behaviour. `Penalized` additionally deducts
/// per skipped and failed step; it stays opt-in until the training team
/// decides whether penalties belong in the score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScoringPolicy {
    #[default]
    CompletedOnly,
    Penalized { per_skip: u32, per_fail: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PerformanceLabel {
    Excellent,
    Good,
    Adequate,
    Poor,
}

impl PerformanceLabel {
    pub fn for_level(level: u8) -> Self {
        match level {
            90.. => PerformanceLabel::Excellent,
            75..=89 => PerformanceLabel::Good,
            60..=74 => PerformanceLabel::Adequate,
            _ => PerformanceLabel::Poor,
        }
    }
}

impl fmt::Display for PerformanceLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PerformanceLabel::Excellent => "Excellent",
            PerformanceLabel::Good => "Good",
            PerformanceLabel::Adequate => "Adequate",
            PerformanceLabel::Poor => "Poor",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Performance {
    /// Percentage in `0..=100`.
    pub level: u8,
    pub label: PerformanceLabel,
}

/// Score a session from the sizes of its outcome sets.
pub fn score(completed: usize, failed: usize, skipped: usize, policy: ScoringPolicy) -> Performance {
    let per_step = 100.0 / f64::from(STEP_COUNT);
    let base = per_step * completed as f64;
    let raw = match policy {
        ScoringPolicy::CompletedOnly => base,
        ScoringPolicy::Penalized { per_skip, per_fail } => {
            base - f64::from(per_skip) * skipped as f64 - f64::from(per_fail) * failed as f64
        }
    };
    let level = raw.round().clamp(0.0, 100.0) as u8;
    Performance {
        level,
        label: PerformanceLabel::for_level(level),
    }
}
