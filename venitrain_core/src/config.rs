//! Runtime configuration for the trainer.
//!
//! These are the structs the trainer and runner consume. They are separate
//! from the TOML-deserialized config in `venitrain_config`; see `conversions`.

use std::time::Duration;

use crate::autocontinue::AutoContinue;
use crate::framing::DEFAULT_RAW_LINE_CAPACITY;
use crate::window::DEFAULT_WINDOW_CAPACITY;

/// Session behaviour.
#[derive(Debug, Clone)]
pub struct SessionCfg {
    /// Auto-continue setting applied when the session starts.
    pub auto_continue: AutoContinue,
    /// Rolling window size in samples.
    pub window_capacity: usize,
    /// Raw-line echo buffer size.
    pub raw_line_capacity: usize,
    /// Session clock period. One second in normal use.
    pub tick: Duration,
    /// Recording time after which readings count as settled.
    pub warmup_s: u64,
}

impl Default for SessionCfg {
    fn default() -> Self {
        Self {
            auto_continue: AutoContinue::Off,
            window_capacity: DEFAULT_WINDOW_CAPACITY,
            raw_line_capacity: DEFAULT_RAW_LINE_CAPACITY,
            tick: Duration::from_secs(1),
            warmup_s: 10,
        }
    }
}

/// Transport reader behaviour.
#[derive(Debug, Clone)]
pub struct TransportCfg {
    /// Upper bound for one blocking read; also bounds disconnect latency.
    pub read_timeout: Duration,
}

impl Default for TransportCfg {
    fn default() -> Self {
        Self {
            read_timeout: Duration::from_millis(100),
        }
    }
}
