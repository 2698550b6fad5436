#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Byte-stream transports for the training arm.
//!
//! - `SimulatedTransport`: synthetic telemetry, no device needed
//! - `ReplayTransport`: a recorded capture file
//! - `TtyTransport` (feature `hardware`): a real serial device via termios

pub mod error;
pub mod replay;
pub mod sim;
#[cfg(feature = "hardware")]
pub mod tty;

use std::path::{Path, PathBuf};

pub use replay::ReplayTransport;
pub use sim::SimulatedTransport;
#[cfg(feature = "hardware")]
pub use tty::TtyTransport;

/// Device-name prefixes used by USB serial adapters and CDC-ACM boards.
const SERIAL_PREFIXES: [&str; 4] = ["ttyACM", "ttyUSB", "cu.usbmodem", "cu.usbserial"];

/// List serial devices under `dev_dir` (normally `/dev`) that look like the
/// training arm, sorted by path.
pub fn candidate_devices(dev_dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut out: Vec<PathBuf> = std::fs::read_dir(dev_dir)?
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            SERIAL_PREFIXES.iter().any(|p| name.starts_with(p))
        })
        .map(|entry| entry.path())
        .collect();
    out.sort();
    Ok(out)
}
