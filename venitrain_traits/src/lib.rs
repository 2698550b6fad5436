pub mod clock;

pub use clock::{Clock, MonotonicClock};

use std::time::Duration;

/// Result of a single transport read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    /// Bytes arrived; never empty.
    Data(Vec<u8>),
    /// The read timed out without data; the stream is still open.
    Idle,
    /// The peer closed the stream; no further data will arrive.
    EndOfStream,
}

/// Byte-stream transport to the telemetry device (serial port, replay file, simulator).
pub trait Transport {
    fn open(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
    fn read(
        &mut self,
        timeout: Duration,
    ) -> Result<ReadOutcome, Box<dyn std::error::Error + Send + Sync>>;
    fn close(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn open(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).open()
    }
    fn read(
        &mut self,
        timeout: Duration,
    ) -> Result<ReadOutcome, Box<dyn std::error::Error + Send + Sync>> {
        (**self).read(timeout)
    }
    fn close(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).close()
    }
}
