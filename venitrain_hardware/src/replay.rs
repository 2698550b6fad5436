//! Replay a captured byte stream from a file.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use venitrain_traits::{Clock, MonotonicClock, ReadOutcome, Transport};

use crate::error::HwError;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Serves a capture in fixed-size chunks, then reports end-of-stream.
pub struct ReplayTransport {
    clock: Arc<dyn Clock + Send + Sync>,
    source: Source,
    chunk_bytes: usize,
    pace: Option<Duration>,
    data: Option<Vec<u8>>,
    pos: usize,
}

impl core::fmt::Debug for ReplayTransport {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ReplayTransport")
            .field("source", &self.source)
            .field("chunk_bytes", &self.chunk_bytes)
            .field("pace", &self.pace)
            .field("pos", &self.pos)
            .finish_non_exhaustive()
    }
}

#[derive(Debug)]
enum Source {
    File(PathBuf),
    Memory(Vec<u8>),
}

impl ReplayTransport {
    pub fn from_file(path: impl AsRef<Path>, chunk_bytes: usize) -> Self {
        Self::with_source(Source::File(path.as_ref().to_path_buf()), chunk_bytes)
    }

    pub fn from_bytes(bytes: Vec<u8>, chunk_bytes: usize) -> Self {
        Self::with_source(Source::Memory(bytes), chunk_bytes)
    }

    fn with_source(source: Source, chunk_bytes: usize) -> Self {
        Self {
            clock: Arc::new(MonotonicClock::new()),
            source,
            chunk_bytes: chunk_bytes.max(1),
            pace: None,
            data: None,
            pos: 0,
        }
    }

    /// Sleep `delay` before each chunk to approximate live timing.
    pub fn paced(mut self, delay: Duration) -> Self {
        self.pace = Some(delay);
        self
    }

    /// Sleep on `clock` when paced.
    pub fn with_clock<C: Clock + Send + Sync + 'static>(mut self, clock: C) -> Self {
        self.clock = Arc::new(clock);
        self
    }
}

impl Transport for ReplayTransport {
    fn open(&mut self) -> Result<(), BoxError> {
        let data = match &self.source {
            Source::File(path) => {
                let bytes = std::fs::read(path).map_err(HwError::from)?;
                tracing::info!(path = %path.display(), bytes = bytes.len(), "replay opened");
                bytes
            }
            Source::Memory(bytes) => bytes.clone(),
        };
        self.data = Some(data);
        self.pos = 0;
        Ok(())
    }

    fn read(&mut self, _timeout: Duration) -> Result<ReadOutcome, BoxError> {
        let Some(data) = &self.data else {
            return Err(Box::new(HwError::NotOpen));
        };
        if self.pos >= data.len() {
            return Ok(ReadOutcome::EndOfStream);
        }
        if let Some(delay) = self.pace {
            self.clock.sleep(delay);
        }
        let end = (self.pos + self.chunk_bytes).min(data.len());
        let chunk = data[self.pos..end].to_vec();
        self.pos = end;
        Ok(ReadOutcome::Data(chunk))
    }

    fn close(&mut self) -> Result<(), BoxError> {
        self.data = None;
        Ok(())
    }
}
