//! Test and helper transports for venitrain_core.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use venitrain_traits::{ReadOutcome, Transport};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// One scripted read result.
#[derive(Debug, Clone)]
pub enum Step {
    Data(Vec<u8>),
    Idle,
    Fail(String),
}

/// Transport that replays a fixed script, then reports end-of-stream.
///
/// `closed()` exposes a flag so tests can observe that the reader closed the
/// transport on its way out.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    script: VecDeque<Step>,
    fail_open: Option<String>,
    opened: bool,
    closed: Arc<AtomicBool>,
    idle_forever: bool,
}

impl ScriptedTransport {
    pub fn new(script: impl IntoIterator<Item = Step>) -> Self {
        Self {
            script: script.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Convenience: one data step per chunk.
    pub fn from_chunks<I, B>(chunks: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: AsRef<[u8]>,
    {
        Self::new(chunks.into_iter().map(|c| Step::Data(c.as_ref().to_vec())))
    }

    /// Make `open()` fail with `msg`.
    pub fn failing_open(mut self, msg: &str) -> Self {
        self.fail_open = Some(msg.to_owned());
        self
    }

    /// Report `Idle` instead of end-of-stream once the script is exhausted.
    pub fn idle_when_exhausted(mut self) -> Self {
        self.idle_forever = true;
        self
    }

    pub fn closed(&self) -> Arc<AtomicBool> {
        self.closed.clone()
    }
}

impl Transport for ScriptedTransport {
    fn open(&mut self) -> Result<(), BoxError> {
        if let Some(msg) = &self.fail_open {
            return Err(msg.clone().into());
        }
        self.opened = true;
        Ok(())
    }

    fn read(&mut self, timeout: Duration) -> Result<ReadOutcome, BoxError> {
        if !self.opened {
            return Err("scripted transport not open".into());
        }
        match self.script.pop_front() {
            Some(Step::Data(bytes)) => Ok(ReadOutcome::Data(bytes)),
            Some(Step::Idle) => Ok(ReadOutcome::Idle),
            Some(Step::Fail(msg)) => Err(msg.into()),
            None if self.idle_forever => {
                std::thread::sleep(timeout.min(Duration::from_millis(5)));
                Ok(ReadOutcome::Idle)
            }
            None => Ok(ReadOutcome::EndOfStream),
        }
    }

    fn close(&mut self) -> Result<(), BoxError> {
        self.opened = false;
        self.closed.store(true, Ordering::Relaxed);
        Ok(())
    }
}
