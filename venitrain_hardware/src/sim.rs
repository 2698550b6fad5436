//! Simulated training arm.
//!
//! Emits telemetry records at a fixed rate and hands them out in small chunks
//! so line reassembly is exercised the way a real serial link does. Output is
//! deterministic for a given seed.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use venitrain_traits::{Clock, MonotonicClock, ReadOutcome, Transport};

use crate::error::HwError;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Every Nth record is corrupted the way a noisy link corrupts it.
const GARBLE_EVERY: u64 = 97;

/// Deterministic PRNG (xorshift64).
#[derive(Debug, Clone)]
struct XorShift64 {
    state: u64,
}

impl XorShift64 {
    fn new(seed: u64) -> Self {
        Self { state: seed.max(1) }
    }

    fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }

    /// Uniform in [-1, 1).
    fn next_signed(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 52) as f64 - 1.0
    }
}

pub struct SimulatedTransport {
    clock: Arc<dyn Clock + Send + Sync>,
    period: Duration,
    chunk_bytes: usize,
    rng: XorShift64,
    seed: u64,
    limit: Option<u64>,
    emitted: u64,
    outbox: VecDeque<u8>,
    next_due: Option<Instant>,
    opened_at: Option<Instant>,
    paced: bool,
}

impl core::fmt::Debug for SimulatedTransport {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SimulatedTransport")
            .field("period", &self.period)
            .field("chunk_bytes", &self.chunk_bytes)
            .field("seed", &self.seed)
            .field("limit", &self.limit)
            .field("emitted", &self.emitted)
            .field("paced", &self.paced)
            .finish_non_exhaustive()
    }
}

impl SimulatedTransport {
    pub fn new(sample_rate_hz: u32, chunk_bytes: usize, seed: u64) -> Self {
        let hz = u64::from(sample_rate_hz.max(1));
        Self {
            clock: Arc::new(MonotonicClock::new()),
            period: Duration::from_micros(1_000_000 / hz),
            chunk_bytes: chunk_bytes.max(1),
            rng: XorShift64::new(seed),
            seed,
            limit: None,
            emitted: 0,
            outbox: VecDeque::new(),
            next_due: None,
            opened_at: None,
            paced: true,
        }
    }

    /// Pace records against `clock` instead of the real monotonic clock.
    pub fn with_clock<C: Clock + Send + Sync + 'static>(mut self, clock: C) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Stop with end-of-stream after `records` records.
    pub fn limit(mut self, records: u64) -> Self {
        self.limit = Some(records);
        self
    }

    /// Produce records as fast as they are read instead of at the sample rate.
    pub fn unpaced(mut self) -> Self {
        self.paced = false;
        self
    }

    fn exhausted(&self) -> bool {
        self.limit.is_some_and(|n| self.emitted >= n)
    }

    fn synthesize(&mut self) {
        let t = self.emitted as f64 * self.period.as_secs_f64();
        let angle = 22.5 + 12.0 * (0.3 * t).sin() + 0.4 * self.rng.next_signed();
        let raw = angle + 35.0 + 1.5 * self.rng.next_signed();
        let pressure = 55.0 + 15.0 * (0.7 * t).sin() + 0.8 * self.rng.next_signed();
        let vein = u8::from((0.3 * t).sin() > 0.6);
        self.emitted += 1;

        let line = if self.emitted % GARBLE_EVERY == 0 {
            format!("angleR:{raw:.2} pres\u{fffd}ure:??\r\n")
        } else {
            format!("angleR:{raw:.2} pressure:{pressure:.2} angleP:{angle:.2} vein:{vein}\r\n")
        };
        self.outbox.extend(line.as_bytes());
    }
}

impl Transport for SimulatedTransport {
    fn open(&mut self) -> Result<(), BoxError> {
        self.rng = XorShift64::new(self.seed);
        self.emitted = 0;
        self.outbox.clear();
        let now = self.clock.now();
        self.next_due = Some(now);
        self.opened_at = Some(now);
        tracing::info!(period_ms = self.period.as_millis() as u64, seed = self.seed, "simulated arm connected");
        Ok(())
    }

    fn read(&mut self, timeout: Duration) -> Result<ReadOutcome, BoxError> {
        let Some(due) = self.next_due else {
            return Err(Box::new(HwError::NotOpen));
        };
        if self.outbox.is_empty() {
            if self.exhausted() {
                return Ok(ReadOutcome::EndOfStream);
            }
            if self.paced {
                let now = self.clock.now();
                if due > now {
                    let wait = due - now;
                    if wait > timeout {
                        self.clock.sleep(timeout);
                        return Ok(ReadOutcome::Idle);
                    }
                    self.clock.sleep(wait);
                }
                self.next_due = Some(due + self.period);
            }
            self.synthesize();
        }
        let n = self.chunk_bytes.min(self.outbox.len());
        Ok(ReadOutcome::Data(self.outbox.drain(..n).collect()))
    }

    fn close(&mut self) -> Result<(), BoxError> {
        self.next_due = None;
        let uptime_ms = self
            .opened_at
            .take()
            .map_or(0, |t| self.clock.ms_since(t));
        tracing::info!(records = self.emitted, uptime_ms, "simulated arm disconnected");
        Ok(())
    }
}
