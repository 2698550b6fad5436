//! Builders for `Trainer` and `SessionRunner`.
//!
//! All fields are validated on `build()`; defaults match the shipped device.

use std::sync::Arc;

use venitrain_traits::clock::{Clock, MonotonicClock};

use crate::config::{SessionCfg, TransportCfg};
use crate::error::{BuildError, Result};
use crate::runner::{SessionRunner, TransportFactory};
use crate::scoring::ScoringPolicy;
use crate::trainer::Trainer;

/// Builder for `Trainer`.
#[derive(Default)]
pub struct TrainerBuilder {
    session: Option<SessionCfg>,
    scoring: Option<ScoringPolicy>,
    clock: Option<Arc<dyn Clock + Send + Sync>>,
}

impl TrainerBuilder {
    pub fn session(mut self, cfg: SessionCfg) -> Self {
        self.session = Some(cfg);
        self
    }

    pub fn scoring(mut self, policy: ScoringPolicy) -> Self {
        self.scoring = Some(policy);
        self
    }

    /// Inject a clock (tests use a manually advanced one).
    pub fn clock<C: Clock + Send + Sync + 'static>(mut self, clock: C) -> Self {
        self.clock = Some(Arc::new(clock));
        self
    }

    pub fn build(self) -> Result<Trainer> {
        let session = self.session.unwrap_or_default();
        if session.window_capacity == 0 {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "window_capacity must be >= 1",
            )));
        }
        if session.raw_line_capacity == 0 {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "raw_line_capacity must be >= 1",
            )));
        }
        if session.tick.is_zero() {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "tick must be > 0",
            )));
        }
        let clock = self
            .clock
            .unwrap_or_else(|| Arc::new(MonotonicClock::new()));
        Ok(Trainer::from_parts(
            &session,
            self.scoring.unwrap_or_default(),
            clock,
        ))
    }
}

/// Builder for `SessionRunner`. A transport factory is required.
#[derive(Default)]
pub struct RunnerBuilder {
    trainer: Option<Trainer>,
    session: Option<SessionCfg>,
    transport: Option<TransportCfg>,
    factory: Option<TransportFactory>,
}

impl RunnerBuilder {
    /// Use a pre-built trainer; otherwise one is built from `session`.
    pub fn trainer(mut self, trainer: Trainer) -> Self {
        self.trainer = Some(trainer);
        self
    }

    /// Session config; its `tick` also drives the runner clock.
    pub fn session(mut self, cfg: SessionCfg) -> Self {
        self.session = Some(cfg);
        self
    }

    pub fn transport_cfg(mut self, cfg: TransportCfg) -> Self {
        self.transport = Some(cfg);
        self
    }

    pub fn transport_factory(mut self, factory: TransportFactory) -> Self {
        self.factory = Some(factory);
        self
    }

    pub fn build(self) -> Result<SessionRunner> {
        let factory = self
            .factory
            .ok_or_else(|| eyre::Report::new(BuildError::MissingTransport))?;
        let session = self.session.unwrap_or_default();
        let trainer = match self.trainer {
            Some(t) => t,
            None => Trainer::builder().session(session.clone()).build()?,
        };
        if session.tick.is_zero() {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "tick must be > 0",
            )));
        }
        Ok(SessionRunner::new(
            trainer,
            factory,
            self.transport.unwrap_or_default(),
            session.tick,
        ))
    }
}
