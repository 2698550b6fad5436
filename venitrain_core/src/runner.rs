//! Session runner: the single event-processing loop.
//!
//! Multiplexes reader events, session-clock ticks and operator controls with
//! `crossbeam_channel::select!`, applying each event to the `Trainer` before
//! taking the next.

use std::time::{Duration, Instant};

use crossbeam_channel as xch;
use serde::Serialize;
use venitrain_traits::Transport;

use crate::builder::RunnerBuilder;
use crate::config::TransportCfg;
use crate::error::{Result, TrainerError};
use crate::procedure::StepId;
use crate::reader::{ReaderEvent, TransportReader};
use crate::session::Command;
use crate::telemetry::TelemetrySample;
use crate::trainer::{FeedCounters, Trainer, TrainerSnapshot};

/// Opens a fresh transport for each connect.
pub type TransportFactory =
    Box<dyn FnMut() -> std::result::Result<Box<dyn Transport + Send>, TrainerError> + Send>;

/// Operator control message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Control {
    Session(Command),
    ClearRawLines,
    Connect,
    Disconnect,
    /// Publish a snapshot on the notice channel.
    Status,
    Quit,
}

/// Runner output for an attached console.
#[derive(Debug, Clone)]
pub enum Notice {
    Status(Box<TrainerSnapshot>),
    Rejected { control: Control, error: TrainerError },
    AutoCompleted(StepId),
    Connected,
    TransportEnded { error: Option<TrainerError> },
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    pub connect_on_start: bool,
    /// Also start recording right after the initial connect.
    pub record_on_start: bool,
    /// Stop once the device closes its stream (replay files).
    pub stop_on_end_of_stream: bool,
    pub max_duration: Option<Duration>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum EndReason {
    Quit,
    Deadline,
    EndOfStream,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub ended_by: EndReason,
    pub counters: FeedCounters,
    /// Last transport failure, if the connection ended with one.
    pub transport_error: Option<String>,
    pub session: TrainerSnapshot,
    /// Window contents at the end of the run.
    #[serde(skip)]
    pub samples: Vec<TelemetrySample>,
}

pub struct SessionRunner {
    trainer: Trainer,
    factory: TransportFactory,
    transport_cfg: TransportCfg,
    tick: Duration,
    reader: Option<TransportReader>,
    notices: Option<xch::Sender<Notice>>,
    transport_error: Option<TrainerError>,
}

impl SessionRunner {
    pub fn builder() -> RunnerBuilder {
        RunnerBuilder::default()
    }

    pub(crate) fn new(
        trainer: Trainer,
        factory: TransportFactory,
        transport_cfg: TransportCfg,
        tick: Duration,
    ) -> Self {
        Self {
            trainer,
            factory,
            transport_cfg,
            tick,
            reader: None,
            notices: None,
            transport_error: None,
        }
    }

    /// Send runner notices (status, rejected commands, transport end) to `tx`.
    pub fn with_notices(mut self, tx: xch::Sender<Notice>) -> Self {
        self.notices = Some(tx);
        self
    }

    pub fn trainer(&self) -> &Trainer {
        &self.trainer
    }

    /// Run until `Quit`, the deadline, or end-of-stream when requested.
    ///
    /// A failing initial connect is returned as an error; later transport
    /// failures end that connection only and the run continues.
    pub fn run(mut self, controls: xch::Receiver<Control>, opts: RunOptions) -> Result<SessionSummary> {
        let started = Instant::now();
        if opts.connect_on_start {
            self.connect()?;
            if opts.record_on_start {
                self.trainer.apply(&Command::StartRecording)?;
            }
        }

        let ticker = xch::tick(self.tick);
        let deadline = opts.max_duration.map_or_else(xch::never, xch::after);
        let mut controls_open = true;
        tracing::info!(tick_ms = self.tick.as_millis() as u64, ?opts, "session runner start");

        let ended_by = loop {
            let events = self
                .reader
                .as_ref()
                .map_or_else(xch::never, |r| r.events().clone());
            let ctl = if controls_open {
                controls.clone()
            } else {
                xch::never()
            };

            xch::select! {
                recv(events) -> msg => {
                    if self.on_reader_event(msg.ok()) && opts.stop_on_end_of_stream {
                        break EndReason::EndOfStream;
                    }
                }
                recv(ticker) -> _ => {
                    let outcome = self.trainer.on_tick();
                    if let Some(step) = outcome.auto_completed {
                        self.notify(Notice::AutoCompleted(step));
                    }
                }
                recv(ctl) -> msg => match msg {
                    Ok(Control::Quit) => break EndReason::Quit,
                    Ok(control) => self.on_control(control),
                    Err(_) => {
                        tracing::debug!("control channel closed; running until deadline or end of stream");
                        controls_open = false;
                    }
                },
                recv(deadline) -> _ => break EndReason::Deadline,
            }
        };

        self.disconnect();
        tracing::info!(
            ?ended_by,
            elapsed_ms = started.elapsed().as_millis() as u64,
            counters = ?self.trainer.counters(),
            "session runner stop"
        );
        Ok(SessionSummary {
            ended_by,
            counters: self.trainer.counters(),
            transport_error: self.transport_error.as_ref().map(ToString::to_string),
            session: self.trainer.snapshot(),
            samples: self.trainer.window().to_vec(),
        })
    }

    /// Returns `true` when the connection ended with end-of-stream.
    fn on_reader_event(&mut self, event: Option<ReaderEvent>) -> bool {
        match event {
            Some(ReaderEvent::Chunk(bytes)) => {
                self.trainer.on_chunk(&bytes);
                false
            }
            Some(ReaderEvent::Closed) => {
                tracing::info!("transport reached end of stream");
                self.disconnect();
                self.notify(Notice::TransportEnded { error: None });
                true
            }
            Some(ReaderEvent::Failed(error)) => {
                self.trainer.on_transport_failed(&error);
                self.reader = None;
                self.transport_error = Some(error.clone());
                self.notify(Notice::TransportEnded { error: Some(error) });
                false
            }
            None => {
                tracing::warn!("reader channel closed unexpectedly");
                self.disconnect();
                false
            }
        }
    }

    fn on_control(&mut self, control: Control) {
        let result = match &control {
            Control::Session(cmd) => self.trainer.apply(cmd).map(|_| ()),
            Control::ClearRawLines => {
                self.trainer.clear_raw_lines();
                Ok(())
            }
            Control::Connect => self.connect(),
            Control::Disconnect => {
                self.disconnect();
                Ok(())
            }
            Control::Status => {
                self.notify(Notice::Status(Box::new(self.trainer.snapshot())));
                Ok(())
            }
            Control::Quit => Ok(()),
        };
        if let Err(error) = result {
            tracing::warn!(%error, ?control, "control rejected");
            self.notify(Notice::Rejected { control, error });
        }
    }

    fn connect(&mut self) -> std::result::Result<(), TrainerError> {
        if self.reader.is_some() {
            return Err(TrainerError::AlreadyConnected);
        }
        let transport = (self.factory)()?;
        let reader = TransportReader::spawn(transport, &self.transport_cfg)?;
        self.trainer.on_connected()?;
        self.reader = Some(reader);
        self.transport_error = None;
        self.notify(Notice::Connected);
        Ok(())
    }

    fn disconnect(&mut self) {
        // Dropping the reader signals shutdown, joins the thread and closes the transport.
        self.reader = None;
        self.trainer.on_disconnected();
    }

    fn notify(&self, notice: Notice) {
        if let Some(tx) = &self.notices {
            let _ = tx.send(notice);
        }
    }
}
