//! Background transport reader.
//!
//! Spawns a thread that owns the `Transport`, forwards every chunk over a
//! bounded channel, and closes the transport when it exits. Chunks are
//! forwarded in arrival order. When the queue is full the reader stops reading
//! until the consumer catches up; chunks are never dropped, since a lost chunk
//! would splice two lines together. Sample-level drop-oldest happens in the
//! rolling window.
//!
//! Safety: Each `TransportReader` spawns exactly one thread that is shut down
//! and joined when the reader is dropped, preventing thread leaks.
use crossbeam_channel as xch;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use venitrain_traits::{ReadOutcome, Transport};

use crate::config::TransportCfg;
use crate::error::TrainerError;
use crate::transport_error::map_transport_error;

/// Chunks the reader may queue ahead of the consumer.
pub const READER_QUEUE_CHUNKS: usize = 256;

/// Message from the reader thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReaderEvent {
    Chunk(Vec<u8>),
    /// The device closed the stream.
    Closed,
    /// A read failed; the connection is over.
    Failed(TrainerError),
}

pub struct TransportReader {
    rx: xch::Receiver<ReaderEvent>,
    /// Shutdown flag, checked between reads
    shutdown: Arc<AtomicBool>,
    join_handle: Option<std::thread::JoinHandle<()>>,
}

impl TransportReader {
    /// Open `transport` and start reading it on a dedicated thread.
    ///
    /// Open failures are returned directly and no thread is started.
    pub fn spawn<T: Transport + Send + 'static>(
        mut transport: T,
        cfg: &TransportCfg,
    ) -> Result<Self, TrainerError> {
        transport.open().map_err(|e| map_transport_error(&*e))?;

        let (tx, rx) = xch::bounded(READER_QUEUE_CHUNKS);
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = shutdown.clone();
        let timeout = cfg.read_timeout;

        let join_handle = std::thread::spawn(move || {
            loop {
                if shutdown_clone.load(Ordering::Relaxed) {
                    tracing::debug!("Reader thread received shutdown signal");
                    break;
                }

                let event = match transport.read(timeout) {
                    Ok(ReadOutcome::Data(bytes)) => ReaderEvent::Chunk(bytes),
                    Ok(ReadOutcome::Idle) => continue,
                    Ok(ReadOutcome::EndOfStream) => ReaderEvent::Closed,
                    Err(e) => match map_transport_error(&*e) {
                        TrainerError::Timeout => {
                            tracing::trace!("transport read timed out");
                            continue;
                        }
                        err => ReaderEvent::Failed(err),
                    },
                };

                // A read that completes after shutdown is discarded.
                if shutdown_clone.load(Ordering::Relaxed) {
                    break;
                }
                let terminal = !matches!(event, ReaderEvent::Chunk(_));
                if !forward(&tx, event, timeout, &shutdown_clone) || terminal {
                    break;
                }
            }
            if let Err(e) = transport.close() {
                tracing::warn!(error = %e, "transport close failed");
            }
            tracing::trace!("Reader thread exiting cleanly");
        });

        Ok(Self {
            rx,
            shutdown,
            join_handle: Some(join_handle),
        })
    }

    /// Event stream for use with `crossbeam_channel::select!`.
    pub fn events(&self) -> &xch::Receiver<ReaderEvent> {
        &self.rx
    }
}

/// Queue `event`, waiting while the channel is full. Returns `false` when the
/// consumer is gone or shutdown was requested while waiting.
fn forward(
    tx: &xch::Sender<ReaderEvent>,
    mut event: ReaderEvent,
    wait: std::time::Duration,
    shutdown: &AtomicBool,
) -> bool {
    loop {
        match tx.send_timeout(event, wait) {
            Ok(()) => return true,
            Err(xch::SendTimeoutError::Disconnected(_)) => {
                tracing::debug!("Reader consumer disconnected, exiting thread");
                return false;
            }
            Err(xch::SendTimeoutError::Timeout(back)) => {
                if shutdown.load(Ordering::Relaxed) {
                    return false;
                }
                tracing::trace!("reader queue full, waiting for consumer");
                event = back;
            }
        }
    }
}

impl Drop for TransportReader {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);

        // The thread exits after its current read returns, bounded by the
        // configured read timeout.
        if let Some(handle) = self.join_handle.take() {
            match handle.join() {
                Ok(()) => {
                    tracing::trace!("Reader thread joined successfully");
                }
                Err(e) => {
                    tracing::warn!(?e, "Reader thread panicked during shutdown");
                }
            }
        }
    }
}
