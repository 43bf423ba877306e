//! Background sampling for poll-driven probes.

use crate::cell::ObservationCell;
use crate::error::ProbeError;
use crate::observation::Reading;
use crate::ProbeCallback;
use crossbeam_channel::{bounded, Sender};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;
use std::time::Duration;

/// Default interval between samples of a poll-driven probe.
pub const DEFAULT_SAMPLE_INTERVAL: Duration = Duration::from_secs(1);

struct Worker {
    stop_tx: Sender<()>,
    handle: JoinHandle<()>,
}

/// Runs a probe's sampling function on its own thread and feeds the results
/// into the probe's [`ObservationCell`].
///
/// The first sample is taken immediately. Sampling ends early once the cell
/// is marked unavailable.
#[derive(Default)]
pub struct PollingSampler {
    worker: Mutex<Option<Worker>>,
}

impl PollingSampler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Start sampling. Does nothing if already running.
    pub fn start<F>(
        &self,
        cell: Arc<ObservationCell>,
        interval: Duration,
        on_change: ProbeCallback,
        sample: F,
    ) where
        F: Fn() -> Result<Reading, ProbeError> + Send + 'static,
    {
        let mut worker = self.worker.lock().unwrap_or_else(PoisonError::into_inner);
        if worker.is_some() {
            tracing::warn!(probe = %cell.source_id(), "sampler already running");
            return;
        }

        let (stop_tx, stop_rx) = bounded::<()>(1);
        let handle = std::thread::spawn(move || {
            tracing::debug!(probe = %cell.source_id(), ?interval, "sampler_started");

            loop {
                if cell.record(sample()) {
                    on_change();
                }

                if cell.is_unavailable() {
                    tracing::info!(probe = %cell.source_id(), "sampler_giving_up");
                    break;
                }

                crossbeam_channel::select! {
                    recv(stop_rx) -> _ => break,
                    default(interval) => {}
                }
            }

            tracing::debug!(probe = %cell.source_id(), "sampler_stopped");
        });

        *worker = Some(Worker { stop_tx, handle });
    }

    /// Stop sampling and wait for the thread to exit. Idempotent.
    pub fn stop(&self) {
        let worker = self
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        let Some(worker) = worker else {
            return;
        };

        let _ = worker.stop_tx.try_send(());
        drop(worker.stop_tx);

        if worker.handle.thread().id() != std::thread::current().id() {
            let _ = worker.handle.join();
        }
    }
}

impl Drop for PollingSampler {
    fn drop(&mut self) {
        self.stop();
    }
}
