//! Background jobs owned by the controller.
//!
//! Worker threads report back over a single mpsc channel drained once per
//! frame on the UI thread. Each submission captures the generation current at
//! spawn time; results from an invalidated generation are dropped by the
//! controller instead of overwriting newer state.

use std::path::PathBuf;
use std::sync::mpsc::{Receiver, Sender, TryRecvError};
use std::thread;

use crate::classifier::{self, PredictError, Prediction};

/// Messages produced by background workers.
pub(crate) enum JobMessage {
    PredictFinished(PredictJobResult),
}

/// One prediction request handed to a worker thread.
#[derive(Debug)]
pub(crate) struct PredictJob {
    pub(crate) generation: u64,
    pub(crate) url: String,
    pub(crate) path: PathBuf,
    pub(crate) max_upload_bytes: u64,
}

/// Outcome of a prediction request.
#[derive(Debug)]
pub(crate) struct PredictJobResult {
    pub(crate) generation: u64,
    pub(crate) result: Result<Prediction, PredictError>,
}

pub(crate) struct ControllerJobs {
    message_tx: Sender<JobMessage>,
    message_rx: Receiver<JobMessage>,
    predict_in_flight: usize,
    generation: u64,
}

impl ControllerJobs {
    pub(crate) fn new() -> Self {
        let (message_tx, message_rx) = std::sync::mpsc::channel::<JobMessage>();
        Self {
            message_tx,
            message_rx,
            predict_in_flight: 0,
            generation: 0,
        }
    }

    pub(crate) fn try_recv_message(&self) -> Result<JobMessage, TryRecvError> {
        self.message_rx.try_recv()
    }

    /// Generation stamped onto the next submission.
    pub(crate) fn current_generation(&self) -> u64 {
        self.generation
    }

    /// Invalidate results of every request spawned so far.
    pub(crate) fn bump_generation(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }

    pub(crate) fn predict_in_progress(&self) -> bool {
        self.predict_in_flight > 0
    }

    pub(crate) fn begin_predict(&mut self, job: PredictJob) {
        self.predict_in_flight += 1;
        let tx = self.message_tx.clone();
        thread::spawn(move || {
            let result = classifier::api::predict(&job.url, &job.path, job.max_upload_bytes);
            let _ = tx.send(JobMessage::PredictFinished(PredictJobResult {
                generation: job.generation,
                result,
            }));
        });
    }

    pub(crate) fn predict_finished(&mut self) {
        self.predict_in_flight = self.predict_in_flight.saturating_sub(1);
    }
}
