use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, PoisonError};

use crossbeam_channel::{Receiver, Sender, TrySendError};
use tracing::debug;

use super::job::{JobId, JobOutcome, Payload, TransmissionJob};
use crate::error::SubmitError;

/// Submission side of the FIFO job queue. Cheap to clone, one per handler.
#[derive(Clone)]
pub struct JobQueue {
    tx: Sender<TransmissionJob>,
    capacity: Option<NonZeroUsize>,
    // held across id assignment and send so ids increase in queue order
    next_id: Arc<Mutex<JobId>>,
}

/// Consumer side, owned by the single pipeline worker.
pub struct JobReceiver {
    pub(crate) rx: Receiver<TransmissionJob>,
}

/// Handle returned to a submitter.
pub struct JobTicket {
    id: JobId,
    outcome: Receiver<JobOutcome>,
}

/// Create a queue; `None` means unbounded.
pub fn job_queue(capacity: Option<NonZeroUsize>) -> (JobQueue, JobReceiver) {
    let (tx, rx) = match capacity {
        Some(cap) => crossbeam_channel::bounded(cap.get()),
        None => crossbeam_channel::unbounded(),
    };
    let queue = JobQueue {
        tx,
        capacity,
        next_id: Arc::new(Mutex::new(1)),
    };
    (queue, JobReceiver { rx })
}

impl JobQueue {
    pub fn submit(&self, payload: impl Into<Payload>) -> Result<JobTicket, SubmitError> {
        let (notify, outcome) = crossbeam_channel::bounded(1);
        let mut next_id = self
            .next_id
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let id = *next_id;

        let job = TransmissionJob::new(id, payload.into(), Some(notify));
        match self.tx.try_send(job) {
            Ok(()) => {
                *next_id += 1;
                debug!("Job {} queued ({} pending)", id, self.tx.len());
                Ok(JobTicket { id, outcome })
            }
            Err(TrySendError::Full(_)) => Err(SubmitError::Busy {
                capacity: self
                    .capacity
                    .map_or(0, NonZeroUsize::get),
            }),
            Err(TrySendError::Disconnected(_)) => Err(SubmitError::Closed),
        }
    }

    pub fn pending(&self) -> usize {
        self.tx.len()
    }
}

impl JobReceiver {
    /// Take whatever is still queued without blocking.
    pub fn drain(&self) -> Vec<TransmissionJob> {
        self.rx
            .try_iter()
            .collect()
    }
}

impl JobTicket {
    pub fn id(&self) -> JobId {
        self.id
    }

    /// Block until the job is terminal. `None` if it was discarded unprocessed.
    pub fn wait(&self) -> Option<JobOutcome> {
        self.outcome.recv().ok()
    }

    pub fn try_outcome(&self) -> Option<JobOutcome> {
        self.outcome.try_recv().ok()
    }
}
