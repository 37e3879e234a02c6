use std::fmt;
use std::time::Instant;

use crossbeam_channel::Sender;

pub type JobId = u64;

/// Bit string as submitted; checked by the encoder, not here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload(String);

impl Payload {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for Payload {
    fn from(text: String) -> Self {
        Self(text)
    }
}

impl From<&str> for Payload {
    fn from(text: &str) -> Self {
        Self(text.to_string())
    }
}

/// Queued -> Encoding -> Streaming -> Done, with Failed reachable from
/// Encoding and Streaming.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobState {
    Queued,
    Encoding,
    Streaming,
    Done,
    Failed(String),
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Done | JobState::Failed(_))
    }

    pub fn can_advance_to(&self, next: &JobState) -> bool {
        matches!(
            (self, next),
            (JobState::Queued, JobState::Encoding)
                | (JobState::Queued, JobState::Streaming)
                | (JobState::Encoding, JobState::Streaming)
                | (JobState::Encoding, JobState::Failed(_))
                | (JobState::Streaming, JobState::Done)
                | (JobState::Streaming, JobState::Failed(_))
        )
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobState::Queued => write!(f, "queued"),
            JobState::Encoding => write!(f, "encoding"),
            JobState::Streaming => write!(f, "streaming"),
            JobState::Done => write!(f, "done"),
            JobState::Failed(reason) => write!(f, "failed ({})", reason),
        }
    }
}

/// What the submitter is told once the job is terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Done { bits: usize },
    Failed { reason: String },
}

/// State change reported by the pipeline worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobEvent {
    pub id: JobId,
    pub state: JobState,
}

#[derive(Debug)]
pub struct TransmissionJob {
    id: JobId,
    payload: Payload,
    enqueued_at: Instant,
    state: JobState,
    burst_bits: usize,
    notify: Option<Sender<JobOutcome>>,
}

impl TransmissionJob {
    pub fn new(id: JobId, payload: Payload, notify: Option<Sender<JobOutcome>>) -> Self {
        Self {
            id,
            payload,
            enqueued_at: Instant::now(),
            state: JobState::Queued,
            burst_bits: 0,
            notify,
        }
    }

    pub fn id(&self) -> JobId {
        self.id
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn enqueued_at(&self) -> Instant {
        self.enqueued_at
    }

    pub fn state(&self) -> &JobState {
        &self.state
    }

    /// Only the pipeline worker drives transitions.
    pub(crate) fn advance(&mut self, next: JobState) {
        debug_assert!(
            self.state.can_advance_to(&next),
            "job {}: illegal transition {} -> {}",
            self.id,
            self.state,
            next
        );
        self.state = next;
    }

    pub(crate) fn complete(&mut self, burst_bits: usize) {
        self.burst_bits = burst_bits;
        self.advance(JobState::Done);
    }

    pub(crate) fn fail(&mut self, reason: impl Into<String>) {
        self.advance(JobState::Failed(reason.into()));
    }

    /// Tell the submitter how it ended. A submitter that went away is ignored.
    pub(crate) fn finish(self) {
        let outcome = match self.state {
            JobState::Done => JobOutcome::Done {
                bits: self.burst_bits,
            },
            JobState::Failed(reason) => JobOutcome::Failed { reason },
            _ => return,
        };
        if let Some(notify) = self.notify {
            let _ = notify.send(outcome);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legal_transitions() {
        let failed = JobState::Failed("x".to_string());
        assert!(JobState::Queued.can_advance_to(&JobState::Encoding));
        assert!(JobState::Queued.can_advance_to(&JobState::Streaming));
        assert!(JobState::Encoding.can_advance_to(&JobState::Streaming));
        assert!(JobState::Encoding.can_advance_to(&failed));
        assert!(JobState::Streaming.can_advance_to(&JobState::Done));
        assert!(JobState::Streaming.can_advance_to(&failed));
    }

    #[test]
    fn test_illegal_transitions() {
        assert!(!JobState::Queued.can_advance_to(&JobState::Done));
        assert!(!JobState::Encoding.can_advance_to(&JobState::Done));
        assert!(!JobState::Done.can_advance_to(&JobState::Streaming));
        assert!(!JobState::Failed("x".to_string()).can_advance_to(&JobState::Encoding));
    }

    #[test]
    fn test_finish_reports_outcome() {
        let (tx, rx) = crossbeam_channel::bounded(1);
        let mut job = TransmissionJob::new(7, Payload::from("0101"), Some(tx));
        job.advance(JobState::Encoding);
        job.advance(JobState::Streaming);
        job.complete(96);
        assert!(job.state().is_terminal());
        job.finish();

        assert_eq!(rx.recv(), Ok(JobOutcome::Done { bits: 96 }));
    }

    #[test]
    fn test_dropped_job_disconnects_submitter() {
        let (tx, rx) = crossbeam_channel::bounded::<JobOutcome>(1);
        drop(TransmissionJob::new(1, Payload::from("1"), Some(tx)));
        assert!(rx.recv().is_err());
    }
}
