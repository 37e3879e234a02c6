use crossbeam_channel::{Sender, select_biased};
use serde::Serialize;
use tracing::{debug, error, info, trace, warn};

use super::job::{JobEvent, JobState, TransmissionJob};
use super::queue::JobReceiver;
use super::shutdown::ShutdownSignal;
use super::sink::BurstSink;
use crate::error::HardwareError;
use crate::phy::{BurstEncoder, BurstFrame};
use crate::utils::consts::STREAM_CHUNK_BYTES;

/// What to do with the burst on air when shutdown arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, clap::ValueEnum)]
pub enum ShutdownPolicy {
    /// Finish the current burst, then stop
    #[default]
    Finish,
    /// Drop the current burst at the next chunk boundary
    Abort,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerSummary {
    pub done: u64,
    pub failed: u64,
    pub discarded: u64,
}

enum StreamEnd {
    Completed,
    Aborted,
}

/// Single consumer of the job queue and sole owner of the transmit sink.
///
/// Jobs are handled strictly one at a time: job n+1 is not taken off the queue
/// until job n is Done or Failed.
pub struct PipelineWorker<S: BurstSink> {
    encoder: BurstEncoder,
    sink: S,
    policy: ShutdownPolicy,
    chunk_bytes: usize,
    events: Option<Sender<JobEvent>>,
}

impl<S: BurstSink> PipelineWorker<S> {
    pub fn new(encoder: BurstEncoder, sink: S, policy: ShutdownPolicy) -> Self {
        Self {
            encoder,
            sink,
            policy,
            chunk_bytes: STREAM_CHUNK_BYTES,
            events: None,
        }
    }

    /// Report every state transition on `events`.
    pub fn with_events(mut self, events: Sender<JobEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn with_chunk_bytes(mut self, chunk_bytes: usize) -> Self {
        self.chunk_bytes = chunk_bytes.max(1);
        self
    }

    /// Run until the shutdown signal fires or every submitter is gone.
    ///
    /// A hardware error stops the pipeline and is returned; the sink is still
    /// released on the way out.
    pub fn run(
        mut self,
        jobs: JobReceiver,
        shutdown: ShutdownSignal,
    ) -> Result<WorkerSummary, HardwareError> {
        self.sink.open()?;
        info!("Pipeline worker started (shutdown policy: {:?})", self.policy);

        let mut summary = WorkerSummary::default();
        let served = self.serve(&jobs, &shutdown, &mut summary);

        for job in jobs.drain() {
            warn!("Discarding queued job {}", job.id());
            summary.discarded += 1;
        }
        drop(jobs);

        let released = self.sink.release();
        info!(
            "Pipeline worker stopped: {} done, {} failed, {} discarded",
            summary.done, summary.failed, summary.discarded
        );

        served?;
        released?;
        Ok(summary)
    }

    fn serve(
        &mut self,
        jobs: &JobReceiver,
        shutdown: &ShutdownSignal,
        summary: &mut WorkerSummary,
    ) -> Result<(), HardwareError> {
        loop {
            // shutdown first: a job that is merely queued never goes on air
            // once shutdown has fired
            let job = select_biased! {
                recv(shutdown.receiver()) -> _ => {
                    info!("Shutdown requested");
                    return Ok(());
                }
                recv(jobs.rx) -> msg => match msg {
                    Ok(job) => job,
                    Err(_) => {
                        info!("Job queue closed");
                        return Ok(());
                    }
                },
            };

            self.process(job, shutdown, summary)?;
        }
    }

    fn process(
        &mut self,
        mut job: TransmissionJob,
        shutdown: &ShutdownSignal,
        summary: &mut WorkerSummary,
    ) -> Result<(), HardwareError> {
        debug!(
            "Job {} dequeued after {:?}",
            job.id(),
            job.enqueued_at().elapsed()
        );

        self.transition(&mut job, JobState::Encoding);
        let frame = match self.encoder.encode(job.payload().as_str()) {
            Ok(frame) => frame,
            Err(e) => {
                warn!("Job {} rejected: {}", job.id(), e);
                job.fail(e.to_string());
                self.emit(&job);
                summary.failed += 1;
                job.finish();
                return Ok(());
            }
        };

        self.transition(&mut job, JobState::Streaming);
        match self.stream(&frame, shutdown) {
            Ok(StreamEnd::Completed) => {
                job.complete(frame.bit_len());
                self.emit(&job);
                info!(
                    "Job {} transmitted: {} bits in {} bytes",
                    job.id(),
                    frame.bit_len(),
                    frame.bytes().len()
                );
                summary.done += 1;
                job.finish();
                Ok(())
            }
            Ok(StreamEnd::Aborted) => {
                warn!("Job {} aborted mid-burst by shutdown", job.id());
                job.fail("aborted by shutdown");
                self.emit(&job);
                summary.failed += 1;
                job.finish();
                Ok(())
            }
            Err(e) => {
                error!("Job {} lost to transmit failure: {}", job.id(), e);
                job.fail(e.to_string());
                self.emit(&job);
                summary.failed += 1;
                job.finish();
                Err(e)
            }
        }
    }

    fn stream(
        &mut self,
        frame: &BurstFrame,
        shutdown: &ShutdownSignal,
    ) -> Result<StreamEnd, HardwareError> {
        let bytes = frame.bytes();
        self.sink
            .begin_burst(frame.bit_len(), bytes.len())?;

        for (i, chunk) in bytes
            .chunks(self.chunk_bytes)
            .enumerate()
        {
            if self.policy == ShutdownPolicy::Abort && shutdown.is_fired() {
                self.sink.abort_burst()?;
                return Ok(StreamEnd::Aborted);
            }
            trace!("Chunk {}: {} bytes", i, chunk.len());
            self.sink.write_chunk(chunk)?;
        }

        self.sink.end_burst()?;
        Ok(StreamEnd::Completed)
    }

    fn transition(&self, job: &mut TransmissionJob, next: JobState) {
        job.advance(next);
        self.emit(job);
    }

    fn emit(&self, job: &TransmissionJob) {
        debug!("Job {} -> {}", job.id(), job.state());
        if let Some(events) = &self.events {
            let _ = events.send(JobEvent {
                id: job.id(),
                state: job.state().clone(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phy::FramingConfig;
    use crate::transmission::queue::job_queue;
    use crate::transmission::shutdown::shutdown_channel;
    use crate::transmission::{JobOutcome, StreamSink};

    fn encoder() -> BurstEncoder {
        BurstEncoder::new(FramingConfig::default()).unwrap()
    }

    #[test]
    fn test_worker_exits_when_queue_closes() {
        let (queue, jobs) = job_queue(None);
        let (_trigger, shutdown) = shutdown_channel();
        let ok = queue.submit("0110").unwrap();
        let bad = queue.submit("01a0").unwrap();
        drop(queue);

        let sink = StreamSink::with_writer(Box::new(std::io::sink()));
        let summary = PipelineWorker::new(encoder(), sink, ShutdownPolicy::Finish)
            .run(jobs, shutdown)
            .unwrap();

        assert_eq!(summary.done, 1);
        assert_eq!(summary.failed, 1);
        assert!(matches!(ok.wait(), Some(JobOutcome::Done { .. })));
        assert!(matches!(bad.wait(), Some(JobOutcome::Failed { .. })));
    }

    #[test]
    fn test_events_follow_state_machine() {
        let (queue, jobs) = job_queue(None);
        let (_trigger, shutdown) = shutdown_channel();
        let (events_tx, events_rx) = crossbeam_channel::unbounded();
        queue.submit("1").unwrap();
        queue.submit("").unwrap();
        drop(queue);

        let sink = StreamSink::with_writer(Box::new(std::io::sink()));
        PipelineWorker::new(encoder(), sink, ShutdownPolicy::Finish)
            .with_events(events_tx)
            .run(jobs, shutdown)
            .unwrap();

        let states: Vec<_> = events_rx
            .try_iter()
            .map(|e| (e.id, e.state))
            .collect();
        assert_eq!(
            states,
            vec![
                (1, JobState::Encoding),
                (1, JobState::Streaming),
                (1, JobState::Done),
                (2, JobState::Encoding),
                (2, JobState::Failed("invalid payload: payload is empty".to_string())),
            ]
        );
    }

    #[test]
    fn test_fired_shutdown_beats_ready_jobs() {
        for _ in 0..20 {
            let (queue, jobs) = job_queue(None);
            let (trigger, shutdown) = shutdown_channel();
            let tickets: Vec<_> = (0..3)
                .map(|_| queue.submit("1101").unwrap())
                .collect();
            trigger.fire();

            let summary = PipelineWorker::new(
                encoder(),
                StreamSink::with_writer(Box::new(std::io::sink())),
                ShutdownPolicy::Finish,
            )
            .run(jobs, shutdown)
            .unwrap();

            assert_eq!(summary.done, 0);
            assert_eq!(summary.discarded, 3);
            assert!(tickets.iter().all(|t| t.wait().is_none()));
        }
    }
}
