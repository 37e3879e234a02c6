/// Job queue, pipeline worker, and the transmit sink boundary
pub mod job;
pub mod queue;
pub mod shutdown;
pub mod sink;
pub mod worker;

pub use job::{JobEvent, JobId, JobOutcome, JobState, Payload, TransmissionJob};
pub use queue::{JobQueue, JobReceiver, JobTicket, job_queue};
pub use shutdown::{ShutdownSignal, ShutdownTrigger, shutdown_channel};
pub use sink::{BurstSink, SinkTarget, StreamSink, read_record};
pub use worker::{PipelineWorker, ShutdownPolicy, WorkerSummary};
