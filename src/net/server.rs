use std::io::{self, BufReader, ErrorKind, Read};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use super::protocol::{Reply, read_submission, submission_limit, write_reply};
use crate::error::{EncodeError, NetworkError, PayloadFault, SubmitError};
use crate::transmission::{JobQueue, ShutdownSignal};
use crate::utils::consts::*;

/// Ingest server settings
#[derive(Debug, Clone)]
pub struct IngestConfig {
    pub listen: String,
    /// Budget for the whole submission; `None` lets a stalled client hold its
    /// handler forever
    pub read_timeout: Option<Duration>,
    pub max_payload_bits: usize,
    /// Keep the connection open and report the job's final outcome
    pub await_outcome: bool,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            listen: DEFAULT_LISTEN_ADDR.to_string(),
            read_timeout: Some(Duration::from_millis(DEFAULT_READ_TIMEOUT_MS)),
            max_payload_bits: MAX_PAYLOAD_BITS,
            await_outcome: true,
        }
    }
}

/// Accepts one payload per TCP connection and queues it for transmission.
///
/// The accept loop never waits on encoding or streaming: every connection is
/// served on its own thread.
pub struct IngestServer {
    listener: TcpListener,
    queue: JobQueue,
    config: IngestConfig,
}

impl IngestServer {
    pub fn bind(config: IngestConfig, queue: JobQueue) -> Result<Self, NetworkError> {
        let bind_err = |source| NetworkError::Bind {
            addr: config.listen.clone(),
            source,
        };
        let listener = TcpListener::bind(config.listen.as_str()).map_err(bind_err)?;
        listener
            .set_nonblocking(true)
            .map_err(bind_err)?;

        Ok(Self {
            listener,
            queue,
            config,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, NetworkError> {
        self.listener
            .local_addr()
            .map_err(NetworkError::Socket)
    }

    /// Serve until `shutdown` fires. Connections already accepted finish on
    /// their own threads.
    pub fn run(self, shutdown: ShutdownSignal) {
        accept_loop(&self.listener, &shutdown, "Ingest server", |stream, peer| {
            let queue = self.queue.clone();
            let config = self.config.clone();
            spawn_handler("ingest", peer, move || {
                handle_connection(stream, &queue, &config)
            });
        });
    }
}

/// Poll a nonblocking listener until `shutdown` fires, handing every accepted
/// connection to `accept`.
pub(crate) fn accept_loop<F>(
    listener: &TcpListener,
    shutdown: &ShutdownSignal,
    role: &str,
    mut accept: F,
) where
    F: FnMut(TcpStream, SocketAddr),
{
    match listener.local_addr() {
        Ok(addr) => info!("{} listening on {}", role, addr),
        Err(e) => warn!("{} listening (address unknown: {})", role, e),
    }

    let poll = Duration::from_millis(ACCEPT_POLL_MS);
    while !shutdown.is_fired() {
        match listener.accept() {
            Ok((stream, peer)) => {
                debug!("Connection from {}", peer);
                accept(stream, peer);
            }
            Err(e) if e.kind() == ErrorKind::WouldBlock => {
                if shutdown.wait_timeout(poll) {
                    break;
                }
            }
            Err(e) => warn!("{}", NetworkError::Accept(e)),
        }
    }

    info!("{} stopped accepting connections", role);
}

/// Run a connection handler on its own named thread.
pub(crate) fn spawn_handler<F>(prefix: &str, peer: SocketAddr, handler: F)
where
    F: FnOnce() -> Result<(), NetworkError> + Send + 'static,
{
    let spawned = thread::Builder::new()
        .name(format!("{}-{}", prefix, peer))
        .spawn(move || {
            if let Err(e) = handler() {
                warn!("Connection {} dropped: {}", peer, e);
            }
        });
    if let Err(e) = spawned {
        warn!("Could not spawn handler for {}: {}", peer, e);
    }
}

/// Socket reader bounded by one deadline for the whole submission.
struct DeadlineReader {
    stream: TcpStream,
    deadline: Option<Instant>,
}

impl Read for DeadlineReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if let Some(deadline) = self.deadline {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(io::Error::new(
                    ErrorKind::TimedOut,
                    "submission deadline passed",
                ));
            }
            self.stream.set_read_timeout(Some(remaining))?;
        }
        self.stream.read(buf)
    }
}

fn handle_connection(
    stream: TcpStream,
    queue: &JobQueue,
    config: &IngestConfig,
) -> Result<(), NetworkError> {
    stream
        .set_nonblocking(false)
        .map_err(NetworkError::Socket)?;
    let deadline = config
        .read_timeout
        .map(|timeout| Instant::now() + timeout);
    stream
        .set_write_timeout(Some(Duration::from_millis(REPLY_TIMEOUT_MS)))
        .map_err(NetworkError::Socket)?;

    let mut writer = stream
        .try_clone()
        .map_err(NetworkError::Socket)?;
    let mut reader = BufReader::new(DeadlineReader { stream, deadline });
    let mut reply = |r: &Reply| write_reply(&mut writer, r).map_err(NetworkError::Write);

    let text = match read_submission(&mut reader, submission_limit(config.max_payload_bits)) {
        Ok(text) => text,
        Err(e) => {
            if let NetworkError::Oversized { limit } = e {
                // unread input would turn our close into a reset and lose the reply
                let _ = io::copy(&mut (&mut reader).take(limit as u64 * 4), &mut io::sink());
            }
            // best effort: the peer may already be gone
            let _ = reply(&Reply::Rejected {
                reason: e.to_string(),
            });
            return Err(e);
        }
    };

    submit_and_report(text, queue, config.await_outcome, reply)
}

/// Queue one submission and answer through `reply`: `queued` then the outcome,
/// or a single refusal.
pub(crate) fn submit_and_report<F>(
    text: String,
    queue: &JobQueue,
    await_outcome: bool,
    mut reply: F,
) -> Result<(), NetworkError>
where
    F: FnMut(&Reply) -> Result<(), NetworkError>,
{
    if text.is_empty() {
        return reply(&Reply::Rejected {
            reason: EncodeError::InvalidPayload(PayloadFault::Empty).to_string(),
        });
    }

    let ticket = match queue.submit(text) {
        Ok(ticket) => ticket,
        Err(SubmitError::Busy { capacity }) => {
            debug!("Queue full ({} jobs), refusing submission", capacity);
            return reply(&Reply::Busy);
        }
        Err(e @ SubmitError::Closed) => {
            return reply(&Reply::Rejected {
                reason: e.to_string(),
            });
        }
    };

    reply(&Reply::Queued { job: ticket.id() })?;
    if await_outcome {
        reply(&Reply::from_outcome(ticket.id(), ticket.wait()))?;
    }
    Ok(())
}
