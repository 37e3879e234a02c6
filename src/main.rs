use std::num::NonZeroUsize;
use std::process::ExitCode;
use std::thread;
use std::time::Duration;

use ais_burst_tx::error::ConfigError;
use ais_burst_tx::net::{IngestConfig, IngestServer, WsConfig, WsServer};
use ais_burst_tx::phy::{BurstEncoder, FramingConfig};
use ais_burst_tx::radio::{Channel, ChannelConfig, TransmitChain};
use ais_burst_tx::transmission::{
    PipelineWorker, ShutdownPolicy, SinkTarget, StreamSink, job_queue, shutdown_channel,
};
use ais_burst_tx::utils::consts::*;
use ais_burst_tx::utils::logging::init_logging;
use clap::{Parser, ValueEnum};
use tracing::{error, info, warn};

const EXIT_HARDWARE: u8 = 1;
const EXIT_CONFIG: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Framing {
    /// Octet aligned, LSB-first octets, NRZI, 256-bit minimum (what receivers expect)
    OnAir,
    /// Payload bits sent as given, no line coding
    Plain,
}

/// AIS transmitter: frames bit-string payloads into ITU-R M.1371-4 bursts
/// and streams them to a GMSK modulator / RF sink.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable RF amp
    #[arg(short = 'a', long = "amp")]
    rf_amp: bool,

    /// IF (LNA) gain [0-47 dB]
    #[arg(short = 'l', long, default_value_t = DEFAULT_IF_GAIN_DB, allow_negative_numbers = true)]
    if_gain: i32,

    /// Frequency correction [ppm]
    #[arg(short = 'p', long, default_value_t = 0, allow_negative_numbers = true)]
    ppm: i32,

    /// AIS channel: A (161.975 MHz, 87B) or B (162.025 MHz, 88B)
    #[arg(long, default_value = "A")]
    channel: String,

    /// Sampling rate [Hz]
    #[arg(long, default_value_t = DEFAULT_SAMPLE_RATE)]
    sampling_rate: u32,

    /// Bit rate [baud]
    #[arg(long, default_value_t = DEFAULT_BIT_RATE)]
    bit_rate: u32,

    /// Payload to transmit at startup (bit string from an AIVDM encoder); repeatable
    #[arg(long)]
    payload: Vec<String>,

    /// Ingest address for payload submissions
    #[arg(long, default_value = DEFAULT_LISTEN_ADDR)]
    listen: String,

    /// WebSocket ingest address for browser front ends, e.g. 0.0.0.0:52002
    #[arg(long)]
    ws_listen: Option<String>,

    /// Do not listen; transmit the --payload values and exit
    #[arg(long)]
    no_server: bool,

    /// Maximum pending jobs (unbounded if omitted)
    #[arg(long)]
    queue_capacity: Option<NonZeroUsize>,

    /// Time allowed to read one whole TCP submission [ms], 0 disables it
    #[arg(long, default_value_t = DEFAULT_READ_TIMEOUT_MS)]
    read_timeout_ms: u64,

    /// Burst handling on shutdown
    #[arg(long, value_enum, default_value_t = ShutdownPolicy::Finish)]
    shutdown: ShutdownPolicy,

    /// Burst framing
    #[arg(long, value_enum, default_value_t = Framing::OnAir)]
    framing: Framing,

    /// Burst record output for the modulator ('-' for stdout)
    #[arg(short, long, default_value = "-")]
    output: String,

    /// Print the compiled transmit chain as JSON and exit
    #[arg(long)]
    dump_chain: bool,
}

impl Cli {
    fn channel_config(&self) -> Result<ChannelConfig, ConfigError> {
        Ok(ChannelConfig {
            channel: self.channel.parse::<Channel>()?,
            sample_rate: self.sampling_rate,
            bit_rate: self.bit_rate,
            frequency_correction_ppm: self.ppm,
            amplifier_enabled: self.rf_amp,
            if_gain: self.if_gain,
        })
    }

    fn framing_config(&self) -> FramingConfig {
        match self.framing {
            Framing::OnAir => FramingConfig::on_air(),
            Framing::Plain => FramingConfig::default(),
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging();

    let chain = match cli
        .channel_config()
        .and_then(|channel| TransmitChain::compile(&cli.framing_config(), &channel))
    {
        Ok(chain) => chain,
        Err(e) => {
            error!("Configuration error: {}", e);
            return ExitCode::from(EXIT_CONFIG);
        }
    };

    if cli.dump_chain {
        return match chain.to_json() {
            Ok(json) => {
                println!("{}", json);
                ExitCode::SUCCESS
            }
            Err(e) => {
                error!("Failed to serialize transmit chain: {}", e);
                ExitCode::FAILURE
            }
        };
    }

    if cli.no_server && cli.payload.is_empty() {
        error!("Configuration error: --no-server needs at least one --payload");
        return ExitCode::from(EXIT_CONFIG);
    }

    chain.log_summary();
    match run(&cli, &chain) {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

fn run(cli: &Cli, chain: &TransmitChain) -> Result<(), u8> {
    let encoder = BurstEncoder::new(chain.framing().clone()).map_err(|e| {
        error!("Configuration error: {}", e);
        EXIT_CONFIG
    })?;

    let (trigger, shutdown) = shutdown_channel();
    let mut trigger = Some(trigger);
    ctrlc::set_handler(move || {
        if let Some(trigger) = trigger.take() {
            info!("Interrupt received, shutting down...");
            trigger.fire();
        }
    })
    .unwrap_or_else(|e| warn!("Could not install signal handler: {}", e));

    let (queue, jobs) = job_queue(cli.queue_capacity);
    for payload in &cli.payload {
        match queue.submit(payload.as_str()) {
            Ok(ticket) => info!("Startup payload queued as job {}", ticket.id()),
            Err(e) => warn!("Startup payload not queued: {}", e),
        }
    }

    // The servers own the only other submitters; without them the worker
    // stops once the startup payloads are through.
    let (server, ws_server) = if cli.no_server {
        drop(queue);
        (None, None)
    } else {
        let ws_server = match &cli.ws_listen {
            Some(listen) => {
                let config = WsConfig {
                    listen: listen.clone(),
                    max_payload_bits: chain.framing().max_payload_bits,
                    ..WsConfig::default()
                };
                match WsServer::bind(config, queue.clone()) {
                    Ok(server) => Some(server),
                    Err(e) => {
                        error!("Startup failed: {}", e);
                        return Err(EXIT_HARDWARE);
                    }
                }
            }
            None => None,
        };

        let config = IngestConfig {
            listen: cli.listen.clone(),
            read_timeout: (cli.read_timeout_ms > 0)
                .then(|| Duration::from_millis(cli.read_timeout_ms)),
            max_payload_bits: chain.framing().max_payload_bits,
            await_outcome: true,
        };
        match IngestServer::bind(config, queue) {
            Ok(server) => (Some(server), ws_server),
            Err(e) => {
                error!("Startup failed: {}", e);
                return Err(EXIT_HARDWARE);
            }
        }
    };

    let sink = StreamSink::new(cli.output.parse::<SinkTarget>().unwrap_or(SinkTarget::Stdout));
    let worker = PipelineWorker::new(encoder, sink, cli.shutdown);
    let worker_shutdown = shutdown.clone();
    let worker_handle = thread::Builder::new()
        .name("pipeline-worker".to_string())
        .spawn(move || worker.run(jobs, worker_shutdown))
        .map_err(|e| {
            error!("Failed to start pipeline worker: {}", e);
            EXIT_HARDWARE
        })?;

    let mut listener_handles = Vec::new();
    if let Some(server) = server {
        let server_shutdown = shutdown.clone();
        listener_handles.push(spawn_listener("ingest-accept", move || {
            server.run(server_shutdown)
        })?);
    }
    if let Some(server) = ws_server {
        let server_shutdown = shutdown.clone();
        listener_handles.push(spawn_listener("ws-accept", move || {
            server.run(server_shutdown)
        })?);
    }

    let result = match worker_handle.join() {
        Ok(Ok(summary)) => {
            info!(
                "Transmitted {} bursts ({} failed, {} discarded)",
                summary.done, summary.failed, summary.discarded
            );
            Ok(())
        }
        Ok(Err(e)) => {
            // the RF path is in an unknown state: stop everything
            error!("Hardware error, stopping: {}", e);
            return Err(EXIT_HARDWARE);
        }
        Err(_) => {
            error!("Pipeline worker panicked");
            return Err(EXIT_HARDWARE);
        }
    };

    for handle in listener_handles {
        if handle.join().is_err() {
            warn!("Listener thread panicked");
        }
    }

    info!("Exiting gracefully...");
    result
}

fn spawn_listener<F>(name: &str, run: F) -> Result<thread::JoinHandle<()>, u8>
where
    F: FnOnce() + Send + 'static,
{
    thread::Builder::new()
        .name(name.to_string())
        .spawn(run)
        .map_err(|e| {
            error!("Failed to start {}: {}", name, e);
            EXIT_HARDWARE
        })
}
