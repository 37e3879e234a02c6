// WebSocket ingest, for browser front ends
//
// The connection stays open: every text message is one payload submission and
// is answered with the same JSON replies as the TCP protocol, one reply per
// text message.

use std::net::{SocketAddr, TcpListener, TcpStream};
use std::time::Duration;

use tracing::debug;
use tungstenite::{Message, WebSocket};

use super::protocol::Reply;
use super::server::{accept_loop, spawn_handler, submit_and_report};
use crate::error::{EncodeError, NetworkError, PayloadFault};
use crate::transmission::{JobQueue, ShutdownSignal};
use crate::utils::consts::*;

#[derive(Debug, Clone)]
pub struct WsConfig {
    pub listen: String,
    /// Close a connection after this long without a message
    pub idle_timeout: Option<Duration>,
    pub max_payload_bits: usize,
    pub await_outcome: bool,
}

impl Default for WsConfig {
    fn default() -> Self {
        Self {
            listen: DEFAULT_WS_LISTEN_ADDR.to_string(),
            idle_timeout: Some(Duration::from_secs(DEFAULT_WS_IDLE_TIMEOUT_S)),
            max_payload_bits: MAX_PAYLOAD_BITS,
            await_outcome: true,
        }
    }
}

pub struct WsServer {
    listener: TcpListener,
    queue: JobQueue,
    config: WsConfig,
}

impl WsServer {
    pub fn bind(config: WsConfig, queue: JobQueue) -> Result<Self, NetworkError> {
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

    pub fn run(self, shutdown: ShutdownSignal) {
        accept_loop(&self.listener, &shutdown, "WebSocket server", |stream, peer| {
            let queue = self.queue.clone();
            let config = self.config.clone();
            spawn_handler("ws", peer, move || handle_ws_connection(stream, &queue, &config));
        });
    }
}

fn handle_ws_connection(
    stream: TcpStream,
    queue: &JobQueue,
    config: &WsConfig,
) -> Result<(), NetworkError> {
    stream
        .set_nonblocking(false)
        .map_err(NetworkError::Socket)?;
    stream
        .set_read_timeout(config.idle_timeout)
        .map_err(NetworkError::Socket)?;
    stream
        .set_write_timeout(Some(Duration::from_millis(REPLY_TIMEOUT_MS)))
        .map_err(NetworkError::Socket)?;

    let mut ws =
        tungstenite::accept(stream).map_err(|e| NetworkError::Handshake(e.to_string()))?;

    loop {
        let text = match ws.read() {
            Ok(Message::Text(text)) => text,
            Ok(Message::Binary(data)) => String::from_utf8_lossy(&data).into_owned(),
            // ping/pong are answered inside read(); close completes on the next read
            Ok(_) => continue,
            Err(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed) => {
                debug!("WebSocket closed by peer");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        let text = text.trim();
        if text.len() > config.max_payload_bits {
            let fault = PayloadFault::TooLong {
                len: text.len(),
                max: config.max_payload_bits,
            };
            send_reply(
                &mut ws,
                &Reply::Rejected {
                    reason: EncodeError::InvalidPayload(fault).to_string(),
                },
            )?;
            continue;
        }

        submit_and_report(text.to_string(), queue, config.await_outcome, |reply| {
            send_reply(&mut ws, reply)
        })?;
    }
}

fn send_reply(ws: &mut WebSocket<TcpStream>, reply: &Reply) -> Result<(), NetworkError> {
    let json = serde_json::to_string(reply).map_err(|e| NetworkError::Write(e.into()))?;
    ws.send(Message::text(json))?;
    Ok(())
}
