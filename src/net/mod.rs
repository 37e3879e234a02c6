/// Network ingestion of payload submissions
pub mod protocol;
pub mod server;
pub mod ws;

pub use protocol::{Reply, read_submission, write_reply};
pub use server::{IngestConfig, IngestServer};
pub use ws::{WsConfig, WsServer};
