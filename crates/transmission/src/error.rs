use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransmissionError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("authentication rejected (HTTP {0})")]
    Auth(u16),

    #[error("RPC gave up after {attempts} attempts (last HTTP status: {status})")]
    Connection { attempts: u32, status: u16 },

    #[error("daemon replied \"{0}\"")]
    Rpc(String),

    #[error("unexpected response shape: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("torrent {0} not found")]
    NotFound(i64),
}
