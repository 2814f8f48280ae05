//! Client for the Transmission daemon's HTTP JSON-RPC interface.
//!
//! Covers the slice of the RPC the maintenance engine needs: listing
//! torrents, relocating them, removing them with their data, and resuming
//! paused ones, with the daemon's CSRF session-token handshake handled
//! transparently.

mod client;
mod error;
pub mod models;

pub use client::TransClient;
pub use error::TransmissionError;
pub use models::{Torrent, TorrentFile, TorrentStatus};

pub type Result<T> = std::result::Result<T, TransmissionError>;
