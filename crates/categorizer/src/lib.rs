//! Content categorization for torrent payloads.
//!
//! Given the file list of a torrent as `(path, size)` records, decide whether
//! the payload is adult video, a film, a TV series, music, or none of those.
//! Classification is a pure function of the record list and an externally
//! supplied adult-content pattern; it performs no I/O beyond loading that
//! pattern file.

mod classify;
mod error;
mod ext;
mod groups;
mod pathlex;
mod patterns;

pub use classify::{Categorizer, Category, Record, SIZE_THRESH};
pub use error::CategorizerError;
pub use patterns::load_pattern;

pub type Result<T> = std::result::Result<T, CategorizerError>;
