use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Bad configuration or missing assets; nothing has been touched yet.
    #[error("setup error: {0}")]
    Setup(String),

    #[error(transparent)]
    Rpc(#[from] transmission::TransmissionError),

    #[error(transparent)]
    Categorizer(#[from] categorizer::CategorizerError),

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("torrent {0} did not finish downloading in time")]
    NotReady(i64),
}

impl EngineError {
    pub(crate) fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        EngineError::Io {
            path: path.as_ref().to_owned(),
            source,
        }
    }
}
