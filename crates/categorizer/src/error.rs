use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CategorizerError {
    #[error("empty file list")]
    EmptyFileList,

    #[error("failed to read pattern file {path}: {source}")]
    PatternFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("pattern file {0} contains no pattern")]
    EmptyPattern(PathBuf),

    #[error("invalid pattern: {0}")]
    BadPattern(#[from] regex::Error),
}
