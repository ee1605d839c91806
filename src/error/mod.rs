use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DualError {
    #[error("{op}: suspended while running in blocking mode")]
    SuspendedInBlockingMode { op: &'static str },

    #[error("background task failed: {0}")]
    Background(#[from] tokio::task::JoinError),

    #[error("unknown encoding: {0}")]
    UnknownEncoding(String),

    #[error("unknown file system flag: {0}")]
    UnknownFlag(String),

    #[error("invalid data: {0}")]
    InvalidData(String),
}

impl From<DualError> for io::Error {
    fn from(err: DualError) -> Self {
        let kind = match err {
            DualError::SuspendedInBlockingMode { .. } => io::ErrorKind::WouldBlock,
            DualError::Background(_) => io::ErrorKind::Other,
            DualError::UnknownEncoding(_) | DualError::UnknownFlag(_) => io::ErrorKind::InvalidInput,
            DualError::InvalidData(_) => io::ErrorKind::InvalidData,
        };
        io::Error::new(kind, err)
    }
}

/// Catalog operations surface the host's `io::Error` unchanged.
pub type Result<T> = std::result::Result<T, io::Error>;
