use std::io;
use std::path::PathBuf;

/// Failures surfaced by the on-disk stores.
///
/// Missing files are never reported here: every read path treats
/// "not found" as empty data.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid meta record at {path}: {source}")]
    Meta {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("corrupt index file at {path}: {detail}")]
    Corrupt { path: PathBuf, detail: String },

    #[error("{path} is {len} bytes, over the {limit} byte limit")]
    Oversized { path: PathBuf, len: u64, limit: u64 },

    #[error("failed to lock collection at {path}: {source}")]
    Lock {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl StorageError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        StorageError::Io { path: path.into(), source }
    }
}

pub type Result<T> = std::result::Result<T, StorageError>;
