use thiserror::Error;

/// The single error type returned by every public operation in this crate.
///
/// Variant names mirror the minimum error-code set of the system this crate
/// reimplements rather than Rust naming conventions, so that callers porting
/// tests against the original code/result table can match one-to-one.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("file not found")]
    FileNotFound,

    #[error("file handle not initialized")]
    FileHandleNotInitialized,

    #[error("write failed")]
    WriteFailed,

    #[error("attempt to access a non-existing page")]
    ReadNonExistingPage,

    #[error("failed to close file")]
    FileCloseFailed,

    #[error("pinned pages remain in buffer pool at shutdown")]
    PinnedPagesInBuffer,

    #[error("no evictable frame available")]
    NoEvictableFrame,

    #[error("no more tuples")]
    NoMoreTuples,

    #[error("no tuple with given RID")]
    NoTupleForRid,

    #[error("unknown data type")]
    UnknownDataType,

    #[error("key not found")]
    KeyNotFound,

    #[error("no more index entries")]
    NoMoreEntries,

    #[error("scan condition not found")]
    ScanConditionNotFound,

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, StorageError>;
