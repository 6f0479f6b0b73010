use thiserror::Error;

/// Failure modes of store operations.
///
/// Corruption of the backing file is deliberately absent: an unparsable file
/// is recovered inside the storage layer by resetting to an empty collection,
/// and is never surfaced to callers.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Client-correctable input problem; never fatal
    #[error("{0}")]
    Validation(String),

    /// Operation addressed an id that is not in the collection
    #[error("Registration not found")]
    NotFound(String),

    /// I/O failure reading or writing the backing file; the operation was
    /// aborted with no partial effect
    #[error("Failed to save registration data")]
    Persistence(#[source] anyhow::Error),
}
