use thiserror::Error;

/// Errors raised by the future-message and historical-state caches.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
    #[error("height {height} is out of the future window (consensus height {consensus_height}, size {size})")]
    CacheRejected {
        height: u64,
        consensus_height: u64,
        size: u64,
    },
}

/// Errors raised while building or publishing an outbound consensus
/// message.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("failed to serialize consensus message: {0}")]
    Serialization(#[from] serde_json::Error),
}
