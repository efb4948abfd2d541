use serde::{Deserialize, Serialize};

/// Sizing for a [`crate::FutureMsgCache`]: how many heights beyond the
/// current consensus height to retain buffered proposals/votes for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FutureCacheConfig {
    pub size: u64,
}

/// Sizing for a [`crate::HistoricalStateCache`]: how many past heights to
/// retain finalized states for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoricalCacheConfig {
    pub size: u64,
}
