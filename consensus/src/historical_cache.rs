use crate::config::HistoricalCacheConfig;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use tbft_state::{ConsensusState, Height, ModifyRequestState};

/// Adapts a state type to the height it should be retained under in a
/// [`HistoricalStateCache`].
pub trait HeightKeyed {
    fn height_key(&self) -> Height;
}

impl HeightKeyed for ConsensusState {
    fn height_key(&self) -> Height {
        self.height()
    }
}

impl HeightKeyed for ModifyRequestState {
    fn height_key(&self) -> Height {
        self.modify_block_height()
    }
}

/// Bounded retention of past Consensus/Modify states, for auditing and
/// late-reply handling (spec §4.E).
///
/// Guarded by an explicit mutex around every operation, matching spec §5's
/// requirement that this component, unlike the future cache, is safe to
/// share across readers that are not the single consensus driver.
pub struct HistoricalStateCache<T> {
    size: u64,
    cache: Mutex<BTreeMap<Height, T>>,
}

impl<T: HeightKeyed + Clone> HistoricalStateCache<T> {
    pub fn new(config: HistoricalCacheConfig) -> Self {
        HistoricalStateCache {
            size: config.size,
            cache: Mutex::new(BTreeMap::new()),
        }
    }

    /// Inserts `state` keyed by its height, then runs GC. A height of zero
    /// is ignored: the original fragment also ignores a null state, which
    /// Rust's ownership model makes unrepresentable here, so only the
    /// non-positive-height half of that guard applies.
    pub fn add(&self, state: T) {
        let height = state.height_key();
        if height == 0 {
            log::debug!("historical cache: ignoring state at height 0");
            return;
        }
        let mut cache = self.cache.lock();
        cache.insert(height, state);
        Self::gc_locked(&mut cache, height, self.size);
    }

    pub fn get(&self, height: Height) -> Option<T> {
        self.cache.lock().get(&height).cloned()
    }

    pub fn len(&self) -> usize {
        self.cache.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.lock().is_empty()
    }

    /// Removes every entry whose key + size <= currentHeight, i.e. keeps
    /// only `(currentHeight - size, currentHeight]`.
    pub fn gc(&self, current_height: Height) {
        let mut cache = self.cache.lock();
        Self::gc_locked(&mut cache, current_height, self.size);
    }

    fn gc_locked(cache: &mut BTreeMap<Height, T>, current_height: Height, size: u64) {
        cache.retain(|&height, _| height + size > current_height);
    }
}
