use crate::config::FutureCacheConfig;
use crate::error::CacheError;
use std::collections::BTreeMap;
use std::marker::PhantomData;
use std::sync::Arc;
use tbft_state::{Height, HeightRoundVoteSet, Proposal, Round, ValidatorSet, Vote, VoteKind};

/// Whether a [`FutureMsgCache`] instantiation enforces the strict lower
/// bound (`consensus_height < h`) on buffered votes.
///
/// The consensus-future cache does; per spec §9 the modify-future cache's
/// original behavior lacks that guard, so votes at or below the current
/// consensus height can be silently buffered there. That asymmetry is
/// unclear in intent but is implemented faithfully rather than "fixed" —
/// see `DESIGN.md`.
pub trait FutureCacheKind: VoteKind {
    const STRICT_VOTE_LOWER_BOUND: bool;
}

impl FutureCacheKind for tbft_state::Standard {
    const STRICT_VOTE_LOWER_BOUND: bool = true;
}

impl FutureCacheKind for tbft_state::Modify {
    const STRICT_VOTE_LOWER_BOUND: bool = false;
}

/// The proposals and votes buffered for a single future height.
struct FutureEntry {
    proposals: BTreeMap<Round, Proposal>,
    vote_set: HeightRoundVoteSet,
}

impl FutureEntry {
    fn new(height: Height, validators: Arc<ValidatorSet>) -> Self {
        FutureEntry {
            proposals: BTreeMap::new(),
            vote_set: HeightRoundVoteSet::new(height, validators),
        }
    }
}

/// A bounded, height-indexed buffer for proposals and votes that arrive
/// ahead of the local consensus height (spec §4.D).
pub struct FutureMsgCache<K: FutureCacheKind> {
    size: u64,
    consensus_height: Height,
    cache: BTreeMap<Height, FutureEntry>,
    _kind: PhantomData<K>,
}

impl<K: FutureCacheKind> FutureMsgCache<K> {
    pub fn new(config: FutureCacheConfig, consensus_height: Height) -> Self {
        FutureMsgCache {
            size: config.size,
            consensus_height,
            cache: BTreeMap::new(),
            _kind: PhantomData,
        }
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    pub fn consensus_height(&self) -> Height {
        self.consensus_height
    }

    /// Admits `proposal` iff `consensus_height <= proposal.height <=
    /// consensus_height + size`. Overwrites any existing proposal at the
    /// same (height, round).
    pub fn add_future_proposal(
        &mut self,
        validators: Arc<ValidatorSet>,
        proposal: Proposal,
    ) -> Result<(), CacheError> {
        if proposal.height < self.consensus_height
            || proposal.height > self.consensus_height + self.size
        {
            return Err(CacheError::CacheRejected {
                height: proposal.height,
                consensus_height: self.consensus_height,
                size: self.size,
            });
        }
        let entry = self
            .cache
            .entry(proposal.height)
            .or_insert_with(|| FutureEntry::new(proposal.height, Arc::clone(&validators)));
        entry.proposals.insert(proposal.round, proposal);
        Ok(())
    }

    /// Admits `vote` iff it falls within the window. The lower bound is
    /// strict (`consensus_height < vote.height`) only for `K` where
    /// [`FutureCacheKind::STRICT_VOTE_LOWER_BOUND`] is `true`.
    pub fn add_future_vote(
        &mut self,
        validators: Arc<ValidatorSet>,
        vote: Vote,
    ) -> Result<(), CacheError> {
        let below = if K::STRICT_VOTE_LOWER_BOUND {
            vote.height <= self.consensus_height
        } else {
            false
        };
        if below || vote.height > self.consensus_height + self.size {
            return Err(CacheError::CacheRejected {
                height: vote.height,
                consensus_height: self.consensus_height,
                size: self.size,
            });
        }
        let entry = self
            .cache
            .entry(vote.height)
            .or_insert_with(|| FutureEntry::new(vote.height, Arc::clone(&validators)));
        // A vote that fails admission into the underlying vote set (e.g. an
        // unknown voter or a duplicate) is logged and dropped, mirroring
        // the "CacheRejected"-adjacent drop-and-log policy of spec §7; it
        // does not bubble up as a cache-level error.
        if let Err(err) = entry.vote_set.add_vote(vote) {
            log::debug!("addFutureVote: vote set rejected buffered vote: {err}");
        }
        Ok(())
    }

    pub fn get_future_proposal(&self, height: Height, round: Round) -> Option<&Proposal> {
        self.cache.get(&height)?.proposals.get(&round)
    }

    pub fn get_future_vote(
        &self,
        height: Height,
        round: Round,
    ) -> Option<&tbft_state::VoteSet> {
        self.cache.get(&height)?.vote_set.get_round_vote_set(round)
    }

    /// Drains and removes the future entry for `height`, if any — used on
    /// height advance to promote buffered proposals/votes into the fresh
    /// consensus state for that height.
    pub fn take(&mut self, height: Height) -> Option<(BTreeMap<Round, Proposal>, HeightRoundVoteSet)> {
        self.cache.remove(&height).map(|e| (e.proposals, e.vote_set))
    }

    /// Sets the current consensus height and runs GC.
    pub fn update_consensus_height(&mut self, height: Height) {
        self.consensus_height = height;
        self.gc();
    }

    /// Removes every entry below the current consensus height, but only
    /// when `consensus_height` is a multiple of 10 (scan-amortization
    /// optimization from the original implementation; the retention set
    /// observed by callers is unaffected by the guard, only its update
    /// latency is).
    pub fn gc(&mut self) {
        if self.consensus_height % 10 != 0 {
            return;
        }
        let consensus_height = self.consensus_height;
        self.cache.retain(|&height, _| height >= consensus_height);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tbft_state::{Hash256, Standard, VoteType};

    fn validators() -> Arc<ValidatorSet> {
        Arc::new(ValidatorSet::new(vec![("A".into(), 1), ("B".into(), 1)]))
    }

    fn vote(height: Height) -> Vote {
        Vote {
            voter: "A".into(),
            height,
            round: 0,
            vote_type: VoteType::Prevote,
            block_hash: Hash256::NIL,
        }
    }

    #[test]
    fn future_vote_buffering_scenario() {
        // Scenario 3 of spec §8.
        let mut cache: FutureMsgCache<Standard> = FutureMsgCache::new(FutureCacheConfig { size: 10 }, 5);
        assert!(cache.add_future_vote(validators(), vote(9)).is_ok());
        assert!(cache.add_future_vote(validators(), vote(5)).is_err());
        assert!(cache.add_future_vote(validators(), vote(16)).is_err());
    }

    #[test]
    fn modify_cache_relaxes_lower_bound() {
        let mut cache: FutureMsgCache<tbft_state::Modify> = FutureMsgCache::new(FutureCacheConfig { size: 10 }, 5);
        let mut v = vote(5);
        v.vote_type = VoteType::ModifyPrevote;
        assert!(cache.add_future_vote(validators(), v).is_ok());
    }

    #[test]
    fn gc_runs_only_on_multiples_of_ten() {
        // Scenario 5 of spec §8.
        let mut cache: FutureMsgCache<Standard> =
            FutureMsgCache::new(FutureCacheConfig { size: 20 }, 0);
        for h in 1..=15 {
            cache.add_future_proposal(
                validators(),
                Proposal {
                    proposer: "A".into(),
                    height: h,
                    round: 0,
                    block: Arc::from(vec![]),
                    block_hash: Hash256::NIL,
                    pol_round: None,
                    wire: Arc::from(vec![]),
                },
            )
            .unwrap();
        }
        cache.update_consensus_height(9);
        assert_eq!(cache.len(), 15, "9 % 10 != 0, no GC yet");
        cache.update_consensus_height(10);
        assert_eq!(cache.len(), 6, "heights 10..15 survive, heights 1..9 are gc'd");
    }

    #[test]
    fn proposal_admits_at_current_height_unlike_votes() {
        let mut cache: FutureMsgCache<Standard> = FutureMsgCache::new(FutureCacheConfig { size: 10 }, 5);
        assert!(cache
            .add_future_proposal(
                validators(),
                Proposal {
                    proposer: "A".into(),
                    height: 5,
                    round: 0,
                    block: Arc::from(vec![]),
                    block_hash: Hash256::NIL,
                    pol_round: None,
                    wire: Arc::from(vec![]),
                },
            )
            .is_ok());
    }
}
