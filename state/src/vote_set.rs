use crate::error::VoteSetError;
use crate::types::{Hash256, Height, Id, Round, ValidatorSet, Vote, VoteType, VotingPower};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Per-type tally for one (height, round) vote set: which validator voted
/// for which hash, and the running voting-power totals per hash.
///
/// The `two_thirds` field pins the *first* hash observed to cross the
/// threshold for this type: once set it is never displaced, matching the
/// spec's tie-break rule for the adversarial (non-honest-majority) case.
#[derive(Debug, Clone, Default)]
struct TypeTally {
    votes_by_voter: HashMap<Id, Vote>,
    power_by_hash: HashMap<Hash256, VotingPower>,
    total_power: VotingPower,
    two_thirds: Option<Hash256>,
}

/// Quorum detection over votes cast for a single, fixed (height, round).
///
/// This is component A of the spec: admits votes of any of the four
/// [`VoteType`]s, independently tallied, and answers quorum queries per
/// type.
#[derive(Debug, Clone)]
pub struct VoteSet {
    height: Height,
    round: Round,
    validators: Arc<ValidatorSet>,
    tallies: BTreeMap<VoteType, TypeTally>,
}

impl VoteSet {
    pub fn new(height: Height, round: Round, validators: Arc<ValidatorSet>) -> Self {
        VoteSet {
            height,
            round,
            validators,
            tallies: BTreeMap::new(),
        }
    }

    pub fn height(&self) -> Height {
        self.height
    }

    pub fn round(&self) -> Round {
        self.round
    }

    /// Admits `vote` if it matches this vote set's (height, round), the
    /// voter is a known validator, and no vote of the same type has
    /// already been recorded for that voter. Returns `Ok(true)` if the
    /// vote was newly admitted.
    pub fn add_vote(&mut self, vote: Vote) -> Result<bool, VoteSetError> {
        if vote.height != self.height || vote.round != self.round {
            return Err(VoteSetError::MismatchedHeightRound {
                height: vote.height,
                round: vote.round,
                expected_height: self.height,
                expected_round: self.round,
            });
        }
        let power = self
            .validators
            .power_of(&vote.voter)
            .ok_or_else(|| VoteSetError::UnknownVoter(vote.voter.clone()))?;

        let tally = self.tallies.entry(vote.vote_type).or_default();
        if tally.votes_by_voter.contains_key(&vote.voter) {
            return Err(VoteSetError::DuplicateVote {
                voter: vote.voter,
                vote_type: vote.vote_type,
            });
        }

        let hash = vote.block_hash;
        tally.total_power += power;
        let hash_power = tally.power_by_hash.entry(hash).or_insert(0);
        *hash_power += power;
        let crossed = *hash_power >= self.validators.two_thirds_threshold();
        if crossed && tally.two_thirds.is_none() {
            tally.two_thirds = Some(hash);
        }
        tally.votes_by_voter.insert(vote.voter.clone(), vote);
        Ok(true)
    }

    /// The hash (possibly [`Hash256::NIL`]) that first crossed the
    /// two-thirds threshold for `vote_type`, if any.
    pub fn two_thirds_majority(&self, vote_type: VoteType) -> Option<Hash256> {
        self.tallies.get(&vote_type).and_then(|t| t.two_thirds)
    }

    /// Whether the total voting power of `vote_type` votes, summed across
    /// every hash (including nil), reaches two-thirds.
    pub fn has_two_thirds_any(&self, vote_type: VoteType) -> bool {
        self.tallies
            .get(&vote_type)
            .map(|t| t.total_power >= self.validators.two_thirds_threshold())
            .unwrap_or(false)
    }

    /// The vote cast by `voter` of the given type, if any.
    pub fn vote_by(&self, vote_type: VoteType, voter: &str) -> Option<&Vote> {
        self.tallies
            .get(&vote_type)
            .and_then(|t| t.votes_by_voter.get(voter))
    }

    pub fn voting_power_for(&self, vote_type: VoteType, hash: Hash256) -> VotingPower {
        self.tallies
            .get(&vote_type)
            .and_then(|t| t.power_by_hash.get(&hash).copied())
            .unwrap_or(0)
    }
}

/// A mapping from round to [`VoteSet`] for a single height: the
/// "height-round vote set" of the spec's data model.
#[derive(Debug, Clone)]
pub struct HeightRoundVoteSet {
    height: Height,
    validators: Arc<ValidatorSet>,
    rounds: BTreeMap<Round, VoteSet>,
}

impl HeightRoundVoteSet {
    pub fn new(height: Height, validators: Arc<ValidatorSet>) -> Self {
        HeightRoundVoteSet {
            height,
            validators,
            rounds: BTreeMap::new(),
        }
    }

    pub fn height(&self) -> Height {
        self.height
    }

    /// Returns the vote set for `round`, creating an empty one on first
    /// access.
    pub fn round_vote_set(&mut self, round: Round) -> &mut VoteSet {
        self.rounds
            .entry(round)
            .or_insert_with(|| VoteSet::new(self.height, round, Arc::clone(&self.validators)))
    }

    pub fn get_round_vote_set(&self, round: Round) -> Option<&VoteSet> {
        self.rounds.get(&round)
    }

    pub fn add_vote(&mut self, vote: Vote) -> Result<bool, VoteSetError> {
        if vote.height != self.height {
            return Err(VoteSetError::MismatchedHeightRound {
                height: vote.height,
                round: vote.round,
                expected_height: self.height,
                expected_round: vote.round,
            });
        }
        self.round_vote_set(vote.round).add_vote(vote)
    }
}
