use crate::error::ConsensusStateError;
use crate::types::{Height, Id, Proposal, Round, ValidatorSet};
use crate::vote_set::HeightRoundVoteSet;
use serde::{Deserialize, Serialize};
use std::marker::PhantomData;
use std::sync::Arc;

/// The discrete phase within a round.
///
/// This single enumeration serves both the normal consensus protocol and
/// the modify sub-protocol; the two are structurally identical (spec §3),
/// so there is no separate `ModifyStep` type — only the `VoteKind` the
/// surrounding [`ConsensusCore`] is parameterized over differs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Step {
    NewHeight,
    NewRound,
    Propose,
    Prevote,
    PrevoteWait,
    Precommit,
    PrecommitWait,
    Commit,
}

impl Step {
    /// Rank within a round's lattice. Used to enforce that a step only
    /// ever advances forward within a round (invariant: step may only
    /// regress by entering a strictly higher round).
    fn rank(self) -> u8 {
        match self {
            Step::NewHeight => 0,
            Step::NewRound => 1,
            Step::Propose => 2,
            Step::Prevote => 3,
            Step::PrevoteWait => 4,
            Step::Precommit => 5,
            Step::PrecommitWait => 6,
            Step::Commit => 7,
        }
    }
}

/// Tags the two vote-type pairs a [`ConsensusCore`] can be instantiated
/// over: the normal protocol, and the "modify" sub-protocol that amends an
/// already-committed block header.
pub trait VoteKind: Clone + std::fmt::Debug {
    const PREVOTE: crate::types::VoteType;
    const PRECOMMIT: crate::types::VoteType;
}

/// The normal consensus protocol's vote types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Standard;

impl VoteKind for Standard {
    const PREVOTE: crate::types::VoteType = crate::types::VoteType::Prevote;
    const PRECOMMIT: crate::types::VoteType = crate::types::VoteType::Precommit;
}

/// The modify sub-protocol's vote types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Modify;

impl VoteKind for Modify {
    const PREVOTE: crate::types::VoteType = crate::types::VoteType::ModifyPrevote;
    const PRECOMMIT: crate::types::VoteType = crate::types::VoteType::ModifyPrecommit;
}

/// The driver-visible subset of [`ConsensusCore`]'s state, as produced by
/// [`ConsensusCore::to_snapshot`]. This is the "wire-form snapshot" of
/// spec §4.B; the height-round vote set is not part of it; it is
/// component A, addressed separately by the driver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsensusStateSnapshot {
    pub id: Id,
    pub height: Height,
    pub round: Round,
    pub step: Step,
    pub proposal: Option<Proposal>,
    pub verifying_proposal: Option<Proposal>,
    pub locked_round: Option<Round>,
    pub locked_proposal: Option<Proposal>,
    pub valid_round: Option<Round>,
    pub valid_proposal: Option<Proposal>,
}

/// Generic per-height driver state, parameterized by [`VoteKind`].
///
/// [`crate::ConsensusState`] is `ConsensusCore<Standard>`;
/// [`crate::ModifyRequestState`] wraps `ConsensusCore<Modify>`. Factoring
/// both as one generic machine (spec §9 re-architecture guidance) avoids
/// duplicating the step lattice and lock/valid bookkeeping twice.
#[derive(Debug, Clone)]
pub struct ConsensusCore<K: VoteKind> {
    id: Id,
    height: Height,
    round: Round,
    step: Step,
    proposal: Option<Proposal>,
    verifying_proposal: Option<Proposal>,
    locked_round: Option<Round>,
    locked_proposal: Option<Proposal>,
    valid_round: Option<Round>,
    valid_proposal: Option<Proposal>,
    vote_set: HeightRoundVoteSet,
    validators: Arc<ValidatorSet>,
    _kind: PhantomData<K>,
}

impl<K: VoteKind> ConsensusCore<K> {
    pub fn new(id: Id, height: Height, validators: Arc<ValidatorSet>) -> Self {
        ConsensusCore {
            id,
            height,
            round: 0,
            step: Step::NewHeight,
            proposal: None,
            verifying_proposal: None,
            locked_round: None,
            locked_proposal: None,
            valid_round: None,
            valid_proposal: None,
            vote_set: HeightRoundVoteSet::new(height, Arc::clone(&validators)),
            validators,
            _kind: PhantomData,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn height(&self) -> Height {
        self.height
    }

    pub fn round(&self) -> Round {
        self.round
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn proposal(&self) -> Option<&Proposal> {
        self.proposal.as_ref()
    }

    pub fn verifying_proposal(&self) -> Option<&Proposal> {
        self.verifying_proposal.as_ref()
    }

    pub fn locked_round(&self) -> Option<Round> {
        self.locked_round
    }

    pub fn locked_proposal(&self) -> Option<&Proposal> {
        self.locked_proposal.as_ref()
    }

    pub fn valid_round(&self) -> Option<Round> {
        self.valid_round
    }

    pub fn valid_proposal(&self) -> Option<&Proposal> {
        self.valid_proposal.as_ref()
    }

    pub fn validators(&self) -> &Arc<ValidatorSet> {
        &self.validators
    }

    /// The height-round vote set (component A) owned by this state.
    pub fn vote_set(&mut self) -> &mut HeightRoundVoteSet {
        &mut self.vote_set
    }

    /// Resets to round zero for a new height. Per §9, a locked proposal
    /// does not survive a height advance: locks are round-scoped within a
    /// single height.
    pub fn enter_new_height(&mut self, height: Height, validators: Arc<ValidatorSet>) {
        log::info!("{}: entering height {height}", self.id);
        self.height = height;
        self.round = 0;
        self.step = Step::NewHeight;
        self.proposal = None;
        self.verifying_proposal = None;
        self.locked_round = None;
        self.locked_proposal = None;
        self.valid_round = None;
        self.valid_proposal = None;
        self.vote_set = HeightRoundVoteSet::new(height, Arc::clone(&validators));
        self.validators = validators;
    }

    /// Advances to a strictly higher round within the same height. Clears
    /// the per-round proposal/verifying-proposal; locked/valid survive.
    pub fn enter_new_round(&mut self, round: Round) -> Result<(), ConsensusStateError> {
        if round <= self.round && self.step != Step::NewHeight {
            return Err(ConsensusStateError::RoundDoesNotAdvance(round, self.round));
        }
        log::info!("{}: entering round {round} at height {}", self.id, self.height);
        self.round = round;
        self.step = Step::NewRound;
        self.proposal = None;
        self.verifying_proposal = None;
        Ok(())
    }

    /// Advances the step within the current round. Steps may only move
    /// forward (by rank) within a round; regression requires
    /// [`Self::enter_new_round`].
    pub fn enter_step(&mut self, step: Step) -> Result<(), ConsensusStateError> {
        if step.rank() <= self.step.rank() && step != Step::NewRound {
            return Err(ConsensusStateError::StepDoesNotAdvance(
                step.rank(),
                self.step.rank(),
            ));
        }
        log::info!("{}: step {:?} -> {step:?}", self.id, self.step);
        self.step = step;
        Ok(())
    }

    /// Records `proposal` as this round's proposal, iff it targets the
    /// current (height, round) and none is set yet. Returns whether it was
    /// recorded.
    pub fn set_proposal(&mut self, proposal: Proposal) -> bool {
        if proposal.height != self.height || proposal.round != self.round {
            return false;
        }
        if self.proposal.is_some() {
            return false;
        }
        self.proposal = Some(proposal);
        true
    }

    pub fn set_verifying_proposal(&mut self, proposal: Option<Proposal>) {
        self.verifying_proposal = proposal;
    }

    /// Locks `proposal` at `round`. A lock can only be replaced by one at
    /// a strictly higher round, and never beyond the current round
    /// (invariant 1 & 3 of spec §3).
    pub fn lock(
        &mut self,
        round: Round,
        proposal: Proposal,
    ) -> Result<(), ConsensusStateError> {
        if proposal.height != self.height {
            return Err(ConsensusStateError::ProposalHeightMismatch {
                proposal_height: proposal.height,
                height: self.height,
            });
        }
        if round > self.round {
            return Err(ConsensusStateError::LockBeyondCurrentRound(round, self.round));
        }
        if let Some(locked_round) = self.locked_round {
            if round <= locked_round {
                return Err(ConsensusStateError::LockDoesNotAdvance(round, locked_round));
            }
        }
        self.locked_round = Some(round);
        self.locked_proposal = Some(proposal);
        Ok(())
    }

    /// Records the highest round observed to carry a prevote quorum on a
    /// specific (non-nil) proposal.
    pub fn update_valid(
        &mut self,
        round: Round,
        proposal: Proposal,
    ) -> Result<(), ConsensusStateError> {
        if proposal.height != self.height {
            return Err(ConsensusStateError::ProposalHeightMismatch {
                proposal_height: proposal.height,
                height: self.height,
            });
        }
        if let Some(valid_round) = self.valid_round {
            if round <= valid_round {
                return Err(ConsensusStateError::ValidDoesNotAdvance(round, valid_round));
            }
        }
        self.valid_round = Some(round);
        self.valid_proposal = Some(proposal);
        Ok(())
    }

    /// Produces the wire-form snapshot used for retransmission and for
    /// admission into the historical state cache.
    pub fn to_snapshot(&self) -> ConsensusStateSnapshot {
        ConsensusStateSnapshot {
            id: self.id.clone(),
            height: self.height,
            round: self.round,
            step: self.step,
            proposal: self.proposal.clone(),
            verifying_proposal: self.verifying_proposal.clone(),
            locked_round: self.locked_round,
            locked_proposal: self.locked_proposal.clone(),
            valid_round: self.valid_round,
            valid_proposal: self.valid_proposal.clone(),
        }
    }

    /// Reconstructs a `ConsensusCore` from a snapshot. The height-round
    /// vote set starts empty: it is not part of the wire-form snapshot
    /// (see module docs), so a reconstructed state is only "equivalent"
    /// with respect to the driver-visible fields, not accumulated votes.
    pub fn from_snapshot(snapshot: ConsensusStateSnapshot, validators: Arc<ValidatorSet>) -> Self {
        ConsensusCore {
            id: snapshot.id,
            height: snapshot.height,
            round: snapshot.round,
            step: snapshot.step,
            proposal: snapshot.proposal,
            verifying_proposal: snapshot.verifying_proposal,
            locked_round: snapshot.locked_round,
            locked_proposal: snapshot.locked_proposal,
            valid_round: snapshot.valid_round,
            valid_proposal: snapshot.valid_proposal,
            vote_set: HeightRoundVoteSet::new(snapshot.height, Arc::clone(&validators)),
            validators,
            _kind: PhantomData,
        }
    }
}
