use crate::consensus_core::{ConsensusCore, ConsensusStateSnapshot, Modify, Step};
use crate::error::ConsensusStateError;
use crate::types::{Height, Id, Proposal, Round, ValidatorSet};
use crate::vote_set::HeightRoundVoteSet;
use std::sync::Arc;

/// Tracks the "modify" sub-protocol: a parallel BFT round over an
/// already-committed height, used to retroactively amend its block
/// header (spec §4.C).
///
/// Structurally this is `ConsensusCore<Modify>`; this facade renames the
/// accessors to the spec's Modify* vocabulary (`modify_block_height`
/// instead of `height`, `modify_header` instead of `proposal`, and so on)
/// since the original fragment gives them distinct names even though the
/// shape is identical to [`crate::ConsensusState`].
#[derive(Debug, Clone)]
pub struct ModifyRequestState(ConsensusCore<Modify>);

impl ModifyRequestState {
    pub fn new(id: Id, height: Height, validators: Arc<ValidatorSet>) -> Self {
        ModifyRequestState(ConsensusCore::new(id, height, validators))
    }

    pub fn id(&self) -> &str {
        self.0.id()
    }

    /// The committed height this modify request amends.
    pub fn modify_block_height(&self) -> Height {
        self.0.height()
    }

    pub fn modify_block_round(&self) -> Round {
        self.0.round()
    }

    pub fn modify_consensus_step(&self) -> Step {
        self.0.step()
    }

    /// The amended-header proposal for the current round, if any.
    pub fn modify_header(&self) -> Option<&Proposal> {
        self.0.proposal()
    }

    pub fn verifying_modify_proposal(&self) -> Option<&Proposal> {
        self.0.verifying_proposal()
    }

    pub fn locked_modify_round(&self) -> Option<Round> {
        self.0.locked_round()
    }

    pub fn locked_modify_proposal(&self) -> Option<&Proposal> {
        self.0.locked_proposal()
    }

    pub fn valid_modify_round(&self) -> Option<Round> {
        self.0.valid_round()
    }

    pub fn valid_modify_proposal(&self) -> Option<&Proposal> {
        self.0.valid_proposal()
    }

    pub fn validators(&self) -> &Arc<ValidatorSet> {
        self.0.validators()
    }

    pub fn vote_set(&mut self) -> &mut HeightRoundVoteSet {
        self.0.vote_set()
    }

    pub fn enter_new_round(&mut self, round: Round) -> Result<(), ConsensusStateError> {
        self.0.enter_new_round(round)
    }

    pub fn enter_step(&mut self, step: Step) -> Result<(), ConsensusStateError> {
        self.0.enter_step(step)
    }

    pub fn set_modify_header(&mut self, header: Proposal) -> bool {
        self.0.set_proposal(header)
    }

    pub fn set_verifying_modify_proposal(&mut self, proposal: Option<Proposal>) {
        self.0.set_verifying_proposal(proposal)
    }

    pub fn lock(&mut self, round: Round, proposal: Proposal) -> Result<(), ConsensusStateError> {
        self.0.lock(round, proposal)
    }

    pub fn update_valid(
        &mut self,
        round: Round,
        proposal: Proposal,
    ) -> Result<(), ConsensusStateError> {
        self.0.update_valid(round, proposal)
    }

    pub fn to_snapshot(&self) -> ConsensusStateSnapshot {
        self.0.to_snapshot()
    }

    pub fn from_snapshot(
        snapshot: ConsensusStateSnapshot,
        validators: Arc<ValidatorSet>,
    ) -> Self {
        ModifyRequestState(ConsensusCore::from_snapshot(snapshot, validators))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Hash256, Vote, VoteType};

    fn validators() -> Arc<ValidatorSet> {
        Arc::new(ValidatorSet::new(vec![
            ("A".into(), 1),
            ("B".into(), 1),
            ("C".into(), 1),
            ("D".into(), 1),
        ]))
    }

    #[test]
    fn mirrors_consensus_state_shape_with_modify_vote_types() {
        let mut state = ModifyRequestState::new("A".into(), 10, validators());
        assert_eq!(state.modify_block_height(), 10);
        assert_eq!(state.modify_block_round(), 0);

        let hash = Hash256({
            let mut b = [0u8; 32];
            b[0] = 9;
            b
        });
        for voter in ["A", "B", "C"] {
            state
                .vote_set()
                .add_vote(Vote {
                    voter: voter.into(),
                    height: 10,
                    round: 0,
                    vote_type: VoteType::ModifyPrevote,
                    block_hash: hash,
                })
                .unwrap();
        }
        assert_eq!(
            state
                .vote_set()
                .round_vote_set(0)
                .two_thirds_majority(VoteType::ModifyPrevote),
            Some(hash)
        );
        // The standard Prevote type is a distinct tally; no crossing there.
        assert_eq!(
            state
                .vote_set()
                .round_vote_set(0)
                .two_thirds_majority(VoteType::Prevote),
            None
        );
    }
}
