use crate::consensus_core::{ConsensusCore, ConsensusStateSnapshot, Standard, Step};
use crate::error::ConsensusStateError;
use crate::types::{Height, Id, Proposal, Round, ValidatorSet};
use crate::vote_set::HeightRoundVoteSet;
use std::sync::Arc;

/// Authoritative per-height driver state for the normal consensus
/// protocol (spec §4.B). A thin, spec-named facade over
/// [`ConsensusCore<Standard>`].
#[derive(Debug, Clone)]
pub struct ConsensusState(ConsensusCore<Standard>);

impl ConsensusState {
    pub fn new(id: Id, height: Height, validators: Arc<ValidatorSet>) -> Self {
        ConsensusState(ConsensusCore::new(id, height, validators))
    }

    pub fn id(&self) -> &str {
        self.0.id()
    }

    pub fn height(&self) -> Height {
        self.0.height()
    }

    pub fn round(&self) -> Round {
        self.0.round()
    }

    pub fn step(&self) -> Step {
        self.0.step()
    }

    pub fn proposal(&self) -> Option<&Proposal> {
        self.0.proposal()
    }

    pub fn verifying_proposal(&self) -> Option<&Proposal> {
        self.0.verifying_proposal()
    }

    pub fn locked_round(&self) -> Option<Round> {
        self.0.locked_round()
    }

    pub fn locked_proposal(&self) -> Option<&Proposal> {
        self.0.locked_proposal()
    }

    pub fn valid_round(&self) -> Option<Round> {
        self.0.valid_round()
    }

    pub fn valid_proposal(&self) -> Option<&Proposal> {
        self.0.valid_proposal()
    }

    pub fn validators(&self) -> &Arc<ValidatorSet> {
        self.0.validators()
    }

    pub fn vote_set(&mut self) -> &mut HeightRoundVoteSet {
        self.0.vote_set()
    }

    pub fn enter_new_height(&mut self, height: Height, validators: Arc<ValidatorSet>) {
        self.0.enter_new_height(height, validators)
    }

    pub fn enter_new_round(&mut self, round: Round) -> Result<(), ConsensusStateError> {
        self.0.enter_new_round(round)
    }

    pub fn enter_step(&mut self, step: Step) -> Result<(), ConsensusStateError> {
        self.0.enter_step(step)
    }

    pub fn set_proposal(&mut self, proposal: Proposal) -> bool {
        self.0.set_proposal(proposal)
    }

    pub fn set_verifying_proposal(&mut self, proposal: Option<Proposal>) {
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

    pub fn from_snapshot(snapshot: ConsensusStateSnapshot, validators: Arc<ValidatorSet>) -> Self {
        ConsensusState(ConsensusCore::from_snapshot(snapshot, validators))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Hash256;

    fn validators() -> Arc<ValidatorSet> {
        Arc::new(ValidatorSet::new(vec![
            ("A".into(), 1),
            ("B".into(), 1),
            ("C".into(), 1),
            ("D".into(), 1),
        ]))
    }

    #[test]
    fn happy_path_commit_scenario() {
        // Scenario 1 of spec §8: A proposes, all four prevote and
        // precommit the same block; the quorum is detectable via the
        // owning vote set at round 0.
        let mut state = ConsensusState::new("A".into(), 1, validators());
        let proposal = Proposal {
            proposer: "A".into(),
            height: 1,
            round: 0,
            block: Arc::from(vec![]),
            block_hash: Hash256({
                let mut b = [0u8; 32];
                b[0] = 1;
                b
            }),
            pol_round: None,
            wire: Arc::from(vec![]),
        };
        assert!(state.set_proposal(proposal.clone()));
        for voter in ["A", "B", "C", "D"] {
            state
                .vote_set()
                .add_vote(crate::types::Vote {
                    voter: voter.into(),
                    height: 1,
                    round: 0,
                    vote_type: crate::types::VoteType::Prevote,
                    block_hash: proposal.block_hash,
                })
                .unwrap();
        }
        assert_eq!(
            state
                .vote_set()
                .round_vote_set(0)
                .two_thirds_majority(crate::types::VoteType::Prevote),
            Some(proposal.block_hash)
        );
        state.lock(0, proposal.clone()).unwrap();
        state.enter_new_height(2, validators());
        assert!(state.locked_proposal().is_none(), "lock cleared on height advance");
    }
}
