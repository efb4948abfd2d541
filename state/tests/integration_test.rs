use std::sync::Arc;
use tbft_state::{ConsensusState, Hash256, Proposal, ValidatorSet, Vote, VoteType};

fn validators() -> Arc<ValidatorSet> {
    Arc::new(ValidatorSet::new(vec![
        ("A".into(), 1),
        ("B".into(), 1),
        ("C".into(), 1),
        ("D".into(), 1),
    ]))
}

fn hash(byte: u8) -> Hash256 {
    let mut bytes = [0u8; 32];
    bytes[0] = byte;
    Hash256(bytes)
}

fn vote(voter: &str, vote_type: VoteType, block_hash: Hash256) -> Vote {
    Vote {
        voter: voter.into(),
        height: 1,
        round: 0,
        vote_type,
        block_hash,
    }
}

/// Scenario 2 of spec §8: a byzantine split between two candidate blocks
/// prevents either from reaching a ⅔ majority, so the node falls back to
/// precommitting nil and enters a new round.
#[test]
fn byzantine_split_falls_back_to_nil_precommit_and_new_round() {
    let mut state = ConsensusState::new("A".into(), 1, validators());
    let proposal = Proposal {
        proposer: "A".into(),
        height: 1,
        round: 0,
        block: Arc::from(vec![]),
        block_hash: hash(1),
        pol_round: None,
        wire: Arc::from(vec![]),
    };
    assert!(state.set_proposal(proposal.clone()));

    for (voter, h) in [("A", hash(1)), ("B", hash(1)), ("C", hash(2)), ("D", hash(2))] {
        state
            .vote_set()
            .add_vote(vote(voter, VoteType::Prevote, h))
            .unwrap();
    }

    {
        let round_votes = state.vote_set().round_vote_set(0);
        assert_eq!(round_votes.two_thirds_majority(VoteType::Prevote), None);
        assert!(
            round_votes.has_two_thirds_any(VoteType::Prevote),
            "every validator did vote, just not for the same hash"
        );
    }

    // No polka: the driver precommits nil rather than locking either block.
    for voter in ["A", "B", "C", "D"] {
        state
            .vote_set()
            .add_vote(vote(voter, VoteType::Precommit, Hash256::NIL))
            .unwrap();
    }
    assert_eq!(
        state
            .vote_set()
            .round_vote_set(0)
            .two_thirds_majority(VoteType::Precommit),
        Some(Hash256::NIL)
    );
    assert!(state.locked_proposal().is_none(), "no polka, no lock");

    state.enter_new_round(1).unwrap();
    assert_eq!(state.round(), 1);
    assert!(state.proposal().is_none(), "new round clears the per-round proposal");
}
