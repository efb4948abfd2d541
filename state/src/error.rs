use thiserror::Error;

/// Errors raised while admitting a vote into a [`crate::VoteSet`].
///
/// Every variant here is a "drop", never a propagating failure: callers
/// log it at the level described in the spec's error taxonomy and move on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VoteSetError {
    #[error("vote ({height}, {round}) does not match vote set ({expected_height}, {expected_round})")]
    MismatchedHeightRound {
        height: u64,
        round: u64,
        expected_height: u64,
        expected_round: u64,
    },
    #[error("voter {0:?} is not a member of the validator set")]
    UnknownVoter(String),
    #[error("voter {voter:?} already has a {vote_type:?} vote recorded for this round")]
    DuplicateVote {
        voter: String,
        vote_type: crate::VoteType,
    },
}

/// Errors raised by [`crate::ConsensusCore`] operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConsensusStateError {
    #[error("enterNewRound({0}) must advance past the current round {1}")]
    RoundDoesNotAdvance(u64, u64),
    #[error("step rank {0} does not advance past the current step rank {1}")]
    StepDoesNotAdvance(u8, u8),
    #[error("lock at round {0} does not advance past the current lock at round {1}")]
    LockDoesNotAdvance(u64, u64),
    #[error("cannot lock a round {0} beyond the current round {1}")]
    LockBeyondCurrentRound(u64, u64),
    #[error("valid round {0} does not advance past the current valid round {1}")]
    ValidDoesNotAdvance(u64, u64),
    #[error("proposal height {proposal_height} does not match the current height {height}")]
    ProposalHeightMismatch { proposal_height: u64, height: u64 },
}
