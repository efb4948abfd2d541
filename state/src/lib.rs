//! Core BFT state machinery for a Tendermint-style consensus participant.
//!
//! This crate holds the leaf algorithms: vote aggregation (quorum
//! detection) and the per-height round-state machine, both for the normal
//! consensus protocol and for its "modify" sibling. Everything that talks
//! to the network, a timer wheel, or a block store lives one layer up, in
//! `tbft-consensus`.

mod consensus_core;
mod consensus_state;
mod error;
mod modify_state;
mod types;
mod vote_set;

pub use consensus_core::{ConsensusCore, Modify, Standard, Step, VoteKind};
pub use consensus_state::ConsensusState;
pub use error::{ConsensusStateError, VoteSetError};
pub use modify_state::ModifyRequestState;
pub use types::{Hash256, Height, Id, Proposal, Round, Vote, ValidatorSet, VoteType, VotingPower};
pub use vote_set::{HeightRoundVoteSet, VoteSet};
