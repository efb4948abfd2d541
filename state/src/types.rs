use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// A stable identifier for a node. Validator sets and dispatch addressing
/// are both keyed on this.
pub type Id = String;

/// A monotonically increasing block height.
pub type Height = u64;

/// An attempt within a height to reach agreement. Resets to zero on every
/// new height.
pub type Round = u64;

/// Voting power, summed across a validator set to detect quorums.
pub type VotingPower = u64;

/// A 32-byte block hash. The all-zero value is the distinguished "nil"
/// hash used by votes cast against any proposal in a round.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Hash256(#[serde(with = "hex_bytes")] pub [u8; 32]);

impl Hash256 {
    pub const NIL: Hash256 = Hash256([0u8; 32]);

    pub fn is_nil(&self) -> bool {
        *self == Self::NIL
    }
}

impl fmt::Debug for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash256({})", hex::encode(self.0))
    }
}

impl fmt::Display for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_nil() {
            write!(f, "nil")
        } else {
            write!(f, "{}", hex::encode(self.0))
        }
    }
}

impl Default for Hash256 {
    fn default() -> Self {
        Self::NIL
    }
}

mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8; 32], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<[u8; 32], D::Error> {
        let s = String::deserialize(deserializer)?;
        let bytes = hex::decode(s).map_err(serde::de::Error::custom)?;
        bytes
            .try_into()
            .map_err(|_| serde::de::Error::custom("hash256 must be 32 bytes"))
    }
}

/// The two vote phases of the normal consensus protocol, plus their
/// "modify" counterparts. A [`VoteSet`](crate::VoteSet) tallies votes of a
/// single `VoteType` at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum VoteType {
    Prevote,
    Precommit,
    ModifyPrevote,
    ModifyPrecommit,
}

/// A proposer's block candidate for a (height, round). The block payload
/// itself is opaque to this crate; only its hash and the wire bytes used
/// for retransmission are inspected here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub proposer: Id,
    pub height: Height,
    pub round: Round,
    /// Opaque block payload; never interpreted by this crate.
    pub block: Arc<[u8]>,
    pub block_hash: Hash256,
    /// Proof-of-lock round: the round at which the proposer previously
    /// observed a prevote quorum on this block, if any.
    pub pol_round: Option<Round>,
    /// Serialized wire form, kept around for cheap retransmission.
    pub wire: Arc<[u8]>,
}

/// A single vote cast by a validator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    pub voter: Id,
    pub height: Height,
    pub round: Round,
    pub vote_type: VoteType,
    /// Possibly [`Hash256::NIL`].
    pub block_hash: Hash256,
}

/// An ordered, immutable set of validators for a single height. Shared
/// (never pointer-aliased-mutable) across the vote sets, states, and
/// future caches that need it for the duration of the height.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorSet {
    validators: Vec<(Id, VotingPower)>,
}

impl ValidatorSet {
    pub fn new(validators: Vec<(Id, VotingPower)>) -> Self {
        ValidatorSet { validators }
    }

    pub fn total_power(&self) -> VotingPower {
        self.validators.iter().map(|(_, power)| power).sum()
    }

    pub fn power_of(&self, id: &str) -> Option<VotingPower> {
        self.validators
            .iter()
            .find(|(validator, _)| validator == id)
            .map(|(_, power)| *power)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.validators.iter().any(|(validator, _)| validator == id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &Id> {
        self.validators.iter().map(|(id, _)| id)
    }

    pub fn len(&self) -> usize {
        self.validators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }

    /// The number of votes (by power) required for a strict two-thirds
    /// supermajority: `floor(2 * total / 3) + 1`.
    pub fn two_thirds_threshold(&self) -> VotingPower {
        self.total_power() * 2 / 3 + 1
    }
}
