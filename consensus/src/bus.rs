use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tbft_state::Id;

/// The single topic outbound dispatch publishes to.
pub const SEND_CONSENSUS_MSG_TOPIC: &str = "SendConsensusMsg";

/// The type tag of a transport envelope. Only one kind of payload crosses
/// this boundary today, but the tag is kept (rather than inferred from
/// context) because the bus is shared with non-consensus traffic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnvelopeType {
    ConsensusMsg,
}

/// The transport envelope published to the bus for each recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub payload: Vec<u8>,
    pub msg_type: EnvelopeType,
    pub to: Id,
}

/// A publish/subscribe facility the gossip/transport layer exposes to the
/// core. Fire-and-forget: `publish` does not report delivery, and the
/// core never retries a failed publish (spec §7, `BusUnavailable`).
#[async_trait]
pub trait MessageBus: Send + Sync {
    async fn publish(&self, topic: &str, envelope: Envelope);
}

/// An in-memory bus that records every publication it receives, used by
/// this crate's own tests and suitable for driving the dispatch component
/// in isolation before a real transport is wired in.
#[derive(Debug, Default)]
pub struct RecordingBus {
    published: parking_lot::Mutex<Vec<(String, Envelope)>>,
}

impl RecordingBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn published(&self) -> Vec<(String, Envelope)> {
        self.published.lock().clone()
    }
}

#[async_trait]
impl MessageBus for RecordingBus {
    async fn publish(&self, topic: &str, envelope: Envelope) {
        self.published.lock().push((topic.to_string(), envelope));
    }
}
