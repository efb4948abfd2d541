//! Consensus runtime glue that sits on top of `tbft-state`: the
//! future-message cache, the historical-state cache, and the outbound
//! message dispatcher.
//!
//! The pure state machine (vote sets, consensus state, modify-request
//! state) lives in the `tbft-state` crate; this crate is concerned with
//! everything that has a lifetime or an I/O edge attached to it.

mod bus;
mod config;
mod dispatch;
mod error;
mod future_cache;
mod historical_cache;

pub use bus::{Envelope, EnvelopeType, MessageBus, RecordingBus, SEND_CONSENSUS_MSG_TOPIC};
pub use config::{FutureCacheConfig, HistoricalCacheConfig};
pub use dispatch::{Dispatcher, TBFTMsg};
pub use error::{CacheError, DispatchError};
pub use future_cache::{FutureCacheKind, FutureMsgCache};
pub use historical_cache::{HeightKeyed, HistoricalStateCache};

/// Composition-root error type for callers that drive this crate's
/// components together and need to bubble up a single error type (e.g. a
/// cache rejection alongside a dispatch failure) without a shared enum.
pub type Error = eyre::Error;
pub type Result<T> = eyre::Result<T>;
