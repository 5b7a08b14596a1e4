//! Media-transport boundary.
//!
//! Session negotiation, encryption and network traversal belong to an
//! external real-time media stack; the core only sees this trait. A session
//! forwards `offer`/`candidate` signaling here and wires the transport's
//! track handles into its room. [`channel::ChannelMediaTransport`] is the
//! in-process implementation used by the default wiring and the test
//! harness.

use std::sync::Arc;

use crate::common::TransportError;
use crate::room::track::{TrackSink, TrackSource};

pub mod channel;

pub use channel::{ChannelMediaTransport, ChannelTransportFactory};

/// Result of accepting a remote session description: the local answer plus
/// any connectivity candidates to trickle back over signaling.
#[derive(Debug, Clone)]
pub struct TransportAnswer {
    pub sdp: String,
    pub candidates: Vec<serde_json::Value>,
}

pub trait MediaTransport: Send + Sync {
    /// Apply the remote session description and produce the local answer.
    fn accept_offer(&self, sdp: &str) -> Result<TransportAnswer, TransportError>;

    /// Apply one remote connectivity candidate.
    fn add_remote_candidate(&self, candidate: &serde_json::Value) -> Result<(), TransportError>;

    /// Inbound encoded-audio handle for this connection.
    fn source(&self) -> Arc<dyn TrackSource>;

    /// Outbound encoded-audio handle for this connection.
    fn sink(&self) -> Arc<dyn TrackSink>;
}

/// Creates one transport per accepted connection.
pub trait TransportFactory: Send + Sync {
    fn create(&self) -> Result<Arc<dyn MediaTransport>, TransportError>;
}
