//! In-process media transport over `flume` channels.
//!
//! Carries encoded frames between a peer handle and the track handles
//! without any network or negotiation machinery: `accept_offer` records the
//! remote description and mirrors it back, which is all an in-process link
//! needs to complete the signaling handshake. The real-time media stack a
//! deployment plugs in implements [`MediaTransport`] against its own
//! connection type.

use std::sync::Arc;

use bytes::Bytes;
use parking_lot::Mutex;

use crate::audio::constants::SINK_QUEUE_PACKETS;
use crate::common::TransportError;
use crate::room::track::{AudioPacket, ChannelTrackSink, ChannelTrackSource, TrackSink, TrackSource};
use crate::transport::{MediaTransport, TransportAnswer, TransportFactory};

/// The far side of a [`ChannelMediaTransport`]: feeds inbound frames and
/// drains outbound packets. Handles are cheap clones of the underlying
/// channel ends.
#[derive(Clone)]
pub struct ChannelPeer {
    pub frames: flume::Sender<Bytes>,
    pub packets: flume::Receiver<AudioPacket>,
}

pub struct ChannelMediaTransport {
    source: Arc<ChannelTrackSource>,
    sink: Arc<ChannelTrackSink>,
    peer: ChannelPeer,
    remote_sdp: Mutex<Option<String>>,
    remote_candidates: Mutex<Vec<serde_json::Value>>,
}

impl ChannelMediaTransport {
    pub fn new(queue: usize) -> Self {
        let (frames, source) = ChannelTrackSource::channel(queue);
        let (sink, packets) = ChannelTrackSink::channel(queue);
        Self {
            source,
            sink,
            peer: ChannelPeer { frames, packets },
            remote_sdp: Mutex::new(None),
            remote_candidates: Mutex::new(Vec::new()),
        }
    }

    pub fn peer(&self) -> ChannelPeer {
        self.peer.clone()
    }

    pub fn remote_sdp(&self) -> Option<String> {
        self.remote_sdp.lock().clone()
    }

    pub fn remote_candidates(&self) -> Vec<serde_json::Value> {
        self.remote_candidates.lock().clone()
    }
}

impl Default for ChannelMediaTransport {
    fn default() -> Self {
        Self::new(SINK_QUEUE_PACKETS)
    }
}

impl MediaTransport for ChannelMediaTransport {
    fn accept_offer(&self, sdp: &str) -> Result<TransportAnswer, TransportError> {
        if sdp.is_empty() {
            return Err(TransportError::Negotiation("empty session description".into()));
        }
        *self.remote_sdp.lock() = Some(sdp.to_string());
        Ok(TransportAnswer {
            sdp: sdp.to_string(),
            candidates: Vec::new(),
        })
    }

    fn add_remote_candidate(&self, candidate: &serde_json::Value) -> Result<(), TransportError> {
        self.remote_candidates.lock().push(candidate.clone());
        Ok(())
    }

    fn source(&self) -> Arc<dyn TrackSource> {
        self.source.clone()
    }

    fn sink(&self) -> Arc<dyn TrackSink> {
        self.sink.clone()
    }
}

#[derive(Default)]
pub struct ChannelTransportFactory;

impl TransportFactory for ChannelTransportFactory {
    fn create(&self) -> Result<Arc<dyn MediaTransport>, TransportError> {
        Ok(Arc::new(ChannelMediaTransport::default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frames_flow_peer_to_source() {
        let transport = ChannelMediaTransport::new(4);
        let peer = transport.peer();
        peer.frames.send(Bytes::from_static(b"opus")).unwrap();
        assert_eq!(transport.source().poll_frame().unwrap().as_ref(), b"opus");
    }

    #[test]
    fn packets_flow_sink_to_peer() {
        let transport = ChannelMediaTransport::new(4);
        let peer = transport.peer();
        let packet = AudioPacket {
            sequence: 3,
            timestamp: 2880,
            payload: Bytes::from_static(b"mix"),
        };
        transport.sink().deliver(packet.clone()).unwrap();
        assert_eq!(peer.packets.try_recv().unwrap(), packet);
    }

    #[test]
    fn negotiation_records_remote_state() {
        let transport = ChannelMediaTransport::new(4);
        let answer = transport.accept_offer("v=0").unwrap();
        assert_eq!(answer.sdp, "v=0");
        assert_eq!(transport.remote_sdp().as_deref(), Some("v=0"));

        transport
            .add_remote_candidate(&serde_json::json!({"candidate": "udp 1"}))
            .unwrap();
        assert_eq!(transport.remote_candidates().len(), 1);

        assert!(transport.accept_offer("").is_err());
    }
}
