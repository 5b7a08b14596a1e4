//! Per-participant audio handles.
//!
//! A [`TrackSource`] yields the next inbound encoded frame without blocking;
//! a [`TrackSink`] accepts one outbound packet per tick. Both sides are
//! backed by `flume` channels so the transport layer and the mixer never
//! share locks.

use bytes::Bytes;
use std::sync::Arc;

use crate::common::DeliveryError;

/// One encoded frame of mixed room audio, stamped with the room-scoped
/// packet framing. Every sink of a given tick sees the same sequence number
/// and timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioPacket {
    pub sequence: u16,
    pub timestamp: u32,
    pub payload: Bytes,
}

/// Inbound encoded-audio handle. `poll_frame` must return immediately: a
/// source with nothing buffered reports `None` rather than stall the tick
/// for the rest of the room.
pub trait TrackSource: Send + Sync {
    fn poll_frame(&self) -> Option<Bytes>;
}

/// Outbound encoded-audio handle, one per member.
pub trait TrackSink: Send + Sync {
    fn deliver(&self, packet: AudioPacket) -> Result<(), DeliveryError>;
}

/// Channel-backed source fed by the transport's receive path.
pub struct ChannelTrackSource {
    rx: flume::Receiver<Bytes>,
}

impl ChannelTrackSource {
    /// Returns the feed handle and the source.
    pub fn channel(capacity: usize) -> (flume::Sender<Bytes>, Arc<Self>) {
        let (tx, rx) = flume::bounded(capacity);
        (tx, Arc::new(Self { rx }))
    }
}

impl TrackSource for ChannelTrackSource {
    fn poll_frame(&self) -> Option<Bytes> {
        self.rx.try_recv().ok()
    }
}

/// Channel-backed sink drained by the transport's send path. The queue is
/// bounded: a recipient whose transport stalls loses packets, not the room.
pub struct ChannelTrackSink {
    tx: flume::Sender<AudioPacket>,
}

impl ChannelTrackSink {
    /// Returns the sink and the drain handle.
    pub fn channel(capacity: usize) -> (Arc<Self>, flume::Receiver<AudioPacket>) {
        let (tx, rx) = flume::bounded(capacity);
        (Arc::new(Self { tx }), rx)
    }
}

impl TrackSink for ChannelTrackSink {
    fn deliver(&self, packet: AudioPacket) -> Result<(), DeliveryError> {
        self.tx.try_send(packet).map_err(|e| match e {
            flume::TrySendError::Full(_) => DeliveryError::Backlogged,
            flume::TrySendError::Disconnected(_) => DeliveryError::Disconnected,
        })
    }
}
