//! The per-room mixing engine.
//!
//! Every 20 ms tick: snapshot the tracks, pull at most one encoded frame per
//! source, decode, average, then render one mix per recipient with their own
//! contribution removed, re-encode and deliver. Codec state is persistent
//! per participant (one decoder per track, one encoder per recipient), so
//! the engine keeps coder maps keyed by participant and prunes them as the
//! snapshot changes.
//!
//! The engine never holds the room lock across codec work, and no failure of
//! one source or sink touches the others: decode, encode and delivery errors
//! are counted into the tick's [`TickReport`] and skipped.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tokio::time::MissedTickBehavior;

use crate::audio::codec::{CodecFactory, FrameDecoder, FrameEncoder};
use crate::audio::constants::MAX_OPUS_PACKET;
use crate::audio::mix::MixAccumulator;
use crate::common::{CodecError, ParticipantId};
use crate::room::track::{AudioPacket, TrackSink, TrackSource};
use crate::room::Room;

/// Typed per-tick diagnostics. Tests assert on these counts instead of log
/// output.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    /// Sources whose frame made it into the accumulator.
    pub contributors: usize,
    /// Sources skipped this tick: no frame ready.
    pub idle_sources: usize,
    pub decode_failures: usize,
    pub encode_failures: usize,
    pub delivery_failures: usize,
    /// Packets handed to a sink.
    pub delivered: usize,
    /// Whether any mix was produced (sequence/timestamp advanced).
    pub produced: bool,
    pub sequence: u16,
    pub timestamp: u32,
}

impl TickReport {
    pub fn failures(&self) -> usize {
        self.decode_failures + self.encode_failures + self.delivery_failures
    }
}

pub struct MixEngine {
    codec: Arc<dyn CodecFactory>,
    frame_samples: usize,
    samples_per_tick: u32,
    decoders: HashMap<ParticipantId, Box<dyn FrameDecoder>>,
    encoders: HashMap<ParticipantId, Box<dyn FrameEncoder>>,
    acc: MixAccumulator,
    /// Decoded frames of this tick, kept per contributor for exclude-self.
    contributions: Vec<(ParticipantId, Vec<i16>)>,
    scratch: Vec<i16>,
    mix_buf: Vec<i16>,
    packet_buf: Vec<u8>,
    sequence: u16,
    timestamp: u32,
}

impl MixEngine {
    pub fn new(codec: Arc<dyn CodecFactory>) -> Self {
        let params = codec.params();
        let frame_samples = params.frame_samples();
        Self {
            frame_samples,
            samples_per_tick: params.samples_per_tick() as u32,
            decoders: HashMap::new(),
            encoders: HashMap::new(),
            acc: MixAccumulator::new(frame_samples),
            contributions: Vec::new(),
            scratch: vec![0; frame_samples],
            mix_buf: vec![0; frame_samples],
            packet_buf: vec![0; MAX_OPUS_PACKET],
            sequence: 0,
            timestamp: 0,
            codec,
        }
    }

    /// Drive the engine until the room's stop token fires. Runs as one
    /// independent task per room.
    pub async fn run(mut self, room: Arc<Room>) {
        let params = self.codec.params();
        let mut interval = tokio::time::interval(Duration::from_millis(params.frame_ms as u64));
        // Burst catches up after a stall instead of widening packet gaps.
        interval.set_missed_tick_behavior(MissedTickBehavior::Burst);

        loop {
            tokio::select! {
                _ = room.stop_token().cancelled() => break,
                _ = interval.tick() => {
                    let sources = room.snapshot_sources();
                    let report = self.tick_with(&sources, || room.snapshot_sinks());
                    if report.failures() > 0 {
                        tracing::warn!(
                            room = %room.id(),
                            decode = report.decode_failures,
                            encode = report.encode_failures,
                            delivery = report.delivery_failures,
                            "tick completed with failures"
                        );
                    }
                }
            }
        }

        tracing::debug!(room = %room.id(), "mixing stopped");
    }

    /// One mixing cycle over point-in-time source and sink snapshots.
    pub fn tick(
        &mut self,
        sources: &[(ParticipantId, Arc<dyn TrackSource>)],
        sinks: &[(ParticipantId, Arc<dyn TrackSink>)],
    ) -> TickReport {
        self.tick_with(sources, || sinks.to_vec())
    }

    /// One mixing cycle. The sink snapshot is deferred until a mix was
    /// produced, so a member joining during codec work is already visible
    /// to this tick's delivery, and silent ticks take no snapshot at all.
    fn tick_with(
        &mut self,
        sources: &[(ParticipantId, Arc<dyn TrackSource>)],
        snapshot_sinks: impl FnOnce() -> Vec<(ParticipantId, Arc<dyn TrackSink>)>,
    ) -> TickReport {
        let mut report = TickReport::default();

        self.prune_decoders(sources);
        self.acc.reset();
        self.contributions.clear();

        for (id, source) in sources {
            let Some(frame) = source.poll_frame() else {
                report.idle_sources += 1;
                continue;
            };
            match self.decode_contribution(*id, &frame) {
                Ok(pcm) => {
                    self.acc.add(&pcm);
                    self.contributions.push((*id, pcm));
                    report.contributors += 1;
                }
                Err(err) => {
                    report.decode_failures += 1;
                    tracing::warn!(participant = %id, error = %err, "dropping undecodable frame");
                }
            }
        }

        report.produced = self.acc.contributors() > 0;
        if !report.produced {
            report.sequence = self.sequence;
            report.timestamp = self.timestamp;
            return report;
        }

        self.sequence = self.sequence.wrapping_add(1);
        self.timestamp = self.timestamp.wrapping_add(self.samples_per_tick);
        report.sequence = self.sequence;
        report.timestamp = self.timestamp;

        let sinks = snapshot_sinks();
        self.prune_encoders(&sinks);

        for (id, sink) in &sinks {
            let own = self
                .contributions
                .iter()
                .find(|(cid, _)| cid == id)
                .map(|(_, pcm)| pcm.as_slice());
            if self.acc.render_excluding(own, &mut self.mix_buf) == 0 {
                continue;
            }

            let encoder = match coder_entry(&mut self.encoders, *id, || self.codec.new_encoder()) {
                Ok(e) => e,
                Err(err) => {
                    report.encode_failures += 1;
                    tracing::warn!(participant = %id, error = %err, "encoder unavailable");
                    continue;
                }
            };
            let size = match encoder.encode(&self.mix_buf, &mut self.packet_buf) {
                Ok(size) => size,
                Err(err) => {
                    report.encode_failures += 1;
                    tracing::warn!(participant = %id, error = %err, "encode failed");
                    continue;
                }
            };

            let packet = AudioPacket {
                sequence: self.sequence,
                timestamp: self.timestamp,
                payload: Bytes::copy_from_slice(&self.packet_buf[..size]),
            };
            match sink.deliver(packet) {
                Ok(()) => report.delivered += 1,
                Err(err) => {
                    report.delivery_failures += 1;
                    tracing::warn!(participant = %id, error = %err, "delivery failed");
                }
            }
        }

        report
    }

    fn decode_contribution(
        &mut self,
        id: ParticipantId,
        frame: &Bytes,
    ) -> Result<Vec<i16>, CodecError> {
        let decoder = coder_entry(&mut self.decoders, id, || self.codec.new_decoder())?;
        let samples = decoder.decode(frame, &mut self.scratch)?;
        let got = samples * self.codec.params().channels as usize;
        if got != self.frame_samples {
            return Err(CodecError::BadFrameSize {
                got,
                expected: self.frame_samples,
            });
        }
        Ok(self.scratch.clone())
    }

    /// Drop decoder state for sources no longer in the snapshot.
    fn prune_decoders(&mut self, sources: &[(ParticipantId, Arc<dyn TrackSource>)]) {
        let live: HashSet<ParticipantId> = sources.iter().map(|(id, _)| *id).collect();
        self.decoders.retain(|id, _| live.contains(id));
    }

    /// Drop encoder state for recipients no longer in the snapshot.
    fn prune_encoders(&mut self, sinks: &[(ParticipantId, Arc<dyn TrackSink>)]) {
        let live: HashSet<ParticipantId> = sinks.iter().map(|(id, _)| *id).collect();
        self.encoders.retain(|id, _| live.contains(id));
    }
}

fn coder_entry<C>(
    map: &mut HashMap<ParticipantId, C>,
    id: ParticipantId,
    create: impl FnOnce() -> Result<C, CodecError>,
) -> Result<&mut C, CodecError> {
    use std::collections::hash_map::Entry;
    match map.entry(id) {
        Entry::Occupied(e) => Ok(e.into_mut()),
        Entry::Vacant(v) => Ok(v.insert(create()?)),
    }
}
