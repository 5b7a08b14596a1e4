//! Central constants for the audio pipeline.
//!
//! Default values for the configurable codec surface live here so the config
//! layer and the mixer agree on one set of numbers.

/// Default output sample rate (Hz).
pub const SAMPLE_RATE: u32 = 48_000;

/// Default channel count (interleaved stereo).
pub const CHANNELS: u8 = 2;

/// Default mixing cadence — one codec frame per tick (ms).
pub const FRAME_MS: u32 = 20;

/// Samples per channel per 20 ms tick at 48 kHz.
pub const SAMPLES_PER_TICK: usize = 960;

/// Interleaved samples per 20 ms stereo frame at 48 kHz (960 frames × 2 channels).
pub const FRAME_SIZE_SAMPLES: usize = SAMPLES_PER_TICK * CHANNELS as usize;

/// Scratch size for one encoded Opus packet.
pub const MAX_OPUS_PACKET: usize = 4_000;

/// Bounded outbound queue per sink, in packets (~1.3 s of audio).
pub const SINK_QUEUE_PACKETS: usize = 64;
