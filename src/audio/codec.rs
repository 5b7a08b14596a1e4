//! Opus codec adapter.
//!
//! Wraps `audiopus` behind the [`FrameDecoder`] / [`FrameEncoder`] traits so
//! the mixer never touches the bindings directly and tests can substitute a
//! deterministic codec. Coder state is persistent per participant, which is
//! why the mixer asks the [`CodecFactory`] for a fresh instance per track.

use audiopus::coder::{Decoder as OpusDecoderInner, Encoder as OpusEncoderInner};
use audiopus::{Application, Bitrate, Channels, SampleRate};

use crate::common::CodecError;

/// Codec surface shared by the config layer and the mixing engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecParams {
    pub sample_rate: u32,
    pub channels: u8,
    pub frame_ms: u32,
}

impl CodecParams {
    /// Samples per channel advanced by one tick (the timestamp step).
    pub fn samples_per_tick(&self) -> usize {
        (self.sample_rate * self.frame_ms / 1000) as usize
    }

    /// Interleaved sample count of one fixed-size mixing frame.
    pub fn frame_samples(&self) -> usize {
        self.samples_per_tick() * self.channels as usize
    }

    fn opus_rate(&self) -> Result<SampleRate, CodecError> {
        match self.sample_rate {
            8_000 => Ok(SampleRate::Hz8000),
            12_000 => Ok(SampleRate::Hz12000),
            16_000 => Ok(SampleRate::Hz16000),
            24_000 => Ok(SampleRate::Hz24000),
            48_000 => Ok(SampleRate::Hz48000),
            other => Err(CodecError::UnsupportedSampleRate(other)),
        }
    }

    fn opus_channels(&self) -> Result<Channels, CodecError> {
        match self.channels {
            1 => Ok(Channels::Mono),
            2 => Ok(Channels::Stereo),
            other => Err(CodecError::UnsupportedChannels(other)),
        }
    }
}

/// Encoded packet → fixed-length interleaved i16 PCM.
pub trait FrameDecoder: Send {
    /// Returns the number of decoded samples per channel.
    fn decode(&mut self, packet: &[u8], pcm: &mut [i16]) -> Result<usize, CodecError>;
}

/// Interleaved i16 PCM → encoded packet. Returns the encoded byte count.
pub trait FrameEncoder: Send {
    fn encode(&mut self, pcm: &[i16], out: &mut [u8]) -> Result<usize, CodecError>;
}

/// Creates per-participant coder state for the mixing engine.
pub trait CodecFactory: Send + Sync {
    fn params(&self) -> CodecParams;
    fn new_decoder(&self) -> Result<Box<dyn FrameDecoder>, CodecError>;
    fn new_encoder(&self) -> Result<Box<dyn FrameEncoder>, CodecError>;
}

/// The production codec: Opus at the configured rate and channel layout.
pub struct OpusCodec {
    params: CodecParams,
    rate: SampleRate,
    channels: Channels,
}

impl OpusCodec {
    pub fn new(params: CodecParams) -> Result<Self, CodecError> {
        let rate = params.opus_rate()?;
        let channels = params.opus_channels()?;
        Ok(Self {
            params,
            rate,
            channels,
        })
    }
}

impl CodecFactory for OpusCodec {
    fn params(&self) -> CodecParams {
        self.params
    }

    fn new_decoder(&self) -> Result<Box<dyn FrameDecoder>, CodecError> {
        let decoder = OpusDecoderInner::new(self.rate, self.channels)?;
        Ok(Box::new(OpusFrameDecoder { decoder }))
    }

    fn new_encoder(&self) -> Result<Box<dyn FrameEncoder>, CodecError> {
        let mut encoder = OpusEncoderInner::new(self.rate, self.channels, Application::Audio)?;
        encoder.set_bitrate(Bitrate::Auto)?;
        Ok(Box::new(OpusFrameEncoder { encoder }))
    }
}

struct OpusFrameDecoder {
    decoder: OpusDecoderInner,
}

impl FrameDecoder for OpusFrameDecoder {
    fn decode(&mut self, packet: &[u8], pcm: &mut [i16]) -> Result<usize, CodecError> {
        Ok(self.decoder.decode(Some(packet), pcm, false)?)
    }
}

struct OpusFrameEncoder {
    encoder: OpusEncoderInner,
}

impl FrameEncoder for OpusFrameEncoder {
    fn encode(&mut self, pcm: &[i16], out: &mut [u8]) -> Result<usize, CodecError> {
        Ok(self.encoder.encode(pcm, out)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::constants::{FRAME_SIZE_SAMPLES, MAX_OPUS_PACKET, SAMPLES_PER_TICK};

    fn default_params() -> CodecParams {
        CodecParams {
            sample_rate: 48_000,
            channels: 2,
            frame_ms: 20,
        }
    }

    #[test]
    fn params_derive_frame_geometry() {
        let p = default_params();
        assert_eq!(p.samples_per_tick(), SAMPLES_PER_TICK);
        assert_eq!(p.frame_samples(), FRAME_SIZE_SAMPLES);
    }

    #[test]
    fn rejects_unsupported_rate() {
        let mut p = default_params();
        p.sample_rate = 44_100;
        assert!(matches!(
            OpusCodec::new(p),
            Err(CodecError::UnsupportedSampleRate(44_100))
        ));
    }

    #[test]
    fn rejects_unsupported_channels() {
        let mut p = default_params();
        p.channels = 3;
        assert!(matches!(
            OpusCodec::new(p),
            Err(CodecError::UnsupportedChannels(3))
        ));
    }

    #[test]
    fn encode_decode_preserves_frame_length() {
        let codec = OpusCodec::new(default_params()).unwrap();
        let mut encoder = codec.new_encoder().unwrap();
        let mut decoder = codec.new_decoder().unwrap();

        // 440 Hz-ish ramp, interleaved stereo.
        let pcm: Vec<i16> = (0..FRAME_SIZE_SAMPLES)
            .map(|i| ((i % 64) as i16 - 32) * 128)
            .collect();

        let mut packet = vec![0u8; MAX_OPUS_PACKET];
        let size = encoder.encode(&pcm, &mut packet).unwrap();
        assert!(size > 0);

        let mut out = vec![0i16; FRAME_SIZE_SAMPLES];
        let samples = decoder.decode(&packet[..size], &mut out).unwrap();
        assert_eq!(samples, SAMPLES_PER_TICK);
    }

    #[test]
    fn decode_rejects_garbage_packet() {
        let codec = OpusCodec::new(default_params()).unwrap();
        let mut decoder = codec.new_decoder().unwrap();
        let mut out = vec![0i16; FRAME_SIZE_SAMPLES];
        // Code-3 packet with a zero frame-count byte is invalid per RFC 6716.
        assert!(decoder.decode(&[0x03, 0x00], &mut out).is_err());
    }
}
