pub mod codec;
pub mod constants;
pub mod mix;

pub use codec::{CodecFactory, CodecParams, FrameDecoder, FrameEncoder, OpusCodec};
pub use mix::MixAccumulator;
