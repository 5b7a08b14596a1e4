use thiserror::Error;

/// Codec initialization and per-frame coding failures.
///
/// Initialization errors are fatal to room creation; per-frame decode/encode
/// errors are recovered locally by skipping that source or recipient for the
/// current tick.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("unsupported sample rate {0} Hz")]
    UnsupportedSampleRate(u32),

    #[error("unsupported channel count {0}")]
    UnsupportedChannels(u8),

    #[error(transparent)]
    Opus(#[from] audiopus::Error),

    /// Decoder produced a frame that violates the fixed-size contract.
    /// Such frames are rejected, never mixed.
    #[error("decoded frame has {got} samples, expected {expected}")]
    BadFrameSize { got: usize, expected: usize },

    #[error("{0}")]
    Failed(String),
}

/// Failure to hand an outbound packet to one recipient's sink.
/// Isolated to that recipient; never aborts the tick.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("sink queue full")]
    Backlogged,

    #[error("sink disconnected")]
    Disconnected,
}

/// Errors from the media-transport collaborator. Fatal to the owning session.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("negotiation failed: {0}")]
    Negotiation(String),

    #[error("transport unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum RoomError {
    /// The room observed zero members and tore itself down; nothing may be
    /// added to it afterwards.
    #[error("room is closed")]
    Closed,
}

/// Inbound signaling faults. A malformed payload terminates the connection;
/// an unrecognized message type is reported back and the connection lives on.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("malformed message: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("unrecognized message type `{0}`")]
    Unrecognized(String),
}
