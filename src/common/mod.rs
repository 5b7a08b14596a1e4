pub mod errors;
pub mod types;

pub use errors::{CodecError, DeliveryError, ProtocolError, RoomError, TransportError};
pub use types::{ParticipantId, RoomId};
