//! Signaling protocol: closed tagged enums for every message the server
//! understands, decoded once and matched exhaustively. No untyped payload
//! dispatch — an unknown field set is a parse error, and an unknown `type`
//! is reported without tearing the connection down.

use serde::{Deserialize, Serialize};

use crate::common::ProtocolError;

/// Client → server messages.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClientMessage {
    /// Bind the session to a room and set the display name.
    Join { name: String, room: String },
    /// SDP offer for the media-transport collaborator; answered in-band.
    Offer { sdp: String },
    /// Connectivity candidate for the media-transport collaborator.
    Candidate { candidate: serde_json::Value },
    /// Explicit leave.
    Disconnect,
}

/// Server → client messages.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ServerMessage {
    Answer { sdp: String },
    Candidate { candidate: serde_json::Value },
    /// Current display names, pushed after any membership change.
    Participants { list: Vec<String> },
    Error { message: String },
}

const KNOWN_TYPES: &[&str] = &["join", "offer", "candidate", "disconnect"];

/// Decode one inbound message, separating the two protocol fault modes:
/// a recognized `type` with a bad payload is [`ProtocolError::Malformed`]
/// (fatal to the connection), an unknown `type` in otherwise valid JSON is
/// [`ProtocolError::Unrecognized`] (reported, connection lives on).
pub fn parse_client_message(raw: &str) -> Result<ClientMessage, ProtocolError> {
    match serde_json::from_str::<ClientMessage>(raw) {
        Ok(msg) => Ok(msg),
        Err(err) => {
            #[derive(Deserialize)]
            struct Envelope {
                #[serde(rename = "type")]
                kind: String,
            }
            match serde_json::from_str::<Envelope>(raw) {
                Ok(env) if !KNOWN_TYPES.contains(&env.kind.as_str()) => {
                    Err(ProtocolError::Unrecognized(env.kind))
                }
                _ => Err(ProtocolError::Malformed(err)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_inbound_type() {
        assert_eq!(
            parse_client_message(r#"{"type":"join","name":"Alice","room":"r1"}"#).unwrap(),
            ClientMessage::Join {
                name: "Alice".into(),
                room: "r1".into()
            }
        );
        assert_eq!(
            parse_client_message(r#"{"type":"offer","sdp":"v=0"}"#).unwrap(),
            ClientMessage::Offer { sdp: "v=0".into() }
        );
        assert!(matches!(
            parse_client_message(r#"{"type":"candidate","candidate":{"sdpMid":"0"}}"#).unwrap(),
            ClientMessage::Candidate { .. }
        ));
        assert_eq!(
            parse_client_message(r#"{"type":"disconnect"}"#).unwrap(),
            ClientMessage::Disconnect
        );
    }

    #[test]
    fn unknown_type_is_unrecognized_not_malformed() {
        match parse_client_message(r#"{"type":"mute","on":true}"#) {
            Err(ProtocolError::Unrecognized(kind)) => assert_eq!(kind, "mute"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn known_type_with_bad_payload_is_malformed() {
        assert!(matches!(
            parse_client_message(r#"{"type":"join","room":"r1"}"#),
            Err(ProtocolError::Malformed(_))
        ));
    }

    #[test]
    fn broken_json_is_malformed() {
        assert!(matches!(
            parse_client_message("{not json"),
            Err(ProtocolError::Malformed(_))
        ));
    }

    #[test]
    fn outbound_wire_shape_matches_the_protocol() {
        let json = serde_json::to_string(&ServerMessage::Participants {
            list: vec!["Alice".into(), "Bob".into()],
        })
        .unwrap();
        assert_eq!(json, r#"{"type":"participants","list":["Alice","Bob"]}"#);

        let json = serde_json::to_string(&ServerMessage::Answer { sdp: "v=0".into() }).unwrap();
        assert_eq!(json, r#"{"type":"answer","sdp":"v=0"}"#);
    }
}
