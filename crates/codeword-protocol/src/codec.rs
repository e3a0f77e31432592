//! Codec trait and implementations for serializing client requests and
//! server messages.
//!
//! The handler never calls `serde_json` directly. It goes through a
//! [`Codec`], so the wire format can change without touching the game
//! code. Today the only implementation is [`JsonCodec`], because browser
//! clients speak JSON over WebSocket text frames.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// A codec that can encode Rust types to bytes and decode bytes back.
///
/// `Send + Sync + 'static` because one codec instance is shared by every
/// connection task for the lifetime of the server.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed or
    /// don't match the expected type.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// Output is always valid UTF-8, so the transport can ship it as a
/// WebSocket text frame.
///
/// ## Example
///
/// ```rust
/// use codeword_protocol::{ClientRequest, Codec, JsonCodec};
///
/// let codec = JsonCodec;
/// let bytes = codec.encode(&ClientRequest::RevealTile { index: 7 }).unwrap();
/// let decoded: ClientRequest = codec.decode(&bytes).unwrap();
/// assert_eq!(decoded, ClientRequest::RevealTile { index: 7 });
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}

#[cfg(all(test, feature = "json"))]
mod tests {
    use super::*;
    use crate::{ClientRequest, Notification, Team, Timestamp};

    #[test]
    fn test_json_codec_output_is_utf8() {
        let bytes = JsonCodec
            .encode(&Notification::TurnSwitched {
                turn_team: Team::Blue,
                turn_deadline: Timestamp(60_000),
            })
            .unwrap();
        assert!(std::str::from_utf8(&bytes).is_ok());
    }

    #[test]
    fn test_json_codec_decode_error_is_decode_variant() {
        let result: Result<ClientRequest, _> = JsonCodec.decode(b"{not json");
        assert!(matches!(result, Err(ProtocolError::Decode(_))));
    }
}
