//! Error types for the protocol layer.
//!
//! Each crate in Codeword defines its own error enum. A `ProtocolError`
//! always means a problem with the shape of data: bytes that don't decode,
//! or an identifier that doesn't meet the rules for room codes and
//! usernames. Game rule violations live in the room layer.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning bytes into a Rust type).
    ///
    /// Common causes: malformed JSON, an unknown `"type"` tag, or a
    /// missing field in a client request.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// A room code or username that breaks the identifier rules.
    #[error("invalid {field}: {reason}")]
    InvalidIdentifier {
        /// Which identifier was rejected (`"room code"`, `"username"`).
        field: &'static str,
        /// Human-readable reason, safe to show to the client.
        reason: String,
    },
}
