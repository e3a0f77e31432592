//! Unified error type for the Codeword server.

use codeword_protocol::ProtocolError;
use codeword_room::RoomError;
use codeword_transport::TransportError;

/// Top-level error wrapping every sub-crate error.
///
/// `#[from]` on each variant lets `?` lift sub-crate errors without
/// explicit mapping.
#[derive(Debug, thiserror::Error)]
pub enum CodewordError {
    /// Binding, accepting, or talking to a socket failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Bytes that would not encode or decode.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A room operation was rejected.
    #[error(transparent)]
    Room(#[from] RoomError),
}
