use std::io;

/// Errors that can occur in the transport layer.
///
/// Library errors from the WebSocket stack are carried as `io::Error` so
/// this enum doesn't change with the transport implementation.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The listening socket could not be opened.
    #[error("bind failed: {0}")]
    Bind(#[source] io::Error),

    /// Accepting a TCP connection failed.
    #[error("accept failed: {0}")]
    Accept(#[source] io::Error),

    /// The peer connected but the WebSocket upgrade failed.
    #[error("handshake failed: {0}")]
    Handshake(#[source] io::Error),

    #[error("send failed: {0}")]
    Send(#[source] io::Error),

    #[error("receive failed: {0}")]
    Receive(#[source] io::Error),

    /// The connection was already closed.
    #[error("connection closed")]
    Closed,
}

