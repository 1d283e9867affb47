//! Error types for the transport layer.

/// Errors that can occur on a listener or channel.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Binding the listener or accepting a connection failed.
    #[error("accept failed: {0}")]
    Accept(#[source] std::io::Error),

    /// The WebSocket upgrade handshake failed.
    #[error("websocket handshake failed: {0}")]
    Handshake(String),

    /// Sending a frame failed; the peer is likely gone.
    #[error("send failed: {0}")]
    Send(String),

    /// Receiving a frame failed mid-stream.
    #[error("receive failed: {0}")]
    Receive(String),

    /// The channel was already closed.
    #[error("channel closed")]
    Closed,
}
