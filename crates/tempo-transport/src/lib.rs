//! Transport layer for Tempo.
//!
//! Provides the [`Listener`] and [`Channel`] traits that abstract over the
//! underlying network protocol, plus the default WebSocket implementation.
//! A channel carries opaque frames; the protocol crate decides what the
//! bytes mean.
//!
//! # Feature flags
//!
//! - `websocket` (default) — WebSocket transport via `tokio-tungstenite`

#![allow(async_fn_in_trait)]

mod error;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
#[cfg(feature = "websocket")]
pub use websocket::{WebSocketChannel, WebSocketListener};

use tempo_protocol::ConnectionId;

/// Accepts incoming connections and hands out channels.
pub trait Listener: Send + 'static {
    /// The channel type produced by this listener.
    type Channel: Channel;

    /// Waits for and accepts the next incoming connection.
    async fn accept(&mut self) -> Result<Self::Channel, TransportError>;

    /// The local address the listener is bound to.
    fn local_addr(&self) -> std::io::Result<std::net::SocketAddr>;
}

/// One participant's bidirectional event channel.
///
/// Channels are frame-oriented: one `send` on this side surfaces as one
/// `recv` on the other.
pub trait Channel: Send + Sync + 'static {
    /// Sends one frame to the remote peer.
    async fn send(&self, frame: &[u8]) -> Result<(), TransportError>;

    /// Receives the next frame from the remote peer.
    ///
    /// Returns `Ok(None)` when the peer closed the channel cleanly.
    async fn recv(&self) -> Result<Option<Vec<u8>>, TransportError>;

    /// Closes the channel.
    async fn close(&self) -> Result<(), TransportError>;

    /// The ephemeral identifier assigned to this connection on accept.
    fn id(&self) -> ConnectionId;
}
