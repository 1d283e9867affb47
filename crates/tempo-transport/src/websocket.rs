//! WebSocket transport built on `tokio-tungstenite`.
//!
//! The accepted stream is split into independent read and write halves so
//! the gateway can pump outbound events while blocked on `recv`. Frames
//! are sent as text because the protocol is JSON; inbound binary frames
//! are accepted too.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message;

use tempo_protocol::ConnectionId;

use crate::{Channel, Listener, TransportError};

/// Source of ephemeral connection ids, unique per process.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

type WsSink = SplitSink<WebSocketStream<TcpStream>, Message>;
type WsSource = SplitStream<WebSocketStream<TcpStream>>;

/// A [`Listener`] that accepts WebSocket connections on a TCP port.
pub struct WebSocketListener {
    listener: TcpListener,
}

impl WebSocketListener {
    /// Binds to the given address (`"127.0.0.1:0"` picks a free port).
    pub async fn bind(addr: &str) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(TransportError::Accept)?;
        tracing::info!(addr, "websocket listener bound");
        Ok(Self { listener })
    }
}

impl Listener for WebSocketListener {
    type Channel = WebSocketChannel;

    async fn accept(&mut self) -> Result<Self::Channel, TransportError> {
        let (stream, peer) = self
            .listener
            .accept()
            .await
            .map_err(TransportError::Accept)?;

        let ws = tokio_tungstenite::accept_async(stream)
            .await
            .map_err(|e| TransportError::Handshake(e.to_string()))?;

        let id = ConnectionId(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed));
        tracing::debug!(%id, %peer, "websocket connection accepted");

        let (sink, source) = ws.split();
        Ok(WebSocketChannel {
            id,
            sink: Arc::new(Mutex::new(sink)),
            source: Arc::new(Mutex::new(source)),
        })
    }

    fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.listener.local_addr()
    }
}

/// One accepted WebSocket connection.
///
/// Cloneable; the read and write halves have separate locks, so one task
/// can sit in `recv` while another sends.
#[derive(Clone)]
pub struct WebSocketChannel {
    id: ConnectionId,
    sink: Arc<Mutex<WsSink>>,
    source: Arc<Mutex<WsSource>>,
}

impl Channel for WebSocketChannel {
    async fn send(&self, frame: &[u8]) -> Result<(), TransportError> {
        let text = String::from_utf8_lossy(frame).into_owned();
        self.sink
            .lock()
            .await
            .send(Message::Text(text.into()))
            .await
            .map_err(|e| TransportError::Send(e.to_string()))
    }

    async fn recv(&self) -> Result<Option<Vec<u8>>, TransportError> {
        let mut source = self.source.lock().await;
        loop {
            match source.next().await {
                Some(Ok(Message::Text(text))) => {
                    return Ok(Some(text.as_bytes().to_vec()));
                }
                Some(Ok(Message::Binary(data))) => {
                    return Ok(Some(data.into()));
                }
                Some(Ok(Message::Close(_))) | None => return Ok(None),
                // Ping/pong and raw frames are transport noise.
                Some(Ok(_)) => continue,
                Some(Err(e)) => {
                    return Err(TransportError::Receive(e.to_string()));
                }
            }
        }
    }

    async fn close(&self) -> Result<(), TransportError> {
        self.sink
            .lock()
            .await
            .send(Message::Close(None))
            .await
            .map_err(|e| TransportError::Send(e.to_string()))
    }

    fn id(&self) -> ConnectionId {
        self.id
    }
}
