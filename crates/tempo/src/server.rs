//! `TempoServer` builder and accept loop.
//!
//! This is the entry point for running a Tempo coordination server. It
//! ties together all the layers: transport → protocol → coordinator.

use tempo_protocol::{Codec, JsonCodec};
use tempo_room::{CoordinatorHandle, RulesEngine};
use tempo_transport::{Listener, WebSocketListener};

use crate::TempoError;
use crate::handler::handle_connection;

/// Builder for configuring and starting a Tempo server.
///
/// # Example
///
/// ```rust,ignore
/// use tempo::prelude::*;
///
/// let server = TempoServer::builder()
///     .bind("0.0.0.0:8080")
///     .build::<MyEngine>(MyEngine::Config::default())
///     .await?;
/// server.run().await
/// ```
pub struct TempoServerBuilder {
    bind_addr: String,
}

impl TempoServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Binds the listener, spawns the coordinator for engine `E`, and
    /// returns the server ready to [`run`](TempoServer::run).
    ///
    /// Uses `JsonCodec` and the WebSocket transport as defaults.
    pub async fn build<E: RulesEngine>(
        self,
        config: E::Config,
    ) -> Result<TempoServer<JsonCodec>, TempoError> {
        let listener = WebSocketListener::bind(&self.bind_addr).await?;
        let coordinator = tempo_room::spawn::<E>(config);

        Ok(TempoServer {
            listener,
            coordinator,
            codec: JsonCodec,
        })
    }
}

impl Default for TempoServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running Tempo coordination server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct TempoServer<C: Codec + Clone> {
    listener: WebSocketListener,
    coordinator: CoordinatorHandle,
    codec: C,
}

impl TempoServer<JsonCodec> {
    /// Creates a new builder.
    pub fn builder() -> TempoServerBuilder {
        TempoServerBuilder::new()
    }
}

impl<C: Codec + Clone> TempoServer<C> {
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.listener.local_addr()
    }

    /// A handle to the coordinator, for out-of-band inspection.
    pub fn coordinator(&self) -> CoordinatorHandle {
        self.coordinator.clone()
    }

    /// Runs the server accept loop.
    ///
    /// Accepts incoming connections and spawns a handler task for each.
    /// Runs until the process is terminated.
    pub async fn run(mut self) -> Result<(), TempoError> {
        tracing::info!("tempo server running");

        loop {
            match self.listener.accept().await {
                Ok(channel) => {
                    let coordinator = self.coordinator.clone();
                    let codec = self.codec.clone();
                    tokio::spawn(async move {
                        if let Err(e) =
                            handle_connection(channel, coordinator, codec).await
                        {
                            tracing::debug!(
                                error = %e,
                                "connection ended with error"
                            );
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
