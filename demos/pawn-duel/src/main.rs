//! Pawn Duel server: Tempo coordination in front of a pawn-race engine.
//!
//! Run with an optional bind address:
//!
//! ```text
//! pawn-duel 0.0.0.0:8080
//! ```
//!
//! `RUST_LOG` controls verbosity (`RUST_LOG=tempo_room=debug` shows
//! dropped moves and seat changes).

mod engine;

use tempo::prelude::*;
use tracing_subscriber::EnvFilter;

use crate::engine::{PawnDuelConfig, PawnDuelEngine};

#[tokio::main]
async fn main() -> Result<(), TempoError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let addr = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "127.0.0.1:8080".to_string());

    let server = TempoServer::builder()
        .bind(&addr)
        .build::<PawnDuelEngine>(PawnDuelConfig::default())
        .await?;

    if let Ok(local) = server.local_addr() {
        tracing::info!(addr = %local, "pawn duel server listening");
    }
    server.run().await
}
