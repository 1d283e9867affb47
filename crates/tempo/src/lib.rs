//! # Tempo
//!
//! Realtime coordination server for two-player chess sessions.
//!
//! Tempo keeps the rules of the game pluggable: implement the
//! [`RulesEngine`](tempo_room::RulesEngine) trait for your rules crate
//! of choice and the server
//! handles transport, matchmaking, seat assignment, turn arbitration,
//! move relay, and disconnect recovery.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tempo::prelude::*;
//!
//! let server = TempoServer::builder()
//!     .bind("0.0.0.0:8080")
//!     .build::<MyEngine>(MyEngine::Config::default())
//!     .await?;
//! server.run().await
//! ```

mod error;
mod handler;
mod server;

pub use error::TempoError;
pub use server::{TempoServer, TempoServerBuilder};

// The sub-crates, re-exported for direct access.
pub use tempo_protocol as protocol;
pub use tempo_room as room;
pub use tempo_transport as transport;

/// The common imports for building a Tempo server.
pub mod prelude {
    pub use crate::{TempoError, TempoServer, TempoServerBuilder};
    pub use tempo_protocol::{
        AppliedMove, ClientEvent, Color, ConnectionId, GameResult,
        MoveCandidate, Role, RoomId, ServerEvent,
    };
    pub use tempo_room::{
        BoardGrid, CoordinatorHandle, EngineError, PieceKind, RulesEngine,
    };
}
