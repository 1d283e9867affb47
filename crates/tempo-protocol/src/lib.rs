//! Wire protocol for Tempo.
//!
//! Defines the event vocabulary that clients and the server speak:
//!
//! - **Types** ([`ClientEvent`], [`ServerEvent`], [`Color`], [`Role`],
//!   the identity newtypes) — structures that travel on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how events become bytes.
//! - **Errors** ([`ProtocolError`]).
//!
//! The protocol layer knows nothing about connections, rooms, or chess
//! rules; it only describes messages.

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    AppliedMove, ClientEvent, Color, ConnectionId, GameResult, MoveCandidate,
    Role, RoomId, ServerEvent,
};
