//! Wire types for the Tempo event protocol.
//!
//! Everything in this module travels between a client and the server as
//! internally tagged JSON (`{"type": "move", ...}`), the named-event
//! style browser clients expect. Event and field names are camelCase on
//! the wire.

use serde::{Deserialize, Serialize};

use std::fmt;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// Ephemeral identifier for one live connection.
///
/// Assigned by the transport when the channel is accepted and valid only
/// for the connection's lifetime. Never persisted; a reconnecting client
/// gets a fresh id.
///
/// `#[serde(transparent)]` makes `ConnectionId(42)` serialize as `42`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(pub u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Opaque room identifier, the registry key for one session.
///
/// Tempo treats the contents as opaque: a lobby may generate one with any
/// collision-resistant scheme, or a client may pick a memorable name for
/// a private game.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub String);

impl RoomId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RoomId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

// ---------------------------------------------------------------------------
// Colors and roles
// ---------------------------------------------------------------------------

/// One of the two playing colors. Serializes long form (`"white"`),
/// used by `playerColor` and `gameEnd.winner`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    White,
    Black,
}

impl Color {
    /// The color that moves first in a fresh game.
    pub fn initial() -> Self {
        Color::White
    }

    pub fn opposite(self) -> Self {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    /// The seat role for this color (`w` / `b` on the wire).
    pub fn role(self) -> Role {
        match self {
            Color::White => Role::White,
            Color::Black => Role::Black,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::White => f.write_str("white"),
            Color::Black => f.write_str("black"),
        }
    }
}

/// What a connection is allowed to do in its session.
///
/// Serializes short form (`"w"` / `"b"` / `"spectator"`), used by
/// `playerRole` and — since a turn always belongs to a seat — by `turn`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "w")]
    White,
    #[serde(rename = "b")]
    Black,
    #[serde(rename = "spectator")]
    Spectator,
}

impl Role {
    /// The playing color for a seated role; `None` for spectators.
    pub fn color(self) -> Option<Color> {
        match self {
            Role::White => Some(Color::White),
            Role::Black => Some(Color::Black),
            Role::Spectator => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::White => f.write_str("w"),
            Role::Black => f.write_str("b"),
            Role::Spectator => f.write_str("spectator"),
        }
    }
}

// ---------------------------------------------------------------------------
// Moves
// ---------------------------------------------------------------------------

/// A move as submitted by a client, before the rules engine has seen it.
///
/// Squares are algebraic (`"e2"`, `"e4"`); `promotion` is the piece letter
/// (`"q"`, `"r"`, `"b"`, `"n"`) when a pawn reaches the last rank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveCandidate {
    pub from: String,
    pub to: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promotion: Option<String>,
}

/// A move the rules engine accepted and applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedMove {
    pub from: String,
    pub to: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promotion: Option<String>,
    /// Standard algebraic notation, when the engine produces it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub san: Option<String>,
}

// ---------------------------------------------------------------------------
// Game end
// ---------------------------------------------------------------------------

/// How a game concluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameResult {
    Checkmate,
    Draw,
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Events a client sends to the server.
///
/// Connection loss is implicit (the channel closes) and has no event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientEvent {
    /// Join (or lazily create) a named room.
    #[serde(rename_all = "camelCase")]
    JoinRoomByName {
        room_id: RoomId,
        display_name: String,
    },

    /// Join any session with a vacant seat, or a fresh one if none is open.
    JoinRandom,

    /// Submit a move for the bound session.
    Move(MoveCandidate),

    /// Reclaim play after the client's previous connection was lost
    /// (e.g. a page reload). `stale_connection_id` is the id the client
    /// held before losing its channel.
    #[serde(rename_all = "camelCase")]
    Reload { stale_connection_id: ConnectionId },
}

/// Events the server sends to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerEvent {
    /// First event on every channel: tells the client its own connection
    /// id, which it needs later for the `reload` flow.
    #[serde(rename_all = "camelCase")]
    Welcome { connection_id: ConnectionId },

    /// The joining connection's assigned playing color.
    PlayerColor { color: Color },

    /// The joining connection's role, including `spectator`.
    PlayerRole { role: Role },

    /// Canonical board serialization for client resync.
    BoardState { fen: String },

    /// Both seats were taken; the connection joined as a spectator.
    Full { message: String },

    /// A new party connected to the room (sent to existing occupants,
    /// carrying the joiner's display identity) and, symmetrically, to the
    /// joiner about each pre-existing peer.
    Connected { info: String },

    /// An accepted move, broadcast to every connection in the room.
    Move {
        #[serde(rename = "move")]
        mv: AppliedMove,
    },

    /// The color whose move is now awaited (short form: `w` / `b`).
    Turn { color: Role },

    /// Terminal condition reached; at most one per accepted move.
    GameEnd {
        result: GameResult,
        winner: Option<Color>,
        reason: String,
    },

    /// A rejected move, sent only to the submitter together with the
    /// unchanged board so the client can resync.
    InvalidMove {
        #[serde(rename = "move")]
        mv: MoveCandidate,
        fen: String,
        message: String,
    },

    /// A player's channel closed.
    #[serde(rename_all = "camelCase")]
    PlayerDisconnected { connection_id: ConnectionId },

    /// The session was reset to the initial position (after a seat was
    /// vacated); carries the fresh serialization.
    ResetBoard { fen: String },
}

// =========================================================================
// Tests
// =========================================================================
