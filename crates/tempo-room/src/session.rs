//! Session and connection state: the data the coordinator mutates.
//!
//! A [`Session`] is the authoritative state of one room — one rules
//! engine, two seats, the turn indicator, and a lifecycle status. A
//! [`Connection`] is the server-side record of one live channel.

use tokio::sync::mpsc;

use tempo_protocol::{Color, ConnectionId, Role, RoomId, ServerEvent};

use crate::RulesEngine;

/// Channel sender delivering outbound events to one connection's writer.
pub type EventSender = mpsc::UnboundedSender<ServerEvent>;

// ---------------------------------------------------------------------------
// Connection
// ---------------------------------------------------------------------------

/// Server-side record of one live channel.
///
/// Explicit state threaded through handlers, not fields bolted onto the
/// transport object. `role` is `None` until a join succeeds.
pub struct Connection {
    pub id: ConnectionId,
    /// The session this connection is bound to; at most one at a time.
    pub bound_session: Option<RoomId>,
    pub role: Option<Role>,
    pub sender: EventSender,
}

impl Connection {
    pub fn new(id: ConnectionId, sender: EventSender) -> Self {
        Self {
            id,
            bound_session: None,
            role: None,
            sender,
        }
    }

    /// Sends an event to this connection's writer. A closed receiver
    /// means the channel is already down; the event is dropped.
    pub fn send(&self, event: ServerEvent) {
        let _ = self.sender.send(event);
    }
}

// ---------------------------------------------------------------------------
// Seats
// ---------------------------------------------------------------------------

/// The two playing seats of a session.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Seats {
    pub white: Option<ConnectionId>,
    pub black: Option<ConnectionId>,
}

impl Seats {
    /// The occupant of the given color's seat.
    pub fn occupant(&self, color: Color) -> Option<ConnectionId> {
        match color {
            Color::White => self.white,
            Color::Black => self.black,
        }
    }

    /// Connection ids seated in either seat, white first.
    pub fn occupants(&self) -> impl Iterator<Item = ConnectionId> {
        self.white.into_iter().chain(self.black)
    }

    pub fn has_vacancy(&self) -> bool {
        self.white.is_none() || self.black.is_none()
    }

    pub fn both_vacant(&self) -> bool {
        self.white.is_none() && self.black.is_none()
    }

    /// Vacates every seat held by `conn`. Both seats are checked
    /// unconditionally; returns whether any vacancy occurred.
    pub fn vacate(&mut self, conn: ConnectionId) -> bool {
        let mut vacated = false;
        if self.white == Some(conn) {
            self.white = None;
            vacated = true;
        }
        if self.black == Some(conn) {
            self.black = None;
            vacated = true;
        }
        vacated
    }
}

// ---------------------------------------------------------------------------
// SessionStatus
// ---------------------------------------------------------------------------

/// Lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// A game is in progress (or awaiting players).
    Active,
    /// A terminal condition was reached; the room stays alive for
    /// spectation until seat vacancy evicts it.
    Terminated,
    /// Both seats vacated; the session is about to leave the registry.
    Empty,
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionStatus::Active => f.write_str("active"),
            SessionStatus::Terminated => f.write_str("terminated"),
            SessionStatus::Empty => f.write_str("empty"),
        }
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// The authoritative state of one room.
///
/// Invariants upheld by the coordinator:
/// - `turn` always equals the engine's current mover after any mutation
///   (re-synced via [`sync_turn`](Self::sync_turn) after accepted moves
///   and resets).
/// - A session with both seats vacant does not outlive the handler that
///   vacated them.
pub struct Session<E: RulesEngine> {
    pub id: RoomId,
    /// Exclusively owned rules engine; nothing else mutates it.
    pub engine: E,
    pub seats: Seats,
    /// The color whose move is awaited.
    pub turn: Color,
    pub status: SessionStatus,
    /// Every connection bound to this room, seated and spectating, in
    /// join order.
    pub members: Vec<ConnectionId>,
}

impl<E: RulesEngine> Session<E> {
    /// Creates a fresh session: new engine, both seats vacant, turn set
    /// to the initial mover.
    pub fn new(id: RoomId, config: &E::Config) -> Self {
        let engine = E::new(config);
        let turn = engine.current_mover();
        Self {
            id,
            engine,
            seats: Seats::default(),
            turn,
            status: SessionStatus::Active,
            members: Vec::new(),
        }
    }

    /// Seats the connection deterministically: white if vacant, else
    /// black if vacant, else spectator. The connection is also recorded
    /// as a member.
    pub fn seat(&mut self, conn: ConnectionId) -> Role {
        let role = if self.seats.white.is_none() {
            self.seats.white = Some(conn);
            Role::White
        } else if self.seats.black.is_none() {
            self.seats.black = Some(conn);
            Role::Black
        } else {
            Role::Spectator
        };
        if !self.members.contains(&conn) {
            self.members.push(conn);
        }
        role
    }

    /// Drops the connection from the member list (seats are handled
    /// separately by [`Seats::vacate`]).
    pub fn remove_member(&mut self, conn: ConnectionId) {
        self.members.retain(|m| *m != conn);
    }

    /// Re-reads the turn indicator from the engine. Call after every
    /// accepted move and after every reset.
    pub fn sync_turn(&mut self) {
        self.turn = self.engine.current_mover();
    }

    /// Resets to a fresh game: new engine at the initial position, turn
    /// back to the initial mover, status back to active. Seats and
    /// members are untouched.
    pub fn reset(&mut self, config: &E::Config) {
        self.engine = E::new(config);
        self.status = SessionStatus::Active;
        self.sync_turn();
    }
}
