//! The coordinator actor: one Tokio task that owns the session registry
//! and every connection record, and handles gateway events strictly one
//! at a time.
//!
//! All inbound events (joins, moves, disconnects, reloads) funnel into a
//! single mpsc queue and are handled to completion in arrival order.
//! That serialization is the whole concurrency story: no handler ever
//! observes another handler's partial mutation, so sessions need no
//! locks and no rollback. Two "simultaneous" moves are ordered by the
//! queue, and the later one is judged against the earlier one's result.

use std::collections::HashMap;

use rand::Rng;
use rand::distr::Alphanumeric;
use tokio::sync::{mpsc, oneshot};

use tempo_protocol::{
    Color, ConnectionId, MoveCandidate, Role, RoomId, ServerEvent,
};

use crate::session::{Connection, EventSender, SessionStatus};
use crate::{CoordinatorError, RulesEngine, SessionRegistry, termination};

/// Depth of the gateway event queue. Senders briefly wait when the
/// coordinator falls this far behind.
const GATEWAY_QUEUE: usize = 256;

/// Length of the random suffix in generated room ids.
const ROOM_ID_SUFFIX_LEN: usize = 6;

/// Events the gateway feeds into the coordinator queue.
pub(crate) enum GatewayEvent {
    JoinByName {
        conn: ConnectionId,
        room: RoomId,
        display_name: String,
        sender: EventSender,
    },
    JoinRandom {
        conn: ConnectionId,
        sender: EventSender,
    },
    SubmitMove {
        conn: ConnectionId,
        candidate: MoveCandidate,
    },
    Reload {
        conn: ConnectionId,
        stale: ConnectionId,
    },
    Disconnect {
        conn: ConnectionId,
    },
    RoomInfo {
        room: RoomId,
        reply: oneshot::Sender<Option<RoomInfo>>,
    },
    RoomCount {
        reply: oneshot::Sender<usize>,
    },
}

/// Snapshot of one session's coordination state (not the board).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomInfo {
    pub room_id: RoomId,
    pub status: SessionStatus,
    pub white: Option<ConnectionId>,
    pub black: Option<ConnectionId>,
    pub spectators: usize,
    pub turn: Color,
}

/// Handle to the running coordinator. Cheap to clone; one per
/// connection handler task.
#[derive(Clone)]
pub struct CoordinatorHandle {
    sender: mpsc::Sender<GatewayEvent>,
}

impl CoordinatorHandle {
    /// Joins (or lazily creates) the named room.
    pub async fn join_by_name(
        &self,
        conn: ConnectionId,
        room: RoomId,
        display_name: String,
        sender: EventSender,
    ) -> Result<(), CoordinatorError> {
        self.send(GatewayEvent::JoinByName {
            conn,
            room,
            display_name,
            sender,
        })
        .await
    }

    /// Joins any session with a vacant seat, creating one if needed.
    pub async fn join_random(
        &self,
        conn: ConnectionId,
        sender: EventSender,
    ) -> Result<(), CoordinatorError> {
        self.send(GatewayEvent::JoinRandom { conn, sender }).await
    }

    /// Submits a move for arbitration (fire-and-forget; outcomes arrive
    /// on the event channel).
    pub async fn submit_move(
        &self,
        conn: ConnectionId,
        candidate: MoveCandidate,
    ) -> Result<(), CoordinatorError> {
        self.send(GatewayEvent::SubmitMove { conn, candidate }).await
    }

    /// Requests the reload/seat-reclaim flow against a stale connection id.
    pub async fn reload(
        &self,
        conn: ConnectionId,
        stale: ConnectionId,
    ) -> Result<(), CoordinatorError> {
        self.send(GatewayEvent::Reload { conn, stale }).await
    }

    /// Reports that the connection's channel closed.
    pub async fn disconnect(
        &self,
        conn: ConnectionId,
    ) -> Result<(), CoordinatorError> {
        self.send(GatewayEvent::Disconnect { conn }).await
    }

    /// Snapshot of a room's coordination state; `None` if the room is
    /// not in the registry.
    pub async fn room_info(
        &self,
        room: RoomId,
    ) -> Result<Option<RoomInfo>, CoordinatorError> {
        let (tx, rx) = oneshot::channel();
        self.send(GatewayEvent::RoomInfo { room, reply: tx }).await?;
        rx.await.map_err(|_| CoordinatorError::Unavailable)
    }

    /// Number of sessions currently in the registry.
    pub async fn room_count(&self) -> Result<usize, CoordinatorError> {
        let (tx, rx) = oneshot::channel();
        self.send(GatewayEvent::RoomCount { reply: tx }).await?;
        rx.await.map_err(|_| CoordinatorError::Unavailable)
    }

    async fn send(&self, event: GatewayEvent) -> Result<(), CoordinatorError> {
        self.sender
            .send(event)
            .await
            .map_err(|_| CoordinatorError::Unavailable)
    }
}

/// Spawns the coordinator task for engine type `E` and returns its handle.
pub fn spawn<E: RulesEngine>(config: E::Config) -> CoordinatorHandle {
    let (tx, rx) = mpsc::channel(GATEWAY_QUEUE);
    let coordinator = Coordinator::<E> {
        registry: SessionRegistry::new(config),
        connections: HashMap::new(),
        receiver: rx,
    };
    tokio::spawn(coordinator.run());
    CoordinatorHandle { sender: tx }
}

/// Whether a join targeted a named room or asked for matchmaking.
enum JoinTarget {
    Named { room: RoomId, display_name: String },
    Random,
}

struct Coordinator<E: RulesEngine> {
    registry: SessionRegistry<E>,
    /// Every live connection the gateway has introduced, keyed by id.
    connections: HashMap<ConnectionId, Connection>,
    receiver: mpsc::Receiver<GatewayEvent>,
}

impl<E: RulesEngine> Coordinator<E> {
    async fn run(mut self) {
        tracing::info!("coordinator started");

        while let Some(event) = self.receiver.recv().await {
            match event {
                GatewayEvent::JoinByName {
                    conn,
                    room,
                    display_name,
                    sender,
                } => self.handle_join(
                    conn,
                    sender,
                    JoinTarget::Named { room, display_name },
                ),
                GatewayEvent::JoinRandom { conn, sender } => {
                    self.handle_join(conn, sender, JoinTarget::Random)
                }
                GatewayEvent::SubmitMove { conn, candidate } => {
                    self.handle_move(conn, candidate)
                }
                GatewayEvent::Reload { conn, stale } => {
                    self.handle_reload(conn, stale)
                }
                GatewayEvent::Disconnect { conn } => {
                    self.handle_disconnect(conn)
                }
                GatewayEvent::RoomInfo { room, reply } => {
                    let _ = reply.send(self.room_info(&room));
                }
                GatewayEvent::RoomCount { reply } => {
                    let _ = reply.send(self.registry.len());
                }
            }
        }

        tracing::info!("coordinator stopped");
    }

    // -- Matchmaking ------------------------------------------------------

    fn handle_join(
        &mut self,
        conn: ConnectionId,
        sender: EventSender,
        target: JoinTarget,
    ) {
        // A bound connection joining again is first detached from its old
        // session, with full vacancy handling but no disconnect broadcast.
        self.detach(conn);

        let (room, joiner_label) = match target {
            JoinTarget::Named { room, display_name } => (room, display_name),
            JoinTarget::Random => {
                let room = self
                    .registry
                    .find_open()
                    .cloned()
                    .unwrap_or_else(fallback_room_id);
                (room, conn.to_string())
            }
        };

        let session = self.registry.get_or_create(&room);

        // Tell the seated occupants about the joiner, and the joiner
        // about each of them, before the joiner takes a seat.
        let occupants: Vec<ConnectionId> = session.seats.occupants().collect();
        for occupant in &occupants {
            let _ = sender.send(ServerEvent::Connected {
                info: occupant.to_string(),
            });
            if let Some(peer) = self.connections.get(occupant) {
                peer.send(ServerEvent::Connected {
                    info: joiner_label.clone(),
                });
            }
        }

        let role = session.seat(conn);
        match role {
            Role::White | Role::Black => {
                let color = role.color().expect("seated role has a color");
                let _ = sender.send(ServerEvent::PlayerColor { color });
                let _ = sender.send(ServerEvent::PlayerRole { role });
            }
            Role::Spectator => {
                let _ = sender.send(ServerEvent::Full {
                    message: "Game is full".into(),
                });
                let _ = sender.send(ServerEvent::PlayerRole { role });
            }
        }

        // The joiner always converges on the canonical board, whatever
        // the join order was.
        let _ = sender.send(ServerEvent::BoardState {
            fen: session.engine.fen(),
        });

        tracing::info!(%conn, room_id = %room, %role, "connection joined");

        let mut record = Connection::new(conn, sender);
        record.bound_session = Some(room);
        record.role = Some(role);
        self.connections.insert(conn, record);
    }

    // -- Turn arbitration -------------------------------------------------

    fn handle_move(&mut self, conn: ConnectionId, candidate: MoveCandidate) {
        let Some(connection) = self.connections.get(&conn) else {
            return;
        };
        let Some(room) = connection.bound_session.clone() else {
            tracing::debug!(%conn, "move from unbound connection dropped");
            return;
        };
        let Some(session) = self.registry.get_mut(&room) else {
            tracing::debug!(%conn, room_id = %room, "move for unknown room dropped");
            return;
        };

        // The seat whose turn it is must be held by the sender. Covers
        // spectators, the idle player, and stale bindings alike.
        if session.seats.occupant(session.turn) != Some(conn) {
            tracing::debug!(
                %conn,
                room_id = %room,
                turn = %session.turn,
                "out-of-turn move dropped"
            );
            return;
        }

        match session.engine.apply_move(&candidate) {
            Ok(applied) => {
                session.sync_turn();
                let members = session.members.clone();
                broadcast(
                    &self.connections,
                    &members,
                    ServerEvent::Move { mv: applied },
                );
                broadcast(
                    &self.connections,
                    &members,
                    ServerEvent::Turn {
                        color: session.turn.role(),
                    },
                );
                broadcast(
                    &self.connections,
                    &members,
                    ServerEvent::BoardState {
                        fen: session.engine.fen(),
                    },
                );

                if let Some(end) = termination::detect(&session.engine) {
                    session.status = SessionStatus::Terminated;
                    tracing::info!(room_id = %room, "game reached terminal state");
                    broadcast(&self.connections, &members, end);
                }
            }
            Err(rejection) => {
                // Atomic by contract: the engine did not mutate. Only the
                // submitter hears about it, with the unchanged board.
                tracing::debug!(%conn, room_id = %room, error = %rejection, "move rejected");
                if let Some(connection) = self.connections.get(&conn) {
                    connection.send(ServerEvent::InvalidMove {
                        mv: candidate,
                        fen: session.engine.fen(),
                        message: rejection.to_string(),
                    });
                }
            }
        }
    }

    // -- Disconnect recovery ----------------------------------------------

    fn handle_disconnect(&mut self, conn: ConnectionId) {
        let Some(connection) = self.connections.remove(&conn) else {
            return;
        };
        let Some(room) = connection.bound_session else {
            return;
        };
        tracing::info!(%conn, room_id = %room, "connection lost");

        if let Some(session) = self.registry.get(&room) {
            broadcast(
                &self.connections,
                &session.members,
                ServerEvent::PlayerDisconnected { connection_id: conn },
            );
        }
        self.vacate_and_recover(&room, conn);
    }

    /// Unbinds a still-live connection from its current session (used
    /// when a bound connection joins elsewhere). Same vacancy handling
    /// as a disconnect, minus the `playerDisconnected` broadcast.
    fn detach(&mut self, conn: ConnectionId) {
        let Some(connection) = self.connections.get_mut(&conn) else {
            return;
        };
        let Some(room) = connection.bound_session.take() else {
            return;
        };
        connection.role = None;
        tracing::debug!(%conn, room_id = %room, "connection detached for rebinding");
        self.vacate_and_recover(&room, conn);
    }

    /// Seat vacancy handling shared by disconnect and detach: vacate any
    /// seat held by `conn`, reset the session for remaining members, and
    /// evict the session once both seats are vacant.
    fn vacate_and_recover(&mut self, room: &RoomId, conn: ConnectionId) {
        let config = self.registry.engine_config().clone();
        let Some(session) = self.registry.get_mut(room) else {
            return;
        };

        session.remove_member(conn);

        if session.seats.vacate(conn) {
            session.reset(&config);
            let members = session.members.clone();
            broadcast(
                &self.connections,
                &members,
                ServerEvent::ResetBoard {
                    fen: session.engine.fen(),
                },
            );
            broadcast(
                &self.connections,
                &members,
                ServerEvent::Turn {
                    color: session.turn.role(),
                },
            );
            tracing::info!(room_id = %room, "session reset after seat vacancy");
        }

        if session.seats.both_vacant() {
            session.status = SessionStatus::Empty;
            self.registry.remove(room);
        }
    }

    /// The reload/seat-reclaim flow. Deliberately asymmetric, matching
    /// long-standing client expectations: only a stale `black` occupant
    /// is reclaimed, and the requester always ends up on `white`.
    fn handle_reload(&mut self, conn: ConnectionId, stale: ConnectionId) {
        let Some(connection) = self.connections.get(&conn) else {
            return;
        };
        let Some(room) = connection.bound_session.clone() else {
            return;
        };
        let Some(session) = self.registry.get_mut(&room) else {
            return;
        };

        if session.seats.black == Some(stale) {
            session.seats.black = None;
            session.seats.white = Some(conn);
            tracing::info!(%conn, room_id = %room, %stale, "seat reclaimed on reload");
            if let Some(connection) = self.connections.get_mut(&conn) {
                connection.role = Some(Role::White);
                connection.send(ServerEvent::PlayerRole { role: Role::White });
            }
        }
    }

    fn room_info(&self, room: &RoomId) -> Option<RoomInfo> {
        let session = self.registry.get(room)?;
        let seated = session.seats.occupants().count();
        Some(RoomInfo {
            room_id: session.id.clone(),
            status: session.status,
            white: session.seats.white,
            black: session.seats.black,
            spectators: session.members.len().saturating_sub(seated),
            turn: session.turn,
        })
    }
}

/// Fans an event out to every member of a room. Members whose writer is
/// already gone are skipped.
fn broadcast(
    connections: &HashMap<ConnectionId, Connection>,
    members: &[ConnectionId],
    event: ServerEvent,
) {
    for member in members {
        if let Some(connection) = connections.get(member) {
            connection.send(event.clone());
        }
    }
}

/// Generates a room id for a random join that found no open session.
/// Collisions are harmless: the joiner would simply land in the
/// colliding room's vacant seat, which is what a random join asks for.
fn fallback_room_id() -> RoomId {
    let suffix: String = rand::rng()
        .sample_iter(Alphanumeric)
        .take(ROOM_ID_SUFFIX_LEN)
        .map(char::from)
        .collect();
    RoomId::new(format!("room-{}", suffix.to_ascii_lowercase()))
}
