//! Integration tests for the coordinator using a scripted rules engine.
//!
//! The engine accepts any move except the magic squares `bad` (illegal)
//! and `boom` (internal fault), alternates the mover, and can be scripted
//! to report a terminal condition after N accepted moves. That is enough
//! to exercise matchmaking, turn arbitration, termination, and recovery
//! without a real chess library.

use tokio::sync::mpsc;

use tempo_protocol::{
    AppliedMove, Color, ConnectionId, GameResult, MoveCandidate, Role, RoomId,
    ServerEvent,
};
use tempo_room::engine::{BoardGrid, EngineError};
use tempo_room::{CoordinatorHandle, RulesEngine, SessionStatus, spawn};

// =========================================================================
// Scripted engine
// =========================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Terminal {
    Checkmate,
    Stalemate,
    FiftyMove,
}

#[derive(Clone, Default)]
struct Script {
    /// Report this terminal condition once this many moves were accepted.
    terminal_after: Option<(u32, Terminal)>,
}

struct ScriptedEngine {
    script: Script,
    accepted: u32,
    turn: Color,
}

impl ScriptedEngine {
    fn terminal(&self, kind: Terminal) -> bool {
        matches!(
            self.script.terminal_after,
            Some((after, k)) if k == kind && self.accepted >= after
        )
    }
}

impl RulesEngine for ScriptedEngine {
    type Config = Script;

    fn new(script: &Script) -> Self {
        Self {
            script: script.clone(),
            accepted: 0,
            turn: Color::initial(),
        }
    }

    fn load_position(&mut self, _fen: &str) -> Result<(), EngineError> {
        Ok(())
    }

    fn fen(&self) -> String {
        format!("scripted;{};{}", self.accepted, self.turn.role())
    }

    fn board_grid(&self) -> BoardGrid {
        vec![vec![None; 8]; 8]
    }

    fn apply_move(
        &mut self,
        mv: &MoveCandidate,
    ) -> Result<AppliedMove, EngineError> {
        match mv.from.as_str() {
            "bad" => Err(EngineError::Illegal("no piece can move there".into())),
            "boom" => Err(EngineError::Fault("scripted explosion".into())),
            _ => {
                self.accepted += 1;
                self.turn = self.turn.opposite();
                Ok(AppliedMove {
                    from: mv.from.clone(),
                    to: mv.to.clone(),
                    promotion: mv.promotion.clone(),
                    san: None,
                })
            }
        }
    }

    fn current_mover(&self) -> Color {
        self.turn
    }

    fn is_checkmate(&self) -> bool {
        self.terminal(Terminal::Checkmate)
    }

    fn is_stalemate(&self) -> bool {
        self.terminal(Terminal::Stalemate)
    }

    fn has_insufficient_material(&self) -> bool {
        false
    }

    fn is_threefold_repetition(&self) -> bool {
        false
    }

    fn half_move_clock(&self) -> u32 {
        if self.terminal(Terminal::FiftyMove) { 100 } else { 0 }
    }
}

// =========================================================================
// Helpers
// =========================================================================

type EventRx = mpsc::UnboundedReceiver<ServerEvent>;

fn conn(id: u64) -> ConnectionId {
    ConnectionId(id)
}

fn room(id: &str) -> RoomId {
    RoomId::new(id)
}

fn mv(from: &str, to: &str) -> MoveCandidate {
    MoveCandidate {
        from: from.into(),
        to: to.into(),
        promotion: None,
    }
}

fn start() -> CoordinatorHandle {
    spawn::<ScriptedEngine>(Script::default())
}

fn start_with(script: Script) -> CoordinatorHandle {
    spawn::<ScriptedEngine>(script)
}

/// The gateway queue is FIFO, so awaiting any query guarantees every
/// previously submitted event has been fully handled.
async fn flush(handle: &CoordinatorHandle) {
    let _ = handle.room_count().await.unwrap();
}

fn next(rx: &mut EventRx) -> ServerEvent {
    rx.try_recv().expect("expected a pending event")
}

fn assert_empty(rx: &mut EventRx) {
    assert!(rx.try_recv().is_err(), "expected no pending events");
}

fn drain(rx: &mut EventRx) {
    while rx.try_recv().is_ok() {}
}

/// Joins `conn_id` to the named room and returns its event receiver.
async fn join(
    handle: &CoordinatorHandle,
    conn_id: ConnectionId,
    room_id: &str,
    name: &str,
) -> EventRx {
    let (tx, rx) = mpsc::unbounded_channel();
    handle
        .join_by_name(conn_id, room(room_id), name.into(), tx)
        .await
        .unwrap();
    flush(handle).await;
    rx
}

/// Standard two-player setup in room "x": white=1 ("Alice"),
/// black=2 ("Bob"), both receivers drained.
async fn seated_pair(handle: &CoordinatorHandle) -> (EventRx, EventRx) {
    let mut a = join(handle, conn(1), "x", "Alice").await;
    let mut b = join(handle, conn(2), "x", "Bob").await;
    drain(&mut a);
    drain(&mut b);
    (a, b)
}

// =========================================================================
// Matchmaking
// =========================================================================

#[tokio::test]
async fn test_first_join_receives_white_role_and_initial_board() {
    let handle = start();
    let mut a = join(&handle, conn(1), "x", "Alice").await;

    assert_eq!(
        next(&mut a),
        ServerEvent::PlayerColor { color: Color::White }
    );
    assert_eq!(next(&mut a), ServerEvent::PlayerRole { role: Role::White });
    assert_eq!(
        next(&mut a),
        ServerEvent::BoardState { fen: "scripted;0;w".into() }
    );
    assert_empty(&mut a);
}

#[tokio::test]
async fn test_second_join_receives_black_and_peers_are_introduced() {
    let handle = start();
    let mut a = join(&handle, conn(1), "x", "Alice").await;
    drain(&mut a);

    let mut b = join(&handle, conn(2), "x", "Bob").await;

    // The joiner hears about the seated peer first, then its own role.
    assert_eq!(
        next(&mut b),
        ServerEvent::Connected { info: "conn-1".into() }
    );
    assert_eq!(
        next(&mut b),
        ServerEvent::PlayerColor { color: Color::Black }
    );
    assert_eq!(next(&mut b), ServerEvent::PlayerRole { role: Role::Black });
    assert_eq!(
        next(&mut b),
        ServerEvent::BoardState { fen: "scripted;0;w".into() }
    );

    // The seated peer hears the joiner's display identity.
    assert_eq!(next(&mut a), ServerEvent::Connected { info: "Bob".into() });
    assert_empty(&mut a);
}

#[tokio::test]
async fn test_third_join_is_spectator_and_displaces_nobody() {
    let handle = start();
    let (_a, _b) = seated_pair(&handle).await;

    let mut c = join(&handle, conn(3), "x", "Carol").await;

    // Two Connected notices (one per occupant), then full + spectator.
    let _ = next(&mut c);
    let _ = next(&mut c);
    assert_eq!(
        next(&mut c),
        ServerEvent::Full { message: "Game is full".into() }
    );
    assert_eq!(
        next(&mut c),
        ServerEvent::PlayerRole { role: Role::Spectator }
    );
    assert_eq!(
        next(&mut c),
        ServerEvent::BoardState { fen: "scripted;0;w".into() }
    );

    let info = handle.room_info(room("x")).await.unwrap().unwrap();
    assert_eq!(info.white, Some(conn(1)));
    assert_eq!(info.black, Some(conn(2)));
    assert_eq!(info.spectators, 1);
}

#[tokio::test]
async fn test_join_random_creates_session_when_none_open() {
    let handle = start();
    let (tx, mut rx) = mpsc::unbounded_channel();
    handle.join_random(conn(1), tx).await.unwrap();
    flush(&handle).await;

    assert_eq!(handle.room_count().await.unwrap(), 1);
    assert_eq!(
        next(&mut rx),
        ServerEvent::PlayerColor { color: Color::White }
    );
}

#[tokio::test]
async fn test_join_random_takes_vacant_seat_in_open_session() {
    let handle = start();
    let mut a = join(&handle, conn(1), "x", "Alice").await;
    drain(&mut a);

    let (tx, mut rx) = mpsc::unbounded_channel();
    handle.join_random(conn(2), tx).await.unwrap();
    flush(&handle).await;

    // No new session; the random joiner filled the open black seat.
    assert_eq!(handle.room_count().await.unwrap(), 1);
    let _connected = next(&mut rx);
    assert_eq!(
        next(&mut rx),
        ServerEvent::PlayerColor { color: Color::Black }
    );

    let info = handle.room_info(room("x")).await.unwrap().unwrap();
    assert_eq!(info.black, Some(conn(2)));
}

#[tokio::test]
async fn test_join_random_opens_fresh_session_when_all_full() {
    let handle = start();
    let (_a, _b) = seated_pair(&handle).await;

    let (tx, mut rx) = mpsc::unbounded_channel();
    handle.join_random(conn(3), tx).await.unwrap();
    flush(&handle).await;

    assert_eq!(handle.room_count().await.unwrap(), 2);
    assert_eq!(
        next(&mut rx),
        ServerEvent::PlayerColor { color: Color::White }
    );
}

// =========================================================================
// Turn arbitration
// =========================================================================

#[tokio::test]
async fn test_accepted_move_broadcasts_move_turn_and_board() {
    let handle = start();
    let (mut a, mut b) = seated_pair(&handle).await;

    handle.submit_move(conn(1), mv("e2", "e4")).await.unwrap();
    flush(&handle).await;

    for rx in [&mut a, &mut b] {
        match next(rx) {
            ServerEvent::Move { mv } => {
                assert_eq!(mv.from, "e2");
                assert_eq!(mv.to, "e4");
            }
            other => panic!("expected move, got {other:?}"),
        }
        assert_eq!(next(rx), ServerEvent::Turn { color: Role::Black });
        assert_eq!(
            next(rx),
            ServerEvent::BoardState { fen: "scripted;1;b".into() }
        );
        // Not a terminal position: no gameEnd.
        assert_empty(rx);
    }
}

#[tokio::test]
async fn test_turn_indicator_matches_engine_after_move() {
    let handle = start();
    let (_a, _b) = seated_pair(&handle).await;

    handle.submit_move(conn(1), mv("e2", "e4")).await.unwrap();
    flush(&handle).await;

    let info = handle.room_info(room("x")).await.unwrap().unwrap();
    assert_eq!(info.turn, Color::Black);
}

#[tokio::test]
async fn test_out_of_turn_move_is_dropped_silently() {
    let handle = start();
    let (mut a, mut b) = seated_pair(&handle).await;

    // Black tries to move first: nothing happens, nobody hears anything.
    handle.submit_move(conn(2), mv("e7", "e5")).await.unwrap();
    flush(&handle).await;
    assert_empty(&mut a);
    assert_empty(&mut b);

    let info = handle.room_info(room("x")).await.unwrap().unwrap();
    assert_eq!(info.turn, Color::White);

    // White can still move, proving the session was untouched.
    handle.submit_move(conn(1), mv("e2", "e4")).await.unwrap();
    flush(&handle).await;
    assert!(matches!(next(&mut a), ServerEvent::Move { .. }));
}

#[tokio::test]
async fn test_spectator_move_is_dropped() {
    let handle = start();
    let (mut a, mut b) = seated_pair(&handle).await;
    let mut c = join(&handle, conn(3), "x", "Carol").await;
    drain(&mut c);

    handle.submit_move(conn(3), mv("e2", "e4")).await.unwrap();
    flush(&handle).await;

    assert_empty(&mut a);
    assert_empty(&mut b);
    assert_empty(&mut c);
}

#[tokio::test]
async fn test_move_from_unbound_connection_is_dropped() {
    let handle = start();
    let (mut a, _b) = seated_pair(&handle).await;

    handle.submit_move(conn(99), mv("e2", "e4")).await.unwrap();
    flush(&handle).await;

    assert_empty(&mut a);
    assert_eq!(handle.room_count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_illegal_move_notifies_only_the_submitter() {
    let handle = start();
    let (mut a, mut b) = seated_pair(&handle).await;

    handle.submit_move(conn(1), mv("bad", "e4")).await.unwrap();
    flush(&handle).await;

    match next(&mut a) {
        ServerEvent::InvalidMove { mv, fen, message } => {
            assert_eq!(mv.from, "bad");
            // Board unchanged: atomic rejection.
            assert_eq!(fen, "scripted;0;w");
            assert!(message.contains("illegal move"));
        }
        other => panic!("expected invalidMove, got {other:?}"),
    }
    assert_empty(&mut a);
    assert_empty(&mut b);
}

#[tokio::test]
async fn test_engine_fault_is_reported_like_an_illegal_move() {
    let handle = start();
    let (mut a, mut b) = seated_pair(&handle).await;

    handle.submit_move(conn(1), mv("boom", "e4")).await.unwrap();
    flush(&handle).await;

    match next(&mut a) {
        ServerEvent::InvalidMove { fen, message, .. } => {
            assert_eq!(fen, "scripted;0;w");
            assert!(message.contains("engine fault"));
        }
        other => panic!("expected invalidMove, got {other:?}"),
    }
    assert_empty(&mut b);

    // The session survived the fault: white is still to move.
    handle.submit_move(conn(1), mv("e2", "e4")).await.unwrap();
    flush(&handle).await;
    assert!(matches!(next(&mut a), ServerEvent::Move { .. }));
}

// =========================================================================
// Termination
// =========================================================================

#[tokio::test]
async fn test_checkmate_broadcasts_exactly_one_game_end() {
    let handle = start_with(Script {
        terminal_after: Some((1, Terminal::Checkmate)),
    });
    let (mut a, mut b) = seated_pair(&handle).await;

    handle.submit_move(conn(1), mv("d8", "h4")).await.unwrap();
    flush(&handle).await;

    for rx in [&mut a, &mut b] {
        assert!(matches!(next(rx), ServerEvent::Move { .. }));
        assert!(matches!(next(rx), ServerEvent::Turn { .. }));
        assert!(matches!(next(rx), ServerEvent::BoardState { .. }));
        match next(rx) {
            ServerEvent::GameEnd {
                result: GameResult::Checkmate,
                winner,
                reason,
            } => {
                // White moved and delivered mate.
                assert_eq!(winner, Some(Color::White));
                assert_eq!(reason, "Checkmate");
            }
            other => panic!("expected gameEnd, got {other:?}"),
        }
        assert_empty(rx);
    }

    let info = handle.room_info(room("x")).await.unwrap().unwrap();
    assert_eq!(info.status, SessionStatus::Terminated);
}

#[tokio::test]
async fn test_stalemate_is_a_draw_for_everyone() {
    let handle = start_with(Script {
        terminal_after: Some((1, Terminal::Stalemate)),
    });
    let (mut a, _b) = seated_pair(&handle).await;

    handle.submit_move(conn(1), mv("a1", "a2")).await.unwrap();
    flush(&handle).await;

    let _ = next(&mut a); // move
    let _ = next(&mut a); // turn
    let _ = next(&mut a); // boardState
    match next(&mut a) {
        ServerEvent::GameEnd {
            result: GameResult::Draw,
            winner: None,
            reason,
        } => assert_eq!(reason, "Stalemate"),
        other => panic!("expected draw, got {other:?}"),
    }
}

#[tokio::test]
async fn test_fifty_move_rule_reason() {
    let handle = start_with(Script {
        terminal_after: Some((1, Terminal::FiftyMove)),
    });
    let (mut a, _b) = seated_pair(&handle).await;

    handle.submit_move(conn(1), mv("g1", "f3")).await.unwrap();
    flush(&handle).await;

    let _ = next(&mut a);
    let _ = next(&mut a);
    let _ = next(&mut a);
    match next(&mut a) {
        ServerEvent::GameEnd { reason, winner, .. } => {
            assert_eq!(reason, "50-move rule");
            assert_eq!(winner, None);
        }
        other => panic!("expected gameEnd, got {other:?}"),
    }
}

// =========================================================================
// Disconnect recovery
// =========================================================================

#[tokio::test]
async fn test_disconnect_vacates_seat_and_resets_session() {
    let handle = start();
    let (mut a, mut b) = seated_pair(&handle).await;

    // Advance the game so the reset is observable.
    handle.submit_move(conn(1), mv("e2", "e4")).await.unwrap();
    flush(&handle).await;
    drain(&mut a);
    drain(&mut b);

    handle.disconnect(conn(1)).await.unwrap();
    flush(&handle).await;

    assert_eq!(
        next(&mut b),
        ServerEvent::PlayerDisconnected { connection_id: conn(1) }
    );
    assert_eq!(
        next(&mut b),
        ServerEvent::ResetBoard { fen: "scripted;0;w".into() }
    );
    assert_eq!(next(&mut b), ServerEvent::Turn { color: Role::White });
    assert_empty(&mut b);

    let info = handle.room_info(room("x")).await.unwrap().unwrap();
    assert_eq!(info.white, None);
    assert_eq!(info.black, Some(conn(2)));
    assert_eq!(info.turn, Color::White);
    assert_eq!(info.status, SessionStatus::Active);
}

#[tokio::test]
async fn test_second_disconnect_evicts_the_session() {
    let handle = start();
    let (_a, _b) = seated_pair(&handle).await;

    handle.disconnect(conn(1)).await.unwrap();
    handle.disconnect(conn(2)).await.unwrap();
    flush(&handle).await;

    assert_eq!(handle.room_count().await.unwrap(), 0);
    assert!(handle.room_info(room("x")).await.unwrap().is_none());
}

#[tokio::test]
async fn test_spectator_disconnect_does_not_reset_the_game() {
    let handle = start();
    let (mut a, mut b) = seated_pair(&handle).await;
    let mut c = join(&handle, conn(3), "x", "Carol").await;
    drain(&mut a);
    drain(&mut b);
    drain(&mut c);

    handle.disconnect(conn(3)).await.unwrap();
    flush(&handle).await;

    assert_eq!(
        next(&mut a),
        ServerEvent::PlayerDisconnected { connection_id: conn(3) }
    );
    assert_empty(&mut a); // no resetBoard, no turn
    assert!(handle.room_info(room("x")).await.unwrap().is_some());
}

#[tokio::test]
async fn test_both_seats_vacant_evicts_even_with_spectators_left() {
    let handle = start();
    let (_a, _b) = seated_pair(&handle).await;
    let mut c = join(&handle, conn(3), "x", "Carol").await;
    drain(&mut c);

    handle.disconnect(conn(1)).await.unwrap();
    handle.disconnect(conn(2)).await.unwrap();
    flush(&handle).await;

    assert_eq!(handle.room_count().await.unwrap(), 0);
    drain(&mut c);

    // The dangling spectator's later move is a harmless no-op.
    handle.submit_move(conn(3), mv("e2", "e4")).await.unwrap();
    flush(&handle).await;
    assert_empty(&mut c);
}

#[tokio::test]
async fn test_disconnect_of_unknown_connection_is_noop() {
    let handle = start();
    let (_a, _b) = seated_pair(&handle).await;

    handle.disconnect(conn(42)).await.unwrap();
    flush(&handle).await;

    assert_eq!(handle.room_count().await.unwrap(), 1);
}

// =========================================================================
// Rebinding
// =========================================================================

#[tokio::test]
async fn test_rejoining_elsewhere_detaches_and_evicts_old_session() {
    let handle = start();
    let mut a = join(&handle, conn(1), "x", "Alice").await;
    drain(&mut a);

    let mut a2 = join(&handle, conn(1), "y", "Alice").await;

    // Sole occupant left "x": it must be gone; "y" holds the binding.
    assert!(handle.room_info(room("x")).await.unwrap().is_none());
    let info = handle.room_info(room("y")).await.unwrap().unwrap();
    assert_eq!(info.white, Some(conn(1)));

    assert_eq!(
        next(&mut a2),
        ServerEvent::PlayerColor { color: Color::White }
    );
}

#[tokio::test]
async fn test_rejoining_elsewhere_resets_old_session_for_peer() {
    let handle = start();
    let (_a, mut b) = seated_pair(&handle).await;

    let _a2 = join(&handle, conn(1), "y", "Alice").await;

    // The remaining player sees a reset, but no playerDisconnected:
    // the rebinding connection is still alive.
    assert_eq!(
        next(&mut b),
        ServerEvent::ResetBoard { fen: "scripted;0;w".into() }
    );
    assert_eq!(next(&mut b), ServerEvent::Turn { color: Role::White });
    assert_empty(&mut b);
}

// =========================================================================
// Reload / seat reclaim
// =========================================================================

#[tokio::test]
async fn test_reload_reclaims_stale_black_seat_and_promotes_to_white() {
    let handle = start();
    let (_a, _b) = seated_pair(&handle).await;

    // The reloaded client rejoins (as a spectator — both seats look
    // taken) and then reclaims using its previous connection id.
    let mut c = join(&handle, conn(3), "x", "Bob").await;
    drain(&mut c);

    handle.reload(conn(3), conn(2)).await.unwrap();
    flush(&handle).await;

    assert_eq!(next(&mut c), ServerEvent::PlayerRole { role: Role::White });

    let info = handle.room_info(room("x")).await.unwrap().unwrap();
    assert_eq!(info.white, Some(conn(3)));
    assert_eq!(info.black, None);
}

#[tokio::test]
async fn test_reload_with_unmatched_stale_id_is_noop() {
    let handle = start();
    let (_a, _b) = seated_pair(&handle).await;
    let mut c = join(&handle, conn(3), "x", "Bob").await;
    drain(&mut c);

    handle.reload(conn(3), conn(77)).await.unwrap();
    flush(&handle).await;

    assert_empty(&mut c);
    let info = handle.room_info(room("x")).await.unwrap().unwrap();
    assert_eq!(info.white, Some(conn(1)));
    assert_eq!(info.black, Some(conn(2)));
}

#[tokio::test]
async fn test_reload_from_unbound_connection_is_noop() {
    let handle = start();
    let (_a, _b) = seated_pair(&handle).await;

    handle.reload(conn(42), conn(2)).await.unwrap();
    flush(&handle).await;

    let info = handle.room_info(room("x")).await.unwrap().unwrap();
    assert_eq!(info.black, Some(conn(2)));
}
