//! Termination detection: queries the rules engine in fixed priority
//! order after each accepted move and produces at most one `gameEnd`.

use tempo_protocol::{Color, GameResult, ServerEvent};

use crate::RulesEngine;

/// Half-moves without a capture or pawn advance that end the game
/// (the 50-move rule).
const HALF_MOVE_DRAW_THRESHOLD: u32 = 100;

/// Checks the engine for a terminal condition, stopping at the first
/// true one. Priority: checkmate > stalemate > insufficient material >
/// threefold repetition > 50-move rule.
///
/// On checkmate the winner is the color that is NOT to move — the mover
/// who delivered mate.
pub fn detect<E: RulesEngine>(engine: &E) -> Option<ServerEvent> {
    if engine.is_checkmate() {
        return Some(ServerEvent::GameEnd {
            result: GameResult::Checkmate,
            winner: Some(engine.current_mover().opposite()),
            reason: "Checkmate".into(),
        });
    }
    if engine.is_stalemate() {
        return Some(draw("Stalemate"));
    }
    if engine.has_insufficient_material() {
        return Some(draw("Insufficient material"));
    }
    if engine.is_threefold_repetition() {
        return Some(draw("Threefold repetition"));
    }
    if engine.half_move_clock() >= HALF_MOVE_DRAW_THRESHOLD {
        return Some(draw("50-move rule"));
    }
    None
}

fn draw(reason: &str) -> ServerEvent {
    ServerEvent::GameEnd {
        result: GameResult::Draw,
        winner: None,
        reason: reason.into(),
    }
}
