//! The `RulesEngine` trait — Tempo's contract with the chess rules.
//!
//! Tempo never computes legality or terminal conditions itself; it owns
//! exactly one engine instance per session and talks to it through this
//! trait. Any chess library (or a scripted fake in tests) can sit behind
//! it.

use tempo_protocol::{AppliedMove, Color, MoveCandidate};

/// A piece kind, for rendering consumers of [`RulesEngine::board_grid`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PieceKind {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

/// An 8x8 grid of squares, rank-major; `None` is an empty square.
pub type BoardGrid = Vec<Vec<Option<(PieceKind, Color)>>>;

/// Why a move application or position load failed.
///
/// `Illegal` and `Fault` are handled identically at the coordination
/// layer (both become an `invalidMove` notification) but kept distinct
/// for diagnostics.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The rules rejected the move.
    #[error("illegal move: {0}")]
    Illegal(String),

    /// The engine hit an internal error while applying the move.
    #[error("engine fault: {0}")]
    Fault(String),

    /// A serialized position could not be loaded.
    #[error("invalid position: {0}")]
    InvalidPosition(String),
}

/// One game's rules oracle. A session exclusively owns its instance.
///
/// Contract: every query is synchronous and inexpensive, and
/// [`apply_move`](Self::apply_move) MUST NOT mutate state when it returns
/// `Err` — the coordinator relies on this to keep rejected moves atomic.
pub trait RulesEngine: Send + 'static {
    /// Engine-specific construction settings (opening book, variant
    /// parameters, scripted behavior in tests).
    type Config: Clone + Default + Send + 'static;

    /// Creates an engine at the initial position.
    fn new(config: &Self::Config) -> Self;

    /// Replaces internal state from a canonical serialization.
    fn load_position(&mut self, fen: &str) -> Result<(), EngineError>;

    /// Canonical serialization of the current position, side to move,
    /// and clock state. Used to resync clients on join, reset, and
    /// rejection.
    fn fen(&self) -> String;

    /// The current position as a grid, for rendering consumers.
    fn board_grid(&self) -> BoardGrid;

    /// Attempts the move. On `Ok` the move has been fully applied; on
    /// `Err` the position is unchanged.
    fn apply_move(&mut self, mv: &MoveCandidate) -> Result<AppliedMove, EngineError>;

    /// The color whose move is awaited.
    fn current_mover(&self) -> Color;

    fn is_checkmate(&self) -> bool;

    fn is_stalemate(&self) -> bool;

    fn has_insufficient_material(&self) -> bool;

    fn is_threefold_repetition(&self) -> bool;

    /// Half-moves since the last capture or pawn advance. 100 half-moves
    /// (50 full moves) is a draw.
    fn half_move_clock(&self) -> u32;
}
