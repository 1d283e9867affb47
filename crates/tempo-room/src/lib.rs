//! Room and session coordination for Tempo.
//!
//! This crate is the authoritative core of the server: it owns every
//! session (one chess game plus its seats and turn indicator), matches
//! incoming connections to sessions, arbitrates turns, detects terminal
//! positions, and recovers from disconnects.
//!
//! # Key types
//!
//! - [`RulesEngine`] — the contract with the (external) chess rules
//! - [`Session`] / [`SessionRegistry`] — room state and the room table
//! - [`CoordinatorHandle`] / [`spawn`] — the single-threaded dispatch
//!   actor that every gateway connection talks to
//! - [`termination::detect`] — fixed-priority terminal-state checks

pub mod engine;
pub mod termination;

mod coordinator;
mod error;
mod registry;
mod session;

pub use coordinator::{CoordinatorHandle, RoomInfo, spawn};
pub use engine::{BoardGrid, EngineError, PieceKind, RulesEngine};
pub use error::CoordinatorError;
pub use registry::SessionRegistry;
pub use session::{Connection, EventSender, Seats, Session, SessionStatus};
