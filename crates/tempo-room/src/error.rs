//! Error types for the coordination layer.
//!
//! Most failures here are deliberately NOT errors: illegal moves become
//! targeted notifications, and references to unknown rooms or unbound
//! connections are logged no-ops. What remains is the plumbing.

/// Errors surfaced by [`CoordinatorHandle`](crate::CoordinatorHandle).
#[derive(Debug, thiserror::Error)]
pub enum CoordinatorError {
    /// The coordinator task is gone or its queue closed.
    #[error("coordinator is not running")]
    Unavailable,
}
