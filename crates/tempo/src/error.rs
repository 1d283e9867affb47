//! Unified error type for the Tempo server.

use tempo_protocol::ProtocolError;
use tempo_room::CoordinatorError;
use tempo_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `tempo` meta-crate, you deal with this single error
/// type instead of importing errors from each sub-crate. The `#[from]`
/// attribute on each variant auto-generates `From` impls, so the `?`
/// operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum TempoError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, invalid event).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The coordinator task is gone.
    #[error(transparent)]
    Coordinator(#[from] CoordinatorError),
}
