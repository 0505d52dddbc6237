//! Unified error type for the Syncline framework.

use syncline_protocol::ProtocolError;
use syncline_session::SessionError;
use syncline_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `syncline` meta-crate, you deal with this single error
/// type instead of importing errors from each sub-crate. The `#[from]`
/// attribute on each variant auto-generates `From` impls, so the `?`
/// operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum SynclineError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (malformed or oversized frame data).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A session-level error (auth, duplicate or unknown session).
    #[error(transparent)]
    Session(#[from] SessionError),
}
