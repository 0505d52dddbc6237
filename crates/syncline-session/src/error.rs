//! Error types for the session layer.

use syncline_protocol::{PlayerId, ProtocolError};

/// Errors that can occur during authentication and session management.
///
/// Every registry operation returns success or one of these named
/// failures; nothing crosses the registry boundary as a panic.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The connect-time token was rejected by the
    /// [`Authenticator`](crate::Authenticator).
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// The connection supplied no authentication token at all.
    #[error("no authentication token supplied")]
    MissingToken,

    /// The player already has a live session in the registry.
    #[error("player {0} already has a live session")]
    DuplicateSession(PlayerId),

    /// No session is registered for the player.
    #[error("no session for player {0}")]
    UnknownSession(PlayerId),

    /// The [`PlayerStore`](crate::PlayerStore) has no profile for an
    /// authenticated identity.
    #[error("no stored profile for player {0}")]
    ProfileUnavailable(PlayerId),

    /// A stored display name doesn't fit the wire protocol's name field.
    #[error("invalid player name: {0}")]
    InvalidName(#[from] ProtocolError),
}
