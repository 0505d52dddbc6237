//! Session types: the server-side record of one connected player.

use tokio::sync::mpsc;

use syncline_protocol::{PlayerId, PlayerName};

/// Sending half of a session's outbound frame queue.
///
/// The registry pushes encoded frames here synchronously; the session's own
/// connection task drains the other end and writes to the socket. The queue
/// is what keeps one slow receiver from stalling a broadcast to everyone
/// else.
pub type Outbound = mpsc::UnboundedSender<Vec<u8>>;

/// One live, authenticated player.
///
/// Created when a connection completes identification, destroyed when it
/// closes or errors. The position is mutated only through the registry, by
/// that player's own updates; the server trusts client-reported coordinates.
#[derive(Debug)]
pub struct PlayerSession {
    /// Stable identity assigned at authentication. Registry key.
    pub player_id: PlayerId,
    /// Display name. Denormalized and not unique; lookups go by id.
    pub name: PlayerName,
    pub x: i32,
    pub y: i32,
    pub(crate) outbound: Outbound,
}

impl PlayerSession {
    pub(crate) fn new(
        player_id: PlayerId,
        name: PlayerName,
        x: i32,
        y: i32,
        outbound: Outbound,
    ) -> Self {
        Self {
            player_id,
            name,
            x,
            y,
            outbound,
        }
    }

    /// Returns a sender-free view of this session.
    pub fn info(&self) -> SessionInfo {
        SessionInfo {
            player_id: self.player_id,
            name: self.name.clone(),
            x: self.x,
            y: self.y,
        }
    }
}

/// A snapshot view of one session: who, and where.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    pub player_id: PlayerId,
    pub name: PlayerName,
    pub x: i32,
    pub y: i32,
}
