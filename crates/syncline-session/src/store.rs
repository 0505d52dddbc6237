//! Persistence hook for loading a player's profile at connect time.
//!
//! Like authentication, durable storage is the host application's concern.
//! The framework asks it exactly one thing after a token verifies: the
//! player's display name and last-known position.

use syncline_protocol::PlayerId;

use crate::SessionError;

/// Default spawn position for players with no stored coordinates.
pub const SPAWN_ORIGIN: (i32, i32) = (0, 0);

/// A player's stored profile, as loaded from the host's persistence layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerProfile {
    pub name: String,
    /// Last-known x coordinate; `None` for a player who has never moved.
    pub x: Option<i32>,
    /// Last-known y coordinate; `None` for a player who has never moved.
    pub y: Option<i32>,
}

impl PlayerProfile {
    /// The position this player enters the world at, defaulting missing
    /// coordinates to [`SPAWN_ORIGIN`].
    pub fn spawn_position(&self) -> (i32, i32) {
        (
            self.x.unwrap_or(SPAWN_ORIGIN.0),
            self.y.unwrap_or(SPAWN_ORIGIN.1),
        )
    }
}

/// Loads player profiles for authenticated identities.
pub trait PlayerStore: Send + Sync + 'static {
    /// Fetches the profile for the given player.
    ///
    /// # Errors
    /// [`SessionError::ProfileUnavailable`] if the identity has no stored
    /// profile (authentication and storage out of sync).
    fn load_player(
        &self,
        player_id: PlayerId,
    ) -> impl std::future::Future<Output = Result<PlayerProfile, SessionError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spawn_position_defaults_to_origin() {
        let profile = PlayerProfile {
            name: "newcomer".into(),
            x: None,
            y: None,
        };
        assert_eq!(profile.spawn_position(), (0, 0));
    }

    #[test]
    fn spawn_position_uses_stored_coordinates() {
        let profile = PlayerProfile {
            name: "veteran".into(),
            x: Some(14),
            y: Some(-2),
        };
        assert_eq!(profile.spawn_position(), (14, -2));
    }

    #[test]
    fn spawn_position_defaults_each_axis_independently() {
        let profile = PlayerProfile {
            name: "half".into(),
            x: Some(9),
            y: None,
        };
        assert_eq!(profile.spawn_position(), (9, 0));
    }
}
