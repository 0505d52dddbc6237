//! Core wire types: player identity, validated names, and the message set.
//!
//! These are the structures that travel on the wire between the server and
//! every connected client. The message set is closed: exactly five kinds,
//! exhaustively matched in the codec and in every consumer, so a new kind
//! cannot be silently mishandled.

use std::fmt;

use crate::ProtocolError;

/// Width of the fixed name field on the wire, in bytes.
///
/// Names shorter than this are NUL-padded when encoded; the padding is
/// stripped when decoded. Names longer than this are rejected at
/// construction, never silently truncated.
pub const NAME_LEN: usize = 20;

/// A player's stable numeric identity, assigned at authentication.
///
/// Newtype over `u32` (the wire field is 4 bytes, big-endian). Distinct from
/// the display name: identities are unique and server-assigned, names are
/// client-influenced input. The session registry is keyed by this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlayerId(pub u32);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

/// A display name that fits the fixed 20-byte wire field.
///
/// Validated at construction: at most [`NAME_LEN`] UTF-8 bytes and no NUL
/// bytes (NUL is the field's padding and would be stripped on decode).
/// Holding a `PlayerName` is proof the name is encodable, which keeps the
/// encoder infallible.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PlayerName(String);

impl PlayerName {
    /// Validates and wraps a display name.
    ///
    /// # Errors
    /// - [`ProtocolError::NameTooLong`] if the name exceeds [`NAME_LEN`]
    ///   bytes (bytes, not characters; multi-byte UTF-8 counts in full).
    /// - [`ProtocolError::NameContainsNul`] if the name contains `'\0'`.
    pub fn new(name: impl Into<String>) -> Result<Self, ProtocolError> {
        let name = name.into();
        if name.len() > NAME_LEN {
            return Err(ProtocolError::NameTooLong(name.len()));
        }
        if name.contains('\0') {
            return Err(ProtocolError::NameContainsNul);
        }
        Ok(Self(name))
    }

    /// Returns the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the wrapper, returning the inner `String`.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for PlayerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One complete wire message.
///
/// Every encoded frame begins with a one-byte tag identifying the variant;
/// the remaining bytes are kind-specific (see [`crate::codec`] for the
/// exact layouts).
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// Bidirectional: a client reports its own new position; the server
    /// relays the frame verbatim to every other client.
    PlayerUpdate {
        player_id: PlayerId,
        name: PlayerName,
        x: i32,
        y: i32,
    },

    /// Server → others: a player connected. Also sent to a newcomer once
    /// per already-present player, so the newcomer learns who is here.
    PlayerJoin {
        player_id: PlayerId,
        name: PlayerName,
        x: i32,
        y: i32,
    },

    /// Server → others: a player disconnected.
    PlayerLeave { player_id: PlayerId },

    /// Free text with a send-time timestamp (seconds).
    Chat {
        player_id: PlayerId,
        text: String,
        timestamp: f32,
    },

    /// Server → one client, exactly once: the receiver's own identity and
    /// spawn position.
    PlayerInit {
        player_id: PlayerId,
        name: PlayerName,
        x: i32,
        y: i32,
    },
}

impl Message {
    /// Builds a chat message stamped with the current wall-clock time
    /// (seconds since the Unix epoch, as carried on the wire).
    pub fn chat_now(player_id: PlayerId, text: impl Into<String>) -> Self {
        let timestamp = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs_f32();
        Message::Chat {
            player_id,
            text: text.into(),
            timestamp,
        }
    }

    /// Returns the identity of the player this message is about.
    pub fn player_id(&self) -> PlayerId {
        match self {
            Message::PlayerUpdate { player_id, .. }
            | Message::PlayerJoin { player_id, .. }
            | Message::PlayerLeave { player_id }
            | Message::Chat { player_id, .. }
            | Message::PlayerInit { player_id, .. } => *player_id,
        }
    }
}
