//! Binary encoding and decoding of wire messages.
//!
//! Frame layouts (all multi-byte integers big-endian):
//!
//! | Tag | Kind         | After the tag byte                                    |
//! |-----|--------------|-------------------------------------------------------|
//! | 1   | PlayerUpdate | u32 player_id, 20-byte name, i32 x, i32 y             |
//! | 2   | PlayerJoin   | u32 player_id, 20-byte name, i32 x, i32 y             |
//! | 3   | PlayerLeave  | u32 player_id                                         |
//! | 4   | Chat         | u32 player_id, u32 len, `len` bytes UTF-8, f32 time   |
//! | 6   | PlayerInit   | u32 player_id, 20-byte name, i32 x, i32 y             |
//!
//! The four structured kinds are fixed-width, so the hot `PlayerUpdate`
//! relay path decodes without allocation beyond the name string. Only chat
//! is length-prefixed, because free text is unbounded. Tag 5 is unassigned
//! and decodes as [`ProtocolError::UnknownTag`].

use crate::{Message, NAME_LEN, PlayerId, PlayerName, ProtocolError};

pub const TAG_PLAYER_UPDATE: u8 = 1;
pub const TAG_PLAYER_JOIN: u8 = 2;
pub const TAG_PLAYER_LEAVE: u8 = 3;
pub const TAG_CHAT: u8 = 4;
pub const TAG_PLAYER_INIT: u8 = 6;

/// Total frame length of the three entity-shaped kinds (update/join/init).
const ENTITY_FRAME_LEN: usize = 1 + 4 + NAME_LEN + 4 + 4;
/// Total frame length of a leave frame.
const LEAVE_FRAME_LEN: usize = 1 + 4;
/// Chat frame length up to and including the declared text length.
const CHAT_HEADER_LEN: usize = 1 + 4 + 4;

/// Maximum accepted chat text length in bytes. Guards the decoder against
/// unbounded allocation from a hostile length prefix.
pub const MAX_CHAT_LEN: u32 = 64 * 1024;

impl Message {
    /// The one-byte kind tag this message encodes with.
    pub fn tag(&self) -> u8 {
        match self {
            Message::PlayerUpdate { .. } => TAG_PLAYER_UPDATE,
            Message::PlayerJoin { .. } => TAG_PLAYER_JOIN,
            Message::PlayerLeave { .. } => TAG_PLAYER_LEAVE,
            Message::Chat { .. } => TAG_CHAT,
            Message::PlayerInit { .. } => TAG_PLAYER_INIT,
        }
    }
}

/// Encodes a message into a fresh frame buffer.
///
/// Deterministic and pure: the same message always produces the same bytes,
/// and the first byte is always the tag. Infallible because [`PlayerName`]
/// is validated at construction; chat text is expected to stay within
/// [`MAX_CHAT_LEN`] (the receiving side rejects frames that don't).
pub fn encode(msg: &Message) -> Vec<u8> {
    match msg {
        Message::PlayerUpdate {
            player_id,
            name,
            x,
            y,
        } => encode_entity(TAG_PLAYER_UPDATE, *player_id, name, *x, *y),
        Message::PlayerJoin {
            player_id,
            name,
            x,
            y,
        } => encode_entity(TAG_PLAYER_JOIN, *player_id, name, *x, *y),
        Message::PlayerInit {
            player_id,
            name,
            x,
            y,
        } => encode_entity(TAG_PLAYER_INIT, *player_id, name, *x, *y),
        Message::PlayerLeave { player_id } => {
            let mut buf = Vec::with_capacity(LEAVE_FRAME_LEN);
            buf.push(TAG_PLAYER_LEAVE);
            buf.extend_from_slice(&player_id.0.to_be_bytes());
            buf
        }
        Message::Chat {
            player_id,
            text,
            timestamp,
        } => {
            debug_assert!(text.len() <= MAX_CHAT_LEN as usize);
            let mut buf = Vec::with_capacity(CHAT_HEADER_LEN + text.len() + 4);
            buf.push(TAG_CHAT);
            buf.extend_from_slice(&player_id.0.to_be_bytes());
            buf.extend_from_slice(&(text.len() as u32).to_be_bytes());
            buf.extend_from_slice(text.as_bytes());
            buf.extend_from_slice(&timestamp.to_be_bytes());
            buf
        }
    }
}

fn encode_entity(tag: u8, player_id: PlayerId, name: &PlayerName, x: i32, y: i32) -> Vec<u8> {
    let mut buf = Vec::with_capacity(ENTITY_FRAME_LEN);
    buf.push(tag);
    buf.extend_from_slice(&player_id.0.to_be_bytes());
    let name_bytes = name.as_str().as_bytes();
    buf.extend_from_slice(name_bytes);
    buf.resize(1 + 4 + NAME_LEN, 0); // NUL-pad the name field
    buf.extend_from_slice(&x.to_be_bytes());
    buf.extend_from_slice(&y.to_be_bytes());
    buf
}

/// Decodes one frame into a message.
///
/// Empty input is `Ok(None)`, not an error, since an empty read may simply
/// mean the stream closed. Every malformed input returns a
/// [`ProtocolError`] without reading out of bounds or partially
/// constructing a message.
pub fn decode(buf: &[u8]) -> Result<Option<Message>, ProtocolError> {
    let Some((&tag, _)) = buf.split_first() else {
        return Ok(None);
    };
    let msg = match tag {
        TAG_PLAYER_UPDATE | TAG_PLAYER_JOIN | TAG_PLAYER_INIT => decode_entity(tag, buf)?,
        TAG_PLAYER_LEAVE => {
            if buf.len() != LEAVE_FRAME_LEN {
                return Err(ProtocolError::WrongLength {
                    tag,
                    expected: LEAVE_FRAME_LEN,
                    got: buf.len(),
                });
            }
            Message::PlayerLeave {
                player_id: PlayerId(be_u32(&buf[1..5])),
            }
        }
        TAG_CHAT => decode_chat(buf)?,
        other => return Err(ProtocolError::UnknownTag(other)),
    };
    Ok(Some(msg))
}

fn decode_entity(tag: u8, buf: &[u8]) -> Result<Message, ProtocolError> {
    if buf.len() != ENTITY_FRAME_LEN {
        return Err(ProtocolError::WrongLength {
            tag,
            expected: ENTITY_FRAME_LEN,
            got: buf.len(),
        });
    }
    let player_id = PlayerId(be_u32(&buf[1..5]));
    let name = decode_name(&buf[5..5 + NAME_LEN])?;
    let x = be_i32(&buf[25..29]);
    let y = be_i32(&buf[29..33]);
    let msg = match tag {
        TAG_PLAYER_UPDATE => Message::PlayerUpdate {
            player_id,
            name,
            x,
            y,
        },
        TAG_PLAYER_JOIN => Message::PlayerJoin {
            player_id,
            name,
            x,
            y,
        },
        _ => Message::PlayerInit {
            player_id,
            name,
            x,
            y,
        },
    };
    Ok(msg)
}

/// Two-phase chat decode: fixed header first, then exactly the declared
/// number of text bytes, then the trailing timestamp.
fn decode_chat(buf: &[u8]) -> Result<Message, ProtocolError> {
    if buf.len() < CHAT_HEADER_LEN {
        return Err(ProtocolError::Truncated {
            tag: TAG_CHAT,
            need: CHAT_HEADER_LEN,
            got: buf.len(),
        });
    }
    let player_id = PlayerId(be_u32(&buf[1..5]));
    let declared = be_u32(&buf[5..9]);
    if declared > MAX_CHAT_LEN {
        return Err(ProtocolError::ChatTooLong(declared));
    }
    let expected = CHAT_HEADER_LEN + declared as usize + 4;
    if buf.len() != expected {
        return Err(ProtocolError::WrongLength {
            tag: TAG_CHAT,
            expected,
            got: buf.len(),
        });
    }
    let text_end = CHAT_HEADER_LEN + declared as usize;
    let text = std::str::from_utf8(&buf[CHAT_HEADER_LEN..text_end])
        .map_err(ProtocolError::TextNotUtf8)?
        .to_owned();
    let timestamp = be_f32(&buf[text_end..text_end + 4]);
    Ok(Message::Chat {
        player_id,
        text,
        timestamp,
    })
}

/// Strips trailing NUL padding from the fixed name field and validates it.
fn decode_name(field: &[u8]) -> Result<PlayerName, ProtocolError> {
    let end = field.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
    let text = std::str::from_utf8(&field[..end]).map_err(ProtocolError::NameNotUtf8)?;
    PlayerName::new(text)
}

fn be_u32(bytes: &[u8]) -> u32 {
    u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

fn be_i32(bytes: &[u8]) -> i32 {
    i32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

fn be_f32(bytes: &[u8]) -> f32 {
    f32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}
