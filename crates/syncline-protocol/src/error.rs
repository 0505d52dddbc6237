//! Error types for the protocol layer.

/// Errors that can occur while validating or decoding wire data.
///
/// Every variant names a specific way a frame can be malformed. The decoder
/// returns an error instead of a partially-constructed message; callers drop
/// the frame and keep the connection alive.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// The first byte of the frame matches no known message kind.
    ///
    /// Unknown tags are rejected rather than skipped so that protocol
    /// version skew between client and server is observable.
    #[error("unknown message tag {0}")]
    UnknownTag(u8),

    /// The frame is shorter than the minimum length for its kind.
    #[error("frame for tag {tag} too short: need at least {need} bytes, got {got}")]
    Truncated { tag: u8, need: usize, got: usize },

    /// The frame length doesn't match the kind's layout exactly.
    #[error("wrong frame length for tag {tag}: expected {expected} bytes, got {got}")]
    WrongLength {
        tag: u8,
        expected: usize,
        got: usize,
    },

    /// A chat frame declared a text length above the allocation guard.
    #[error("chat text too long ({0} bytes)")]
    ChatTooLong(u32),

    /// A player name exceeds the fixed 20-byte wire field.
    #[error("player name too long ({0} bytes, limit 20)")]
    NameTooLong(usize),

    /// A player name contains a NUL byte, which would be indistinguishable
    /// from field padding on the wire.
    #[error("player name contains a NUL byte")]
    NameContainsNul,

    /// The name field is not valid UTF-8 after stripping padding.
    #[error("name field is not valid UTF-8: {0}")]
    NameNotUtf8(#[source] std::str::Utf8Error),

    /// The chat text payload is not valid UTF-8.
    #[error("chat text is not valid UTF-8: {0}")]
    TextNotUtf8(#[source] std::str::Utf8Error),
}
