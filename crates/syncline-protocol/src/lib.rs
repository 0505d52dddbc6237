//! Wire protocol for Syncline.
//!
//! This crate defines the language that clients and the server speak:
//!
//! - **Types** ([`Message`], [`PlayerId`], [`PlayerName`]) — the closed set
//!   of structures that travel on the wire.
//! - **Codec** ([`codec::encode`], [`codec::decode`]) — the hand-specified
//!   tagged binary layout. Pure functions, no state.
//! - **Errors** ([`ProtocolError`]) — every way a frame can be malformed.
//!
//! The protocol layer sits below sessions and transport: it knows nothing
//! about connections or who is online, only how messages become bytes and
//! back.

pub mod codec;
mod error;
mod types;

pub use codec::{MAX_CHAT_LEN, decode, encode};
pub use error::ProtocolError;
pub use types::{Message, NAME_LEN, PlayerId, PlayerName};
