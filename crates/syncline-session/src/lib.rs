//! Player session management for Syncline.
//!
//! This crate owns the answer to "who is online and where":
//!
//! 1. **Identity hooks** — the [`Authenticator`] and [`PlayerStore`] traits
//!    the host application implements (token verification, profile storage).
//! 2. **Sessions** — one [`PlayerSession`] per connected player, holding
//!    identity, last-known position, and the outbound frame queue.
//! 3. **The registry** — [`SessionRegistry`], the shared table every
//!    connection task mutates and broadcasts through.
//!
//! # How it fits in the stack
//!
//! ```text
//! Connection handler (above)  ← drives join/relay/leave per connection
//!     ↕
//! Session layer (this crate)  ← the single source of truth for presence
//!     ↕
//! Protocol layer (below)      ← PlayerId, PlayerName, frame encoding
//! ```

#![allow(async_fn_in_trait)]

mod auth;
mod error;
mod registry;
mod session;
mod store;

pub use auth::Authenticator;
pub use error::SessionError;
pub use registry::SessionRegistry;
pub use session::{Outbound, PlayerSession, SessionInfo};
pub use store::{PlayerProfile, PlayerStore, SPAWN_ORIGIN};
