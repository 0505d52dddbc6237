//! # Syncline
//!
//! Real-time position-synchronization backend for multiplayer games.
//!
//! A Syncline server holds the authoritative registry of connected players
//! and relays each player's movement to every other player over persistent
//! WebSocket connections, using a compact tagged binary protocol. The host
//! application supplies two hooks, an [`Authenticator`] for connect-time
//! tokens and a [`PlayerStore`] for profiles, and the framework handles
//! the rest.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use syncline::prelude::*;
//!
//! // Implement Authenticator and PlayerStore for your backend, then:
//! // let server = SynclineServer::builder()
//! //     .bind("0.0.0.0:8080")
//! //     .build(my_auth, my_store)
//! //     .await?;
//! // server.run().await
//! ```

mod error;
mod handler;
mod server;

pub use error::SynclineError;
pub use server::{SynclineServer, SynclineServerBuilder};

/// One-stop imports for building and running a server.
pub mod prelude {
    pub use crate::{SynclineError, SynclineServer, SynclineServerBuilder};
    pub use syncline_protocol::{
        Message, NAME_LEN, PlayerId, PlayerName, ProtocolError, decode, encode,
    };
    pub use syncline_session::{
        Authenticator, PlayerProfile, PlayerStore, SPAWN_ORIGIN, SessionError, SessionInfo,
        SessionRegistry,
    };
    pub use syncline_transport::{Connection, ConnectionId, Transport, TransportError};
}
