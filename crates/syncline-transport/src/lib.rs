//! Transport abstraction layer for Syncline.
//!
//! Provides the [`Transport`] and [`Connection`] traits that abstract over
//! the network protocol, plus the WebSocket implementation used in
//! production. Sessions and the connection handler are written against the
//! traits, so tests can substitute in-memory fakes.

#![allow(async_fn_in_trait)]

mod error;
mod websocket;

pub use error::TransportError;
pub use websocket::{WebSocketConnection, WebSocketTransport};

use std::fmt;

/// Opaque identifier for a connection.
///
/// Distinct from a player identity: a connection has an id from the moment
/// it is accepted, before anyone knows who is on the other end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Creates a new `ConnectionId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Accepts new incoming connections.
pub trait Transport: Send + Sync + 'static {
    /// The connection type produced by this transport.
    type Connection: Connection;
    /// The error type for transport operations.
    type Error: std::error::Error + Send + Sync;

    /// Waits for and accepts the next incoming connection.
    async fn accept(&mut self) -> Result<Self::Connection, Self::Error>;

    /// Gracefully shuts down the transport, stopping new connections.
    async fn shutdown(&self) -> Result<(), Self::Error>;
}

/// A single persistent, bidirectional connection carrying byte frames.
pub trait Connection: Send + Sync + 'static {
    /// The error type for connection operations.
    type Error: std::error::Error + Send + Sync;

    /// Sends one frame to the remote peer.
    async fn send(&self, data: &[u8]) -> Result<(), Self::Error>;

    /// Receives the next frame from the remote peer.
    ///
    /// Returns `Ok(None)` when the connection is cleanly closed.
    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error>;

    /// Closes the connection.
    async fn close(&self) -> Result<(), Self::Error>;

    /// Closes the connection signalling a policy violation (e.g. a rejected
    /// authentication token). Defaults to a plain close for transports with
    /// no such signal.
    async fn close_policy_violation(&self) -> Result<(), Self::Error> {
        self.close().await
    }

    /// The authentication token supplied out-of-band at connect time,
    /// if the transport carries one.
    fn auth_token(&self) -> Option<&str> {
        None
    }

    /// Returns the unique identifier for this connection.
    fn id(&self) -> ConnectionId;
}
