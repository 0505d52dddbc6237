//! `SynclineServer` builder and accept loop.
//!
//! The entry point for running a Syncline server. It ties the layers
//! together: transport → protocol → sessions, with one handler task per
//! connection.

use std::sync::Arc;

use syncline_session::{Authenticator, PlayerStore, SessionRegistry};
use syncline_transport::{Transport, WebSocketTransport};

use crate::SynclineError;
use crate::handler::handle_connection;

/// Shared server state passed to each connection handler task.
///
/// Constructed once at startup and handed to every task behind an `Arc`;
/// the registry is an explicitly owned component, not ambient global state,
/// which keeps it testable with fakes standing in for connections.
pub(crate) struct ServerState<A, S> {
    pub(crate) registry: SessionRegistry,
    pub(crate) auth: A,
    pub(crate) store: S,
}

/// Builder for configuring and starting a Syncline server.
///
/// # Example
///
/// ```rust,ignore
/// use syncline::prelude::*;
///
/// let server = SynclineServer::builder()
///     .bind("0.0.0.0:8080")
///     .build(my_auth, my_store)
///     .await?;
/// server.run().await
/// ```
pub struct SynclineServerBuilder {
    bind_addr: String,
}

impl SynclineServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Builds the server with the given identity hooks.
    pub async fn build<A, S>(
        self,
        auth: A,
        store: S,
    ) -> Result<SynclineServer<A, S>, SynclineError>
    where
        A: Authenticator,
        S: PlayerStore,
    {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;

        let state = Arc::new(ServerState {
            registry: SessionRegistry::new(),
            auth,
            store,
        });

        Ok(SynclineServer { transport, state })
    }
}

impl Default for SynclineServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running Syncline server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct SynclineServer<A, S> {
    transport: WebSocketTransport,
    state: Arc<ServerState<A, S>>,
}

impl<A, S> SynclineServer<A, S>
where
    A: Authenticator,
    S: PlayerStore,
{
    /// Creates a new builder.
    pub fn builder() -> SynclineServerBuilder {
        SynclineServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Runs the server accept loop.
    ///
    /// Accepts incoming connections and spawns a handler task for each.
    /// Runs until the process is terminated.
    pub async fn run(mut self) -> Result<(), SynclineError> {
        tracing::info!("Syncline server running");

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(handle_connection(conn, state));
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
