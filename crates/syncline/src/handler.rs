//! Per-connection handler: the lifecycle state machine for one client.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The states:
//!
//! ```text
//! Connecting → Identified → Joining → Active → Closing → Closed
//! ```
//!
//! - **Connecting**: verify the connect-time token (reject with a policy
//!   close on failure, fatal to this connection only).
//! - **Identified**: load the player's profile, defaulting the spawn.
//! - **Joining**: one atomic registry step: register, init the newcomer,
//!   describe the existing peers to it, announce it to everyone else.
//! - **Active**: the relay loop. Own `PlayerUpdate`s are applied and
//!   relayed verbatim; everything else inbound is logged and dropped.
//! - **Closing**: reached from every exit path exactly once: stop the
//!   outbound drain, leave the registry (which broadcasts the departure),
//!   close the socket.

use std::sync::Arc;

use tokio::sync::mpsc;

use syncline_protocol::{Message, PlayerId, PlayerName, decode};
use syncline_session::{Authenticator, PlayerStore, SessionError};
use syncline_transport::{Connection, WebSocketConnection};

use crate::server::ServerState;

/// Drives a single connection from accept to close. Cleanup runs on every
/// exit path, so peers always see the departure broadcast.
pub(crate) async fn handle_connection<A, S>(
    conn: WebSocketConnection,
    state: Arc<ServerState<A, S>>,
) where
    A: Authenticator,
    S: PlayerStore,
{
    let conn_id = conn.id();

    // -- Connecting → Identified --
    let (player_id, name, x, y) = match identify(&conn, &state).await {
        Ok(identity) => identity,
        Err(e) => {
            tracing::info!(%conn_id, error = %e, "connection rejected");
            let _ = conn.close_policy_violation().await;
            return;
        }
    };
    tracing::info!(%conn_id, %player_id, "player identified");

    // -- Joining --
    let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
    if let Err(e) = state
        .registry
        .join(player_id, name, x, y, outbound_tx)
        .await
    {
        tracing::warn!(%conn_id, %player_id, error = %e, "join rejected");
        let _ = conn.close_policy_violation().await;
        return;
    }
    let drain = tokio::spawn(drain_outbound(conn.clone(), outbound_rx));

    // -- Active --
    relay_loop(&conn, &state, player_id).await;

    // -- Closing --
    // Cancelling the drain stops delivery to this connection only;
    // registry.leave is idempotent, so however the loop ended, peers get
    // exactly one PlayerLeave.
    drain.abort();
    state.registry.leave(player_id).await;
    let _ = conn.close().await;
    tracing::info!(%conn_id, %player_id, "connection closed");
}

/// Connecting/Identified: token → identity → stored profile → spawn.
async fn identify<A, S>(
    conn: &WebSocketConnection,
    state: &ServerState<A, S>,
) -> Result<(PlayerId, PlayerName, i32, i32), SessionError>
where
    A: Authenticator,
    S: PlayerStore,
{
    let token = conn.auth_token().ok_or(SessionError::MissingToken)?;
    let player_id = state.auth.verify_token(token).await?;
    let profile = state.store.load_player(player_id).await?;
    let name = PlayerName::new(profile.name.as_str())?;
    let (x, y) = profile.spawn_position();
    Ok((player_id, name, x, y))
}

/// Active: receive frames until the connection ends or the session is lost.
///
/// A decode failure, a foreign sender identity, or an unexpected kind is a
/// protocol violation from the client: the frame is dropped and the loop
/// continues, so a misbehaving client can't grief anyone by taking the
/// relay down.
async fn relay_loop<A, S>(
    conn: &WebSocketConnection,
    state: &ServerState<A, S>,
    player_id: PlayerId,
) where
    A: Authenticator,
    S: PlayerStore,
{
    loop {
        let frame = match conn.recv().await {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                tracing::info!(%player_id, "connection closed by peer");
                return;
            }
            Err(e) => {
                tracing::debug!(%player_id, error = %e, "receive failed");
                return;
            }
        };

        match decode(&frame) {
            Ok(Some(Message::PlayerUpdate {
                player_id: sender,
                x,
                y,
                ..
            })) if sender == player_id => {
                if let Err(e) = state.registry.update_position(player_id, x, y).await {
                    // The session vanished from under us; nothing left to
                    // relay for.
                    tracing::warn!(%player_id, error = %e, "session gone, dropping connection");
                    return;
                }
                // Relay the original bytes, not a re-encode: peers receive
                // a bit-identical frame.
                state.registry.broadcast(&frame, Some(player_id)).await;
            }
            Ok(Some(Message::PlayerUpdate {
                player_id: sender, ..
            })) => {
                tracing::warn!(%player_id, claimed = %sender, "update with foreign identity ignored");
            }
            Ok(Some(other)) => {
                tracing::debug!(%player_id, tag = other.tag(), "unexpected inbound kind ignored");
            }
            Ok(None) => {} // empty frame: nothing to do
            Err(e) => {
                tracing::debug!(%player_id, error = %e, "undecodable frame dropped");
            }
        }
    }
}

/// Drains the session's outbound queue onto the socket until the queue
/// closes or a send fails.
async fn drain_outbound(conn: WebSocketConnection, mut rx: mpsc::UnboundedReceiver<Vec<u8>>) {
    while let Some(frame) = rx.recv().await {
        if let Err(e) = conn.send(&frame).await {
            tracing::debug!(conn_id = %conn.id(), error = %e, "outbound send failed, stopping drain");
            return;
        }
    }
}
