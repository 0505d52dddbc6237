//! World Walker: a minimal Syncline deployment.
//!
//! Serves one shared 2D world where every connected player sees everyone
//! else move in real time. A JSON roster file stands in for a real account
//! backend: each entry maps a bearer token to a player identity and stored
//! position. Clients connect with `ws://host:port/?token=<token>`.
//!
//! Configuration is process-external:
//! - `SYNCLINE_ADDR` — bind address (default `127.0.0.1:8080`)
//! - `WORLD_WALKER_ROSTER` — roster path (default `roster.json`)
//! - `RUST_LOG` — tracing filter (default `info`)

use std::collections::HashMap;
use std::sync::Arc;

use serde::Deserialize;
use syncline::prelude::*;

// ---------------------------------------------------------------------------
// Roster
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct RosterEntry {
    token: String,
    player_id: u32,
    name: String,
    #[serde(default)]
    x: Option<i32>,
    #[serde(default)]
    y: Option<i32>,
}

/// The parsed roster, indexed once for both identity hooks.
struct Roster {
    by_token: HashMap<String, PlayerId>,
    profiles: HashMap<PlayerId, PlayerProfile>,
}

impl Roster {
    fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let entries: Vec<RosterEntry> = serde_json::from_str(json)?;
        let mut by_token = HashMap::new();
        let mut profiles = HashMap::new();
        for entry in entries {
            let id = PlayerId(entry.player_id);
            by_token.insert(entry.token, id);
            profiles.insert(
                id,
                PlayerProfile {
                    name: entry.name,
                    x: entry.x,
                    y: entry.y,
                },
            );
        }
        Ok(Self { by_token, profiles })
    }
}

/// Token lookup against the roster.
struct RosterAuth(Arc<Roster>);

impl Authenticator for RosterAuth {
    async fn verify_token(&self, token: &str) -> Result<PlayerId, SessionError> {
        self.0
            .by_token
            .get(token)
            .copied()
            .ok_or_else(|| SessionError::AuthFailed("unknown token".into()))
    }
}

/// Profile lookup against the roster.
struct RosterStore(Arc<Roster>);

impl PlayerStore for RosterStore {
    async fn load_player(&self, player_id: PlayerId) -> Result<PlayerProfile, SessionError> {
        self.0
            .profiles
            .get(&player_id)
            .cloned()
            .ok_or(SessionError::ProfileUnavailable(player_id))
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let addr = std::env::var("SYNCLINE_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".into());
    let roster_path =
        std::env::var("WORLD_WALKER_ROSTER").unwrap_or_else(|_| "roster.json".into());

    let roster = Arc::new(Roster::from_json(&std::fs::read_to_string(&roster_path)?)?);
    tracing::info!(players = roster.profiles.len(), %addr, "world-walker starting");

    let server = SynclineServer::<RosterAuth, RosterStore>::builder()
        .bind(&addr)
        .build(RosterAuth(Arc::clone(&roster)), RosterStore(roster))
        .await?;
    server.run().await?;
    Ok(())
}
