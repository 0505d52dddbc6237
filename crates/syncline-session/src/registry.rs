//! The session registry: the shared table of everyone who is online.
//!
//! This is the single shared mutable resource in the system. Every
//! connection task holds an `Arc` to the same registry; one registry-wide
//! async mutex serializes all mutations and all reads used for broadcast,
//! so a broadcast can never observe a half-updated position and two
//! concurrent joins can never miss each other.
//!
//! Delivery is decoupled from the lock: "sending" a frame here means
//! pushing it onto the recipient's unbounded outbound queue, which the
//! recipient's own connection task drains. A stalled receiver therefore
//! slows nobody down, and a failed push (the receiver is already gone) is
//! logged and skipped; removing a dead session is its own connection
//! handler's job, never the broadcaster's.

use std::collections::HashMap;

use tokio::sync::Mutex;

use syncline_protocol::{Message, PlayerId, PlayerName, encode};

use crate::{Outbound, PlayerSession, SessionError, SessionInfo};

/// The authoritative map of live sessions, keyed by player identity.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<PlayerId, PlayerSession>>,
}

impl SessionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a session for `player_id`.
    ///
    /// # Errors
    /// [`SessionError::DuplicateSession`] if the identity already has a
    /// live session. The existing session is left untouched.
    pub async fn register(
        &self,
        player_id: PlayerId,
        name: PlayerName,
        x: i32,
        y: i32,
        outbound: Outbound,
    ) -> Result<(), SessionError> {
        let mut sessions = self.sessions.lock().await;
        insert_session(&mut sessions, player_id, name, x, y, outbound)?;
        tracing::info!(%player_id, players = sessions.len(), "session registered");
        Ok(())
    }

    /// Removes the session for `player_id`, if any.
    ///
    /// Idempotent: disconnect paths race with explicit removal, so an
    /// absent id is a no-op, not an error. Returns whether a session was
    /// actually removed.
    pub async fn unregister(&self, player_id: PlayerId) -> bool {
        let mut sessions = self.sessions.lock().await;
        let removed = sessions.remove(&player_id).is_some();
        if removed {
            tracing::info!(%player_id, players = sessions.len(), "session unregistered");
        }
        removed
    }

    /// Overwrites the position of `player_id`'s session.
    ///
    /// The whole pair is written under the registry lock, so concurrent
    /// broadcasts see either the old position or the new one, never a mix.
    ///
    /// # Errors
    /// [`SessionError::UnknownSession`] if the identity isn't registered.
    pub async fn update_position(
        &self,
        player_id: PlayerId,
        x: i32,
        y: i32,
    ) -> Result<(), SessionError> {
        let mut sessions = self.sessions.lock().await;
        let session = sessions
            .get_mut(&player_id)
            .ok_or(SessionError::UnknownSession(player_id))?;
        session.x = x;
        session.y = y;
        Ok(())
    }

    /// Queues the same frame for every registered session except `exclude`.
    ///
    /// A failed push is logged and skipped; the remaining recipients still
    /// get the frame, and the dead session stays registered until its own
    /// handler removes it. Returns the number of sessions the frame was
    /// queued for.
    pub async fn broadcast(&self, frame: &[u8], exclude: Option<PlayerId>) -> usize {
        let sessions = self.sessions.lock().await;
        broadcast_locked(&sessions, frame, exclude)
    }

    /// Returns a view of every current session.
    pub async fn snapshot(&self) -> Vec<SessionInfo> {
        let sessions = self.sessions.lock().await;
        sessions.values().map(PlayerSession::info).collect()
    }

    /// The joining sequence, as one critical section.
    ///
    /// Under a single lock acquisition: reject a duplicate identity, queue
    /// a `PlayerInit` describing the newcomer to itself, queue one
    /// `PlayerJoin` per already-present peer to the newcomer, insert the
    /// new session, and queue a `PlayerJoin` about the newcomer to everyone
    /// else. Holding the lock across all five steps is what guarantees two
    /// players joining at the same time each learn about the other exactly
    /// once.
    ///
    /// # Errors
    /// [`SessionError::DuplicateSession`]; nothing is sent or inserted.
    pub async fn join(
        &self,
        player_id: PlayerId,
        name: PlayerName,
        x: i32,
        y: i32,
        outbound: Outbound,
    ) -> Result<(), SessionError> {
        let mut sessions = self.sessions.lock().await;
        if sessions.contains_key(&player_id) {
            return Err(SessionError::DuplicateSession(player_id));
        }

        let init = encode(&Message::PlayerInit {
            player_id,
            name: name.clone(),
            x,
            y,
        });
        deliver(&outbound, &init, player_id);

        for peer in sessions.values() {
            let frame = encode(&Message::PlayerJoin {
                player_id: peer.player_id,
                name: peer.name.clone(),
                x: peer.x,
                y: peer.y,
            });
            deliver(&outbound, &frame, player_id);
        }

        let announce = encode(&Message::PlayerJoin {
            player_id,
            name: name.clone(),
            x,
            y,
        });
        insert_session(&mut sessions, player_id, name, x, y, outbound)?;
        broadcast_locked(&sessions, &announce, Some(player_id));

        tracing::info!(%player_id, players = sessions.len(), "player joined");
        Ok(())
    }

    /// The departure sequence, as one critical section.
    ///
    /// Removes the session and, only if one was actually removed,
    /// broadcasts a `PlayerLeave` to everyone remaining. Idempotent:
    /// however many code paths detect the same disconnect, peers see
    /// exactly one departure. Returns whether this call did the removal.
    pub async fn leave(&self, player_id: PlayerId) -> bool {
        let mut sessions = self.sessions.lock().await;
        if sessions.remove(&player_id).is_none() {
            return false;
        }
        let frame = encode(&Message::PlayerLeave { player_id });
        broadcast_locked(&sessions, &frame, None);
        tracing::info!(%player_id, players = sessions.len(), "player left");
        true
    }

    /// Returns whether `player_id` has a live session.
    pub async fn contains(&self, player_id: PlayerId) -> bool {
        self.sessions.lock().await.contains_key(&player_id)
    }

    /// Returns the number of live sessions.
    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    /// Returns `true` if nobody is online.
    pub async fn is_empty(&self) -> bool {
        self.sessions.lock().await.is_empty()
    }
}

fn insert_session(
    sessions: &mut HashMap<PlayerId, PlayerSession>,
    player_id: PlayerId,
    name: PlayerName,
    x: i32,
    y: i32,
    outbound: Outbound,
) -> Result<(), SessionError> {
    if sessions.contains_key(&player_id) {
        return Err(SessionError::DuplicateSession(player_id));
    }
    sessions.insert(
        player_id,
        PlayerSession::new(player_id, name, x, y, outbound),
    );
    Ok(())
}

fn broadcast_locked(
    sessions: &HashMap<PlayerId, PlayerSession>,
    frame: &[u8],
    exclude: Option<PlayerId>,
) -> usize {
    let mut delivered = 0;
    for session in sessions.values() {
        if Some(session.player_id) == exclude {
            continue;
        }
        if deliver(&session.outbound, frame, session.player_id) {
            delivered += 1;
        }
    }
    delivered
}

/// Pushes a frame onto one session's outbound queue. A closed queue means
/// the receiving connection already died; the frame is dropped and the
/// failure logged.
fn deliver(outbound: &Outbound, frame: &[u8], recipient: PlayerId) -> bool {
    match outbound.send(frame.to_vec()) {
        Ok(()) => true,
        Err(_) => {
            tracing::warn!(%recipient, "dropping frame for unreachable session");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tokio::sync::mpsc;
    use tokio::sync::mpsc::UnboundedReceiver;

    use syncline_protocol::decode;

    use super::*;

    fn name(s: &str) -> PlayerName {
        PlayerName::new(s).unwrap()
    }

    fn channel() -> (Outbound, UnboundedReceiver<Vec<u8>>) {
        mpsc::unbounded_channel()
    }

    /// Drains every frame currently queued for a session and decodes them.
    fn drain(rx: &mut UnboundedReceiver<Vec<u8>>) -> Vec<Message> {
        let mut out = Vec::new();
        while let Ok(frame) = rx.try_recv() {
            out.push(decode(&frame).unwrap().unwrap());
        }
        out
    }

    async fn register_player(
        registry: &SessionRegistry,
        id: u32,
        player_name: &str,
    ) -> UnboundedReceiver<Vec<u8>> {
        let (tx, rx) = channel();
        registry
            .register(PlayerId(id), name(player_name), 0, 0, tx)
            .await
            .expect("register should succeed");
        rx
    }

    // -- register / unregister -------------------------------------------

    #[tokio::test]
    async fn register_duplicate_id_fails_and_keeps_one_session() {
        let registry = SessionRegistry::new();
        let _rx = register_player(&registry, 5, "first").await;

        let (tx, _rx2) = channel();
        let result = registry.register(PlayerId(5), name("second"), 1, 1, tx).await;

        assert!(matches!(
            result,
            Err(SessionError::DuplicateSession(PlayerId(5)))
        ));
        assert_eq!(registry.len().await, 1);
        // The original session survives untouched.
        let snapshot = registry.snapshot().await;
        assert_eq!(snapshot[0].name.as_str(), "first");
    }

    #[tokio::test]
    async fn unregister_is_idempotent() {
        let registry = SessionRegistry::new();
        let _rx = register_player(&registry, 3, "gone").await;

        assert!(registry.unregister(PlayerId(3)).await);
        assert!(!registry.unregister(PlayerId(3)).await);
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn unregister_unknown_is_a_noop() {
        let registry = SessionRegistry::new();
        assert!(!registry.unregister(PlayerId(99)).await);
    }

    // -- update_position --------------------------------------------------

    #[tokio::test]
    async fn update_position_overwrites_coordinates() {
        let registry = SessionRegistry::new();
        let _rx = register_player(&registry, 1, "mover").await;

        registry.update_position(PlayerId(1), 7, -4).await.unwrap();

        let snapshot = registry.snapshot().await;
        assert_eq!((snapshot[0].x, snapshot[0].y), (7, -4));
    }

    #[tokio::test]
    async fn update_position_unknown_session_fails() {
        let registry = SessionRegistry::new();
        let result = registry.update_position(PlayerId(8), 1, 1).await;
        assert!(matches!(
            result,
            Err(SessionError::UnknownSession(PlayerId(8)))
        ));
    }

    // -- broadcast --------------------------------------------------------

    #[tokio::test]
    async fn broadcast_excludes_the_named_session() {
        let registry = SessionRegistry::new();
        let mut rx_a = register_player(&registry, 1, "a").await;
        let mut rx_b = register_player(&registry, 7, "b").await;
        let mut rx_c = register_player(&registry, 3, "c").await;

        let frame = encode(&Message::PlayerLeave {
            player_id: PlayerId(42),
        });
        let delivered = registry.broadcast(&frame, Some(PlayerId(7))).await;

        assert_eq!(delivered, 2);
        assert_eq!(drain(&mut rx_a).len(), 1);
        assert_eq!(drain(&mut rx_b).len(), 0, "excluded session got a frame");
        assert_eq!(drain(&mut rx_c).len(), 1);
    }

    #[tokio::test]
    async fn broadcast_without_exclusion_reaches_everyone() {
        let registry = SessionRegistry::new();
        let mut rx_a = register_player(&registry, 1, "a").await;
        let mut rx_b = register_player(&registry, 2, "b").await;

        let frame = encode(&Message::PlayerLeave {
            player_id: PlayerId(9),
        });
        let delivered = registry.broadcast(&frame, None).await;

        assert_eq!(delivered, 2);
        assert_eq!(drain(&mut rx_a).len(), 1);
        assert_eq!(drain(&mut rx_b).len(), 1);
    }

    #[tokio::test]
    async fn broadcast_survives_a_dead_recipient() {
        let registry = SessionRegistry::new();
        let mut rx_a = register_player(&registry, 1, "a").await;
        let rx_b = register_player(&registry, 2, "b").await;
        let mut rx_c = register_player(&registry, 3, "c").await;

        // Session 2's connection died without unregistering yet.
        drop(rx_b);

        let frame = encode(&Message::PlayerLeave {
            player_id: PlayerId(9),
        });
        let delivered = registry.broadcast(&frame, None).await;

        assert_eq!(delivered, 2, "live sessions still get the frame");
        assert_eq!(drain(&mut rx_a).len(), 1);
        assert_eq!(drain(&mut rx_c).len(), 1);
        // The dead session is NOT removed by the broadcaster.
        assert!(registry.contains(PlayerId(2)).await);
    }

    #[tokio::test]
    async fn broadcast_delivers_identical_bytes() {
        let registry = SessionRegistry::new();
        let _rx_a = register_player(&registry, 1, "a").await;
        let (tx, mut rx_b) = channel();
        registry
            .register(PlayerId(2), name("b"), 0, 0, tx)
            .await
            .unwrap();

        let frame = encode(&Message::PlayerUpdate {
            player_id: PlayerId(1),
            name: name("a"),
            x: 5,
            y: 0,
        });
        registry.broadcast(&frame, Some(PlayerId(1))).await;

        let received = rx_b.try_recv().unwrap();
        assert_eq!(received, frame, "relay must be bit-identical");
    }

    // -- snapshot ---------------------------------------------------------

    #[tokio::test]
    async fn snapshot_lists_every_session() {
        let registry = SessionRegistry::new();
        let _rx_a = register_player(&registry, 1, "a").await;
        let _rx_b = register_player(&registry, 2, "b").await;

        let mut ids: Vec<u32> = registry
            .snapshot()
            .await
            .iter()
            .map(|info| info.player_id.0)
            .collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![1, 2]);
    }

    // -- join -------------------------------------------------------------

    #[tokio::test]
    async fn join_sends_init_then_peers_then_announces() {
        let registry = SessionRegistry::new();
        let mut rx_a = register_player(&registry, 1, "a").await;

        let (tx, mut rx_b) = channel();
        registry
            .join(PlayerId(2), name("b"), 4, 5, tx)
            .await
            .expect("join should succeed");

        let newcomer_view = drain(&mut rx_b);
        assert_eq!(newcomer_view.len(), 2);
        assert_eq!(
            newcomer_view[0],
            Message::PlayerInit {
                player_id: PlayerId(2),
                name: name("b"),
                x: 4,
                y: 5,
            },
            "first frame must be the newcomer's own init"
        );
        assert_eq!(
            newcomer_view[1],
            Message::PlayerJoin {
                player_id: PlayerId(1),
                name: name("a"),
                x: 0,
                y: 0,
            }
        );

        let peer_view = drain(&mut rx_a);
        assert_eq!(
            peer_view,
            vec![Message::PlayerJoin {
                player_id: PlayerId(2),
                name: name("b"),
                x: 4,
                y: 5,
            }]
        );
    }

    #[tokio::test]
    async fn join_duplicate_sends_nothing() {
        let registry = SessionRegistry::new();
        let mut rx_first = register_player(&registry, 1, "a").await;

        let (tx, mut rx_second) = channel();
        let result = registry.join(PlayerId(1), name("imposter"), 0, 0, tx).await;

        assert!(matches!(
            result,
            Err(SessionError::DuplicateSession(PlayerId(1)))
        ));
        assert!(drain(&mut rx_second).is_empty());
        assert!(drain(&mut rx_first).is_empty());
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn concurrent_joins_see_each_other_exactly_once() {
        let registry = Arc::new(SessionRegistry::new());

        let (tx_a, mut rx_a) = channel();
        let (tx_b, mut rx_b) = channel();

        let join_a = {
            let registry = Arc::clone(&registry);
            tokio::spawn(async move {
                registry.join(PlayerId(1), name("a"), 0, 0, tx_a).await
            })
        };
        let join_b = {
            let registry = Arc::clone(&registry);
            tokio::spawn(async move {
                registry.join(PlayerId(2), name("b"), 0, 0, tx_b).await
            })
        };
        join_a.await.unwrap().unwrap();
        join_b.await.unwrap().unwrap();

        let joins_seen_by_a: Vec<PlayerId> = drain(&mut rx_a)
            .into_iter()
            .filter_map(|msg| match msg {
                Message::PlayerJoin { player_id, .. } => Some(player_id),
                _ => None,
            })
            .collect();
        let joins_seen_by_b: Vec<PlayerId> = drain(&mut rx_b)
            .into_iter()
            .filter_map(|msg| match msg {
                Message::PlayerJoin { player_id, .. } => Some(player_id),
                _ => None,
            })
            .collect();

        assert_eq!(joins_seen_by_a, vec![PlayerId(2)]);
        assert_eq!(joins_seen_by_b, vec![PlayerId(1)]);
    }

    // -- leave ------------------------------------------------------------

    #[tokio::test]
    async fn leave_broadcasts_departure_once() {
        let registry = SessionRegistry::new();
        let _rx_gone = register_player(&registry, 3, "gone").await;
        let mut rx_stay = register_player(&registry, 1, "stay").await;

        assert!(registry.leave(PlayerId(3)).await);
        assert!(!registry.leave(PlayerId(3)).await, "second leave is a no-op");

        let seen = drain(&mut rx_stay);
        assert_eq!(
            seen,
            vec![Message::PlayerLeave {
                player_id: PlayerId(3),
            }],
            "peers must see exactly one departure"
        );
    }

    #[tokio::test]
    async fn leave_does_not_echo_to_the_departing_session() {
        let registry = SessionRegistry::new();
        let mut rx_gone = register_player(&registry, 3, "gone").await;

        registry.leave(PlayerId(3)).await;

        // The departing session was removed before the broadcast, so its
        // queue holds nothing.
        assert!(drain(&mut rx_gone).is_empty());
    }
}
