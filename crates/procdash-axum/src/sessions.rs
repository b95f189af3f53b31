//! Session tracking and event delivery.
//!
//! One [`SessionManager`] serves the whole process: it maps session ids to
//! their outbound channels and keeps an inverted index from process name to
//! the sessions joined to it. Unicast events go to one session, multicast
//! events to every subscriber of the named process - never to all sessions
//! globally. A send that fails against a closed outbound channel prunes the
//! dead session from the table and every subscription set.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::{RwLock, mpsc};
use tracing::debug;
use uuid::Uuid;

use procdash_core::ports::EventSink;
use procdash_core::protocol::{Delivery, ServerEvent, SessionId};

struct SessionHandle {
    /// Events queued for this session's WebSocket egress task.
    outbound: mpsc::UnboundedSender<ServerEvent>,
    /// Process names this session has joined.
    subscriptions: HashSet<String>,
}

#[derive(Default)]
struct SessionTable {
    sessions: HashMap<SessionId, SessionHandle>,
    /// Inverted index: process name -> joined sessions.
    subscribers: HashMap<String, HashSet<SessionId>>,
}

/// Tracks connected clients and routes events to them.
#[derive(Default)]
pub struct SessionManager {
    inner: RwLock<SessionTable>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new session and hand back its outbound event stream.
    pub async fn register(&self) -> (SessionId, mpsc::UnboundedReceiver<ServerEvent>) {
        let id = Uuid::new_v4();
        let (tx, rx) = mpsc::unbounded_channel();
        let mut table = self.inner.write().await;
        table.sessions.insert(
            id,
            SessionHandle {
                outbound: tx,
                subscriptions: HashSet::new(),
            },
        );
        (id, rx)
    }

    /// Remove a session, dropping it from every subscription set.
    pub async fn unregister(&self, id: SessionId) {
        let mut table = self.inner.write().await;
        if let Some(handle) = table.sessions.remove(&id) {
            for name in handle.subscriptions {
                if let Some(set) = table.subscribers.get_mut(&name) {
                    set.remove(&id);
                    if set.is_empty() {
                        table.subscribers.remove(&name);
                    }
                }
            }
        }
    }

    /// Join a session to a process's multicast events.
    pub async fn join(&self, id: SessionId, process_name: &str) {
        let mut table = self.inner.write().await;
        if let Some(handle) = table.sessions.get_mut(&id) {
            handle.subscriptions.insert(process_name.to_string());
            table
                .subscribers
                .entry(process_name.to_string())
                .or_default()
                .insert(id);
        }
    }

    /// Undo a join (used when the joined name turns out not to exist).
    pub async fn leave(&self, id: SessionId, process_name: &str) {
        let mut table = self.inner.write().await;
        if let Some(handle) = table.sessions.get_mut(&id) {
            handle.subscriptions.remove(process_name);
        }
        if let Some(set) = table.subscribers.get_mut(process_name) {
            set.remove(&id);
            if set.is_empty() {
                table.subscribers.remove(process_name);
            }
        }
    }

    /// Number of connected sessions.
    pub async fn session_count(&self) -> usize {
        self.inner.read().await.sessions.len()
    }

    /// Number of sessions joined to a process.
    pub async fn subscriber_count(&self, process_name: &str) -> usize {
        self.inner
            .read()
            .await
            .subscribers
            .get(process_name)
            .map_or(0, HashSet::len)
    }
}

#[async_trait]
impl EventSink for SessionManager {
    async fn deliver(&self, delivery: Delivery, event: ServerEvent) {
        let stale: Vec<SessionId> = {
            let table = self.inner.read().await;
            match delivery {
                Delivery::Unicast(id) => {
                    let mut stale = Vec::new();
                    if let Some(handle) = table.sessions.get(&id)
                        && handle.outbound.send(event).is_err()
                    {
                        stale.push(id);
                    }
                    stale
                }
                Delivery::Multicast(process_name) => {
                    let Some(subscribers) = table.subscribers.get(&process_name) else {
                        return;
                    };
                    let mut stale = Vec::new();
                    for id in subscribers {
                        if let Some(handle) = table.sessions.get(id)
                            && handle.outbound.send(event.clone()).is_err()
                        {
                            stale.push(*id);
                        }
                    }
                    stale
                }
            }
        };

        // A failed send means the egress task is gone; drop the session now
        // instead of waiting for socket teardown to unregister it.
        for id in stale {
            debug!(session = %id, "Pruning session with closed outbound channel");
            self.unregister(id).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log_event(lines: &[&str]) -> ServerEvent {
        ServerEvent::Log {
            process_name: "gbc".to_string(),
            lines: lines.iter().map(ToString::to_string).collect(),
        }
    }

    #[tokio::test]
    async fn multicast_reaches_only_subscribers() {
        let manager = SessionManager::new();
        let (joined, mut joined_rx) = manager.register().await;
        let (_other, mut other_rx) = manager.register().await;
        manager.join(joined, "gbc").await;

        manager
            .deliver(Delivery::Multicast("gbc".to_string()), log_event(&["hello"]))
            .await;

        assert!(matches!(
            joined_rx.try_recv(),
            Ok(ServerEvent::Log { lines, .. }) if lines == vec!["hello".to_string()]
        ));
        assert!(other_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn multicast_is_scoped_per_process() {
        let manager = SessionManager::new();
        let (id, mut rx) = manager.register().await;
        manager.join(id, "gbc").await;

        manager
            .deliver(Delivery::Multicast("gbem".to_string()), log_event(&["x"]))
            .await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn unicast_reaches_only_the_requester() {
        let manager = SessionManager::new();
        let (requester, mut requester_rx) = manager.register().await;
        let (subscriber, mut subscriber_rx) = manager.register().await;
        manager.join(subscriber, "gbc").await;

        let error = ServerEvent::Error {
            process_name: "gbc".to_string(),
            message: "Process already started".to_string(),
        };
        manager.deliver(Delivery::Unicast(requester), error).await;

        assert!(requester_rx.try_recv().is_ok());
        assert!(subscriber_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn unregister_removes_all_subscriptions() {
        let manager = SessionManager::new();
        let (id, _rx) = manager.register().await;
        manager.join(id, "gbc").await;
        manager.join(id, "gbem").await;
        assert_eq!(manager.subscriber_count("gbc").await, 1);

        manager.unregister(id).await;
        assert_eq!(manager.session_count().await, 0);
        assert_eq!(manager.subscriber_count("gbc").await, 0);
        assert_eq!(manager.subscriber_count("gbem").await, 0);
    }

    #[tokio::test]
    async fn leave_undoes_join() {
        let manager = SessionManager::new();
        let (id, mut rx) = manager.register().await;
        manager.join(id, "gbc").await;
        manager.leave(id, "gbc").await;

        manager
            .deliver(Delivery::Multicast("gbc".to_string()), log_event(&["y"]))
            .await;
        assert!(rx.try_recv().is_err());
        assert_eq!(manager.subscriber_count("gbc").await, 0);
    }

    #[tokio::test]
    async fn multicast_prunes_sessions_with_closed_channels() {
        let manager = SessionManager::new();
        let (dead, dead_rx) = manager.register().await;
        let (live, mut live_rx) = manager.register().await;
        manager.join(dead, "gbc").await;
        manager.join(live, "gbc").await;
        drop(dead_rx);

        manager
            .deliver(Delivery::Multicast("gbc".to_string()), log_event(&["z"]))
            .await;

        assert!(live_rx.try_recv().is_ok());
        assert_eq!(manager.session_count().await, 1);
        assert_eq!(manager.subscriber_count("gbc").await, 1);
    }

    #[tokio::test]
    async fn unicast_prunes_a_session_with_a_closed_channel() {
        let manager = SessionManager::new();
        let (id, rx) = manager.register().await;
        manager.join(id, "gbc").await;
        drop(rx);

        let error = ServerEvent::Error {
            process_name: "gbc".to_string(),
            message: "Process not started".to_string(),
        };
        manager.deliver(Delivery::Unicast(id), error).await;

        assert_eq!(manager.session_count().await, 0);
        assert_eq!(manager.subscriber_count("gbc").await, 0);
    }

    #[tokio::test]
    async fn join_is_idempotent() {
        let manager = SessionManager::new();
        let (id, mut rx) = manager.register().await;
        manager.join(id, "gbc").await;
        manager.join(id, "gbc").await;

        manager
            .deliver(Delivery::Multicast("gbc".to_string()), log_event(&["once"]))
            .await;
        assert!(rx.try_recv().is_ok());
        // delivered once, not per-join
        assert!(rx.try_recv().is_err());
    }
}
