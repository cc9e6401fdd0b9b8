//! In-process registry of Server-Sent Events subscribers.
//!
//! The hub is created at startup, handed to handlers through `AppState`,
//! and closed during graceful shutdown. Delivery is best-effort: there is
//! no replay and no back-pressure, and a client whose receiver is gone is
//! dropped the next time something is sent to it.

use std::sync::Arc;

use common::{ChallengeStatus, UserRole};
use dashmap::DashMap;
use futures::stream::{self, Stream};
use serde::Serialize;
use serde_json::json;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Identifier of one connected stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ClientId(Uuid);

impl ClientId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for ClientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Who is listening on a stream. Anonymous subscribers have no user.
#[derive(Clone, Debug, Default)]
pub struct ClientInfo {
    pub user_id: Option<i32>,
    pub role: Option<UserRole>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ServerEvent {
    pub name: &'static str,
    pub data: serde_json::Value,
}

impl ServerEvent {
    pub const CONNECTED: &'static str = "connected";
    pub const CHALLENGE_UPDATED: &'static str = "challenge-updated";
    pub const PARTICIPANT_JOINED: &'static str = "challenge-participant-joined";
    pub const FINALIZATION_UPDATED: &'static str = "finalization-updated";

    pub fn connected(id: ClientId) -> Self {
        Self {
            name: Self::CONNECTED,
            data: json!({ "clientId": id }),
        }
    }

    pub fn challenge_updated(challenge_id: i32, status: ChallengeStatus) -> Self {
        Self {
            name: Self::CHALLENGE_UPDATED,
            data: json!({ "challengeId": challenge_id, "status": status }),
        }
    }

    pub fn participant_joined(challenge_id: i32, student_id: i32) -> Self {
        Self {
            name: Self::PARTICIPANT_JOINED,
            data: json!({ "challengeId": challenge_id, "studentId": student_id }),
        }
    }

    pub fn finalization_updated(challenge_id: i32) -> Self {
        Self {
            name: Self::FINALIZATION_UPDATED,
            data: json!({ "challengeId": challenge_id }),
        }
    }
}

struct ClientEntry {
    info: ClientInfo,
    tx: mpsc::UnboundedSender<ServerEvent>,
}

#[derive(Clone, Default)]
pub struct EventHub {
    clients: Arc<DashMap<ClientId, ClientEntry>>,
}

impl EventHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_client(
        &self,
        info: ClientInfo,
    ) -> (ClientId, mpsc::UnboundedReceiver<ServerEvent>) {
        let id = ClientId::new();
        let (tx, rx) = mpsc::unbounded_channel();
        self.clients.insert(id, ClientEntry { info, tx });
        tracing::debug!(client_id = %id, clients = self.client_count(), "SSE client registered");
        (id, rx)
    }

    pub fn remove_client(&self, id: ClientId) -> bool {
        let removed = self.clients.remove(&id).is_some();
        if removed {
            tracing::debug!(client_id = %id, "SSE client removed");
        }
        removed
    }

    /// Send to one client. A closed channel removes the client and returns `false`.
    pub fn send_event(&self, id: ClientId, event: ServerEvent) -> bool {
        let delivered = match self.clients.get(&id) {
            Some(entry) => entry.tx.send(event).is_ok(),
            None => return false,
        };
        if !delivered {
            self.remove_client(id);
        }
        delivered
    }

    /// Send to every client accepted by `filter` (all clients when `None`).
    /// Returns the number of clients the event was handed to.
    pub fn broadcast(
        &self,
        event: ServerEvent,
        filter: Option<&(dyn Fn(&ClientInfo) -> bool + Sync)>,
    ) -> usize {
        let mut delivered = 0;
        let mut dead = Vec::new();

        for entry in self.clients.iter() {
            if filter.is_some_and(|f| !f(&entry.info)) {
                continue;
            }
            if entry.tx.send(event.clone()).is_ok() {
                delivered += 1;
            } else {
                dead.push(*entry.key());
            }
        }

        // Removal must happen after iteration releases the shard locks.
        for id in dead {
            self.remove_client(id);
        }

        tracing::debug!(event = event.name, delivered, "SSE broadcast");
        delivered
    }

    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    /// Drop every sender so open streams end.
    pub fn close_all(&self) {
        let count = self.client_count();
        self.clients.clear();
        tracing::info!(clients = count, "Closed all SSE clients");
    }

    /// Register a client and return its event stream, starting with `connected`.
    /// The client is removed when the stream is dropped.
    pub fn subscribe(&self, info: ClientInfo) -> (ClientId, impl Stream<Item = ServerEvent> + use<>) {
        let (id, rx) = self.register_client(info);
        self.send_event(id, ServerEvent::connected(id));

        let guard = ClientGuard {
            hub: self.clone(),
            id,
        };
        let stream = stream::unfold((rx, guard), |(mut rx, guard)| async move {
            let event = rx.recv().await?;
            Some((event, (rx, guard)))
        });
        (id, stream)
    }
}

struct ClientGuard {
    hub: EventHub,
    id: ClientId,
}

impl Drop for ClientGuard {
    fn drop(&mut self) {
        self.hub.remove_client(self.id);
    }
}
