//! Signed-in sessions held by the service.
//!
//! The upstream bearer token never leaves the server; clients hold a session
//! id. Every sign-in, sign-out, eviction and expiry is broadcast so all tabs
//! sharing a session observe it at once.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionEventKind {
    SignedIn,
    SignedOut,
    Evicted,
    Expired,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SessionEvent {
    pub session_id: Uuid,
    pub kind: SessionEventKind,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct Session {
    pub id: Uuid,
    token: String,
    pub last_seen: DateTime<Utc>,
}

pub struct SessionStore {
    sessions: DashMap<Uuid, Session>,
    events_tx: broadcast::Sender<SessionEvent>,
}

impl SessionStore {
    pub fn new(event_buffer_size: usize) -> Self {
        let (events_tx, _unused_rx) = broadcast::channel(event_buffer_size);
        Self {
            sessions: DashMap::new(),
            events_tx,
        }
    }

    pub fn sign_in(&self, token: String) -> Uuid {
        let now = Utc::now();
        let session = Session {
            id: Uuid::new_v4(),
            token,
            last_seen: now,
        };
        let id = session.id;

        self.sessions.insert(id, session);
        self.notify(id, SessionEventKind::SignedIn);
        info!(session_id = %id, "session started");
        id
    }

    /// Upstream token for the session, refreshing its last-seen time.
    pub fn token(&self, id: Uuid) -> Option<String> {
        self.sessions.get_mut(&id).map(|mut session| {
            session.last_seen = Utc::now();
            session.token.clone()
        })
    }

    pub fn get(&self, id: Uuid) -> Option<Session> {
        self.sessions.get(&id).map(|session| session.value().clone())
    }

    pub fn sign_out(&self, id: Uuid) -> bool {
        self.end(id, SessionEventKind::SignedOut)
    }

    /// Drops a session whose token the backend no longer accepts.
    pub fn evict(&self, id: Uuid) -> bool {
        self.end(id, SessionEventKind::Evicted)
    }

    /// Ends every session not seen since `cutoff`, returning their ids.
    pub fn expire_idle(&self, cutoff: DateTime<Utc>) -> Vec<Uuid> {
        let idle: Vec<Uuid> = self
            .sessions
            .iter()
            .filter(|session| session.last_seen < cutoff)
            .map(|session| session.id)
            .collect();

        idle.into_iter()
            .filter(|id| {
                self.sessions
                    .remove_if(id, |_, session| session.last_seen < cutoff)
                    .is_some()
            })
            .inspect(|id| {
                self.notify(*id, SessionEventKind::Expired);
                info!(session_id = %id, "session expired");
            })
            .collect()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events_tx.subscribe()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    fn end(&self, id: Uuid, kind: SessionEventKind) -> bool {
        if self.sessions.remove(&id).is_none() {
            return false;
        }
        self.notify(id, kind);
        info!(session_id = %id, reason = ?kind, "session ended");
        true
    }

    fn notify(&self, session_id: Uuid, kind: SessionEventKind) {
        let _ = self.events_tx.send(SessionEvent {
            session_id,
            kind,
            at: Utc::now(),
        });
    }
}
