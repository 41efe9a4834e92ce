//! In-memory chat sessions.
//!
//! Each session owns one [`DialogueEngine`]. The map lock is only held to
//! find or insert an entry; a turn runs under that entry's own mutex, so
//! turns of one session are serialized while different sessions proceed
//! concurrently.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tablebot_conversation::{BookingPolicy, Capabilities, DialogueEngine, Script};
use tablebot_core::SessionId;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;
use tracing::{debug, info};

/// A live conversation.
#[derive(Debug)]
pub struct SessionEntry {
    /// The dialogue state for this session.
    pub engine: DialogueEngine,
    last_active: Instant,
}

impl SessionEntry {
    /// Marks the session as used now.
    pub fn touch(&mut self) {
        self.last_active = Instant::now();
    }

    /// Time since the last turn.
    #[must_use]
    pub fn idle_for(&self) -> Duration {
        self.last_active.elapsed()
    }
}

/// Session id → conversation.
#[derive(Debug)]
pub struct SessionRegistry {
    script: Arc<Script>,
    capabilities: Capabilities,
    policy: BookingPolicy,
    idle_timeout: Duration,
    sessions: RwLock<HashMap<SessionId, Arc<Mutex<SessionEntry>>>>,
}

impl SessionRegistry {
    /// Creates an empty registry; every new session runs `script`.
    #[must_use]
    pub fn new(
        script: Arc<Script>,
        capabilities: Capabilities,
        policy: BookingPolicy,
        idle_timeout: Duration,
    ) -> Self {
        Self {
            script,
            capabilities,
            policy,
            idle_timeout,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the session for `id`, creating a fresh one when `id` is absent
    /// or unknown.
    pub async fn get_or_create(
        &self,
        id: Option<SessionId>,
    ) -> (SessionId, Arc<Mutex<SessionEntry>>) {
        if let Some(id) = id
            && let Some(entry) = self.sessions.read().await.get(&id)
        {
            return (id, Arc::clone(entry));
        }

        let id = id.unwrap_or_default();
        let mut sessions = self.sessions.write().await;
        let entry = sessions.entry(id).or_insert_with(|| {
            debug!(session = %id, "starting session");
            let engine = DialogueEngine::new(Arc::clone(&self.script), self.capabilities.clone())
                .with_policy(self.policy.clone());
            Arc::new(Mutex::new(SessionEntry {
                engine,
                last_active: Instant::now(),
            }))
        });
        (id, Arc::clone(entry))
    }

    /// Drops sessions idle for longer than the configured timeout.
    ///
    /// Sessions with a turn in flight are skipped.
    pub async fn evict_idle(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, entry| match entry.try_lock() {
            Ok(entry) => entry.idle_for() <= self.idle_timeout,
            Err(_) => true,
        });
        let evicted = before - sessions.len();
        if evicted > 0 {
            info!(evicted, remaining = sessions.len(), "evicted idle sessions");
        }
        evicted
    }

    /// Number of live sessions.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Whether no session is live.
    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}
