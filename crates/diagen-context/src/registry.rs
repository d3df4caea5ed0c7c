use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex as StdMutex, MutexGuard as StdMutexGuard};

use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::session::{Session, SessionMessage};

/// Per-session mutexes. An entry lives only while someone holds or waits
/// on it, so the table is bounded by in-flight requests.
#[derive(Clone, Default)]
struct LockTable(Arc<StdMutex<HashMap<String, Arc<Mutex<()>>>>>);

impl LockTable {
    fn table(&self) -> StdMutexGuard<'_, HashMap<String, Arc<Mutex<()>>>> {
        self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn checkout(&self, session_id: &str) -> Arc<Mutex<()>> {
        let mut table = self.table();
        // Waiters cancelled before acquiring leave idle entries behind.
        table.retain(|_, lock| Arc::strong_count(lock) > 1);
        table
            .entry(session_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Drop the entry if nobody holds or waits on it.
    fn prune(&self, session_id: &str) {
        let mut table = self.table();
        if table
            .get(session_id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            table.remove(session_id);
        }
    }

    fn len(&self) -> usize {
        self.table().len()
    }
}

/// Held for the whole of one request against a session. Dropping it
/// releases the session and prunes its lock entry when idle.
pub struct SessionGuard {
    guard: Option<OwnedMutexGuard<()>>,
    session_id: String,
    locks: LockTable,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        // Release first so our own reference does not count as a holder.
        drop(self.guard.take());
        self.locks.prune(&self.session_id);
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SessionConfig {
    /// Messages kept per session.
    pub max_messages: usize,
    /// Sessions kept before the oldest-created one is evicted.
    pub max_sessions: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_messages: 20,
            max_sessions: 100,
        }
    }
}

#[derive(Default)]
struct State {
    sessions: HashMap<String, Session>,
    /// Creation order. Eviction is FIFO on this, not on last access.
    order: VecDeque<String>,
}

impl State {
    fn session_mut(&mut self, id: &str, max_sessions: usize) -> &mut Session {
        if !self.sessions.contains_key(id) {
            self.sessions.insert(id.to_string(), Session::new(id));
            self.order.push_back(id.to_string());
            tracing::debug!(session_id = %id, "Session created");
            self.evict_over(max_sessions, Some(id));
        }
        self.sessions.entry(id.to_string()).or_insert_with(|| Session::new(id))
    }

    /// Remove one session if over capacity, never `keep`.
    fn evict_over(&mut self, max_sessions: usize, keep: Option<&str>) -> Option<String> {
        if self.sessions.len() <= max_sessions {
            return None;
        }
        let pos = self.order.iter().position(|id| Some(id.as_str()) != keep)?;
        let victim = self.order.remove(pos)?;
        self.sessions.remove(&victim);
        tracing::debug!(session_id = %victim, "Session evicted");
        Some(victim)
    }
}

/// Process-wide session store.
pub struct SessionRegistry {
    config: SessionConfig,
    state: Mutex<State>,
    locks: LockTable,
}

impl SessionRegistry {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config: SessionConfig {
                max_messages: config.max_messages.max(1),
                max_sessions: config.max_sessions.max(1),
            },
            state: Mutex::new(State::default()),
            locks: LockTable::default(),
        }
    }

    pub fn config(&self) -> SessionConfig {
        self.config
    }

    /// Snapshot of the session, creating an empty one if absent.
    pub async fn get(&self, session_id: &str) -> Session {
        let mut state = self.state.lock().await;
        state.session_mut(session_id, self.config.max_sessions).clone()
    }

    pub async fn append(&self, session_id: &str, message: SessionMessage) {
        let mut state = self.state.lock().await;
        state
            .session_mut(session_id, self.config.max_sessions)
            .push(message, self.config.max_messages);
    }

    /// Drop the oldest-created session if the registry is over capacity.
    pub async fn evict_if_over_capacity(&self) -> Option<String> {
        let mut state = self.state.lock().await;
        state.evict_over(self.config.max_sessions, None)
    }

    /// Serialize work on one session. Other sessions are unaffected.
    pub async fn lock_session(&self, session_id: &str) -> SessionGuard {
        let lock = self.locks.checkout(session_id);
        let guard = lock.lock_owned().await;
        SessionGuard {
            guard: Some(guard),
            session_id: session_id.to_string(),
            locks: self.locks.clone(),
        }
    }

    /// Lock entries currently held or awaited.
    pub fn active_locks(&self) -> usize {
        self.locks.len()
    }

    pub async fn contains(&self, session_id: &str) -> bool {
        self.state.lock().await.sessions.contains_key(session_id)
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.sessions.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn remove(&self, session_id: &str) -> bool {
        let mut state = self.state.lock().await;
        state.order.retain(|id| id != session_id);
        let removed = state.sessions.remove(session_id).is_some();
        self.locks.prune(session_id);
        removed
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}
