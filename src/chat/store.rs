//! In-memory session registry for channels that serve many conversations.
//!
//! Each session sits behind its own lock, so a slow LLM call in one
//! conversation never blocks another. Nothing survives a restart.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use tokio::sync::Mutex;

use super::session::Session;

/// Sessions keyed by a channel-specific conversation id.
pub struct SessionStore<K> {
    sessions: Mutex<HashMap<K, Arc<Mutex<Session>>>>,
}

impl<K> Default for SessionStore<K> {
    fn default() -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
        }
    }
}

impl<K: Eq + Hash> SessionStore<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, key: &K) -> Option<Arc<Mutex<Session>>> {
        self.sessions.lock().await.get(key).cloned()
    }

    /// The session for `key`, starting a fresh one if there is none.
    pub async fn get_or_create(&self, key: K) -> Arc<Mutex<Session>> {
        self.sessions
            .lock()
            .await
            .entry(key)
            .or_insert_with(|| Arc::new(Mutex::new(Session::new())))
            .clone()
    }

    /// Store `session` under `key`, replacing any previous one.
    pub async fn insert(&self, key: K, session: Session) -> Arc<Mutex<Session>> {
        let handle = Arc::new(Mutex::new(session));
        self.sessions.lock().await.insert(key, Arc::clone(&handle));
        handle
    }

    /// Forget a conversation. Returns false if it was unknown.
    pub async fn remove(&self, key: &K) -> bool {
        self.sessions.lock().await.remove(key).is_some()
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
