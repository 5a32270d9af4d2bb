use crate::config::SessionConfig;
use crate::intent::IntentKind;
use crate::store::Row;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::debug;

struct SessionEntry {
    rows: Vec<Row>,
    updated_at: Instant,
}

/// Last-turn result rows per conversation, used to resolve follow-up
/// questions such as "what is his salary?".
pub struct SessionStore {
    entries: RwLock<HashMap<String, SessionEntry>>,
    ttl: Duration,
    max_sessions: usize,
}

impl SessionStore {
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl: Duration::from_secs(config.ttl_secs),
            max_sessions: config.max_sessions.max(1),
        }
    }

    fn is_expired(&self, entry: &SessionEntry, now: Instant) -> bool {
        now.duration_since(entry.updated_at) >= self.ttl
    }

    /// Rows remembered for a session; empty when unknown or expired.
    pub async fn context(&self, session_id: &str) -> Vec<Row> {
        self.context_at(session_id, Instant::now()).await
    }

    async fn context_at(&self, session_id: &str, now: Instant) -> Vec<Row> {
        {
            let entries = self.entries.read().await;
            match entries.get(session_id) {
                None => return Vec::new(),
                Some(entry) if !self.is_expired(entry, now) => return entry.rows.clone(),
                Some(_) => {}
            }
        }

        debug!("Session {} expired", session_id);
        let mut entries = self.entries.write().await;
        if entries
            .get(session_id)
            .is_some_and(|entry| self.is_expired(entry, now))
        {
            entries.remove(session_id);
        }
        Vec::new()
    }

    /// Applies the end-of-turn rule: list intents that produced rows replace
    /// the memo, everything else clears it.
    pub async fn record(&self, session_id: &str, intent: Option<IntentKind>, rows: &[Row]) {
        let keep = intent.is_some_and(|kind| kind.is_list_producing()) && !rows.is_empty();
        if keep {
            self.remember(session_id, rows.to_vec()).await;
        } else {
            self.clear(session_id).await;
        }
    }

    pub async fn remember(&self, session_id: &str, rows: Vec<Row>) {
        self.remember_at(session_id, rows, Instant::now()).await
    }

    async fn remember_at(&self, session_id: &str, rows: Vec<Row>, now: Instant) {
        let mut entries = self.entries.write().await;

        if !entries.contains_key(session_id) && entries.len() >= self.max_sessions {
            entries.retain(|_, entry| now.duration_since(entry.updated_at) < self.ttl);
            if entries.len() >= self.max_sessions {
                let oldest = entries
                    .iter()
                    .min_by_key(|(_, entry)| entry.updated_at)
                    .map(|(id, _)| id.clone());
                if let Some(id) = oldest {
                    debug!("Evicting session {} to make room", id);
                    entries.remove(&id);
                }
            }
        }

        entries.insert(
            session_id.to_string(),
            SessionEntry {
                rows,
                updated_at: now,
            },
        );
    }

    /// Returns whether the session had anything remembered.
    pub async fn clear(&self, session_id: &str) -> bool {
        self.entries.write().await.remove(session_id).is_some()
    }

    /// Drops every expired session and returns how many were removed.
    pub async fn evict_expired(&self) -> usize {
        self.evict_expired_at(Instant::now()).await
    }

    async fn evict_expired_at(&self, now: Instant) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| now.duration_since(entry.updated_at) < self.ttl);
        before - entries.len()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}
