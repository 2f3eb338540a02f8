use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::services::preview::ObjectUrlRegistry;
use crate::services::session::Session;

pub type SharedSession = Arc<Mutex<Session>>;

struct SessionEntry {
    session: SharedSession,
    last_seen: DateTime<Utc>,
}

impl SessionEntry {
    fn is_expired(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        now > self.last_seen + ttl
    }
}

/// Browser sessions keyed by cookie id, dropped after `ttl` of inactivity.
///
/// Dropping a session drops its preview guard, so expiry also revokes the
/// object URLs it owned.
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<Uuid, SessionEntry>>>,
    registry: ObjectUrlRegistry,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(registry: ObjectUrlRegistry, ttl_seconds: i64) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            registry,
            ttl: Duration::seconds(ttl_seconds),
        }
    }

    pub fn registry(&self) -> &ObjectUrlRegistry {
        &self.registry
    }

    /// Returns the session for `id`, creating a fresh one when the id is
    /// missing, unknown or expired. The boolean is true for new sessions.
    pub async fn resolve(&self, id: Option<Uuid>) -> (Uuid, SharedSession, bool) {
        let now = Utc::now();

        if let Some(id) = id {
            let mut sessions = self.sessions.write().await;
            if let Some(entry) = sessions.get_mut(&id) {
                if !entry.is_expired(self.ttl, now) {
                    entry.last_seen = now;
                    return (id, entry.session.clone(), false);
                }
            }
        }

        self.cleanup().await;

        let id = Uuid::new_v4();
        let session = Arc::new(Mutex::new(Session::new()));
        self.sessions.write().await.insert(
            id,
            SessionEntry {
                session: session.clone(),
                last_seen: now,
            },
        );
        log::info!("Started session {}", id);
        (id, session, true)
    }

    pub async fn get(&self, id: &Uuid) -> Option<SharedSession> {
        let sessions = self.sessions.read().await;
        sessions
            .get(id)
            .filter(|entry| !entry.is_expired(self.ttl, Utc::now()))
            .map(|entry| entry.session.clone())
    }

    /// Drops expired sessions and unclaimed downloads.
    pub async fn cleanup(&self) -> usize {
        let now = Utc::now();
        let expired: Vec<SessionEntry> = {
            let mut sessions = self.sessions.write().await;
            let ids: Vec<Uuid> = sessions
                .iter()
                .filter(|(_, entry)| entry.is_expired(self.ttl, now))
                .map(|(id, _)| *id)
                .collect();
            ids.iter().filter_map(|id| sessions.remove(id)).collect()
        };

        let count = expired.len();
        // Dropped outside the map lock; each drop revokes the session's preview.
        drop(expired);

        let purged = self.registry.purge_unclaimed(self.ttl);
        if count > 0 || purged > 0 {
            log::info!("Expired {} sessions and {} unclaimed downloads", count, purged);
        }
        count
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SelectedFile;
    use crate::services::session::Event;

    #[tokio::test]
    async fn test_resolve_reuses_known_session() {
        let store = SessionStore::new(ObjectUrlRegistry::new(), 60);
        let (id, first, created) = store.resolve(None).await;
        assert!(created);

        first.lock().await.dispatch(Event::Edit("kept".into())).unwrap();

        let (same_id, second, created) = store.resolve(Some(id)).await;
        assert!(!created);
        assert_eq!(same_id, id);
        assert_eq!(second.lock().await.extracted_text(), "kept");
    }

    #[tokio::test]
    async fn test_unknown_id_gets_fresh_session() {
        let store = SessionStore::new(ObjectUrlRegistry::new(), 60);
        let stale = Uuid::new_v4();
        let (id, _, created) = store.resolve(Some(stale)).await;
        assert!(created);
        assert_ne!(id, stale);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let store = SessionStore::new(ObjectUrlRegistry::new(), 60);
        let (_, a, _) = store.resolve(None).await;
        let (_, b, _) = store.resolve(None).await;
        a.lock().await.dispatch(Event::Edit("only a".into())).unwrap();
        assert_eq!(b.lock().await.extracted_text(), "");
    }

    #[tokio::test]
    async fn test_expiry_revokes_preview() {
        let registry = ObjectUrlRegistry::new();
        let store = SessionStore::new(registry.clone(), 1);
        let (id, session, _) = store.resolve(None).await;

        let preview = registry.create("image/png", vec![7]);
        let preview_id = preview.id();
        session
            .lock()
            .await
            .dispatch(Event::Select {
                file: SelectedFile {
                    name: "a.png".into(),
                    mime: "image/png".into(),
                    bytes: vec![7],
                },
                preview: Some(preview),
            })
            .unwrap();
        drop(session);

        tokio::time::sleep(std::time::Duration::from_millis(2100)).await;

        assert!(store.get(&id).await.is_none());
        assert_eq!(store.cleanup().await, 1);
        assert!(store.is_empty().await);
        assert!(registry.resolve(&preview_id).is_none());
    }
}
