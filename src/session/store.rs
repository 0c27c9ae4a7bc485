use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use moka::future::Cache;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::config::SessionConfig;
use crate::provider::PendingHandshake;
use crate::types::{PendingIdentity, ProviderKind};

/// Everything kept for one browser session.
#[derive(Debug, Default, Clone)]
pub struct SessionData {
    pub user_id: Option<i32>,
    pub pending: Option<PendingIdentity>,
    pub handshakes: HashMap<ProviderKind, PendingHandshake>,
}

/// Handle to one session for the duration of a request.
#[derive(Debug, Clone)]
pub struct Session {
    id: String,
    data: Arc<Mutex<SessionData>>,
    rotate: Arc<AtomicBool>,
}

impl Session {
    fn new(id: String, data: Arc<Mutex<SessionData>>) -> Self {
        Self {
            id,
            data,
            rotate: Arc::new(AtomicBool::new(false)),
        }
    }

    /// A session not backed by any store, for tests and one-off use.
    #[must_use]
    pub fn detached() -> Self {
        Self::new(Uuid::new_v4().simple().to_string(), Arc::default())
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    pub async fn user_id(&self) -> Option<i32> {
        self.data.lock().await.user_id
    }

    pub async fn is_authenticated(&self) -> bool {
        self.user_id().await.is_some()
    }

    /// Mark the session as logged in. The id is rotated when the response goes out.
    pub async fn login(&self, user_id: i32) {
        self.data.lock().await.user_id = Some(user_id);
        self.rotate.store(true, Ordering::Relaxed);
    }

    /// Drop everything held by the session.
    pub async fn flush(&self) {
        *self.data.lock().await = SessionData::default();
        self.rotate.store(true, Ordering::Relaxed);
    }

    pub async fn set_handshake(&self, provider: ProviderKind, handshake: PendingHandshake) {
        self.data.lock().await.handshakes.insert(provider, handshake);
    }

    /// Remove and return the handshake for `provider`.
    pub async fn take_handshake(&self, provider: ProviderKind) -> Option<PendingHandshake> {
        self.data.lock().await.handshakes.remove(&provider)
    }

    pub(super) async fn with_data<R>(&self, f: impl FnOnce(&mut SessionData) -> R) -> R {
        let mut guard = self.data.lock().await;
        f(&mut guard)
    }

    pub(super) fn wants_rotation(&self) -> bool {
        self.rotate.load(Ordering::Relaxed)
    }
}

/// In-memory session store with idle expiry.
#[derive(Clone)]
pub struct SessionStore {
    cache: Cache<String, Arc<Mutex<SessionData>>>,
    config: SessionConfig,
}

impl SessionStore {
    #[must_use]
    pub fn new(config: &SessionConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(config.max_entries)
            .time_to_idle(Duration::from_secs(config.ttl_seconds))
            .build();
        Self {
            cache,
            config: config.clone(),
        }
    }

    #[must_use]
    pub const fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Load the session named by the cookie, or start a new one.
    ///
    /// Returns the session and whether it was created.
    pub async fn load_or_create(&self, id: Option<&str>) -> (Session, bool) {
        if let Some(id) = id {
            if let Some(data) = self.cache.get(id).await {
                return (Session::new(id.to_string(), data), false);
            }
        }

        let id = Uuid::new_v4().simple().to_string();
        let data = Arc::new(Mutex::new(SessionData::default()));
        self.cache.insert(id.clone(), Arc::clone(&data)).await;
        (Session::new(id, data), true)
    }

    /// Move the session's data under a fresh id and return it.
    pub async fn rotate(&self, session: &Session) -> String {
        let new_id = Uuid::new_v4().simple().to_string();
        self.cache.invalidate(session.id()).await;
        self.cache.insert(new_id.clone(), Arc::clone(&session.data)).await;
        new_id
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.cache.contains_key(id)
    }

    /// Snapshot of a stored session's data.
    pub async fn snapshot(&self, id: &str) -> Option<SessionData> {
        match self.cache.get(id).await {
            Some(data) => Some(data.lock().await.clone()),
            None => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_load_or_create_reuses_known_ids() {
        let store = SessionStore::new(&SessionConfig::default());
        let (session, created) = store.load_or_create(None).await;
        assert!(created);
        session.login(7).await;

        let (again, created) = store.load_or_create(Some(session.id())).await;
        assert!(!created);
        assert_eq!(again.user_id().await, Some(7));

        let (_, created) = store.load_or_create(Some("unknown")).await;
        assert!(created);
    }

    #[tokio::test]
    async fn test_rotate_moves_data() {
        let store = SessionStore::new(&SessionConfig::default());
        let (session, _) = store.load_or_create(None).await;
        session.login(3).await;
        assert!(session.wants_rotation());

        let new_id = store.rotate(&session).await;
        assert_ne!(new_id, session.id());
        assert!(!store.contains(session.id()));
        assert_eq!(store.snapshot(&new_id).await.unwrap().user_id, Some(3));
    }

    #[tokio::test]
    async fn test_flush_clears_everything() {
        let session = Session::detached();
        session.login(1).await;
        session
            .set_handshake(
                ProviderKind::Twitter,
                PendingHandshake::OAuth1 {
                    request_token: "t".into(),
                    request_token_secret: "s".into(),
                },
            )
            .await;

        session.flush().await;
        assert!(!session.is_authenticated().await);
        assert!(session.take_handshake(ProviderKind::Twitter).await.is_none());
    }

    #[tokio::test]
    async fn test_take_handshake_is_one_shot() {
        let session = Session::detached();
        let handshake = PendingHandshake::OAuth2 {
            state: "s".into(),
            redirect_url: "http://localhost/cb".into(),
        };
        session.set_handshake(ProviderKind::Facebook, handshake.clone()).await;

        assert_eq!(session.take_handshake(ProviderKind::Facebook).await, Some(handshake));
        assert_eq!(session.take_handshake(ProviderKind::Facebook).await, None);
    }
}
