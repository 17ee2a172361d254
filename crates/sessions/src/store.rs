use {anyhow::Result, async_trait::async_trait};

use crate::Session;

/// In-place edit applied under the session's lock.
pub type Mutator<'a> = Box<dyn FnOnce(&mut Session) + Send + 'a>;

/// Owner of all session state.
///
/// Every mutation goes through [`SessionStore::update`], which runs the
/// mutator while holding a lock scoped to that one session id and hands back
/// a snapshot of the result.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Load the session, creating a fresh one for an unseen id.
    async fn get_or_create(&self, id: &str) -> Session;

    async fn get(&self, id: &str) -> Option<Session>;

    /// Atomic read-modify-write. Unknown ids are created first.
    async fn update<'a>(&self, id: &str, mutator: Mutator<'a>) -> Session;

    /// Remove a session, returning its final state.
    async fn delete(&self, id: &str) -> Option<Session>;

    /// All sessions, oldest first.
    async fn list(&self) -> Vec<Session>;

    /// Whole seconds between creation and last activity; 0 for unknown ids.
    async fn engagement_duration(&self, id: &str) -> u64 {
        self.get(id)
            .await
            .map(|s| s.engagement_duration_secs())
            .unwrap_or(0)
    }
}

/// Durable storage behind the in-memory store.
///
/// Writes are best effort: the in-memory copy stays authoritative and callers
/// only log failures.
#[async_trait]
pub trait SessionBackend: Send + Sync {
    async fn load_all(&self) -> Result<Vec<Session>>;
    async fn save(&self, session: &Session) -> Result<()>;
    async fn remove(&self, id: &str) -> Result<()>;
}
