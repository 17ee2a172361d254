use std::sync::Arc;

use {
    anyhow::Result,
    async_trait::async_trait,
    dashmap::{DashMap, mapref::entry::Entry},
    tokio::sync::Mutex,
    tracing::{debug, warn},
};

use crate::{
    Session,
    store::{Mutator, SessionBackend, SessionStore},
};

/// Concurrent map of per-session mutexes.
///
/// Two messages for the same id serialize on that session's mutex; different
/// ids never wait on each other. When a backend is attached, every committed
/// change is written through while the session's lock is still held, so the
/// backend sees writes for one id in commit order.
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: DashMap<String, Arc<Mutex<Session>>>,
    backend: Option<Arc<dyn SessionBackend>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a durable backend and load whatever it already holds.
    pub async fn with_backend(backend: Arc<dyn SessionBackend>) -> Result<Self> {
        let sessions = DashMap::new();
        for session in backend.load_all().await? {
            sessions.insert(session.id.clone(), Arc::new(Mutex::new(session)));
        }
        debug!(count = sessions.len(), "loaded persisted sessions");
        Ok(Self {
            sessions,
            backend: Some(backend),
        })
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    fn slot(&self, id: &str) -> (Arc<Mutex<Session>>, bool) {
        match self.sessions.entry(id.to_string()) {
            Entry::Occupied(entry) => (Arc::clone(entry.get()), false),
            Entry::Vacant(entry) => {
                let slot = Arc::new(Mutex::new(Session::new(id)));
                entry.insert(Arc::clone(&slot));
                (slot, true)
            },
        }
    }

    /// False once `slot` has been deleted (or replaced by a newer session).
    fn is_current(&self, id: &str, slot: &Arc<Mutex<Session>>) -> bool {
        self.sessions
            .get(id)
            .is_some_and(|entry| Arc::ptr_eq(entry.value(), slot))
    }

    async fn persist(&self, session: &Session) {
        if let Some(backend) = &self.backend
            && let Err(e) = backend.save(session).await
        {
            warn!(session_id = %session.id, error = %e, "failed to persist session");
        }
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get_or_create(&self, id: &str) -> Session {
        let (slot, created) = self.slot(id);
        let session = slot.lock().await;
        if created && self.is_current(id, &slot) {
            debug!(session_id = %id, "created session");
            self.persist(&session).await;
        }
        session.clone()
    }

    async fn get(&self, id: &str) -> Option<Session> {
        let slot = self.sessions.get(id).map(|entry| Arc::clone(entry.value()))?;
        let session = slot.lock().await;
        Some(session.clone())
    }

    async fn update<'a>(&self, id: &str, mutator: Mutator<'a>) -> Session {
        let (slot, _) = self.slot(id);
        let mut session = slot.lock().await;
        mutator(&mut *session);
        // A delete that won the lock first leaves this copy orphaned.
        if self.is_current(id, &slot) {
            self.persist(&session).await;
        }
        session.clone()
    }

    async fn delete(&self, id: &str) -> Option<Session> {
        let slot = self.sessions.get(id).map(|entry| Arc::clone(entry.value()))?;
        let session = slot.lock().await;
        self.sessions
            .remove_if(id, |_, current| Arc::ptr_eq(current, &slot))?;
        if let Some(backend) = &self.backend
            && let Err(e) = backend.remove(id).await
        {
            warn!(session_id = %id, error = %e, "failed to remove persisted session");
        }
        Some(session.clone())
    }

    async fn list(&self) -> Vec<Session> {
        let slots: Vec<_> = self
            .sessions
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        let mut out = Vec::with_capacity(slots.len());
        for slot in slots {
            out.push(slot.lock().await.clone());
        }
        out.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        out
    }
}
