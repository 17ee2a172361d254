use std::sync::Arc;

use {
    anyhow::Result,
    decoy_agents::{Persona, ProviderChain},
    decoy_config::{DecoyConfig, SessionBackendKind, SessionsConfig},
    decoy_sessions::{JsonFileBackend, MemorySessionStore, SessionStore, SqliteSessionBackend},
    tokio_util::task::TaskTracker,
    tracing::info,
};

use crate::{auth::ApiKeyAuth, callback::CallbackDispatcher};

/// Everything a request handler needs.
pub struct GatewayState {
    pub store: Arc<dyn SessionStore>,
    pub chain: ProviderChain,
    pub persona: Persona,
    pub auth: ApiKeyAuth,
    pub dispatcher: Option<CallbackDispatcher>,
    /// Detached callback dispatches; shutdown waits on these.
    pub tasks: TaskTracker,
    pub version: String,
}

impl GatewayState {
    pub fn new(store: Arc<dyn SessionStore>, chain: ProviderChain) -> Self {
        Self {
            store,
            chain,
            persona: Persona::default(),
            auth: ApiKeyAuth::default(),
            dispatcher: None,
            tasks: TaskTracker::new(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    pub fn with_persona(mut self, persona: Persona) -> Self {
        self.persona = persona;
        self
    }

    pub fn with_auth(mut self, auth: ApiKeyAuth) -> Self {
        self.auth = auth;
        self
    }

    pub fn with_dispatcher(mut self, dispatcher: CallbackDispatcher) -> Self {
        self.dispatcher = Some(dispatcher);
        self
    }

    /// Wire up the store, provider chain, persona, auth and callback from a
    /// loaded config.
    pub async fn from_config(config: &DecoyConfig) -> Result<Self> {
        let store = open_store(&config.sessions).await?;
        let chain = decoy_agents::build_chain(config);
        let mut state = Self::new(store, chain)
            .with_persona(Persona::from(&config.persona))
            .with_auth(ApiKeyAuth::new(config.server.api_key.clone()));
        if let Some(dispatcher) = CallbackDispatcher::from_config(&config.callback) {
            state = state.with_dispatcher(dispatcher);
        }
        Ok(state)
    }
}

/// Open the configured session store, loading anything already persisted.
pub async fn open_store(config: &SessionsConfig) -> Result<Arc<dyn SessionStore>> {
    let store = match config.backend {
        SessionBackendKind::Memory => MemorySessionStore::new(),
        SessionBackendKind::Json => {
            let path = config
                .path
                .clone()
                .unwrap_or_else(|| decoy_config::data_dir().join("sessions.json"));
            info!(path = %path.display(), "using JSON session file");
            MemorySessionStore::with_backend(Arc::new(JsonFileBackend::new(path))).await?
        },
        SessionBackendKind::Sqlite => {
            let path = config
                .path
                .clone()
                .unwrap_or_else(|| decoy_config::data_dir().join("sessions.db"));
            info!(path = %path.display(), "using SQLite session database");
            let backend = SqliteSessionBackend::open(&path).await?;
            MemorySessionStore::with_backend(Arc::new(backend)).await?
        },
    };
    info!(sessions = store.len(), "session store ready");
    Ok(Arc::new(store))
}
