/// Config schema types (server, sessions, persona, providers, chain, callback).
use std::{collections::HashMap, path::PathBuf};

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DecoyConfig {
    pub server: ServerConfig,
    pub sessions: SessionsConfig,
    pub persona: PersonaConfig,
    pub providers: ProvidersConfig,
    pub chain: ChainConfig,
    pub callback: CallbackConfig,
}

/// HTTP gateway settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
    /// Value expected in the `x-api-key` header. `DECOY_API_KEY` wins if set.
    pub api_key: Option<String>,
    /// Allowed CORS origins. Empty means any origin.
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".into(),
            port: 8000,
            api_key: None,
            cors_origins: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionBackendKind {
    /// Nothing survives a restart.
    Memory,
    /// One JSON file holding every session.
    #[default]
    Json,
    /// One row per session in a SQLite database.
    Sqlite,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionsConfig {
    pub backend: SessionBackendKind,
    /// Storage location. Defaults to `sessions.json` / `sessions.db` under the
    /// data directory.
    pub path: Option<PathBuf>,
}

/// The character the honeypot plays.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonaConfig {
    pub name: String,
    pub age: u32,
    /// Replaces the built-in character description entirely.
    pub system_prompt: Option<String>,
}

impl Default for PersonaConfig {
    fn default() -> Self {
        Self {
            name: "Ramesh".into(),
            age: 52,
            system_prompt: None,
        }
    }
}

/// LLM provider configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    /// Provider-specific settings keyed by provider name.
    /// Known keys: "gemini", "groq", "openai"
    #[serde(flatten)]
    pub providers: HashMap<String, ProviderEntry>,
}

/// Configuration for a single LLM provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderEntry {
    /// Whether this provider is enabled. Defaults to true.
    pub enabled: bool,

    /// Override the API key (optional; env var still takes precedence if set).
    pub api_key: Option<String>,

    /// Override the base URL.
    pub base_url: Option<String>,

    /// Model IDs to try, in order. Each becomes its own slot in the chain.
    pub models: Vec<String>,

    /// Per-attempt timeout for this provider's slots.
    pub timeout_secs: Option<u64>,
}

impl Default for ProviderEntry {
    fn default() -> Self {
        Self {
            enabled: true,
            api_key: None,
            base_url: None,
            models: Vec::new(),
            timeout_secs: None,
        }
    }
}

impl ProvidersConfig {
    /// Check if a provider is enabled (defaults to true if not configured).
    pub fn is_enabled(&self, name: &str) -> bool {
        self.providers.get(name).is_none_or(|e| e.enabled)
    }

    /// Get the configured entry for a provider, if any.
    pub fn get(&self, name: &str) -> Option<&ProviderEntry> {
        self.providers.get(name)
    }
}

/// Order and default timeout of the reply-generation chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainConfig {
    pub order: Vec<String>,
    pub timeout_secs: u64,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            order: vec!["gemini".into(), "groq".into(), "openai".into()],
            timeout_secs: 10,
        }
    }
}

/// Where and how the end-of-engagement report is delivered.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CallbackConfig {
    pub enabled: bool,
    /// Report endpoint. `DECOY_CALLBACK_URL` wins if set. Nothing is sent
    /// while this is unset.
    pub url: Option<String>,
    pub max_attempts: u32,
    /// Timeout of the first attempt.
    pub timeout_secs: u64,
    /// Added to the timeout on every retry.
    pub timeout_step_secs: u64,
}

impl Default for CallbackConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            url: None,
            max_attempts: 3,
            timeout_secs: 5,
            timeout_step_secs: 2,
        }
    }
}
