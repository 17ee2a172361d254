use std::{
    path::{Path, PathBuf},
    sync::{Mutex, PoisonError},
};

use tracing::{debug, warn};

use crate::{env_subst::substitute_env, schema::DecoyConfig};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &["decoy.toml", "decoy.yaml", "decoy.yml", "decoy.json"];

/// Override for the config directory, set via `set_config_dir()`.
static CONFIG_DIR_OVERRIDE: Mutex<Option<PathBuf>> = Mutex::new(None);

const REDACTED: &str = "[REDACTED]";

/// Set a custom config directory. When set, config discovery only looks in
/// this directory (project-local and user-global paths are skipped).
pub fn set_config_dir(path: PathBuf) {
    *CONFIG_DIR_OVERRIDE
        .lock()
        .unwrap_or_else(PoisonError::into_inner) = Some(path);
}

/// Clear the config directory override, restoring default discovery.
pub fn clear_config_dir() {
    *CONFIG_DIR_OVERRIDE
        .lock()
        .unwrap_or_else(PoisonError::into_inner) = None;
}

fn config_dir_override() -> Option<PathBuf> {
    CONFIG_DIR_OVERRIDE
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> anyhow::Result<DecoyConfig> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    let raw = substitute_env(&raw);
    parse_config(&raw, path)
}

/// Discover and load config from standard locations, then apply environment
/// overrides.
///
/// Search order:
/// 1. `./decoy.{toml,yaml,yml,json}` (project-local)
/// 2. `~/.config/decoy/decoy.{toml,yaml,yml,json}` (user-global)
///
/// Falls back to `DecoyConfig::default()` if no file is found or it fails to
/// parse.
pub fn discover_and_load() -> DecoyConfig {
    let mut config = match find_config_file() {
        Some(path) => {
            debug!(path = %path.display(), "loading config");
            load_config(&path).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
                DecoyConfig::default()
            })
        },
        None => {
            debug!("no config file found, using defaults");
            DecoyConfig::default()
        },
    };
    apply_env_overrides(&mut config, |name| std::env::var(name).ok());
    config
}

/// Environment variables consulted for a provider's API key, in order.
pub fn provider_key_vars(provider: &str) -> &'static [&'static str] {
    match provider {
        "gemini" => &["GEMINI_API_KEY", "GOOGLE_API_KEY"],
        "groq" => &["GROQ_API_KEY"],
        "openai" => &["OPENAI_API_KEY"],
        _ => &[],
    }
}

/// Let secrets from the environment replace whatever the file says.
pub fn apply_env_overrides(config: &mut DecoyConfig, lookup: impl Fn(&str) -> Option<String>) {
    let lookup = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    if let Some(key) = lookup("DECOY_API_KEY") {
        config.server.api_key = Some(key);
    }
    if let Some(url) = lookup("DECOY_CALLBACK_URL") {
        config.callback.url = Some(url);
    }
    for provider in ["gemini", "groq", "openai"] {
        if let Some(key) = provider_key_vars(provider).iter().find_map(|v| lookup(*v)) {
            config
                .providers
                .providers
                .entry(provider.to_string())
                .or_default()
                .api_key = Some(key);
        }
    }
}

/// Find the first config file in standard locations.
///
/// When a config dir override is set, only that directory is searched.
fn find_config_file() -> Option<PathBuf> {
    if let Some(dir) = config_dir_override() {
        return first_existing(&dir);
    }

    // Project-local
    for name in CONFIG_FILENAMES {
        let p = PathBuf::from(name);
        if p.exists() {
            return Some(p);
        }
    }

    // User-global: ~/.config/decoy/
    home_dir()
        .map(|h| h.join(".config").join("decoy"))
        .and_then(|dir| first_existing(&dir))
}

fn first_existing(dir: &Path) -> Option<PathBuf> {
    CONFIG_FILENAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|p| p.exists())
}

/// Returns the config directory: override, or `~/.config/decoy/`.
pub fn config_dir() -> Option<PathBuf> {
    if let Some(dir) = config_dir_override() {
        return Some(dir);
    }
    home_dir().map(|h| h.join(".config").join("decoy"))
}

/// Returns the data directory: `~/.decoy/` on all platforms.
pub fn data_dir() -> PathBuf {
    home_dir()
        .map(|h| h.join(".decoy"))
        .unwrap_or_else(|| PathBuf::from(".decoy"))
}

fn home_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.home_dir().to_path_buf())
}

/// Path of the config file that would be loaded, if any.
pub fn config_path() -> Option<PathBuf> {
    find_config_file()
}

/// Serialize `config` as TOML with every secret masked.
pub fn to_redacted_toml(config: &DecoyConfig) -> anyhow::Result<String> {
    let mut shown = config.clone();
    if shown.server.api_key.is_some() {
        shown.server.api_key = Some(REDACTED.into());
    }
    for entry in shown.providers.providers.values_mut() {
        if entry.api_key.is_some() {
            entry.api_key = Some(REDACTED.into());
        }
    }
    toml::to_string_pretty(&shown).map_err(|e| anyhow::anyhow!("serialize config: {e}"))
}

fn parse_config(raw: &str, path: &Path) -> anyhow::Result<DecoyConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => Ok(toml::from_str(raw)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(raw)?),
        "json" => Ok(serde_json::from_str(raw)?),
        _ => anyhow::bail!("unsupported config format: .{ext}"),
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::schema::SessionBackendKind,
        std::{collections::HashMap, fs},
    };

    #[test]
    fn parses_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("decoy.toml");
        fs::write(
            &path,
            r#"
[server]
port = 9000

[sessions]
backend = "sqlite"

[providers.groq]
models = ["llama-3.3-70b-versatile", "llama-3.1-8b-instant"]

[callback]
url = "http://localhost:1234/report"
"#,
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.bind, "0.0.0.0");
        assert_eq!(config.sessions.backend, SessionBackendKind::Sqlite);
        assert_eq!(config.providers.get("groq").unwrap().models.len(), 2);
        assert!(config.providers.is_enabled("gemini"));
        assert_eq!(config.callback.max_attempts, 3);
        assert_eq!(config.chain.timeout_secs, 10);
    }

    #[test]
    fn parses_yaml_and_json() {
        let dir = tempfile::tempdir().unwrap();
        let yaml = dir.path().join("decoy.yaml");
        fs::write(&yaml, "persona:\n  name: Sunita\n  age: 61\n").unwrap();
        assert_eq!(load_config(&yaml).unwrap().persona.name, "Sunita");

        let json = dir.path().join("decoy.json");
        fs::write(&json, r#"{"providers": {"openai": {"enabled": false}}}"#).unwrap();
        assert!(!load_config(&json).unwrap().providers.is_enabled("openai"));
    }

    #[test]
    fn rejects_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("decoy.ini");
        fs::write(&path, "port=1").unwrap();
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn env_overrides_win() {
        let env: HashMap<&str, &str> = [
            ("DECOY_API_KEY", "secret"),
            ("GOOGLE_API_KEY", "g-key"),
            ("GROQ_API_KEY", "  "),
            ("DECOY_CALLBACK_URL", "http://cb.example/report"),
        ]
        .into_iter()
        .collect();

        let mut config = DecoyConfig::default();
        apply_env_overrides(&mut config, |name| env.get(name).map(|v| v.to_string()));

        assert_eq!(config.server.api_key.as_deref(), Some("secret"));
        assert_eq!(
            config.callback.url.as_deref(),
            Some("http://cb.example/report")
        );
        assert_eq!(
            config.providers.get("gemini").unwrap().api_key.as_deref(),
            Some("g-key")
        );
        assert!(config.providers.get("groq").is_none());
    }

    #[test]
    fn redacts_secrets() {
        let mut config = DecoyConfig::default();
        config.server.api_key = Some("top-secret".into());
        apply_env_overrides(&mut config, |name| {
            (name == "OPENAI_API_KEY").then(|| "sk-live".to_string())
        });

        let shown = to_redacted_toml(&config).unwrap();
        assert!(!shown.contains("top-secret"));
        assert!(!shown.contains("sk-live"));
        assert!(shown.contains(REDACTED));
    }

    #[test]
    #[serial_test::serial]
    fn discovery_uses_override_dir() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("decoy.toml"), "[server]\nport = 7777\n").unwrap();

        set_config_dir(dir.path().to_path_buf());
        let found = config_path();
        let config = discover_and_load();
        clear_config_dir();

        assert_eq!(found, Some(dir.path().join("decoy.toml")));
        assert_eq!(config.server.port, 7777);
    }

    #[test]
    #[serial_test::serial]
    fn override_dir_without_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        set_config_dir(dir.path().to_path_buf());
        let found = config_path();
        clear_config_dir();
        assert!(found.is_none());
    }
}
