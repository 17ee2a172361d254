//! Configuration loading: file discovery, `${ENV}` substitution and
//! environment overrides for secrets.

pub mod env_subst;
pub mod loader;
pub mod schema;

pub use {
    loader::{
        apply_env_overrides, clear_config_dir, config_dir, config_path, data_dir,
        discover_and_load, load_config, provider_key_vars, set_config_dir, to_redacted_toml,
    },
    schema::{
        CallbackConfig, ChainConfig, DecoyConfig, PersonaConfig, ProviderEntry, ProvidersConfig,
        ServerConfig, SessionBackendKind, SessionsConfig,
    },
};
