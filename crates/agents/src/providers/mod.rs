pub mod gemini;
pub mod openai_compat;

use std::{sync::Arc, time::Duration};

use {
    decoy_config::{DecoyConfig, ProviderEntry},
    tracing::{info, warn},
};

use crate::{
    chain::{ProviderChain, ProviderSlot},
    model::LlmProvider,
};

pub use {gemini::GeminiProvider, openai_compat::OpenAiCompatProvider};

/// Assemble the reply chain from `[chain].order`. Each configured model of a
/// provider becomes its own slot, in the order listed.
///
/// Providers that are disabled or have no API key are skipped, so an empty
/// chain is a valid result (every reply then comes from the fallback pool).
pub fn build_chain(config: &DecoyConfig) -> ProviderChain {
    let mut chain = ProviderChain::new();

    for name in &config.chain.order {
        if !config.providers.is_enabled(name) {
            info!(provider = %name, "provider disabled, skipping");
            continue;
        }
        let Some(entry) = config.providers.get(name) else {
            info!(provider = %name, "provider not configured, skipping");
            continue;
        };
        let Some(key) = entry.api_key.as_deref().filter(|k| !k.trim().is_empty()) else {
            info!(provider = %name, "no API key, skipping");
            continue;
        };

        let timeout = Duration::from_secs(entry.timeout_secs.unwrap_or(config.chain.timeout_secs));
        for provider in instantiate(name, key, entry) {
            chain.push(ProviderSlot::new(provider, timeout));
        }
    }

    info!(slots = ?chain.slot_names(), "provider chain ready");
    chain
}

fn models_or(entry: &ProviderEntry, defaults: &[&str]) -> Vec<String> {
    if entry.models.is_empty() {
        defaults.iter().map(|m| (*m).to_string()).collect()
    } else {
        entry.models.clone()
    }
}

fn instantiate(name: &str, key: &str, entry: &ProviderEntry) -> Vec<Arc<dyn LlmProvider>> {
    match name {
        "gemini" => models_or(entry, &[gemini::DEFAULT_MODEL])
            .into_iter()
            .map(|model| {
                let mut p = GeminiProvider::new(key.to_string()).with_model(model);
                if let Some(url) = &entry.base_url {
                    p = p.with_base_url(url.clone());
                }
                Arc::new(p) as Arc<dyn LlmProvider>
            })
            .collect(),
        "groq" | "openai" => {
            let (base, defaults) = if name == "groq" {
                (openai_compat::GROQ_BASE_URL, openai_compat::GROQ_MODELS)
            } else {
                (openai_compat::OPENAI_BASE_URL, openai_compat::OPENAI_MODELS)
            };
            let base = entry.base_url.as_deref().unwrap_or(base);
            models_or(entry, defaults)
                .into_iter()
                .map(|model| {
                    Arc::new(OpenAiCompatProvider::new(name, key.to_string(), base, model))
                        as Arc<dyn LlmProvider>
                })
                .collect()
        },
        other => match &entry.base_url {
            Some(base) if !entry.models.is_empty() => entry
                .models
                .iter()
                .map(|model| {
                    Arc::new(OpenAiCompatProvider::new(
                        other,
                        key.to_string(),
                        base,
                        model.clone(),
                    )) as Arc<dyn LlmProvider>
                })
                .collect(),
            _ => {
                warn!(provider = %other, "unknown provider needs base_url and models, skipping");
                Vec::new()
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(key: &str) -> ProviderEntry {
        ProviderEntry {
            api_key: Some(key.into()),
            ..Default::default()
        }
    }

    fn config(order: &[&str], entries: Vec<(&str, ProviderEntry)>) -> DecoyConfig {
        let mut cfg = DecoyConfig::default();
        cfg.chain.order = order.iter().map(|s| (*s).to_string()).collect();
        for (name, e) in entries {
            cfg.providers.providers.insert(name.into(), e);
        }
        cfg
    }

    #[test]
    fn skips_providers_without_keys() {
        let cfg = config(&["gemini", "groq", "openai"], vec![
            ("groq", entry("gsk")),
            ("openai", entry("  ")),
        ]);
        let chain = build_chain(&cfg);
        assert_eq!(chain.slot_names(), vec![
            "groq/llama-3.3-70b-versatile",
            "groq/llama-3.1-8b-instant"
        ]);
    }

    #[test]
    fn follows_order_and_models() {
        let gemini = ProviderEntry {
            models: vec!["gemini-2.0-flash".into(), "gemini-1.5-flash".into()],
            ..entry("g")
        };
        let cfg = config(&["openai", "gemini"], vec![
            ("gemini", gemini),
            ("openai", entry("sk")),
        ]);
        let chain = build_chain(&cfg);
        assert_eq!(chain.slot_names(), vec![
            "openai/gpt-4o-mini",
            "gemini/gemini-2.0-flash",
            "gemini/gemini-1.5-flash"
        ]);
    }

    #[test]
    fn disabled_and_unknown_providers() {
        let gemini = ProviderEntry {
            enabled: false,
            ..entry("g")
        };
        let local = ProviderEntry {
            base_url: Some("http://localhost:11434".into()),
            models: vec!["llama3".into()],
            ..entry("x")
        };
        let cfg = config(&["gemini", "local", "mystery"], vec![
            ("gemini", gemini),
            ("local", local),
            ("mystery", entry("y")),
        ]);
        let chain = build_chain(&cfg);
        assert_eq!(chain.slot_names(), vec!["local/llama3"]);
    }

    #[test]
    fn no_providers_means_empty_chain() {
        assert!(build_chain(&DecoyConfig::default()).is_empty());
    }
}
