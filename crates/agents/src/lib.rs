//! Persona replies: prompt assembly, the provider fallback chain, reply
//! guarding and the canned fallback pool.

pub mod chain;
pub mod fallback;
pub mod guard;
pub mod model;
pub mod prompt;
pub mod providers;

pub use {
    chain::{ProviderChain, ProviderSlot, Reply, ReplySource},
    fallback::fallback_reply,
    guard::sanitize_reply,
    model::{CompletionResponse, LlmProvider, ProviderError, Usage},
    prompt::Persona,
    providers::build_chain,
};
