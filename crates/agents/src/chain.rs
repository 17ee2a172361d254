use std::{sync::Arc, time::Duration};

use {
    decoy_common::Message,
    tracing::{debug, error, info, warn},
};

use crate::{
    fallback::fallback_reply,
    guard::sanitize_reply,
    model::{LlmProvider, ProviderError},
    prompt::{Persona, build_messages},
};

/// One provider/model pair with its own deadline.
pub struct ProviderSlot {
    pub name: String,
    pub provider: Arc<dyn LlmProvider>,
    pub timeout: Duration,
}

impl ProviderSlot {
    pub fn new(provider: Arc<dyn LlmProvider>, timeout: Duration) -> Self {
        Self {
            name: format!("{}/{}", provider.name(), provider.id()),
            provider,
            timeout,
        }
    }
}

/// Where a reply came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplySource {
    /// Slot name (`provider/model`).
    Provider(String),
    Fallback,
}

#[derive(Debug, Clone)]
pub struct Reply {
    pub text: String,
    pub source: ReplySource,
}

/// Ordered list of providers tried one after another until one produces an
/// acceptable reply.
#[derive(Default)]
pub struct ProviderChain {
    slots: Vec<ProviderSlot>,
}

impl ProviderChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_slot(mut self, slot: ProviderSlot) -> Self {
        self.slots.push(slot);
        self
    }

    pub fn push(&mut self, slot: ProviderSlot) {
        self.slots.push(slot);
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slot_names(&self) -> Vec<&str> {
        self.slots.iter().map(|s| s.name.as_str()).collect()
    }

    /// Generate the persona's next reply. Always returns non-empty text:
    /// when every slot fails the canned fallback is used.
    pub async fn respond(&self, current: &str, history: &[Message], persona: &Persona) -> Reply {
        let supplied = decoy_detect::supplied_items(history, current);
        let messages = build_messages(persona, history, current, &supplied);

        for slot in &self.slots {
            match tokio::time::timeout(slot.timeout, slot.provider.complete(&messages)).await {
                Ok(Ok(resp)) => {
                    let raw = resp.text.unwrap_or_default();
                    match sanitize_reply(&raw) {
                        Some(text) => {
                            debug!(
                                slot = %slot.name,
                                input_tokens = resp.usage.input_tokens,
                                output_tokens = resp.usage.output_tokens,
                                "reply generated"
                            );
                            return Reply {
                                text,
                                source: ReplySource::Provider(slot.name.clone()),
                            };
                        },
                        None => warn!(slot = %slot.name, "reply rejected by guard, trying next provider"),
                    }
                },
                Ok(Err(e)) if e.is_transient() => {
                    warn!(slot = %slot.name, error = %e, "provider unavailable, trying next");
                },
                Ok(Err(e)) => {
                    error!(slot = %slot.name, error = %e, "provider request failed, trying next");
                },
                Err(_) => {
                    warn!(
                        slot = %slot.name,
                        error = %ProviderError::Timeout,
                        timeout_ms = slot.timeout.as_millis() as u64,
                        "provider timed out, trying next"
                    );
                },
            }
        }

        if !self.slots.is_empty() {
            info!(tried = self.slots.len(), "all providers failed, using fallback reply");
        }
        Reply {
            text: fallback_reply(current, history.len(), &supplied).to_string(),
            source: ReplySource::Fallback,
        }
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::model::{CompletionResponse, Usage},
        async_trait::async_trait,
        std::sync::atomic::{AtomicUsize, Ordering},
    };

    enum Behaviour {
        Reply(&'static str),
        Fail(u16),
        Hang,
    }

    struct MockProvider {
        id: &'static str,
        behaviour: Behaviour,
        calls: AtomicUsize,
    }

    impl MockProvider {
        fn new(id: &'static str, behaviour: Behaviour) -> Arc<Self> {
            Arc::new(Self {
                id,
                behaviour,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl LlmProvider for MockProvider {
        fn name(&self) -> &str {
            "mock"
        }

        fn id(&self) -> &str {
            self.id
        }

        async fn complete(
            &self,
            _messages: &[serde_json::Value],
        ) -> Result<CompletionResponse, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.behaviour {
                Behaviour::Reply(text) => Ok(CompletionResponse {
                    text: Some(text.into()),
                    usage: Usage {
                        input_tokens: 10,
                        output_tokens: 5,
                    },
                }),
                Behaviour::Fail(status) => Err(ProviderError::from_status(status, "nope".into())),
                Behaviour::Hang => {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    Ok(CompletionResponse::default())
                },
            }
        }
    }

    fn slot(provider: Arc<MockProvider>) -> ProviderSlot {
        ProviderSlot::new(provider, Duration::from_millis(50))
    }

    #[tokio::test]
    async fn first_good_provider_wins() {
        let first = MockProvider::new("a", Behaviour::Reply("Which bank sir?"));
        let second = MockProvider::new("b", Behaviour::Reply("unused"));
        let chain = ProviderChain::new()
            .with_slot(slot(first.clone()))
            .with_slot(slot(second.clone()));

        let reply = chain.respond("your account is blocked", &[], &Persona::default()).await;
        assert_eq!(reply.text, "Which bank sir?");
        assert_eq!(reply.source, ReplySource::Provider("mock/a".into()));
        assert_eq!(second.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn skips_failures_timeouts_and_rejected_replies() {
        let hang = MockProvider::new("hang", Behaviour::Hang);
        let down = MockProvider::new("down", Behaviour::Fail(503));
        let denied = MockProvider::new("denied", Behaviour::Fail(401));
        let rude = MockProvider::new("rude", Behaviour::Reply("You idiot."));
        let good = MockProvider::new("good", Behaviour::Reply("Sir please explain."));
        let chain = ProviderChain::new()
            .with_slot(slot(hang))
            .with_slot(slot(down.clone()))
            .with_slot(slot(denied))
            .with_slot(slot(rude))
            .with_slot(slot(good));

        let reply = chain.respond("send money", &[], &Persona::default()).await;
        assert_eq!(reply.text, "Sir please explain.");
        assert_eq!(reply.source, ReplySource::Provider("mock/good".into()));
        assert_eq!(down.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn exhausted_chain_uses_fallback() {
        let chain = ProviderChain::new()
            .with_slot(slot(MockProvider::new("a", Behaviour::Fail(500))))
            .with_slot(slot(MockProvider::new("b", Behaviour::Hang)))
            .with_slot(slot(MockProvider::new("c", Behaviour::Reply("   "))));

        let reply = chain
            .respond("Your account will be blocked", &[], &Persona::default())
            .await;
        assert_eq!(reply.source, ReplySource::Fallback);
        assert!(reply.text.contains("What happened to my account"));
    }

    #[tokio::test]
    async fn empty_chain_uses_fallback() {
        let history = vec![
            Message::scammer("hello"),
            Message::agent("hello sir"),
            Message::scammer("pay to fraud@ybl"),
        ];
        let reply = ProviderChain::new()
            .respond("did you pay to my upi", &history, &Persona::default())
            .await;
        assert_eq!(reply.source, ReplySource::Fallback);
        assert!(reply.text.contains("showing some error"));
    }

    #[tokio::test]
    async fn long_replies_are_trimmed() {
        let chain = ProviderChain::new().with_slot(slot(MockProvider::new(
            "a",
            Behaviour::Reply("Oh no. Which account? I have two. Please tell."),
        )));
        let reply = chain.respond("hi", &[], &Persona::default()).await;
        assert_eq!(reply.text, "Oh no. Which account?");
        assert_eq!(chain.slot_names(), vec!["mock/a"]);
    }
}
