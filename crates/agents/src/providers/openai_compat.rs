//! Any backend speaking the OpenAI chat-completions protocol (OpenAI, Groq).

use {
    async_trait::async_trait,
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
    tracing::debug,
};

use crate::model::{CompletionResponse, LlmProvider, ProviderError, Usage};

pub const GROQ_BASE_URL: &str = "https://api.groq.com/openai";
pub const GROQ_MODELS: &[&str] = &["llama-3.3-70b-versatile", "llama-3.1-8b-instant"];

pub const OPENAI_BASE_URL: &str = "https://api.openai.com";
pub const OPENAI_MODEL: &str = "gpt-4o-mini";
pub const OPENAI_MODELS: &[&str] = &[OPENAI_MODEL];

pub struct OpenAiCompatProvider {
    name: String,
    client: reqwest::Client,
    api_key: Secret<String>,
    base_url: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

impl OpenAiCompatProvider {
    pub fn new(name: impl Into<String>, api_key: String, base_url: &str, model: String) -> Self {
        Self {
            name: name.into(),
            client: reqwest::Client::new(),
            api_key: Secret::new(api_key),
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            max_tokens: 150,
            temperature: 0.8,
        }
    }

    pub fn groq(api_key: String, model: String) -> Self {
        Self::new("groq", api_key, GROQ_BASE_URL, model)
    }

    pub fn openai(api_key: String, model: String) -> Self {
        Self::new("openai", api_key, OPENAI_BASE_URL, model)
    }

    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [serde_json::Value],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<ApiUsage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ApiUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

#[async_trait]
impl LlmProvider for OpenAiCompatProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn id(&self) -> &str {
        &self.model
    }

    async fn complete(
        &self,
        messages: &[serde_json::Value],
    ) -> Result<CompletionResponse, ProviderError> {
        let req = ChatRequest {
            model: &self.model,
            messages,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        let resp = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .bearer_auth(self.api_key.expose_secret())
            .json(&req)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ProviderError::from_status(status.as_u16(), body));
        }

        let parsed: ChatResponse = resp
            .json()
            .await
            .map_err(|e| ProviderError::Malformed(e.to_string()))?;

        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|t| !t.trim().is_empty());

        let usage = parsed
            .usage
            .map(|u| Usage {
                input_tokens: u.prompt_tokens,
                output_tokens: u.completion_tokens,
            })
            .unwrap_or_default();

        debug!(provider = %self.name, model = %self.model, has_text = text.is_some(), "chat completion");
        Ok(CompletionResponse { text, usage })
    }
}
