use async_trait::async_trait;

/// Text-generation backend (Gemini, Groq, OpenAI, ...).
///
/// `messages` is an OpenAI-style list of `{"role", "content"}` objects; each
/// provider converts it to its own wire format.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Model identifier (e.g. "gemini-1.5-flash", "llama-3.3-70b-versatile").
    fn id(&self) -> &str;

    async fn complete(
        &self,
        messages: &[serde_json::Value],
    ) -> Result<CompletionResponse, ProviderError>;
}

/// Response from an LLM completion call.
#[derive(Debug, Clone, Default)]
pub struct CompletionResponse {
    pub text: Option<String>,
    pub usage: Usage,
}

#[derive(Debug, Clone, Default)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("request timed out")]
    Timeout,

    #[error("server error (HTTP {status})")]
    Server { status: u16 },

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("malformed response: {0}")]
    Malformed(String),
}

impl ProviderError {
    /// Map a non-success status to an error. 5xx and 429 are transient.
    pub fn from_status(status: u16, body: String) -> Self {
        if status >= 500 || status == 429 {
            Self::Server { status }
        } else {
            Self::Http { status, body }
        }
    }

    /// Worth moving on quietly: the backend is slow or overloaded rather than
    /// rejecting the request.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Timeout | Self::Server { .. })
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if e.is_decode() {
            Self::Malformed(e.to_string())
        } else if let Some(status) = e.status() {
            Self::from_status(status.as_u16(), e.to_string())
        } else {
            Self::Transport(e.to_string())
        }
    }
}
