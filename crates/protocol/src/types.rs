use {
    decoy_common::{IntelligenceRecord, Message},
    serde::{Deserialize, Serialize},
};

/// Reply used when a request could not be processed at all.
pub const FALLBACK_OPENER: &str = "Hello, this is Ramesh. How can I help you?";

// ── Inbound ─────────────────────────────────────────────────────────────────

/// One inbound turn in normalized form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboundRequest {
    /// Generated by the gateway when absent.
    #[serde(default)]
    pub session_id: Option<String>,
    pub message: Message,
    #[serde(default)]
    pub conversation_history: Vec<Message>,
    #[serde(default)]
    pub metadata: Option<Metadata>,
}

impl Default for InboundRequest {
    fn default() -> Self {
        Self {
            session_id: None,
            message: Message::scammer(""),
            conversation_history: Vec::new(),
            metadata: None,
        }
    }
}

/// Channel details supplied by the caller. Informational only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Metadata {
    pub channel: Option<String>,
    pub language: Option<String>,
    pub locale: Option<String>,
}

// ── Outbound ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngagementMetrics {
    pub engagement_duration_seconds: u64,
    pub total_messages_exchanged: u32,
}

/// Result of processing one inbound message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeResponse {
    pub status: String,
    pub session_id: String,
    pub scam_detected: bool,
    /// `null` when the message was not judged a scam.
    pub agent_response: Option<String>,
    pub engagement_metrics: EngagementMetrics,
    pub extracted_intelligence: IntelligenceRecord,
    pub agent_notes: String,
}

impl AnalyzeResponse {
    /// Well-formed result for a request that failed internally: the persona's
    /// opener, zeroed metrics and no intelligence.
    pub fn fallback(session_id: impl Into<String>, notes: impl Into<String>) -> Self {
        Self {
            status: "success".into(),
            session_id: session_id.into(),
            scam_detected: true,
            agent_response: Some(FALLBACK_OPENER.into()),
            engagement_metrics: EngagementMetrics::default(),
            extracted_intelligence: IntelligenceRecord::default(),
            agent_notes: notes.into(),
        }
    }
}

/// Body POSTed to the reporting endpoint once per session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallbackPayload {
    pub session_id: String,
    pub scam_detected: bool,
    pub total_messages_exchanged: u32,
    pub extracted_intelligence: IntelligenceRecord,
    pub agent_notes: String,
}

/// Read-only snapshot returned by `GET /session/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub session_id: String,
    pub status: String,
    pub scam_detected: bool,
    pub message_count: u32,
    /// RFC 3339.
    pub start_time: String,
    /// RFC 3339.
    pub last_activity: String,
    pub callback_sent: bool,
    /// The correspondent keeps sending near-identical messages.
    pub repetitive: bool,
    pub extracted_intelligence: IntelligenceRecord,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl HealthResponse {
    pub fn healthy() -> Self {
        Self {
            status: "healthy".into(),
            version: env!("CARGO_PKG_VERSION").into(),
        }
    }
}
