use std::time::{SystemTime, UNIX_EPOCH};

use {
    decoy_common::{IntelligenceRecord, Message},
    serde::{Deserialize, Serialize},
};

pub(crate) fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// State for one conversation with one correspondent.
///
/// `scam_detected` and `callback_sent` only ever go from false to true, the
/// intelligence record only grows and history is append-only. Use the
/// methods below rather than poking the fields so those rules hold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub created_at: u64,
    pub last_activity_at: u64,
    pub message_count: u32,
    #[serde(default)]
    pub scam_detected: bool,
    #[serde(default)]
    pub intelligence: IntelligenceRecord,
    /// Latest scorer explanation.
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub history: Vec<Message>,
    #[serde(default)]
    pub last_agent_reply: Option<String>,
    #[serde(default)]
    pub callback_sent: bool,
}

impl Session {
    pub fn new(id: impl Into<String>) -> Self {
        let now = now_ms();
        Self {
            id: id.into(),
            created_at: now,
            last_activity_at: now,
            message_count: 0,
            scam_detected: false,
            intelligence: IntelligenceRecord::new(),
            notes: String::new(),
            history: Vec::new(),
            last_agent_reply: None,
            callback_sent: false,
        }
    }

    pub fn touch(&mut self) {
        self.last_activity_at = now_ms().max(self.last_activity_at);
    }

    /// Append an inbound scammer turn and bump the message counter.
    pub fn record_inbound(&mut self, message: Message) {
        self.touch();
        self.message_count += 1;
        self.history.push(message);
    }

    /// Append our own reply.
    pub fn record_reply(&mut self, reply: impl Into<String>) {
        let reply = reply.into();
        self.touch();
        self.history.push(Message::agent(reply.clone()));
        self.last_agent_reply = Some(reply);
    }

    pub fn mark_scam_detected(&mut self) {
        self.scam_detected = true;
    }

    /// Set the sent flag. Returns false if it was already set.
    pub fn claim_callback(&mut self) -> bool {
        !std::mem::replace(&mut self.callback_sent, true)
    }

    pub fn merge_intelligence(&mut self, found: &IntelligenceRecord) {
        self.intelligence.merge(found);
    }

    /// The last `n` history entries.
    pub fn recent_history(&self, n: usize) -> &[Message] {
        let start = self.history.len().saturating_sub(n);
        &self.history[start..]
    }

    /// Whole seconds between creation and the last activity.
    pub fn engagement_duration_secs(&self) -> u64 {
        self.last_activity_at.saturating_sub(self.created_at) / 1000
    }
}
