use serde::{Deserialize, Serialize};

/// Who authored a turn in the conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    /// The inbound correspondent.
    Scammer,
    /// The persona we play. Older request formats call this side `user`.
    #[serde(alias = "user")]
    Agent,
}

impl Sender {
    /// Label used when rendering a transcript for a generation backend.
    pub fn transcript_label(self) -> &'static str {
        match self {
            Self::Scammer => "Scammer",
            Self::Agent => "You",
        }
    }
}

/// Message timestamp as supplied by the caller: ISO-8601 text or a unix epoch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Timestamp {
    Epoch(serde_json::Number),
    Iso(String),
}

impl Timestamp {
    pub fn now() -> Self {
        Self::Iso(chrono::Utc::now().to_rfc3339())
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::now()
    }
}

/// A single turn. Never modified once appended to a session's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub sender: Sender,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub timestamp: Timestamp,
}

impl Message {
    pub fn new(sender: Sender, text: impl Into<String>) -> Self {
        Self {
            sender,
            text: text.into(),
            timestamp: Timestamp::now(),
        }
    }

    pub fn scammer(text: impl Into<String>) -> Self {
        Self::new(Sender::Scammer, text)
    }

    pub fn agent(text: impl Into<String>) -> Self {
        Self::new(Sender::Agent, text)
    }

    pub fn is_from_scammer(&self) -> bool {
        self.sender == Sender::Scammer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_is_an_alias_for_agent() {
        let msg: Message =
            serde_json::from_str(r#"{"sender":"user","text":"hello sir"}"#).unwrap();
        assert_eq!(msg.sender, Sender::Agent);
        assert_eq!(serde_json::to_value(msg.sender).unwrap(), "agent");
    }

    #[test]
    fn timestamp_accepts_epoch_and_iso() {
        let epoch: Message =
            serde_json::from_str(r#"{"sender":"scammer","text":"x","timestamp":1770005528731}"#)
                .unwrap();
        assert!(matches!(epoch.timestamp, Timestamp::Epoch(_)));

        let iso: Message = serde_json::from_str(
            r#"{"sender":"scammer","text":"x","timestamp":"2026-01-21T10:15:30Z"}"#,
        )
        .unwrap();
        assert_eq!(
            iso.timestamp,
            Timestamp::Iso("2026-01-21T10:15:30Z".to_string())
        );
    }

    #[test]
    fn missing_timestamp_defaults_to_now() {
        let msg: Message = serde_json::from_str(r#"{"sender":"scammer","text":"x"}"#).unwrap();
        assert!(matches!(msg.timestamp, Timestamp::Iso(_)));
    }
}
