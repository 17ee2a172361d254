//! Fire-once reporting of a session's findings to an external endpoint.

use std::time::Duration;

use {
    decoy_config::CallbackConfig,
    decoy_protocol::CallbackPayload,
    tokio_util::task::TaskTracker,
    tracing::{error, info, warn},
};

/// Whether a session has earned its report and has not sent one yet.
pub fn should_dispatch(scam_detected: bool, message_count: u32, already_sent: bool) -> bool {
    scam_detected && message_count >= 1 && !already_sent
}

#[derive(Debug, thiserror::Error)]
pub enum CallbackError {
    #[error("timed out after {secs}s")]
    Timeout { secs: u64 },

    #[error("endpoint answered HTTP {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("gave up after {attempts} attempts, last error: {last}")]
    Exhausted {
        attempts: u32,
        last: Box<CallbackError>,
    },
}

/// POSTs [`CallbackPayload`]s with a bounded number of attempts, each with a
/// longer timeout than the one before.
#[derive(Clone)]
pub struct CallbackDispatcher {
    client: reqwest::Client,
    url: String,
    max_attempts: u32,
    timeout: Duration,
    timeout_step: Duration,
}

impl CallbackDispatcher {
    pub fn new(url: impl Into<String>) -> Self {
        Self::from_parts(url.into(), &CallbackConfig::default())
    }

    /// `None` when reporting is disabled or no URL is configured.
    pub fn from_config(config: &CallbackConfig) -> Option<Self> {
        if !config.enabled {
            return None;
        }
        let url = config.url.as_deref().map(str::trim).filter(|u| !u.is_empty())?;
        Some(Self::from_parts(url.to_string(), config))
    }

    fn from_parts(url: String, config: &CallbackConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            url,
            max_attempts: config.max_attempts.max(1),
            timeout: Duration::from_secs(config.timeout_secs),
            timeout_step: Duration::from_secs(config.timeout_step_secs),
        }
    }

    pub fn with_timeouts(mut self, first: Duration, step: Duration) -> Self {
        self.timeout = first;
        self.timeout_step = step;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn attempt_timeout(&self, attempt: u32) -> Duration {
        self.timeout + self.timeout_step * attempt
    }

    /// Send the payload, retrying until an attempt gets 200, 201 or 202.
    pub async fn dispatch(&self, payload: &CallbackPayload) -> Result<(), CallbackError> {
        let mut last = CallbackError::Transport("no attempt made".into());

        for attempt in 0..self.max_attempts {
            let timeout = self.attempt_timeout(attempt);
            let result = self
                .client
                .post(&self.url)
                .timeout(timeout)
                .json(payload)
                .send()
                .await;

            last = match result {
                Ok(resp) if matches!(resp.status().as_u16(), 200 | 201 | 202) => {
                    info!(
                        session_id = %payload.session_id,
                        attempt = attempt + 1,
                        "callback delivered"
                    );
                    return Ok(());
                },
                Ok(resp) => {
                    let status = resp.status().as_u16();
                    let body = resp.text().await.unwrap_or_default();
                    CallbackError::Rejected { status, body }
                },
                Err(e) if e.is_timeout() => CallbackError::Timeout {
                    secs: timeout.as_secs(),
                },
                Err(e) => CallbackError::Transport(e.to_string()),
            };
            warn!(
                session_id = %payload.session_id,
                attempt = attempt + 1,
                max_attempts = self.max_attempts,
                error = %last,
                "callback attempt failed"
            );
        }

        Err(CallbackError::Exhausted {
            attempts: self.max_attempts,
            last: Box::new(last),
        })
    }

    /// Dispatch in a detached task registered with `tracker`.
    pub fn spawn(&self, tracker: &TaskTracker, payload: CallbackPayload) {
        let dispatcher = self.clone();
        tracker.spawn(async move {
            if let Err(e) = dispatcher.dispatch(&payload).await {
                error!(session_id = %payload.session_id, error = %e, "callback not delivered");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use {super::*, decoy_common::IntelligenceRecord, mockito::Matcher, serde_json::json};

    fn payload() -> CallbackPayload {
        CallbackPayload {
            session_id: "s1".into(),
            scam_detected: true,
            total_messages_exchanged: 3,
            extracted_intelligence: IntelligenceRecord::default(),
            agent_notes: "Scammer used urgency tactics".into(),
        }
    }

    #[test]
    fn dispatch_rule() {
        assert!(should_dispatch(true, 1, false));
        assert!(!should_dispatch(false, 5, false));
        assert!(!should_dispatch(true, 0, false));
        assert!(!should_dispatch(true, 5, true));
    }

    #[test]
    fn timeouts_grow_per_attempt() {
        let d = CallbackDispatcher::new("http://localhost");
        assert_eq!(d.attempt_timeout(0), Duration::from_secs(5));
        assert_eq!(d.attempt_timeout(1), Duration::from_secs(7));
        assert_eq!(d.attempt_timeout(2), Duration::from_secs(9));
    }

    #[test]
    fn disabled_or_missing_url() {
        assert!(CallbackDispatcher::from_config(&CallbackConfig::default()).is_none());
        let cfg = CallbackConfig {
            url: Some("http://x/report".into()),
            enabled: false,
            ..Default::default()
        };
        assert!(CallbackDispatcher::from_config(&cfg).is_none());
        let cfg = CallbackConfig {
            url: Some("http://x/report".into()),
            ..Default::default()
        };
        assert_eq!(CallbackDispatcher::from_config(&cfg).unwrap().url(), "http://x/report");
    }

    #[tokio::test]
    async fn delivers_payload() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/report")
            .match_header("content-type", "application/json")
            .match_body(Matcher::PartialJson(json!({
                "sessionId": "s1",
                "scamDetected": true,
                "totalMessagesExchanged": 3
            })))
            .with_status(202)
            .expect(1)
            .create_async()
            .await;

        let d = CallbackDispatcher::new(format!("{}/report", server.url()));
        d.dispatch(&payload()).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/report")
            .with_status(500)
            .with_body("boom")
            .expect(3)
            .create_async()
            .await;

        let d = CallbackDispatcher::new(format!("{}/report", server.url()));
        let err = d.dispatch(&payload()).await.unwrap_err();
        match err {
            CallbackError::Exhausted { attempts, last } => {
                assert_eq!(attempts, 3);
                assert!(matches!(*last, CallbackError::Rejected { status: 500, .. }));
            },
            other => panic!("unexpected error: {other}"),
        }
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn unreachable_endpoint_fails() {
        let d = CallbackDispatcher::new("http://127.0.0.1:9/report")
            .with_timeouts(Duration::from_millis(200), Duration::from_millis(100));
        assert!(d.dispatch(&payload()).await.is_err());
    }

    #[tokio::test]
    async fn tracked_dispatch_finishes_before_wait_returns() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/report")
            .with_status(200)
            .expect(1)
            .create_async()
            .await;

        let tracker = TaskTracker::new();
        CallbackDispatcher::new(format!("{}/report", server.url())).spawn(&tracker, payload());
        tracker.close();
        tracker.wait().await;
        mock.assert_async().await;
    }
}
