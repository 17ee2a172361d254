//! The per-message engagement pipeline.
//!
//! A message is handled in two short critical sections on its session: one
//! commits the inbound turn (scoring, extraction, detection latch), the other
//! commits our reply and claims the callback. Reply generation runs between
//! them without holding the session lock.

use {
    decoy_common::{Message, Sender},
    decoy_protocol::{
        AnalyzeResponse, CallbackPayload, EngagementMetrics, InboundRequest, SessionView,
    },
    decoy_sessions::{Session, SessionStore},
    tracing::{debug, info},
};

use crate::{callback::should_dispatch, state::GatewayState};

/// Scammer turns compared when flagging a session as repetitive.
pub const REPETITION_WINDOW: usize = 3;

/// Generate an id for requests that arrive without one.
pub fn new_session_id() -> String {
    format!("session-{}", uuid::Uuid::new_v4())
}

/// Process one inbound message end to end. Never fails: every path ends in a
/// well-formed result.
pub async fn process(state: &GatewayState, request: InboundRequest) -> AnalyzeResponse {
    let session_id = request.session_id.clone().unwrap_or_else(new_session_id);
    let text = request.message.text.clone();
    let verdict = decoy_detect::score(&text);

    let inbound = Message {
        sender: Sender::Scammer,
        ..request.message
    };
    let supplied_history = request.conversation_history;

    let session = state
        .store
        .update(
            &session_id,
            Box::new(|s: &mut Session| {
                let prior: &[Message] = if supplied_history.is_empty() {
                    &s.history
                } else {
                    &supplied_history
                };
                let cumulative = decoy_detect::score_history(prior);

                s.record_inbound(inbound);
                if verdict.is_scam || cumulative.is_scam() {
                    s.mark_scam_detected();
                }
                let found = decoy_detect::extract(&text, &s.intelligence);
                s.merge_intelligence(&found);
                s.notes = verdict.notes.clone();
            }),
        )
        .await;

    debug!(
        session_id = %session_id,
        score = verdict.confidence,
        scam_detected = session.scam_detected,
        "inbound message scored"
    );

    if !session.scam_detected {
        return response(&session, None);
    }

    // Everything before the turn just committed.
    let context: &[Message] = if supplied_history.is_empty() {
        &session.history[..session.history.len().saturating_sub(1)]
    } else {
        &supplied_history
    };
    let reply = state.chain.respond(&text, context, &state.persona).await;
    info!(session_id = %session_id, source = ?reply.source, "reply ready");

    let mut payload = None;
    let can_report = state.dispatcher.is_some();
    let session = state
        .store
        .update(
            &session_id,
            Box::new(|s: &mut Session| {
                s.record_reply(reply.text.as_str());
                if can_report
                    && should_dispatch(s.scam_detected, s.message_count, s.callback_sent)
                    && s.claim_callback()
                {
                    payload = Some(callback_payload(s));
                }
            }),
        )
        .await;

    if let (Some(dispatcher), Some(payload)) = (&state.dispatcher, payload) {
        info!(session_id = %session_id, "dispatching callback");
        dispatcher.spawn(&state.tasks, payload);
    }

    response(&session, Some(reply.text))
}

/// End a session: report it if a report is still owed, then delete it.
/// Returns `None` for unknown ids.
pub async fn end_session(state: &GatewayState, session_id: &str) -> Option<Session> {
    state.store.get(session_id).await?;

    let mut payload = None;
    if state.dispatcher.is_some() {
        state
            .store
            .update(
                session_id,
                Box::new(|s: &mut Session| {
                    if should_dispatch(s.scam_detected, s.message_count, s.callback_sent)
                        && s.claim_callback()
                    {
                        payload = Some(callback_payload(s));
                    }
                }),
            )
            .await;
    }
    if let (Some(dispatcher), Some(payload)) = (&state.dispatcher, payload) {
        info!(session_id = %session_id, "dispatching final callback");
        dispatcher.spawn(&state.tasks, payload);
    }

    let ended = state.store.delete(session_id).await;
    info!(session_id = %session_id, "session ended");
    ended
}

pub fn callback_payload(session: &Session) -> CallbackPayload {
    CallbackPayload {
        session_id: session.id.clone(),
        scam_detected: session.scam_detected,
        total_messages_exchanged: session.message_count,
        extracted_intelligence: session.intelligence.clone(),
        agent_notes: session.notes.clone(),
    }
}

fn response(session: &Session, agent_response: Option<String>) -> AnalyzeResponse {
    AnalyzeResponse {
        status: "success".into(),
        session_id: session.id.clone(),
        scam_detected: session.scam_detected,
        agent_response,
        engagement_metrics: EngagementMetrics {
            engagement_duration_seconds: session.engagement_duration_secs(),
            total_messages_exchanged: session.message_count,
        },
        extracted_intelligence: session.intelligence.clone(),
        agent_notes: session.notes.clone(),
    }
}

fn rfc3339(ms: u64) -> String {
    chrono::DateTime::from_timestamp_millis(ms as i64)
        .unwrap_or_default()
        .to_rfc3339()
}

pub fn session_view(session: &Session) -> SessionView {
    SessionView {
        session_id: session.id.clone(),
        status: "active".into(),
        scam_detected: session.scam_detected,
        message_count: session.message_count,
        start_time: rfc3339(session.created_at),
        last_activity: rfc3339(session.last_activity_at),
        callback_sent: session.callback_sent,
        repetitive: decoy_detect::is_repetitive(&session.history, REPETITION_WINDOW),
        extracted_intelligence: session.intelligence.clone(),
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::callback::CallbackDispatcher,
        decoy_agents::{ProviderChain, ReplySource},
        decoy_sessions::MemorySessionStore,
        std::sync::Arc,
    };

    fn state() -> GatewayState {
        GatewayState::new(Arc::new(MemorySessionStore::new()), ProviderChain::new())
    }

    fn request(session_id: &str, text: &str) -> InboundRequest {
        InboundRequest {
            session_id: Some(session_id.into()),
            message: Message::scammer(text),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn scam_message_end_to_end() {
        let state = state();
        let resp = process(
            &state,
            request(
                "e2e",
                "URGENT: Your SBI account is blocked. Share OTP and account number 912345678901 now.",
            ),
        )
        .await;

        assert!(resp.scam_detected);
        assert_eq!(resp.session_id, "e2e");
        assert!(resp.extracted_intelligence.bank_accounts.contains("912345678901"));
        assert!(resp.agent_notes.contains("urgency tactics"));
        assert!(resp.agent_notes.contains("threatening language"));
        assert!(!resp.agent_response.unwrap_or_default().is_empty());
        assert_eq!(resp.engagement_metrics.total_messages_exchanged, 1);

        let session = state.store.get("e2e").await.unwrap();
        assert_eq!(session.history.len(), 2);
        assert_eq!(session.history[1].sender, Sender::Agent);
        assert!(session.last_agent_reply.is_some());
    }

    #[tokio::test]
    async fn benign_message_gets_no_reply() {
        let state = state();
        let resp = process(&state, request("b1", "Hi, are we still meeting for lunch?")).await;
        assert!(!resp.scam_detected);
        assert!(resp.agent_response.is_none());
        assert_eq!(resp.agent_notes, "No scam indicators found");
        assert_eq!(state.store.get("b1").await.unwrap().history.len(), 1);
    }

    #[tokio::test]
    async fn detection_latches_for_later_turns() {
        let state = state();
        process(&state, request("latch", "Urgent: share your OTP now")).await;
        let resp = process(&state, request("latch", "hello?")).await;
        assert!(resp.scam_detected);
        assert!(resp.agent_response.is_some());
        assert_eq!(resp.engagement_metrics.total_messages_exchanged, 2);
    }

    #[tokio::test]
    async fn intelligence_accumulates_across_turns() {
        let state = state();
        process(&state, request("acc", "Urgent! pay to fraud@ybl")).await;
        let resp = process(&state, request("acc", "or call +91 98765 43210")).await;
        let intel = resp.extracted_intelligence;
        assert!(intel.upi_ids.contains("fraud@ybl"));
        assert!(intel.phone_numbers.contains("9876543210"));
    }

    #[tokio::test]
    async fn missing_session_id_is_generated() {
        let state = state();
        let resp = process(&state, InboundRequest::default()).await;
        assert!(resp.session_id.starts_with("session-"));
        assert!(!resp.scam_detected);
        assert_eq!(resp.agent_notes, "no text provided");
    }

    #[tokio::test]
    async fn supplied_history_drives_cumulative_detection() {
        let state = state();
        let mut req = request("hist", "ok what next");
        req.conversation_history = vec![
            Message::scammer(
                "URGENT: your SBI account will be blocked. Share OTP immediately or police case",
            ),
            Message::agent("Oh no, what happened?"),
        ];
        let resp = process(&state, req).await;
        assert!(resp.scam_detected);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_turns_report_exactly_once() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/report")
            .with_status(200)
            .expect(1)
            .create_async()
            .await;

        let state = Arc::new(
            state().with_dispatcher(CallbackDispatcher::new(format!("{}/report", server.url()))),
        );
        let mut handles = Vec::new();
        for i in 0..20 {
            let state = Arc::clone(&state);
            handles.push(tokio::spawn(async move {
                process(&state, request("race", &format!("Urgent! send OTP now {i}"))).await
            }));
        }
        for h in handles {
            assert!(h.await.unwrap().scam_detected);
        }
        end_session(&state, "race").await;

        state.tasks.close();
        state.tasks.wait().await;
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn end_session_reports_pending_callback() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/report")
            .match_body(mockito::Matcher::PartialJson(
                serde_json::json!({"sessionId": "end", "totalMessagesExchanged": 1}),
            ))
            .with_status(201)
            .expect(1)
            .create_async()
            .await;

        let state = state();
        state
            .store
            .update(
                "end",
                Box::new(|s: &mut Session| {
                    s.record_inbound(Message::scammer("pay now"));
                    s.mark_scam_detected();
                }),
            )
            .await;
        let state =
            state.with_dispatcher(CallbackDispatcher::new(format!("{}/report", server.url())));

        let ended = end_session(&state, "end").await.unwrap();
        assert!(ended.callback_sent);
        assert!(state.store.get("end").await.is_none());
        assert!(end_session(&state, "end").await.is_none());

        state.tasks.close();
        state.tasks.wait().await;
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn view_reports_repetition() {
        let state = state();
        for _ in 0..3 {
            process(&state, request("rep", "Urgent send OTP now")).await;
        }
        let view = session_view(&state.store.get("rep").await.unwrap());
        assert!(view.repetitive);
        assert_eq!(view.status, "active");
        assert_eq!(view.message_count, 3);
        assert!(view.start_time.contains('T'));
    }

    #[tokio::test]
    async fn empty_chain_reply_comes_from_fallback() {
        let state = state();
        let reply = state
            .chain
            .respond("Your account is blocked", &[], &state.persona)
            .await;
        assert_eq!(reply.source, ReplySource::Fallback);
    }
}
