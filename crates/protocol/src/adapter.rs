use {
    decoy_common::{Message, Sender, Timestamp},
    serde_json::{Map, Value},
};

use crate::types::{InboundRequest, Metadata};

/// Turn any JSON body into an [`InboundRequest`].
///
/// Accepts the canonical camelCase shape as well as older variants: the
/// message given as a bare string, `text`/`content` at the top level,
/// snake_case `session_id`/`conversation_history`, and history items given as
/// plain strings. Anything unrecognised becomes an empty default.
pub fn normalize(body: Value) -> InboundRequest {
    let Value::Object(body) = body else {
        return InboundRequest::default();
    };

    let session_id = first(&body, &["sessionId", "session_id"]).and_then(|v| match v {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    });

    let mut message = match body.get("message") {
        Some(Value::String(text)) => Message::scammer(text.clone()),
        Some(Value::Object(obj)) => message_from_object(obj),
        _ => Message::scammer(""),
    };
    if message.text.trim().is_empty()
        && let Some(text) = text_field(&body)
    {
        message.text = text;
    }

    let conversation_history = first(&body, &["conversationHistory", "conversation_history"])
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(history_item).collect())
        .unwrap_or_default();

    let metadata = body.get("metadata").and_then(Value::as_object).map(|m| Metadata {
        channel: string_field(m, "channel"),
        language: string_field(m, "language"),
        locale: string_field(m, "locale"),
    });

    InboundRequest {
        session_id,
        message,
        conversation_history,
        metadata,
    }
}

fn first<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|k| obj.get(*k).filter(|v| !v.is_null()))
}

fn string_field(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key).and_then(Value::as_str).map(str::to_string)
}

fn text_field(obj: &Map<String, Value>) -> Option<String> {
    first(obj, &["text", "content"])
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn sender(value: Option<&Value>) -> Sender {
    match value.and_then(Value::as_str).map(str::to_ascii_lowercase).as_deref() {
        Some("agent" | "user" | "assistant") => Sender::Agent,
        _ => Sender::Scammer,
    }
}

fn timestamp(value: Option<&Value>) -> Timestamp {
    match value {
        Some(Value::Number(n)) => Timestamp::Epoch(n.clone()),
        Some(Value::String(s)) if !s.is_empty() => Timestamp::Iso(s.clone()),
        _ => Timestamp::now(),
    }
}

fn message_from_object(obj: &Map<String, Value>) -> Message {
    Message {
        sender: sender(obj.get("sender")),
        text: text_field(obj).unwrap_or_default(),
        timestamp: timestamp(obj.get("timestamp")),
    }
}

fn history_item(item: &Value) -> Option<Message> {
    match item {
        Value::String(text) => Some(Message::scammer(text.clone())),
        Value::Object(obj) => Some(message_from_object(obj)),
        _ => None,
    }
}
