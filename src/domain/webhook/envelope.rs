//! Parsed webhook event envelope.

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

/// Event names the dispatcher routes explicitly.
pub const EVENT_CHARGE_COMPLETED: &str = "charge.completed";
pub const EVENT_CHARGE_SUCCESSFUL: &str = "charge.successful";
pub const EVENT_CHARGE_FAILED: &str = "charge.failed";

/// How an event name is routed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookEventKind {
    PaymentSucceeded,
    PaymentFailed,
    Unhandled,
}

impl WebhookEventKind {
    pub fn from_event(event: &str) -> Self {
        match event {
            EVENT_CHARGE_COMPLETED | EVENT_CHARGE_SUCCESSFUL => WebhookEventKind::PaymentSucceeded,
            EVENT_CHARGE_FAILED => WebhookEventKind::PaymentFailed,
            _ => WebhookEventKind::Unhandled,
        }
    }
}

/// A webhook body as sent by the gateway.
///
/// `event` and `data` are read out for routing; the body itself is kept
/// verbatim so unrouted events can be handed on without losing fields.
#[derive(Debug, Clone, PartialEq)]
pub struct WebhookEnvelope {
    event: String,
    data: Value,
    root: Map<String, Value>,
}

impl WebhookEnvelope {
    /// Parses a request body.
    ///
    /// Returns `None` unless the body is a JSON object. A missing or
    /// non-string `event` routes as the empty string and a missing or null
    /// `data` as an empty object; the stored body is not rewritten.
    pub fn parse(body: &[u8]) -> Option<Self> {
        match serde_json::from_slice::<Value>(body).ok()? {
            Value::Object(root) => Some(Self::from_object(root)),
            _ => None,
        }
    }

    pub fn from_object(root: Map<String, Value>) -> Self {
        let event = root
            .get("event")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let data = match root.get("data") {
            None | Some(Value::Null) => Value::Object(Map::new()),
            Some(data) => data.clone(),
        };

        Self { event, data, root }
    }

    pub fn event(&self) -> &str {
        &self.event
    }

    pub fn data(&self) -> &Value {
        &self.data
    }

    pub fn into_data(self) -> Value {
        self.data
    }

    pub fn kind(&self) -> WebhookEventKind {
        WebhookEventKind::from_event(&self.event)
    }

    /// Identifier used to detect redelivery: `{event}:{data.id}`, falling
    /// back to `data.tx_ref`. `None` when neither is present.
    pub fn dedup_key(&self) -> Option<String> {
        let id = ["id", "tx_ref"].iter().find_map(|field| {
            match self.data.get(*field)? {
                Value::String(s) if !s.is_empty() => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            }
        })?;
        Some(format!("{}:{}", self.event, id))
    }

    /// The body exactly as received.
    pub fn to_value(&self) -> Value {
        Value::Object(self.root.clone())
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.root)
    }
}

impl Serialize for WebhookEnvelope {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.root.serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn envelope(body: Value) -> WebhookEnvelope {
        match body {
            Value::Object(root) => WebhookEnvelope::from_object(root),
            other => panic!("not an object: {}", other),
        }
    }

    #[test]
    fn parses_event_and_data() {
        let env = WebhookEnvelope::parse(
            br#"{"event":"charge.completed","data":{"id":285959875,"status":"successful"}}"#,
        )
        .unwrap();
        assert_eq!(env.event(), "charge.completed");
        assert_eq!(env.data()["status"], json!("successful"));
        assert_eq!(env.kind(), WebhookEventKind::PaymentSucceeded);
    }

    #[test]
    fn missing_fields_get_defaults() {
        let env = WebhookEnvelope::parse(b"{}").unwrap();
        assert_eq!(env.event(), "");
        assert_eq!(env.data(), &json!({}));
        assert_eq!(env.kind(), WebhookEventKind::Unhandled);
        assert_eq!(env.to_value(), json!({}));
    }

    #[test]
    fn body_is_kept_verbatim() {
        let body = json!({
            "event": "transfer.completed",
            "event.type": "Transfer",
            "data": {"id": 3},
            "meta_data": {"k": 1}
        });
        let env = WebhookEnvelope::parse(body.to_string().as_bytes()).unwrap();
        assert_eq!(env.to_value(), body);
        assert_eq!(serde_json::to_value(&env).unwrap(), body);
        assert_eq!(env.into_value(), body);
    }

    #[test]
    fn non_string_event_routes_as_unhandled_but_is_not_rewritten() {
        let body = json!({"event": 7, "data": null});
        let env = WebhookEnvelope::parse(body.to_string().as_bytes()).unwrap();
        assert_eq!(env.event(), "");
        assert_eq!(env.data(), &json!({}));
        assert_eq!(env.to_value(), body);
    }

    #[test]
    fn non_object_bodies_are_rejected() {
        assert!(WebhookEnvelope::parse(b"not json").is_none());
        assert!(WebhookEnvelope::parse(b"[1,2]").is_none());
        assert!(WebhookEnvelope::parse(b"\"charge.completed\"").is_none());
        assert!(WebhookEnvelope::parse(b"").is_none());
    }

    #[test]
    fn routes_event_kinds() {
        assert_eq!(
            WebhookEventKind::from_event("charge.successful"),
            WebhookEventKind::PaymentSucceeded
        );
        assert_eq!(WebhookEventKind::from_event("charge.failed"), WebhookEventKind::PaymentFailed);
        assert_eq!(
            WebhookEventKind::from_event("transfer.completed"),
            WebhookEventKind::Unhandled
        );
    }

    #[test]
    fn dedup_key_prefers_id_then_tx_ref() {
        let env = envelope(json!({"event": "charge.completed", "data": {"id": 42, "tx_ref": "ref-1"}}));
        assert_eq!(env.dedup_key().as_deref(), Some("charge.completed:42"));

        let env = envelope(json!({"event": "charge.failed", "data": {"tx_ref": "ref-1"}}));
        assert_eq!(env.dedup_key().as_deref(), Some("charge.failed:ref-1"));

        let env = envelope(json!({"event": "charge.failed", "data": {"amount": 100}}));
        assert_eq!(env.dedup_key(), None);
    }
}
