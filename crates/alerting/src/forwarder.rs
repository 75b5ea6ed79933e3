//! The forwarding pipeline and its transport port.
//!
//! [`AlertForwarder::forward`] runs the four steps of one invocation in order:
//! decode the Pub/Sub envelope, parse the incident, render the chat card, and
//! deliver it through a [`WebhookTransport`]. Every failure is terminal for
//! the invocation; there are no retries.
//!
//! The transport is a port: this crate defines *what* delivery means, and the
//! `chat` crate supplies the HTTP implementation.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, field, info, warn, Span};

use serde_json::Value;

use crate::{
    template, ChatResponse, ForwardError, Incident, IncidentPayload, InvocationId, PubSubEnvelope,
    RenderedMessage,
};

// ---------------------------------------------------------------------------
// Transport port
// ---------------------------------------------------------------------------

/// Raw result of one webhook POST.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookReply {
    /// HTTP status code.
    pub status: u16,
    /// Full response body.
    pub body: Vec<u8>,
}

/// Failures a transport can report.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    /// The request could not be sent or no response was received.
    #[error("{0}")]
    Send(String),
    /// A response arrived but its body could not be read.
    #[error("{0}")]
    Read(String),
}

impl From<DeliveryError> for ForwardError {
    fn from(err: DeliveryError) -> Self {
        match err {
            DeliveryError::Send(reason) => ForwardError::Transport { reason },
            DeliveryError::Read(reason) => ForwardError::Read { reason },
        }
    }
}

/// Delivers a rendered chat message to the configured webhook.
///
/// Implementations POST `body` as `application/json` exactly once and return
/// the status and body of the response without interpreting them.
#[async_trait]
pub trait WebhookTransport: Send + Sync {
    /// Sends one message.
    async fn deliver(&self, body: &RenderedMessage) -> Result<WebhookReply, DeliveryError>;
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// An incident decoded from event data, together with its rendered card.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedAlert {
    /// Pub/Sub message id, when present in the envelope.
    pub message_id: Option<String>,
    /// Subscription the message was pushed from, when present.
    pub subscription: Option<String>,
    /// Pub/Sub publish time, when present.
    pub publish_time: Option<String>,
    /// Publisher-supplied message attributes.
    pub attributes: BTreeMap<String, Value>,
    /// The decoded incident.
    pub incident: Incident,
    /// The chat card to deliver.
    pub message: RenderedMessage,
}

/// Decodes, parses, and renders one event without performing any I/O.
pub fn prepare(event_data: &[u8]) -> Result<PreparedAlert, ForwardError> {
    let envelope = PubSubEnvelope::from_slice(event_data)?;
    let payload = envelope.payload()?;
    let incident = IncidentPayload::from_slice(&payload)?.incident;

    let started_at = incident
        .started_at
        .to_card_text()
        .ok_or_else(|| ForwardError::Parse {
            reason: format!("started_at {} is out of range", incident.started_at),
        })?;
    let message = template::render_card(&incident, &started_at);

    Ok(PreparedAlert {
        message_id: envelope.message.message_id,
        subscription: envelope.subscription,
        publish_time: envelope.message.publish_time,
        attributes: envelope.message.attributes,
        incident,
        message,
    })
}

/// Forwards monitoring incidents to a chat webhook.
///
/// Holds no per-invocation state; one instance may serve concurrent
/// invocations.
#[derive(Clone)]
pub struct AlertForwarder {
    transport: Arc<dyn WebhookTransport>,
}

impl AlertForwarder {
    /// Creates a forwarder that delivers through `transport`.
    pub fn new(transport: Arc<dyn WebhookTransport>) -> Self {
        Self { transport }
    }

    /// Runs one invocation for the given event data.
    #[tracing::instrument(
        name = "forward_alert",
        skip_all,
        fields(
            invocation_id = %InvocationId::new_random(),
            message_id = field::Empty,
            subscription = field::Empty,
            publish_time = field::Empty,
            attributes = field::Empty,
            incident_id = field::Empty,
            policy = field::Empty,
            state = field::Empty,
        )
    )]
    pub async fn forward(&self, event_data: &[u8]) -> Result<(), ForwardError> {
        let outcome = self.run(event_data).await;
        if let Err(e) = &outcome {
            warn!(stage = e.kind(), error = %e, "Alert was not delivered");
        }
        outcome
    }

    async fn run(&self, event_data: &[u8]) -> Result<(), ForwardError> {
        let alert = prepare(event_data)?;

        let span = Span::current();
        if let Some(id) = alert.message_id.as_deref() {
            span.record("message_id", id);
        }
        if let Some(subscription) = alert.subscription.as_deref() {
            span.record("subscription", subscription);
        }
        if let Some(published) = alert.publish_time.as_deref() {
            span.record("publish_time", published);
        }
        if !alert.attributes.is_empty() {
            span.record("attributes", field::debug(&alert.attributes));
        }
        span.record("incident_id", alert.incident.incident_id.as_str());
        span.record("policy", alert.incident.policy_name.as_str());
        span.record("state", alert.incident.state.as_str());
        debug!(bytes = alert.message.as_str().len(), "Rendered chat card");

        let reply = self.transport.deliver(&alert.message).await?;
        if !(200..300).contains(&reply.status) {
            warn!(status = reply.status, "Webhook answered with a non-success status");
        }

        ChatResponse::from_slice(&reply.body)?.into_result()?;
        info!(status = reply.status, "Alert delivered");
        Ok(())
    }
}

impl std::fmt::Debug for AlertForwarder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlertForwarder").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;

    use super::*;

    /// Records every delivered body and answers with a canned reply.
    struct RecordingTransport {
        reply: Result<WebhookReply, DeliveryError>,
        sent: Mutex<Vec<String>>,
    }

    impl RecordingTransport {
        fn replying(status: u16, body: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(WebhookReply {
                    status,
                    body: body.as_bytes().to_vec(),
                }),
                sent: Mutex::new(Vec::new()),
            })
        }

        fn failing(err: DeliveryError) -> Arc<Self> {
            Arc::new(Self {
                reply: Err(err),
                sent: Mutex::new(Vec::new()),
            })
        }

        fn sent(&self) -> Vec<String> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl WebhookTransport for RecordingTransport {
        async fn deliver(&self, body: &RenderedMessage) -> Result<WebhookReply, DeliveryError> {
            self.sent.lock().unwrap().push(body.as_str().to_string());
            self.reply.clone()
        }
    }

    fn event_for(payload: &str) -> Vec<u8> {
        serde_json::json!({
            "message": {
                "data": STANDARD.encode(payload),
                "messageId": "1234",
            }
        })
        .to_string()
        .into_bytes()
    }

    const CPU_HIGH: &str = r#"{"incident":{
        "policy_name": "CPU High",
        "incident_id": "0.abc",
        "documentation": {"content": "log line"},
        "state": "open",
        "url": "https://x/y",
        "started_at": 0
    }}"#;

    fn cpu_high_event() -> Vec<u8> {
        event_for(CPU_HIGH)
    }

    #[test]
    fn prepare_renders_incident_fields() {
        let alert = prepare(&cpu_high_event()).unwrap();

        assert_eq!(alert.message_id.as_deref(), Some("1234"));
        let body = alert.message.as_str();
        for expected in [
            "\"CPU High\"",
            "1970-01-01 00:00:00 CET",
            "\"log line\"",
            "\"open\"",
            "\"https://x/y\"",
        ] {
            assert!(body.contains(expected), "missing {expected}");
        }
    }

    #[test]
    fn prepare_carries_envelope_metadata() {
        let event = serde_json::json!({
            "message": {
                "data": STANDARD.encode(CPU_HIGH),
                "attributes": {"n": 1, "team": "sre"},
                "publishTime": "2024-03-01T12:00:00Z",
            },
            "subscription": "projects/p/subscriptions/alerts",
        })
        .to_string();

        let alert = prepare(event.as_bytes()).unwrap();

        assert_eq!(alert.message_id, None);
        assert_eq!(alert.subscription.as_deref(), Some("projects/p/subscriptions/alerts"));
        assert_eq!(alert.publish_time.as_deref(), Some("2024-03-01T12:00:00Z"));
        assert_eq!(alert.attributes["n"], serde_json::json!(1));
        assert_eq!(alert.incident.policy_name, "CPU High");
    }

    #[test]
    fn null_payload_renders_an_empty_card() {
        let alert = prepare(&event_for("null")).unwrap();

        assert_eq!(alert.incident, Incident::default());
        let card: Value = serde_json::from_str(alert.message.as_str()).unwrap();
        assert!(card.is_object());
        assert!(alert.message.as_str().contains("1970-01-01 00:00:00 CET"));
    }

    #[test]
    fn prepare_rejects_out_of_range_start_time() {
        let event = event_for(r#"{"incident":{"started_at":9223372036854775807}}"#);
        let err = prepare(&event).unwrap_err();
        assert!(matches!(err, ForwardError::Parse { .. }));
    }

    #[tokio::test]
    async fn empty_response_object_is_success() {
        let transport = RecordingTransport::replying(200, "{}");
        let forwarder = AlertForwarder::new(transport.clone());

        forwarder.forward(&cpu_high_event()).await.unwrap();

        assert_eq!(transport.sent().len(), 1);
    }

    #[tokio::test]
    async fn non_string_attributes_still_deliver() {
        let transport = RecordingTransport::replying(200, "{}");
        let forwarder = AlertForwarder::new(transport.clone());
        let event = serde_json::json!({
            "message": {"data": STANDARD.encode(CPU_HIGH), "attributes": {"n": 1}}
        })
        .to_string();

        forwarder.forward(event.as_bytes()).await.unwrap();

        assert_eq!(transport.sent().len(), 1);
    }

    #[tokio::test]
    async fn null_webhook_reply_is_success() {
        let transport = RecordingTransport::replying(200, "null");
        let forwarder = AlertForwarder::new(transport);

        assert_eq!(forwarder.forward(&cpu_high_event()).await, Ok(()));
    }

    #[tokio::test]
    async fn malformed_envelope_fails_before_delivery() {
        let transport = RecordingTransport::replying(200, "{}");
        let forwarder = AlertForwarder::new(transport.clone());

        let err = forwarder.forward(b"this is not json").await.unwrap_err();

        assert!(matches!(err, ForwardError::Decode { .. }));
        assert!(transport.sent().is_empty());
    }

    #[tokio::test]
    async fn malformed_payload_fails_before_delivery() {
        let transport = RecordingTransport::replying(200, "{}");
        let forwarder = AlertForwarder::new(transport.clone());

        let err = forwarder.forward(&event_for("{not json")).await.unwrap_err();

        assert!(matches!(err, ForwardError::Parse { .. }));
        assert!(transport.sent().is_empty());
    }

    #[tokio::test]
    async fn remote_error_carries_code() {
        let transport = RecordingTransport::replying(
            400,
            r#"{"error":{"code":400,"message":"bad","status":"INVALID"}}"#,
        );
        let forwarder = AlertForwarder::new(transport);

        let err = forwarder.forward(&cpu_high_event()).await.unwrap_err();

        assert!(matches!(err, ForwardError::Remote { code: 400, .. }));
    }

    #[tokio::test]
    async fn non_json_response_is_reported_with_raw_body() {
        let transport = RecordingTransport::replying(502, "Bad Gateway");
        let forwarder = AlertForwarder::new(transport);

        let err = forwarder.forward(&cpu_high_event()).await.unwrap_err();

        assert!(matches!(err, ForwardError::ResponseParse { .. }));
        assert!(err.to_string().contains("Bad Gateway"));
    }

    #[tokio::test]
    async fn http_status_alone_does_not_decide_outcome() {
        let transport = RecordingTransport::replying(500, "{}");
        let forwarder = AlertForwarder::new(transport);

        assert_eq!(forwarder.forward(&cpu_high_event()).await, Ok(()));
    }

    #[tokio::test]
    async fn transport_failures_map_to_their_stage() {
        let forwarder =
            AlertForwarder::new(RecordingTransport::failing(DeliveryError::Send("refused".into())));
        let err = forwarder.forward(&cpu_high_event()).await.unwrap_err();
        assert_eq!(
            err,
            ForwardError::Transport {
                reason: "refused".to_string()
            }
        );

        let forwarder =
            AlertForwarder::new(RecordingTransport::failing(DeliveryError::Read("reset".into())));
        let err = forwarder.forward(&cpu_high_event()).await.unwrap_err();
        assert_eq!(
            err,
            ForwardError::Read {
                reason: "reset".to_string()
            }
        );
    }

    #[tokio::test]
    async fn identical_events_produce_identical_bodies() {
        let transport = RecordingTransport::replying(200, "{}");
        let forwarder = AlertForwarder::new(transport.clone());

        forwarder.forward(&cpu_high_event()).await.unwrap();
        forwarder.forward(&cpu_high_event()).await.unwrap();

        let sent = transport.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0], sent[1]);
    }
}
