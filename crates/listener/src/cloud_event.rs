//! CloudEvents HTTP protocol binding.
//!
//! Three request shapes are accepted:
//!
//! - **structured** — `Content-Type: application/cloudevents+json`; attributes
//!   and data travel together in one JSON object (`data` or `data_base64`).
//! - **binary** — attributes in `ce-*` headers, the body is the event data.
//! - **raw Pub/Sub push** — no `ce-id` header; the body is a Pub/Sub push
//!   envelope and becomes the event data unchanged.

use alerting::EventId;
use axum::http::header::CONTENT_TYPE;
use axum::http::HeaderMap;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// Media type of a structured-mode CloudEvent.
pub const STRUCTURED_CONTENT_TYPE: &str = "application/cloudevents+json";

/// Event type Pub/Sub uses for published messages.
pub const PUBSUB_MESSAGE_PUBLISHED: &str = "google.cloud.pubsub.topic.v1.messagePublished";

const SUPPORTED_SPEC_VERSIONS: [&str; 2] = ["1.0", "0.3"];

/// An event received from the delivery runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloudEvent {
    /// Event identifier; redeliveries of the same event share it.
    pub id: EventId,
    /// Context in which the event happened.
    pub source: String,
    /// Event type, e.g. [`PUBSUB_MESSAGE_PUBLISHED`].
    pub event_type: String,
    /// CloudEvents specification version.
    pub spec_version: String,
    /// Optional subject within the source.
    pub subject: Option<String>,
    /// Optional occurrence time (RFC 3339).
    pub time: Option<String>,
    /// Media type of `data`, when declared.
    pub data_content_type: Option<String>,
    /// Event payload.
    pub data: Vec<u8>,
}

/// Reasons a request cannot be turned into a [`CloudEvent`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CloudEventError {
    /// A required context attribute is absent or empty.
    #[error("missing required CloudEvent attribute '{0}'")]
    MissingAttribute(&'static str),

    /// The declared specification version is not supported.
    #[error("unsupported CloudEvents specversion '{0}'")]
    UnsupportedSpecVersion(String),

    /// A structured-mode body is not a valid CloudEvent document.
    #[error("invalid structured CloudEvent: {0}")]
    InvalidStructuredBody(String),
}

#[derive(Deserialize)]
struct StructuredEvent {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    source: Option<String>,
    #[serde(default, rename = "type")]
    event_type: Option<String>,
    #[serde(default)]
    specversion: Option<String>,
    #[serde(default)]
    subject: Option<String>,
    #[serde(default)]
    time: Option<String>,
    #[serde(default)]
    datacontenttype: Option<String>,
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    data_base64: Option<String>,
}

impl CloudEvent {
    /// Builds an event from an HTTP request's headers and body.
    pub fn from_http(headers: &HeaderMap, body: &[u8]) -> Result<Self, CloudEventError> {
        let content_type = header_str(headers, CONTENT_TYPE.as_str());

        if content_type.is_some_and(|ct| ct.starts_with(STRUCTURED_CONTENT_TYPE)) {
            Self::from_structured(body)
        } else if headers.contains_key("ce-id") {
            Self::from_binary(headers, content_type, body)
        } else {
            Ok(Self::from_raw_push(content_type, body))
        }
    }

    fn from_binary(
        headers: &HeaderMap,
        content_type: Option<&str>,
        body: &[u8],
    ) -> Result<Self, CloudEventError> {
        let required = |name: &'static str| {
            header_str(headers, name)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .ok_or(CloudEventError::MissingAttribute(name))
        };

        let spec_version = checked_spec_version(required("ce-specversion")?)?;
        let id =
            EventId::new(required("ce-id")?).ok_or(CloudEventError::MissingAttribute("ce-id"))?;

        Ok(Self {
            id,
            source: required("ce-source")?,
            event_type: required("ce-type")?,
            spec_version,
            subject: header_str(headers, "ce-subject").map(str::to_string),
            time: header_str(headers, "ce-time").map(str::to_string),
            data_content_type: content_type.map(str::to_string),
            data: body.to_vec(),
        })
    }

    fn from_structured(body: &[u8]) -> Result<Self, CloudEventError> {
        let raw: StructuredEvent = serde_json::from_slice(body)
            .map_err(|e| CloudEventError::InvalidStructuredBody(e.to_string()))?;

        fn required(value: Option<String>, name: &'static str) -> Result<String, CloudEventError> {
            value
                .filter(|v| !v.is_empty())
                .ok_or(CloudEventError::MissingAttribute(name))
        }

        let spec_version = checked_spec_version(required(raw.specversion, "specversion")?)?;
        let id =
            EventId::new(required(raw.id, "id")?).ok_or(CloudEventError::MissingAttribute("id"))?;

        let data = match (raw.data_base64, raw.data) {
            (Some(encoded), _) => STANDARD
                .decode(encoded.as_bytes())
                .map_err(|e| CloudEventError::InvalidStructuredBody(format!("data_base64: {e}")))?,
            (None, Some(Value::String(text))) if !is_json(raw.datacontenttype.as_deref()) => {
                text.into_bytes()
            }
            (None, Some(value)) => value.to_string().into_bytes(),
            (None, None) => Vec::new(),
        };

        Ok(Self {
            id,
            source: required(raw.source, "source")?,
            event_type: required(raw.event_type, "type")?,
            spec_version,
            subject: raw.subject,
            time: raw.time,
            data_content_type: raw.datacontenttype,
            data,
        })
    }

    fn from_raw_push(content_type: Option<&str>, body: &[u8]) -> Self {
        let envelope: Option<Value> = serde_json::from_slice(body).ok();
        let field = |pointer: &str| {
            envelope
                .as_ref()
                .and_then(|v| v.pointer(pointer))
                .and_then(Value::as_str)
                .map(str::to_string)
        };

        let id = field("/message/messageId")
            .and_then(EventId::new)
            .unwrap_or_else(EventId::generated);
        let source =
            field("/subscription").unwrap_or_else(|| "//pubsub.googleapis.com".to_string());

        Self {
            id,
            source,
            event_type: PUBSUB_MESSAGE_PUBLISHED.to_string(),
            spec_version: SUPPORTED_SPEC_VERSIONS[0].to_string(),
            subject: None,
            time: field("/message/publishTime"),
            data_content_type: content_type.map(str::to_string),
            data: body.to_vec(),
        }
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok()).map(str::trim)
}

fn checked_spec_version(version: String) -> Result<String, CloudEventError> {
    if SUPPORTED_SPEC_VERSIONS.contains(&version.as_str()) {
        Ok(version)
    } else {
        Err(CloudEventError::UnsupportedSpecVersion(version))
    }
}

fn is_json(content_type: Option<&str>) -> bool {
    content_type.map_or(true, |ct| {
        let essence = ct.split(';').next().unwrap_or_default().trim();
        essence == "application/json" || essence.ends_with("+json")
    })
}
