//! Pub/Sub push envelope.
//!
//! Cloud Monitoring publishes incidents to a Pub/Sub topic; the delivery
//! runtime hands the forwarder the push envelope as event data:
//!
//! ```json
//! {
//!   "message": {
//!     "data": "eyJpbmNpZGVudCI6ey4uLn19",
//!     "attributes": {},
//!     "messageId": "9876543210",
//!     "publishTime": "2024-03-01T12:00:00Z"
//!   },
//!   "subscription": "projects/p/subscriptions/s"
//! }
//! ```
//!
//! Only `message.data` matters for forwarding; the other fields are recorded
//! on the invocation span and never fail decoding on their own.

use std::collections::BTreeMap;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::Deserialize;
use serde_json::Value;

use crate::de::null_as_default;
use crate::ForwardError;

/// Outer envelope of a Pub/Sub push delivery.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PubSubEnvelope {
    /// The published message.
    #[serde(default, deserialize_with = "null_as_default")]
    pub message: PubSubMessage,

    /// Full subscription name, when the runtime forwards it.
    #[serde(default)]
    pub subscription: Option<String>,
}

/// A single Pub/Sub message.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PubSubMessage {
    /// Base64-encoded message payload.
    #[serde(default)]
    pub data: Option<String>,

    /// Publisher-supplied attributes. Pub/Sub only sends strings, but any
    /// JSON value is accepted.
    #[serde(default, deserialize_with = "null_as_default")]
    pub attributes: BTreeMap<String, Value>,

    /// Server-assigned message identifier.
    #[serde(default)]
    pub message_id: Option<String>,

    /// Server-assigned publish time (RFC 3339).
    #[serde(default)]
    pub publish_time: Option<String>,
}

impl PubSubEnvelope {
    /// Interprets raw event data as a Pub/Sub envelope.
    pub fn from_slice(event_data: &[u8]) -> Result<Self, ForwardError> {
        serde_json::from_slice(event_data).map_err(|e| ForwardError::Decode {
            reason: e.to_string(),
        })
    }

    /// Returns the decoded message payload bytes.
    ///
    /// An absent or `null` `data` field decodes to an empty payload, which then
    /// fails incident parsing rather than envelope decoding. Line breaks inside
    /// the base64 text are ignored.
    pub fn payload(&self) -> Result<Vec<u8>, ForwardError> {
        let Some(data) = self.message.data.as_deref() else {
            return Ok(Vec::new());
        };

        let compact: String = data.chars().filter(|c| *c != '\r' && *c != '\n').collect();
        STANDARD
            .decode(compact.as_bytes())
            .map_err(|e| ForwardError::Decode {
                reason: format!("message.data is not valid base64: {e}"),
            })
    }
}
