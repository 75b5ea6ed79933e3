//! Alert forwarding domain.
//!
//! Turns one Cloud Monitoring incident, delivered as a Pub/Sub push envelope,
//! into one Google Chat card and interprets the webhook's answer.
//! Infrastructure crates implement [`WebhookTransport`]; they never add
//! forwarding rules.
//!
//! ## Architectural Layer
//!
//! **Business logic + port definitions.** This crate has no I/O dependencies.
//! It defines *what* is delivered; infrastructure crates define *how*.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`envelope`] | Pub/Sub push envelope and payload decoding |
//! | [`incident`] | Incident notification payload |
//! | [`template`] | Chat card template and single-pass placeholder substitution |
//! | [`response`] | Webhook response body and the empty-error success check |
//! | [`forwarder`] | `AlertForwarder` pipeline and the `WebhookTransport` port |
//! | [`identifiers`] | Newtype identifiers (`FunctionName`, `EventId`, `InvocationId`) |
//! | [`types`] | Value types (`StartedAt`, `WebhookUrl`, `RenderedMessage`) |
//! | [`errors`] | `ForwardError` and `ConfigError` |

mod de;

pub mod envelope;
pub mod errors;
pub mod forwarder;
pub mod identifiers;
pub mod incident;
pub mod response;
pub mod template;
pub mod types;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use envelope::{PubSubEnvelope, PubSubMessage};
pub use errors::{ConfigError, ForwardError};
pub use forwarder::{
    prepare, AlertForwarder, DeliveryError, PreparedAlert, WebhookReply, WebhookTransport,
};
pub use identifiers::{EventId, FunctionName, InvocationId};
pub use incident::{Documentation, Incident, IncidentPayload};
pub use response::{ChatError, ChatResponse};
pub use types::{RenderedMessage, StartedAt, WebhookUrl, STARTED_AT_FORMAT};
