//! Trigger event source infrastructure.
//!
//! Receives CloudEvents over HTTP from the event-delivery runtime (Cloud Run /
//! Cloud Functions Pub/Sub triggers, or raw Pub/Sub push subscriptions) and
//! hands each one to the handler selected from a [`FunctionRegistry`].
//!
//! ## Deployment Scenarios
//!
//! | Scenario | Request shape | Notes |
//! |----------|---------------|-------|
//! | Eventarc / Cloud Functions trigger | binary CloudEvent | `ce-*` headers |
//! | CloudEvents SDK producers | structured CloudEvent | `application/cloudevents+json` |
//! | Pub/Sub push subscription | raw push envelope | event id from `messageId` |
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** Protocol binding, HTTP serving, and shutdown handling
//! live here. The [`alerting`] crate never sees HTTP requests; it receives the
//! event data bytes only.

pub mod cloud_event;
pub mod registry;
pub mod server;

pub use cloud_event::{
    CloudEvent, CloudEventError, PUBSUB_MESSAGE_PUBLISHED, STRUCTURED_CONTENT_TYPE,
};
pub use registry::{CloudEventHandler, FunctionRegistry, HandlerError, RegistryError};
pub use server::{router, serve};
