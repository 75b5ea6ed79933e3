//! Alert forwarder entry point.
//!
//! This binary is the composition root for the entire system. Responsibilities:
//!
//! 1. **Load configuration** — read `WEBHOOK_URL`, `PORT`, `FUNCTION_TARGET`,
//!    `LOG_FORMAT`, and `OTEL_EXPORTER_OTLP_ENDPOINT` and validate them.
//! 2. **Wire observability** — configure `tracing-subscriber` with a JSON (or
//!    pretty) layer and, when an endpoint is configured, an OpenTelemetry OTLP
//!    exporter. All spans and events emitted by every crate flow through it.
//! 3. **Construct infrastructure** — build the `GoogleChatWebhook` transport and
//!    inject it into `AlertForwarder`.
//! 4. **Register and serve** — register the forwarder as `GoogleChatAlert`,
//!    resolve `FUNCTION_TARGET`, and serve CloudEvents until shutdown.

mod config;
mod telemetry;

use std::sync::Arc;

use alerting::AlertForwarder;
use anyhow::Context;
use chat::GoogleChatWebhook;
use listener::FunctionRegistry;
use tracing::info;

use crate::config::{ForwarderConfig, GOOGLE_CHAT_ALERT};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ForwarderConfig::from_env().context("invalid configuration")?;
    let telemetry = telemetry::init(config.log_format, config.otlp_endpoint.as_deref())?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        function = %config.function_target,
        webhook = %config.webhook_url.redacted(),
        "Starting alert forwarder"
    );

    let webhook = GoogleChatWebhook::new(config.webhook_url.clone())?;
    let forwarder = AlertForwarder::new(Arc::new(webhook));

    let mut registry = FunctionRegistry::new();
    registry.register_cloud_event(GOOGLE_CHAT_ALERT, Arc::new(forwarder))?;
    let handler = registry.resolve(&config.function_target)?;

    let served = listener::serve(config.listen_addr(), listener::router(handler)).await;

    telemetry.shutdown();
    served.context("server failed")
}
