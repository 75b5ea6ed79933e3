//! Deployment configuration, read once from the environment at startup.

use std::net::SocketAddr;

use alerting::{ConfigError, WebhookUrl};

/// Name the alert forwarder is registered under.
pub const GOOGLE_CHAT_ALERT: &str = "GoogleChatAlert";

/// Port used when `PORT` is unset.
pub const DEFAULT_PORT: u16 = 8080;

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per event (default; understood by Cloud Logging).
    #[default]
    Json,
    /// Multi-line human-readable output for local runs.
    Pretty,
}

/// Everything the forwarder needs from its deployment.
#[derive(Debug, Clone)]
pub struct ForwarderConfig {
    /// Destination chat webhook (`WEBHOOK_URL`).
    pub webhook_url: WebhookUrl,
    /// HTTP listen port (`PORT`).
    pub port: u16,
    /// Registered function to serve (`FUNCTION_TARGET`).
    pub function_target: String,
    /// Log output format (`LOG_FORMAT`).
    pub log_format: LogFormat,
    /// OTLP collector endpoint (`OTEL_EXPORTER_OTLP_ENDPOINT`); tracing export
    /// is disabled when unset.
    pub otlp_endpoint: Option<String>,
}

impl ForwarderConfig {
    /// Reads the configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads the configuration through `lookup`, which returns the value of a
    /// named variable if it is set.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let value = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let webhook_url = WebhookUrl::parse(
            "WEBHOOK_URL",
            value("WEBHOOK_URL").ok_or_else(|| ConfigError::Missing {
                name: "WEBHOOK_URL".to_string(),
            })?,
        )?;

        let port = match value("PORT") {
            Some(raw) => raw.parse::<u16>().map_err(|e| ConfigError::Invalid {
                name: "PORT".to_string(),
                reason: e.to_string(),
            })?,
            None => DEFAULT_PORT,
        };

        let log_format = match value("LOG_FORMAT").as_deref() {
            None | Some("json") => LogFormat::Json,
            Some("pretty") => LogFormat::Pretty,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: "LOG_FORMAT".to_string(),
                    reason: format!("expected 'json' or 'pretty', got '{other}'"),
                })
            }
        };

        Ok(Self {
            webhook_url,
            port,
            function_target: value("FUNCTION_TARGET")
                .unwrap_or_else(|| GOOGLE_CHAT_ALERT.to_string()),
            log_format,
            otlp_endpoint: value("OTEL_EXPORTER_OTLP_ENDPOINT"),
        })
    }

    /// Address the HTTP server binds to (all interfaces).
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::from(([0, 0, 0, 0], self.port))
    }
}
