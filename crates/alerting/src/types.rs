//! Shared value types for the alert forwarding domain.
//!
//! Unlike the identifiers in [`crate::identifiers`], these types carry values
//! with invariants (a webhook URL is absolute `http`/`https`) or with a
//! domain-specific presentation (incident start times).

use chrono::DateTime;
use serde::{Deserialize, Serialize};

use crate::ConfigError;

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// Display format for incident start times on the chat card.
///
/// The zone label is literal; times are rendered in UTC.
pub const STARTED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S CET";

/// Incident start time as reported by Cloud Monitoring, in Unix seconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StartedAt(i64);

impl StartedAt {
    /// Creates a [`StartedAt`] from Unix seconds.
    pub fn from_unix_seconds(seconds: i64) -> Self {
        Self(seconds)
    }

    /// Returns the underlying Unix seconds.
    pub fn as_unix_seconds(self) -> i64 {
        self.0
    }

    /// Formats the start time for display using [`STARTED_AT_FORMAT`].
    ///
    /// Returns `None` if the value is outside the range chrono can represent.
    pub fn to_card_text(self) -> Option<String> {
        DateTime::from_timestamp(self.0, 0).map(|dt| dt.format(STARTED_AT_FORMAT).to_string())
    }
}

impl std::fmt::Display for StartedAt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Webhook destination
// ---------------------------------------------------------------------------

/// Destination chat webhook URL.
///
/// Must be an absolute `http://` or `https://` URL. The value usually embeds
/// a key and token, so [`std::fmt::Debug`] shows only scheme and host.
#[derive(Clone, PartialEq, Eq)]
pub struct WebhookUrl(String);

impl WebhookUrl {
    /// Validates and wraps a webhook URL.
    ///
    /// `name` is the configuration key the value came from and is only used in
    /// the returned error.
    pub fn parse(name: &str, value: impl Into<String>) -> Result<Self, ConfigError> {
        let value = value.into();
        let value = value.trim();
        if value.is_empty() {
            return Err(ConfigError::Missing {
                name: name.to_string(),
            });
        }

        let rest = value
            .strip_prefix("https://")
            .or_else(|| value.strip_prefix("http://"))
            .ok_or_else(|| ConfigError::Invalid {
                name: name.to_string(),
                reason: "must start with http:// or https://".to_string(),
            })?;
        if rest.is_empty() || rest.starts_with('/') {
            return Err(ConfigError::Invalid {
                name: name.to_string(),
                reason: "missing host".to_string(),
            });
        }

        Ok(Self(value.to_string()))
    }

    /// Returns the full URL, including any credentials in the query string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns scheme and host only, safe for logging.
    ///
    /// Path, query, fragment, and any `user:password@` prefix are dropped.
    pub fn redacted(&self) -> String {
        let (scheme, rest) = self.0.split_once("://").unwrap_or(("", &self.0));
        let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();
        let host = authority.rsplit_once('@').map_or(authority, |(_, host)| host);
        format!("{scheme}://{host}")
    }
}

impl std::fmt::Debug for WebhookUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("WebhookUrl").field(&self.redacted()).finish()
    }
}

// ---------------------------------------------------------------------------
// Rendered output
// ---------------------------------------------------------------------------

/// A chat message body produced by [`crate::template::render`], ready to POST.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMessage(String);

impl RenderedMessage {
    /// Wraps an already-rendered message body.
    pub fn new(body: String) -> Self {
        Self(body)
    }

    /// Returns the body as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

}
