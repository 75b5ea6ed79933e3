//! Error types for the alert forwarding domain.
//!
//! [`ForwardError`] covers every way a single invocation can fail. All of its
//! variants are terminal: the forwarder never retries, and the event-delivery
//! runtime decides whether to redeliver.
//!
//! [`ConfigError`] covers invalid deployment configuration detected at startup,
//! before any event is accepted.

use thiserror::Error;

// ---------------------------------------------------------------------------
// Invocation errors
// ---------------------------------------------------------------------------

/// Errors that fail one forwarding invocation.
///
/// The display text always includes the underlying cause so that the message
/// is useful on its own in operator logs.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ForwardError {
    /// The event data could not be interpreted as a Pub/Sub envelope, or the
    /// envelope's `message.data` was not valid base64.
    #[error("failed to retrieve Pub/Sub message: {reason}")]
    Decode {
        /// Description of the decoding failure.
        reason: String,
    },

    /// The decoded Pub/Sub payload is not a valid incident document.
    #[error("failed to parse Pub/Sub message payload: {reason}")]
    Parse {
        /// Description of the parse failure.
        reason: String,
    },

    /// The webhook request could not be sent.
    #[error("failed to send request to Google Chat: {reason}")]
    Transport {
        /// Description of the network failure.
        reason: String,
    },

    /// The webhook response body could not be read.
    #[error("failed to read response body: {reason}")]
    Read {
        /// Description of the I/O failure.
        reason: String,
    },

    /// The webhook response body is not valid JSON.
    #[error("failed to parse Google Chat response: {reason}, received: {body}")]
    ResponseParse {
        /// Description of the JSON error.
        reason: String,
        /// Raw response body text, lossily decoded as UTF-8.
        body: String,
    },

    /// The webhook answered with an application-level error object.
    #[error("received an error response from Google Chat: code {code}, status '{status}', message '{message}'")]
    Remote {
        /// Numeric error code reported by the chat service.
        code: i64,
        /// Human-readable error message.
        message: String,
        /// Symbolic status (e.g. `"INVALID_ARGUMENT"`).
        status: String,
    },
}

impl ForwardError {
    /// Short machine-friendly name of the failure stage, used as a log field.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Decode { .. } => "decode",
            Self::Parse { .. } => "parse",
            Self::Transport { .. } => "transport",
            Self::Read { .. } => "read",
            Self::ResponseParse { .. } => "response_parse",
            Self::Remote { .. } => "remote",
        }
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// The deployment configuration is invalid.
///
/// Produced at load time; the forwarder never starts with an invalid config.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A required configuration value was not supplied.
    #[error("missing required configuration value '{name}'")]
    Missing {
        /// Name of the missing value (e.g. an environment variable).
        name: String,
    },

    /// A configuration value was supplied but could not be used.
    #[error("invalid configuration value '{name}': {reason}")]
    Invalid {
        /// Name of the offending value.
        name: String,
        /// Why the value was rejected.
        reason: String,
    },
}
