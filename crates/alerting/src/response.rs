//! Chat webhook response body.

use serde::Deserialize;

use crate::de::null_as_default;
use crate::ForwardError;

/// Response body returned by the chat webhook.
///
/// Successful posts echo the created message; only the optional `error`
/// object is inspected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ChatResponse {
    /// Error details, zero-valued when the post succeeded.
    #[serde(default, deserialize_with = "null_as_default")]
    pub error: ChatError,
}

/// Application-level error reported by the chat webhook.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ChatError {
    /// HTTP-style error code (e.g. `400`).
    #[serde(default, deserialize_with = "null_as_default")]
    pub code: i64,
    /// Human-readable message.
    #[serde(default, deserialize_with = "null_as_default")]
    pub message: String,
    /// Symbolic status (e.g. `"INVALID_ARGUMENT"`).
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: String,
}

impl ChatError {
    /// Returns `true` if every field holds its zero value.
    ///
    /// An explicit `{"code": 0, "message": "", "status": ""}` is therefore
    /// indistinguishable from no error at all.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl ChatResponse {
    /// Parses a raw response body.
    ///
    /// A JSON `null` body is treated as an empty response. The body is
    /// included verbatim in the error on failure.
    pub fn from_slice(body: &[u8]) -> Result<Self, ForwardError> {
        serde_json::from_slice::<Option<Self>>(body)
            .map(Option::unwrap_or_default)
            .map_err(|e| ForwardError::ResponseParse {
                reason: e.to_string(),
                body: String::from_utf8_lossy(body).into_owned(),
            })
    }

    /// Converts the response into the invocation outcome.
    pub fn into_result(self) -> Result<(), ForwardError> {
        if self.error.is_empty() {
            return Ok(());
        }

        let ChatError {
            code,
            message,
            status,
        } = self.error;
        Err(ForwardError::Remote {
            code,
            message,
            status,
        })
    }
}
