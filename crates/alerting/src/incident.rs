//! Cloud Monitoring incident notification payload.
//!
//! Every field is optional on the wire. Absent or `null` fields decode to
//! empty strings or zero; no validation is performed, so a sparse incident
//! still renders a card.

use serde::Deserialize;

use crate::de::null_as_default;
use crate::{ForwardError, StartedAt};

/// Decoded Pub/Sub payload published by a Cloud Monitoring notification channel.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct IncidentPayload {
    /// The incident being reported.
    #[serde(default, deserialize_with = "null_as_default")]
    pub incident: Incident,
}

/// A monitoring incident.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Incident {
    /// Display name of the alerting policy that opened the incident.
    #[serde(default, deserialize_with = "null_as_default")]
    pub policy_name: String,

    /// Monitoring-assigned incident identifier.
    #[serde(default, deserialize_with = "null_as_default")]
    pub incident_id: String,

    /// Policy documentation attached to the notification.
    #[serde(default, deserialize_with = "null_as_default")]
    pub documentation: Documentation,

    /// Incident state, e.g. `"open"` or `"closed"`.
    #[serde(default, deserialize_with = "null_as_default")]
    pub state: String,

    /// Console link to the incident.
    #[serde(default, deserialize_with = "null_as_default")]
    pub url: String,

    /// When the incident started.
    #[serde(default, deserialize_with = "null_as_default")]
    pub started_at: StartedAt,
}

/// Policy documentation block.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Documentation {
    /// Documentation body; for log-based alerts this carries the log line.
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: String,
}

impl IncidentPayload {
    /// Parses decoded Pub/Sub payload bytes.
    ///
    /// A JSON `null` payload yields an incident with every field empty.
    pub fn from_slice(payload: &[u8]) -> Result<Self, ForwardError> {
        serde_json::from_slice::<Option<Self>>(payload)
            .map(Option::unwrap_or_default)
            .map_err(|e| ForwardError::Parse {
                reason: e.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_incident() {
        let raw = br#"{
            "incident": {
                "policy_name": "CPU High",
                "incident_id": "0.abc123",
                "documentation": {"content": "log line", "mime_type": "text/markdown"},
                "state": "open",
                "url": "https://x/y",
                "started_at": 1700000000,
                "resource_name": "ignored"
            },
            "version": "1.2"
        }"#;

        let incident = IncidentPayload::from_slice(raw).unwrap().incident;

        assert_eq!(incident.policy_name, "CPU High");
        assert_eq!(incident.incident_id, "0.abc123");
        assert_eq!(incident.documentation.content, "log line");
        assert_eq!(incident.state, "open");
        assert_eq!(incident.url, "https://x/y");
        assert_eq!(incident.started_at.as_unix_seconds(), 1_700_000_000);
    }

    #[test]
    fn missing_fields_default_to_zero_values() {
        let incident = IncidentPayload::from_slice(br#"{"incident":{"state":"closed"}}"#)
            .unwrap()
            .incident;

        assert_eq!(incident.state, "closed");
        assert_eq!(incident.policy_name, "");
        assert_eq!(incident.documentation.content, "");
        assert_eq!(incident.started_at, StartedAt::default());
    }

    #[test]
    fn null_fields_default_to_zero_values() {
        let incident = IncidentPayload::from_slice(
            br#"{"incident":{"policy_name":null,"documentation":null,"started_at":null}}"#,
        )
        .unwrap()
        .incident;

        assert_eq!(incident, Incident::default());
    }

    #[test]
    fn empty_object_is_accepted() {
        assert_eq!(
            IncidentPayload::from_slice(b"{}").unwrap(),
            IncidentPayload::default()
        );
    }

    #[test]
    fn null_payload_is_an_empty_incident() {
        assert_eq!(
            IncidentPayload::from_slice(b"null").unwrap(),
            IncidentPayload::default()
        );
    }

    #[test]
    fn malformed_payload_is_a_parse_error() {
        let inputs: [&[u8]; 4] = [
            b"",
            b"{",
            b"[1,2]",
            br#"{"incident":{"started_at":"yesterday"}}"#,
        ];
        for raw in inputs {
            let err = IncidentPayload::from_slice(raw).unwrap_err();
            assert!(matches!(err, ForwardError::Parse { .. }), "input {raw:?}");
        }
    }
}
