//! Chat card template and placeholder substitution.
//!
//! The card is a fixed JSON document with five literal placeholder tokens.
//! Rendering is a single left-to-right pass over the template: at each
//! position the first substitution (in list order) whose token starts there is
//! replaced, and inserted values are never rescanned. Identical inputs always
//! render byte-identical output.

use crate::{Incident, RenderedMessage};

/// Placeholder for the alerting policy name.
pub const ALERT_NAME: &str = "{alertName}";
/// Placeholder for the formatted incident start time.
pub const STARTED_AT: &str = "{startedAt}";
/// Placeholder for the documentation content (the received log line).
pub const LOG_MESSAGE: &str = "{logMessage}";
/// Placeholder for the incident state.
pub const STATUS: &str = "{status}";
/// Placeholder for the incident console link.
pub const INCIDENT_URL: &str = "{incidentURL}";

/// Google Chat card posted for every incident.
pub const MESSAGE_TEMPLATE: &str = r##"
{
    "cards": [
        {
            "header": {
                "title": "<users/all> Google Cloud Monitoring Alert"
            },
            "sections": [
                {
                    "header": "{alertName}",
                    "widgets": [
                        {
                            "textParagraph": {
                                "text": "<b>Started at:</b> {startedAt}"
                            }
                        }
                    ]
                },
                {
                    "header": "<b><font color=\"#ff0000\">Received log</font></b>",
                    "widgets": [
                        {
                            "textParagraph": {
                                "text": "{logMessage}"
                            }
                        }
                    ]
                },
                {
                    "widgets": [
                        {
                            "keyValue": {
                                "topLabel": "Status",
                                "content": "{status}"
                            }
                        }
                    ]
                },
                {
                    "widgets": [
                        {
                            "buttons": [
                                {
                                    "textButton": {
                                        "text": "GO TO INCIDENT",
                                        "onClick": {
                                            "openLink": {
                                                "url": "{incidentURL}"
                                            }
                                        }
                                    }
                                }
                            ]
                        }
                    ]
                }
            ]
        }
    ]
}
"##;

/// One placeholder token and the text that replaces it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Substitution {
    /// Literal token to look for, e.g. [`ALERT_NAME`].
    pub token: &'static str,
    /// Replacement text, inserted verbatim.
    pub value: String,
}

impl Substitution {
    /// Creates a substitution whose value is escaped for use inside a JSON
    /// string literal.
    ///
    /// Values without quotes, backslashes, or control characters are inserted
    /// unchanged.
    pub fn json_string(token: &'static str, value: &str) -> Self {
        Self {
            token,
            value: escape_json_string(value),
        }
    }
}

/// Builds the ordered substitution list for an incident.
///
/// `started_at` is the already-formatted start time.
pub fn substitutions_for(incident: &Incident, started_at: &str) -> Vec<Substitution> {
    vec![
        Substitution::json_string(ALERT_NAME, &incident.policy_name),
        Substitution::json_string(STARTED_AT, started_at),
        Substitution::json_string(LOG_MESSAGE, &incident.documentation.content),
        Substitution::json_string(STATUS, &incident.state),
        Substitution::json_string(INCIDENT_URL, &incident.url),
    ]
}

/// Replaces every occurrence of each token in `template` with its value in a
/// single non-recursive pass.
pub fn render(template: &str, substitutions: &[Substitution]) -> RenderedMessage {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(ch) = rest.chars().next() {
        let matched = substitutions
            .iter()
            .find(|s| !s.token.is_empty() && rest.starts_with(s.token));
        match matched {
            Some(s) => {
                out.push_str(&s.value);
                rest = &rest[s.token.len()..];
            }
            None => {
                out.push(ch);
                rest = &rest[ch.len_utf8()..];
            }
        }
    }

    RenderedMessage::new(out)
}

/// Renders [`MESSAGE_TEMPLATE`] for `incident`.
pub fn render_card(incident: &Incident, started_at: &str) -> RenderedMessage {
    render(MESSAGE_TEMPLATE, &substitutions_for(incident, started_at))
}

fn escape_json_string(value: &str) -> String {
    let quoted = serde_json::Value::String(value.to_string()).to_string();
    quoted[1..quoted.len() - 1].to_string()
}
