//! # View Domain Types
//!
//! The vocabulary shared by the tracker (which produces views and stamps
//! requests) and the collector (which stores them):
//!
//! - [`InstanceId`] - opaque identity of one browser instance
//! - [`ViewState`] - the current-view record, also the report POST body
//! - [`ViewId`] - the `(instance, sequence)` pair carried by [`VIEW_HEADER`]
//!
//! ## Wire format
//!
//! The report body uses the field names `instanceID`, `sequence`, `stateName`,
//! `stateParams` and `requestURI`. The correlation header value is
//! `"<instance> <sequence>"`; an unknown instance is written as
//! [`MISSING_INSTANCE`].

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Error, Result};

/// Correlation header stamped on every outgoing request.
pub const VIEW_HEADER: &str = "X-Track-View";

/// Sequence value before the first navigation. The first view is `1`.
pub const SEQUENCE_BASELINE: u64 = 0;

/// Textual stand-in for an unknown instance (header and URL forms).
pub const MISSING_INSTANCE: &str = "-";

/// Navigation parameters for a state, keyed by parameter name.
pub type StateParams = BTreeMap<String, serde_json::Value>;

// ── InstanceId ────────────────────────────────────────────────────────────────

/// Opaque identifier for one browser instance's tracking session.
///
/// Only visible ASCII is accepted: the value travels inside a space-separated
/// header and a URL path segment.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct InstanceId(String);

impl InstanceId {
    pub fn new(value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        let valid = !value.is_empty()
            && value != MISSING_INSTANCE
            && value.bytes().all(|b| b.is_ascii_graphic());
        if valid {
            Ok(Self(value))
        } else {
            Err(Error::invalid_instance(value))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Numeric ids as allocated by the collector.
impl From<u64> for InstanceId {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

impl FromStr for InstanceId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl<'de> Deserialize<'de> for InstanceId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        // Hosts inject numeric ids as often as strings.
        let raw = serde_json::Value::deserialize(deserializer)?;
        let text = match raw {
            serde_json::Value::String(s) => s,
            serde_json::Value::Number(n) => n.to_string(),
            other => {
                return Err(serde::de::Error::custom(format!(
                    "instance id must be a string or number, got {other}"
                )))
            }
        };
        InstanceId::new(text).map_err(serde::de::Error::custom)
    }
}

// ── ViewState ─────────────────────────────────────────────────────────────────

/// The current-view record owned by the sequencer.
///
/// Serialized as-is for the report POST body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewState {
    #[serde(rename = "instanceID")]
    pub instance_id: Option<InstanceId>,

    pub sequence: u64,

    #[serde(rename = "stateName", default)]
    pub state_name: String,

    #[serde(rename = "stateParams", default)]
    pub state_params: StateParams,

    #[serde(
        rename = "requestURI",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub request_uri: Option<String>,
}

impl ViewState {
    /// A fresh record at [`SEQUENCE_BASELINE`] with no state yet.
    pub fn new(instance_id: Option<InstanceId>) -> Self {
        Self {
            instance_id,
            sequence: SEQUENCE_BASELINE,
            state_name: String::new(),
            state_params: StateParams::new(),
            request_uri: None,
        }
    }

    pub fn view_id(&self) -> ViewId {
        ViewId {
            instance: self.instance_id.clone(),
            sequence: self.sequence,
        }
    }
}

// ── ViewId ────────────────────────────────────────────────────────────────────

/// The `(instance, sequence)` pair identifying one view.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ViewId {
    pub instance: Option<InstanceId>,
    pub sequence: u64,
}

impl ViewId {
    pub fn new(instance: Option<InstanceId>, sequence: u64) -> Self {
        Self { instance, sequence }
    }

    /// Header form: `"<instance> <sequence>"`.
    pub fn header_value(&self) -> String {
        let instance = self
            .instance
            .as_ref()
            .map(InstanceId::as_str)
            .unwrap_or(MISSING_INSTANCE);
        format!("{} {}", instance, self.sequence)
    }

    /// Parse a [`VIEW_HEADER`] value.
    ///
    /// Exactly two whitespace-separated fields are required. A
    /// [`MISSING_INSTANCE`] first field parses to `instance: None`.
    pub fn parse_header(value: &str) -> Result<Self> {
        let fields: Vec<&str> = value.split_whitespace().collect();
        if fields.len() != 2 {
            return Err(Error::invalid_view_header(
                value,
                format!("has {} values; must have exactly 2", fields.len()),
            ));
        }

        let instance = match fields[0] {
            MISSING_INSTANCE => None,
            raw => Some(
                InstanceId::new(raw)
                    .map_err(|_| Error::invalid_view_header(value, "invalid instance"))?,
            ),
        };
        let sequence = fields[1]
            .parse::<u64>()
            .map_err(|e| Error::invalid_view_header(value, format!("bad sequence: {e}")))?;

        Ok(Self { instance, sequence })
    }
}

impl fmt::Display for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.header_value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn instance(s: &str) -> InstanceId {
        InstanceId::new(s).unwrap()
    }

    #[test]
    fn test_instance_id_rejects_whitespace_and_empty() {
        assert!(InstanceId::new("abc123").is_ok());
        assert!(InstanceId::new("").is_err());
        assert!(InstanceId::new("a b").is_err());
        assert!(InstanceId::new("tab\there").is_err());
        assert!(InstanceId::new(MISSING_INSTANCE).is_err());
    }

    #[test]
    fn test_instance_id_deserializes_from_number() {
        let id: InstanceId = serde_json::from_value(json!(42)).unwrap();
        assert_eq!(id.as_str(), "42");

        let id: InstanceId = serde_json::from_value(json!("abc123")).unwrap();
        assert_eq!(id.as_str(), "abc123");

        assert!(serde_json::from_value::<InstanceId>(json!(true)).is_err());
    }

    #[test]
    fn test_new_view_state_starts_at_baseline() {
        let view = ViewState::new(Some(instance("abc123")));
        assert_eq!(view.sequence, SEQUENCE_BASELINE);
        assert!(view.state_name.is_empty());
        assert!(view.state_params.is_empty());
        assert!(view.request_uri.is_none());
    }

    #[test]
    fn test_view_state_wire_format() {
        let view = ViewState {
            instance_id: Some(instance("abc123")),
            sequence: 1,
            state_name: "contacts".to_string(),
            state_params: StateParams::new(),
            request_uri: None,
        };
        let body = serde_json::to_string(&view).unwrap();
        insta::assert_snapshot!(body, @r#"{"instanceID":"abc123","sequence":1,"stateName":"contacts","stateParams":{}}"#);
    }

    #[test]
    fn test_view_state_wire_format_with_request_uri() {
        let mut params = StateParams::new();
        params.insert("id".to_string(), json!("42"));
        let view = ViewState {
            instance_id: None,
            sequence: 2,
            state_name: "contacts.detail".to_string(),
            state_params: params,
            request_uri: Some("/contacts/42".to_string()),
        };
        let body = serde_json::to_string(&view).unwrap();
        insta::assert_snapshot!(body, @r#"{"instanceID":null,"sequence":2,"stateName":"contacts.detail","stateParams":{"id":"42"},"requestURI":"/contacts/42"}"#);
    }

    #[test]
    fn test_view_state_decodes_report_body() {
        let body = r#"{"instanceID":"abc123","sequence":7,"stateName":"contacts","stateParams":{"id":"42"}}"#;
        let view: ViewState = serde_json::from_str(body).unwrap();
        assert_eq!(view.instance_id, Some(instance("abc123")));
        assert_eq!(view.sequence, 7);
        assert_eq!(view.state_name, "contacts");
        assert_eq!(view.state_params.get("id"), Some(&json!("42")));
        assert!(view.request_uri.is_none());
    }

    #[test]
    fn test_header_value() {
        let id = ViewId::new(Some(instance("abc123")), 1);
        assert_eq!(id.header_value(), "abc123 1");

        let id = ViewId::new(None, 3);
        assert_eq!(id.header_value(), "- 3");
    }

    #[test]
    fn test_parse_header() {
        let id = ViewId::parse_header("abc123 2").unwrap();
        assert_eq!(id, ViewId::new(Some(instance("abc123")), 2));

        let id = ViewId::parse_header("  - 5 ").unwrap();
        assert_eq!(id, ViewId::new(None, 5));
    }

    #[test]
    fn test_parse_header_rejects_malformed() {
        assert!(ViewId::parse_header("").is_err());
        assert!(ViewId::parse_header("abc123").is_err());
        assert!(ViewId::parse_header("abc123 1 2").is_err());
        assert!(ViewId::parse_header("abc123 -1").is_err());
        assert!(ViewId::parse_header("abc123 x").is_err());
    }

    #[test]
    fn test_view_id_from_view_state() {
        let mut view = ViewState::new(Some(instance("w1")));
        view.sequence = 9;
        assert_eq!(view.view_id().header_value(), "w1 9");
    }
}
