//! Records stored by the collector
//!
//! These are the read-side shapes returned by the collector's query
//! endpoints. The tracker only ever writes views; it never reads these back.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::view::{InstanceId, ViewId, ViewState};

/// One browser instance, created when the host page is served.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceRecord {
    pub id: InstanceId,
    /// URL of the page that created the instance.
    pub url: String,
    pub referrer_url: Option<String>,
    pub user_agent: Option<String>,
    /// Client address without the port.
    pub remote_addr: Option<String>,
    pub start: DateTime<Utc>,
}

/// A stored view report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewRecord {
    pub id: u64,
    #[serde(flatten)]
    pub view: ViewState,
    pub date: DateTime<Utc>,
}

/// An API call made by a client, correlated with the view it was issued in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallRecord {
    pub id: u64,
    /// The view named by the correlation header, if the request carried one.
    pub view: Option<ViewId>,
    pub method: String,
    /// Path and query of the request.
    pub request_uri: String,
    /// Matched route template, e.g. `/api/contacts/:id`.
    pub route: Option<String>,
    pub route_params: BTreeMap<String, String>,
    pub query_params: BTreeMap<String, Vec<String>>,
    pub date: DateTime<Utc>,
}

impl CallRecord {
    /// Whether this call was issued during the given view. `None` matches
    /// calls stamped with the placeholder instance.
    pub fn belongs_to(&self, instance: Option<&InstanceId>, sequence: u64) -> bool {
        self.view
            .as_ref()
            .is_some_and(|v| v.instance.as_ref() == instance && v.sequence == sequence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(view: Option<ViewId>) -> CallRecord {
        CallRecord {
            id: 1,
            view,
            method: "GET".to_string(),
            request_uri: "/api/contacts".to_string(),
            route: Some("/api/contacts".to_string()),
            route_params: BTreeMap::new(),
            query_params: BTreeMap::new(),
            date: Utc::now(),
        }
    }

    #[test]
    fn test_call_belongs_to_view() {
        let instance = InstanceId::new("abc").unwrap();
        let c = call(Some(ViewId::new(Some(instance.clone()), 2)));
        assert!(c.belongs_to(Some(&instance), 2));
        assert!(!c.belongs_to(Some(&instance), 1));
        assert!(!c.belongs_to(Some(&InstanceId::new("other").unwrap()), 2));
        assert!(!c.belongs_to(None, 2));
    }

    #[test]
    fn test_call_without_header_belongs_nowhere() {
        let instance = InstanceId::new("abc").unwrap();
        assert!(!call(None).belongs_to(Some(&instance), 0));
        assert!(!call(None).belongs_to(None, 0));
        assert!(!call(Some(ViewId::new(None, 1))).belongs_to(Some(&instance), 1));
        assert!(call(Some(ViewId::new(None, 1))).belongs_to(None, 1));
    }

    #[test]
    fn test_view_record_flattens_view_fields() {
        let record = ViewRecord {
            id: 3,
            view: ViewState::new(Some(InstanceId::new("abc").unwrap())),
            date: Utc::now(),
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["instanceID"], "abc");
        assert_eq!(value["sequence"], 0);
        assert_eq!(value["id"], 3);
    }
}
