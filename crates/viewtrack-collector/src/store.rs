//! In-memory storage for instances, views and calls

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;
use viewtrack_core::{CallRecord, InstanceId, InstanceRecord, ViewId, ViewRecord, ViewState};

/// Request details captured when an instance is created.
#[derive(Debug, Clone, Default)]
pub struct NewInstance {
    pub url: String,
    pub referrer_url: Option<String>,
    pub user_agent: Option<String>,
    pub remote_addr: Option<String>,
}

/// A call as seen by the middleware, before the store assigns id and date.
#[derive(Debug, Clone, Default)]
pub struct NewCall {
    pub view: Option<ViewId>,
    pub method: String,
    pub request_uri: String,
    pub route: Option<String>,
    pub route_params: BTreeMap<String, String>,
    pub query_params: BTreeMap<String, Vec<String>>,
}

#[derive(Default)]
struct Tables {
    last_instance: u64,
    last_view: u64,
    last_call: u64,
    instances: HashMap<InstanceId, InstanceRecord>,
    views: Vec<ViewRecord>,
    calls: Vec<CallRecord>,
}

/// Shared collector storage. Clones share the same tables.
#[derive(Clone, Default)]
pub struct CollectorStore {
    tables: Arc<RwLock<Tables>>,
}

impl CollectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next sequential instance id.
    pub async fn create_instance(&self, new: NewInstance) -> InstanceRecord {
        let mut tables = self.tables.write().await;
        tables.last_instance += 1;
        let id = InstanceId::from(tables.last_instance);
        let record = InstanceRecord {
            id: id.clone(),
            url: new.url,
            referrer_url: new.referrer_url,
            user_agent: new.user_agent,
            remote_addr: new.remote_addr,
            start: Utc::now(),
        };
        tables.instances.insert(id, record.clone());
        record
    }

    pub async fn instance(&self, id: &InstanceId) -> Option<InstanceRecord> {
        self.tables.read().await.instances.get(id).cloned()
    }

    pub async fn insert_view(&self, view: ViewState) -> ViewRecord {
        let mut tables = self.tables.write().await;
        tables.last_view += 1;
        let record = ViewRecord {
            id: tables.last_view,
            view,
            date: Utc::now(),
        };
        tables.views.push(record.clone());
        record
    }

    /// Views of one instance ordered by sequence. Reports may arrive out of
    /// order; ties keep arrival order.
    pub async fn views(&self, instance: Option<&InstanceId>) -> Vec<ViewRecord> {
        let tables = self.tables.read().await;
        let mut views: Vec<_> = tables
            .views
            .iter()
            .filter(|r| r.view.instance_id.as_ref() == instance)
            .cloned()
            .collect();
        views.sort_by_key(|r| (r.view.sequence, r.id));
        views
    }

    pub async fn insert_call(&self, call: NewCall) -> CallRecord {
        let mut tables = self.tables.write().await;
        tables.last_call += 1;
        let record = CallRecord {
            id: tables.last_call,
            view: call.view,
            method: call.method,
            request_uri: call.request_uri,
            route: call.route,
            route_params: call.route_params,
            query_params: call.query_params,
            date: Utc::now(),
        };
        tables.calls.push(record.clone());
        record
    }

    /// Calls issued during one view, in arrival order.
    pub async fn calls(&self, instance: Option<&InstanceId>, sequence: u64) -> Vec<CallRecord> {
        self.tables
            .read()
            .await
            .calls
            .iter()
            .filter(|c| c.belongs_to(instance, sequence))
            .cloned()
            .collect()
    }

    pub async fn all_calls(&self) -> Vec<CallRecord> {
        self.tables.read().await.calls.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(instance: Option<&InstanceId>, sequence: u64) -> ViewState {
        let mut view = ViewState::new(instance.cloned());
        view.sequence = sequence;
        view
    }

    #[tokio::test]
    async fn test_instance_ids_are_sequential() {
        let store = CollectorStore::new();
        let first = store.create_instance(NewInstance::default()).await;
        let second = store.create_instance(NewInstance::default()).await;
        assert_eq!(first.id.as_str(), "1");
        assert_eq!(second.id.as_str(), "2");
        assert_eq!(store.instance(&second.id).await.unwrap(), second);
        assert!(store.instance(&InstanceId::from(3)).await.is_none());
    }

    #[tokio::test]
    async fn test_views_are_ordered_by_sequence() {
        let store = CollectorStore::new();
        let a = InstanceId::from(1);
        let b = InstanceId::from(2);
        store.insert_view(view(Some(&a), 2)).await;
        store.insert_view(view(Some(&b), 1)).await;
        store.insert_view(view(Some(&a), 1)).await;

        let views = store.views(Some(&a)).await;
        let sequences: Vec<_> = views.iter().map(|r| r.view.sequence).collect();
        assert_eq!(sequences, vec![1, 2]);
        assert!(store.views(None).await.is_empty());
    }

    #[tokio::test]
    async fn test_calls_filtered_by_view() {
        let store = CollectorStore::new();
        let a = InstanceId::from(1);
        for sequence in [1, 1, 2] {
            store
                .insert_call(NewCall {
                    view: Some(ViewId::new(Some(a.clone()), sequence)),
                    method: "GET".to_string(),
                    request_uri: "/api/contacts".to_string(),
                    ..Default::default()
                })
                .await;
        }
        store.insert_call(NewCall::default()).await;

        assert_eq!(store.calls(Some(&a), 1).await.len(), 2);
        assert_eq!(store.calls(Some(&a), 2).await.len(), 1);
        assert!(store.calls(Some(&a), 3).await.is_empty());
        assert_eq!(store.all_calls().await.len(), 4);
    }
}
