//! Client-side navigation and start-of-navigation notification
//!
//! The [`Navigator`] is the page's router. Observers are subscribed
//! explicitly and are told synchronously about every navigation before it is
//! applied. Dispatch is serialized: two concurrent navigations never
//! interleave their observer calls.

use std::sync::{Arc, Mutex, RwLock};

use viewtrack_core::prelude::*;
use viewtrack_core::StateParams;

/// A navigation about to be applied.
#[derive(Debug, Clone, PartialEq)]
pub struct NavigationEvent {
    pub state_name: String,
    pub params: StateParams,
}

impl NavigationEvent {
    pub fn new(state_name: impl Into<String>, params: StateParams) -> Self {
        Self {
            state_name: state_name.into(),
            params,
        }
    }
}

/// Receives start-of-navigation notifications.
///
/// Called while the navigator holds its dispatch lock; implementations must
/// not navigate from inside the callback.
pub trait NavigationObserver: Send + Sync {
    fn navigation_started(&self, event: &NavigationEvent);
}

/// Router for named navigation states.
#[derive(Default)]
pub struct Navigator {
    observers: RwLock<Vec<Arc<dyn NavigationObserver>>>,
    /// Last applied navigation; also the dispatch lock.
    current: Mutex<Option<NavigationEvent>>,
}

impl Navigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, observer: Arc<dyn NavigationObserver>) {
        self.observers
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(observer);
    }

    pub fn observer_count(&self) -> usize {
        self.observers
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    /// Navigate to `state_name`, notifying every observer first.
    pub fn navigate(&self, state_name: impl Into<String>, params: StateParams) {
        let event = NavigationEvent::new(state_name, params);
        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());

        let observers = self
            .observers
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        trace!(
            "Navigation to {:?} ({} observers)",
            event.state_name,
            observers.len()
        );
        for observer in &observers {
            observer.navigation_started(&event);
        }

        *current = Some(event);
    }

    /// The last navigation applied, if any.
    pub fn current(&self) -> Option<NavigationEvent> {
        self.current
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<String>>,
    }

    impl NavigationObserver for Recorder {
        fn navigation_started(&self, event: &NavigationEvent) {
            self.seen.lock().unwrap().push(event.state_name.clone());
        }
    }

    #[test]
    fn test_navigate_notifies_observers_in_order() {
        let navigator = Navigator::new();
        let recorder = Arc::new(Recorder::default());
        navigator.subscribe(recorder.clone());

        navigator.navigate("contacts", StateParams::new());
        navigator.navigate("contacts.detail", StateParams::new());

        assert_eq!(
            *recorder.seen.lock().unwrap(),
            vec!["contacts".to_string(), "contacts.detail".to_string()]
        );
    }

    #[test]
    fn test_navigate_without_observers_updates_current() {
        let navigator = Navigator::new();
        assert!(navigator.current().is_none());

        let mut params = StateParams::new();
        params.insert("id".to_string(), json!("42"));
        navigator.navigate("contacts.detail", params.clone());

        let current = navigator.current().unwrap();
        assert_eq!(current.state_name, "contacts.detail");
        assert_eq!(current.params, params);
    }

    #[test]
    fn test_every_observer_is_notified() {
        let navigator = Navigator::new();
        let a = Arc::new(Recorder::default());
        let b = Arc::new(Recorder::default());
        navigator.subscribe(a.clone());
        navigator.subscribe(b.clone());
        assert_eq!(navigator.observer_count(), 2);

        navigator.navigate("contacts", StateParams::new());
        assert_eq!(a.seen.lock().unwrap().len(), 1);
        assert_eq!(b.seen.lock().unwrap().len(), 1);
    }
}
