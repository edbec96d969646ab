//! Navigation state URL templates and request-URI derivation
//!
//! States are named with dots for nesting (`contacts.detail` is a child of
//! `contacts`). A state's full URL template is its ancestors' templates
//! followed by its own.
//!
//! Only parameters that appear in the template are reflected in the derived
//! URI. Extra query parameters present at navigation time are dropped; this
//! is a known limitation of the derived `requestURI`.

use std::collections::HashMap;
use std::sync::LazyLock;

use percent_encoding::utf8_percent_encode;
use regex::{Captures, Regex};
use viewtrack_core::{StateParams, PATH_SEGMENT};

/// Matches `{name}` and `:name` placeholders.
static PLACEHOLDER_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}|:([A-Za-z_][A-Za-z0-9_]*)")
        .expect("Invalid placeholder regex")
});

/// Registry of navigation states and their URL templates.
#[derive(Debug, Clone, Default)]
pub struct StateRegistry {
    urls: HashMap<String, String>,
}

impl StateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a state with its own (relative to parent) URL template.
    pub fn register(&mut self, name: impl Into<String>, url: impl Into<String>) -> &mut Self {
        self.urls.insert(name.into(), url.into());
        self
    }

    /// Builder form of [`register`](Self::register).
    pub fn with_state(mut self, name: impl Into<String>, url: impl Into<String>) -> Self {
        self.register(name, url);
        self
    }

    /// Full URL template of a state, or `None` if the state or any ancestor
    /// is unknown.
    pub fn url_template(&self, name: &str) -> Option<String> {
        if name.is_empty() {
            return None;
        }
        let mut template = String::new();
        let mut prefix_end = 0;
        for segment in name.split('.') {
            let end = prefix_end + segment.len();
            let ancestor = &name[..end];
            template.push_str(self.urls.get(ancestor)?);
            prefix_end = end + 1;
        }
        Some(template)
    }

    /// Derive the request URI for a navigation, filling template placeholders
    /// from `params`. Missing parameters render empty.
    pub fn request_uri(&self, name: &str, params: &StateParams) -> Option<String> {
        let template = self.url_template(name)?;
        let uri = PLACEHOLDER_REGEX.replace_all(&template, |caps: &Captures| {
            let key = caps
                .get(1)
                .or_else(|| caps.get(2))
                .map(|m| m.as_str())
                .unwrap_or_default();
            params
                .get(key)
                .map(|value| {
                    let text = match value {
                        serde_json::Value::String(s) => s.clone(),
                        serde_json::Value::Null => String::new(),
                        other => other.to_string(),
                    };
                    utf8_percent_encode(&text, PATH_SEGMENT).to_string()
                })
                .unwrap_or_default()
        });
        Some(uri.into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn registry() -> StateRegistry {
        StateRegistry::new()
            .with_state("contacts", "/contacts")
            .with_state("contacts.detail", "/{id}")
            .with_state("contacts.detail.note", "/notes/:note")
    }

    fn params(pairs: &[(&str, serde_json::Value)]) -> StateParams {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_url_template_concatenates_ancestors() {
        let reg = registry();
        assert_eq!(reg.url_template("contacts").unwrap(), "/contacts");
        assert_eq!(reg.url_template("contacts.detail").unwrap(), "/contacts/{id}");
        assert_eq!(
            reg.url_template("contacts.detail.note").unwrap(),
            "/contacts/{id}/notes/:note"
        );
    }

    #[test]
    fn test_unknown_state_has_no_uri() {
        let reg = registry();
        assert!(reg.url_template("settings").is_none());
        assert!(reg.url_template("").is_none());
        assert!(reg.request_uri("settings", &StateParams::new()).is_none());
    }

    #[test]
    fn test_missing_ancestor_has_no_template() {
        let reg = StateRegistry::new().with_state("a.b", "/b");
        assert!(reg.url_template("a.b").is_none());
    }

    #[test]
    fn test_request_uri_fills_params() {
        let reg = registry();
        let uri = reg.request_uri("contacts.detail", &params(&[("id", json!("42"))]));
        assert_eq!(uri.unwrap(), "/contacts/42");

        let uri = reg.request_uri(
            "contacts.detail.note",
            &params(&[("id", json!(7)), ("note", json!("n 1"))]),
        );
        assert_eq!(uri.unwrap(), "/contacts/7/notes/n%201");
    }

    #[test]
    fn test_request_uri_ignores_extra_params() {
        let reg = registry();
        let uri = reg.request_uri(
            "contacts.detail",
            &params(&[("id", json!("42")), ("tab", json!("history"))]),
        );
        assert_eq!(uri.unwrap(), "/contacts/42");
    }

    #[test]
    fn test_request_uri_missing_param_renders_empty() {
        let reg = registry();
        let uri = reg.request_uri("contacts.detail", &StateParams::new());
        assert_eq!(uri.unwrap(), "/contacts/");
    }
}
