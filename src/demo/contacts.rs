//! Contacts API served by the example application

use axum::extract::{Path, Query};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use viewtrack_client::StateRegistry;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub id: u32,
    pub name: String,
    pub email: String,
}

fn contact(id: u32, name: &str, email: &str) -> Contact {
    Contact {
        id,
        name: name.to_string(),
        email: email.to_string(),
    }
}

/// The fixed address book.
pub fn all_contacts() -> Vec<Contact> {
    vec![
        contact(1, "Ada Lovelace", "ada@example.com"),
        contact(2, "Grace Hopper", "grace@example.com"),
        contact(3, "Alan Turing", "alan@example.com"),
    ]
}

/// Navigation states of the contacts page.
pub fn states() -> StateRegistry {
    StateRegistry::new()
        .with_state("contacts", "/contacts")
        .with_state("contacts.detail", "/{id}")
}

#[derive(Debug, Default, Deserialize)]
struct ContactQuery {
    /// Case-insensitive name filter.
    q: Option<String>,
}

pub fn router() -> Router {
    Router::new()
        .route("/api/contacts", get(query_contacts))
        .route("/api/contacts/:id", get(get_contact))
}

async fn query_contacts(Query(query): Query<ContactQuery>) -> Json<Vec<Contact>> {
    let needle = query.q.unwrap_or_default().to_lowercase();
    Json(
        all_contacts()
            .into_iter()
            .filter(|c| c.name.to_lowercase().contains(&needle))
            .collect(),
    )
}

async fn get_contact(Path(id): Path<u32>) -> Result<Json<Contact>, StatusCode> {
    all_contacts()
        .into_iter()
        .find(|c| c.id == id)
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}
