//! Collector REST endpoints
//!
//! ```text
//! POST /instances                              -> ClientData
//! GET  /instances/:instance                    -> InstanceRecord
//! POST /instances/:instance/views              <- ViewState
//! GET  /instances/:instance/views              -> [ViewRecord]
//! GET  /instances/:instance/views/:seq/calls   -> [CallRecord]
//! ```
//!
//! `:instance` may be the placeholder `-` for views and calls from clients
//! that run without an identity.

use std::net::SocketAddr;

use axum::body::Bytes;
use axum::extract::{ConnectInfo, Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};
use viewtrack_core::{
    CallRecord, ClientData, Error, InstanceId, InstanceRecord, TrackerConfig, ViewRecord, ViewState,
    INSTANCE_PLACEHOLDER, MISSING_INSTANCE,
};

use crate::store::{CollectorStore, NewInstance};

/// Route that receives view reports. Its `:instance` segment doubles as the
/// client-side placeholder.
pub const CREATE_VIEW_ROUTE: &str = "/instances/:instance/views";

/// Error response: a status and a JSON `{"error": message}` body.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        let status = match err {
            Error::InvalidInstance { .. } | Error::InvalidViewHeader { .. } | Error::Json(_) => {
                StatusCode::BAD_REQUEST
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

/// The collector router. Mount it with `Router::nest` under any prefix and
/// hand [`client_config`] the same prefix.
pub fn router(store: CollectorStore) -> Router {
    Router::new()
        .route("/instances", post(create_instance))
        .route("/instances/:instance", get(get_instance))
        .route(CREATE_VIEW_ROUTE, post(create_view).get(list_views))
        .route("/instances/:instance/views/:seq/calls", get(list_calls))
        .with_state(store)
}

/// Tracker config pointing at the create-view route under `base`.
///
/// `base` is an absolute URL or a path prefix such as `/track`.
pub fn client_config(base: &str) -> TrackerConfig {
    debug_assert!(CREATE_VIEW_ROUTE.contains(INSTANCE_PLACEHOLDER));
    TrackerConfig::new(format!("{}{}", base.trim_end_matches('/'), CREATE_VIEW_ROUTE))
}

/// `-` is the placeholder for clients without an identity.
fn parse_instance(raw: &str) -> Result<Option<InstanceId>, ApiError> {
    if raw == MISSING_INSTANCE {
        return Ok(None);
    }
    InstanceId::new(raw).map(Some).map_err(ApiError::from)
}

#[derive(Debug, Default, Deserialize)]
struct CreateInstanceBody {
    #[serde(default)]
    url: String,
}

async fn create_instance(
    State(store): State<CollectorStore>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<ClientData>, ApiError> {
    let body: CreateInstanceBody = if body.is_empty() {
        CreateInstanceBody::default()
    } else {
        serde_json::from_slice(&body).map_err(Error::from)?
    };
    let header_text = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };

    let record = store
        .create_instance(NewInstance {
            url: body.url,
            referrer_url: header_text(header::REFERER),
            user_agent: header_text(header::USER_AGENT),
            remote_addr: connect_info.map(|ConnectInfo(addr)| addr.ip().to_string()),
        })
        .await;
    debug!("Created instance {}", record.id);
    Ok(Json(ClientData::new(record.id)))
}

async fn get_instance(
    State(store): State<CollectorStore>,
    Path(instance): Path<String>,
) -> Result<Json<InstanceRecord>, ApiError> {
    let not_found = || ApiError::not_found(format!("no instance {instance:?}"));
    let id = parse_instance(&instance)?.ok_or_else(not_found)?;
    store.instance(&id).await.map(Json).ok_or_else(not_found)
}

async fn create_view(
    State(store): State<CollectorStore>,
    Path(instance): Path<String>,
    body: Bytes,
) -> Result<(StatusCode, Json<ViewRecord>), ApiError> {
    let instance = parse_instance(&instance)?;
    let view: ViewState = serde_json::from_slice(&body).map_err(Error::from)?;

    if view.instance_id != instance {
        warn!(
            "View instance {:?} does not match route instance {:?}",
            view.instance_id, instance
        );
        return Err(ApiError::bad_request(
            "view instanceID does not match the instance in the URL",
        ));
    }

    let record = store.insert_view(view).await;
    debug!(
        "Stored view {} ({:?})",
        record.view.view_id(),
        record.view.state_name
    );
    Ok((StatusCode::CREATED, Json(record)))
}

async fn list_views(
    State(store): State<CollectorStore>,
    Path(instance): Path<String>,
) -> Result<Json<Vec<ViewRecord>>, ApiError> {
    let instance = parse_instance(&instance)?;
    Ok(Json(store.views(instance.as_ref()).await))
}

async fn list_calls(
    State(store): State<CollectorStore>,
    Path((instance, sequence)): Path<(String, u64)>,
) -> Result<Json<Vec<CallRecord>>, ApiError> {
    let instance = parse_instance(&instance)?;
    Ok(Json(store.calls(instance.as_ref(), sequence).await))
}
