//! Call tracking middleware
//!
//! Wrap an API router with [`track_calls`] to record every request against
//! the view named in its `X-Track-View` header. A malformed header is
//! rejected with 400 before the handler runs; a missing one is recorded with
//! no view.

use std::collections::BTreeMap;

use axum::extract::{MatchedPath, RawPathParams, Request, State};
use axum::http::HeaderMap;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::Router;
use tracing::{trace, warn};
use viewtrack_core::{Error, Result, ViewId, VIEW_HEADER};

use crate::api::ApiError;
use crate::store::{CollectorStore, NewCall};

/// Record calls to every route of `router` in `store`.
///
/// Applied as a route layer so the matched route and its parameters are
/// known; requests that match no route are not recorded.
pub fn track_calls<S>(router: Router<S>, store: CollectorStore) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.route_layer(middleware::from_fn_with_state(store, track_call))
}

/// The correlation header of a request, if present.
pub fn view_from_headers(headers: &HeaderMap) -> Result<Option<ViewId>> {
    let Some(value) = headers.get(VIEW_HEADER) else {
        return Ok(None);
    };
    let text = value
        .to_str()
        .map_err(|_| Error::invalid_view_header(format!("{value:?}"), "not visible ASCII"))?;
    ViewId::parse_header(text).map(Some)
}

fn query_params(query: Option<&str>) -> BTreeMap<String, Vec<String>> {
    let mut params: BTreeMap<String, Vec<String>> = BTreeMap::new();
    if let Some(query) = query {
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            params
                .entry(key.into_owned())
                .or_default()
                .push(value.into_owned());
        }
    }
    params
}

async fn track_call(
    State(store): State<CollectorStore>,
    matched: Option<MatchedPath>,
    path_params: Option<RawPathParams>,
    request: Request,
    next: Next,
) -> Response {
    let view = match view_from_headers(request.headers()) {
        Ok(view) => view,
        Err(e) => {
            warn!("Rejecting {} {}: {}", request.method(), request.uri(), e);
            return ApiError::from(e).into_response();
        }
    };

    let uri = request.uri();
    let call = NewCall {
        view,
        method: request.method().to_string(),
        request_uri: uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| uri.path().to_string()),
        route: matched.map(|m| m.as_str().to_string()),
        route_params: path_params
            .map(|params| {
                params
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect()
            })
            .unwrap_or_default(),
        query_params: query_params(uri.query()),
    };
    let record = store.insert_call(call).await;
    trace!(
        "Call {} {} in view {:?}",
        record.method,
        record.request_uri,
        record.view
    );

    next.run(request).await
}
