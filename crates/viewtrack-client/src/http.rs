//! HTTP client with dispatch-time interceptors
//!
//! [`TrackedClient`] wraps a `reqwest::Client`. Requests are built lazily;
//! interceptors run in [`TrackedRequest::send`] right before the request is
//! executed, so they observe the state at dispatch, not at construction.

use std::sync::Arc;

use reqwest::header::{HeaderName, HeaderValue};
use reqwest::Method;
use serde::Serialize;
use url::Url;
use viewtrack_core::prelude::*;

use crate::interceptor::RequestInterceptor;

/// Builder for [`TrackedClient`].
#[derive(Default)]
pub struct TrackedClientBuilder {
    inner: Option<reqwest::Client>,
    base_url: Option<Url>,
    interceptors: Vec<Arc<dyn RequestInterceptor>>,
}

impl TrackedClientBuilder {
    /// Use an existing `reqwest::Client` (connection pool, timeouts).
    pub fn client(mut self, client: reqwest::Client) -> Self {
        self.inner = Some(client);
        self
    }

    /// Base URL for relative request paths.
    pub fn base_url(mut self, base_url: Option<Url>) -> Self {
        self.base_url = base_url;
        self
    }

    pub fn interceptor(mut self, interceptor: impl RequestInterceptor + 'static) -> Self {
        self.interceptors.push(Arc::new(interceptor));
        self
    }

    pub fn build(self) -> TrackedClient {
        TrackedClient {
            inner: self.inner.unwrap_or_default(),
            base_url: self.base_url,
            interceptors: self.interceptors.into(),
        }
    }
}

/// An HTTP client whose every request passes through the registered
/// interceptors. Cheap to clone.
#[derive(Clone)]
pub struct TrackedClient {
    inner: reqwest::Client,
    base_url: Option<Url>,
    interceptors: Arc<[Arc<dyn RequestInterceptor>]>,
}

impl TrackedClient {
    pub fn builder() -> TrackedClientBuilder {
        TrackedClientBuilder::default()
    }

    pub fn base_url(&self) -> Option<&Url> {
        self.base_url.as_ref()
    }

    /// Resolve `url` against the base URL when it is relative.
    pub fn resolve(&self, url: &str) -> Result<Url> {
        match Url::parse(url) {
            Ok(url) => Ok(url),
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                let base = self.base_url.as_ref().ok_or_else(|| {
                    Error::transport(format!("relative URL {url:?} without a base URL"))
                })?;
                base.join(url)
                    .map_err(|e| Error::transport(format!("invalid URL {url:?}: {e}")))
            }
            Err(e) => Err(Error::transport(format!("invalid URL {url:?}: {e}"))),
        }
    }

    pub fn get(&self, url: &str) -> TrackedRequest {
        self.request(Method::GET, url)
    }

    pub fn post(&self, url: &str) -> TrackedRequest {
        self.request(Method::POST, url)
    }

    pub fn request(&self, method: Method, url: &str) -> TrackedRequest {
        let builder = self
            .resolve(url)
            .map(|url| self.inner.request(method, url));
        TrackedRequest {
            client: self.clone(),
            builder,
        }
    }

    fn stamp(&self, request: &mut reqwest::Request) {
        for interceptor in self.interceptors.iter() {
            interceptor.intercept(request);
        }
    }
}

/// A request under construction. Nothing is stamped until it is sent.
pub struct TrackedRequest {
    client: TrackedClient,
    builder: Result<reqwest::RequestBuilder>,
}

impl TrackedRequest {
    fn map(self, f: impl FnOnce(reqwest::RequestBuilder) -> reqwest::RequestBuilder) -> Self {
        Self {
            client: self.client,
            builder: self.builder.map(f),
        }
    }

    pub fn header(self, name: HeaderName, value: HeaderValue) -> Self {
        self.map(|b| b.header(name, value))
    }

    pub fn json<T: Serialize + ?Sized>(self, body: &T) -> Self {
        self.map(|b| b.json(body))
    }

    pub fn query<T: Serialize + ?Sized>(self, query: &T) -> Self {
        self.map(|b| b.query(query))
    }

    /// Build the request and run the interceptors, exactly as `send` does
    /// before handing it to the transport.
    pub fn prepare(self) -> Result<reqwest::Request> {
        let mut request = self
            .builder?
            .build()
            .map_err(|e| Error::transport(e.to_string()))?;
        self.client.stamp(&mut request);
        Ok(request)
    }

    pub async fn send(self) -> Result<reqwest::Response> {
        let client = self.client.clone();
        let request = self.prepare()?;
        trace!("{} {}", request.method(), request.url());
        client
            .inner
            .execute(request)
            .await
            .map_err(|e| Error::transport(e.to_string()))
    }
}
