//! HTTP surface: one search route per configured pattern.
//!
//! ```ignore
//! let api = HttpApi::new(backend)
//!     .route(Route::new("/products").with_index("products"))
//!     .route(Route::new("/products/search").with_index("products").with_reader(JsonBodyReader));
//! let router = api.into_router()?;
//! axum::serve(listener, router).await?;
//! ```
//!
//! | Outcome                              | Status |
//! |--------------------------------------|--------|
//! | response document produced           | 200    |
//! | parameters unreadable / search failed | 400    |
//! | response could not be serialized     | 500    |

use std::collections::HashSet;
use std::sync::Arc;

use axum::{
    Router,
    body::to_bytes,
    extract::Request as HttpRequest,
    http::header,
    response::{IntoResponse, Response},
    routing::any,
};
use log::{debug, error, info};

use crate::{
    backend::{Backend, Endpoint},
    errors::AdapterError,
    params::Request,
    readers::{InboundRequest, ParamReader, QueryReader, ReaderChain},
    response::SearchResponse,
};

/// Largest request body the readers will see.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Route configuration. Without explicit readers the route reads the URL query.
#[derive(Debug, Clone)]
pub struct Route {
    pattern: String,
    indices: Vec<String>,
    readers: ReaderChain,
}

impl Route {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            indices: Vec::new(),
            readers: ReaderChain::new(),
        }
    }

    #[inline]
    pub fn with_index(mut self, index: impl Into<String>) -> Self {
        self.indices.push(index.into());
        self
    }

    #[inline]
    pub fn with_indices<S: Into<String>>(mut self, indices: impl IntoIterator<Item = S>) -> Self {
        self.indices.extend(indices.into_iter().map(Into::into));
        self
    }

    /// Append a reader; readers run in the order they were added.
    #[inline]
    pub fn with_reader(mut self, reader: impl ParamReader + 'static) -> Self {
        self.readers = self.readers.with(reader);
        self
    }

    #[inline]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    #[inline]
    pub fn indices(&self) -> &[String] {
        &self.indices
    }

    /// Check the pattern against the router's capture syntax and return its
    /// shape (capture names erased) for conflict detection.
    fn validate(&self) -> Result<String, AdapterError> {
        let invalid = |message: String| AdapterError::InvalidRoute {
            pattern: self.pattern.clone(),
            message,
        };

        let Some(path) = self.pattern.strip_prefix('/') else {
            return Err(invalid("pattern must start with '/'".to_string()));
        };

        let segments: Vec<&str> = path.split('/').collect();
        let mut captures: Vec<&str> = Vec::new();
        let mut shape = String::new();

        for (index, segment) in segments.iter().enumerate() {
            shape.push('/');
            if segment.starts_with(':') || segment.starts_with('*') {
                return Err(invalid("captures must use the {name} form".to_string()));
            }
            if !segment.contains(['{', '}']) {
                shape.push_str(segment);
                continue;
            }

            let Some(inner) = segment.strip_prefix('{').and_then(|rest| rest.strip_suffix('}')) else {
                return Err(invalid(format!("segment '{segment}' must be a whole {{name}} capture")));
            };
            let (name, wildcard) = match inner.strip_prefix('*') {
                Some(name) => (name, true),
                None => (inner, false),
            };
            if name.is_empty() || name.contains(['{', '}', '*']) {
                return Err(invalid(format!("segment '{segment}' has an invalid capture name")));
            }
            if wildcard && index + 1 != segments.len() {
                return Err(invalid("wildcard capture must be the last segment".to_string()));
            }
            if captures.contains(&name) {
                return Err(invalid(format!("capture '{name}' used twice")));
            }
            captures.push(name);
            shape.push_str(if wildcard { "{*}" } else { "{}" });
        }

        Ok(shape)
    }

    fn into_readers(self) -> ReaderChain {
        if self.readers.is_empty() {
            ReaderChain::new().with(QueryReader)
        } else {
            self.readers
        }
    }
}

/// A search backend exposed over HTTP.
pub struct HttpApi<B> {
    backend: Arc<B>,
    routes: Vec<Route>,
}

impl<B: Backend> HttpApi<B> {
    pub fn new(backend: B) -> Self {
        Self::from_shared(Arc::new(backend))
    }

    pub fn from_shared(backend: Arc<B>) -> Self {
        Self {
            backend,
            routes: Vec::new(),
        }
    }

    #[inline]
    pub fn route(mut self, route: Route) -> Self {
        self.routes.push(route);
        self
    }

    #[inline]
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Build the router. Fails on malformed or duplicate patterns.
    pub fn into_router(self) -> Result<Router, AdapterError> {
        let mut router = Router::new();
        let mut shapes = HashSet::new();

        for route in self.routes {
            if !shapes.insert(route.validate()?) {
                return Err(AdapterError::InvalidRoute {
                    pattern: route.pattern,
                    message: "pattern registered twice".to_string(),
                });
            }

            let pattern = route.pattern.clone();
            let endpoint = Endpoint::new(Arc::clone(&self.backend), route.indices.clone());
            let handler = SearchHandler::new(endpoint, route.into_readers());

            info!("registering search route {pattern}");
            router = router.route(
                &pattern,
                any(move |request: HttpRequest| {
                    let handler = handler.clone();
                    async move { handler.handle(request).await }
                }),
            );
        }

        Ok(router)
    }
}

/// Request → parameters → search → response document.
pub struct SearchHandler<B> {
    endpoint: Endpoint<B>,
    readers: ReaderChain,
}

impl<B> Clone for SearchHandler<B> {
    fn clone(&self) -> Self {
        Self {
            endpoint: self.endpoint.clone(),
            readers: self.readers.clone(),
        }
    }
}

impl<B: Backend> SearchHandler<B> {
    pub fn new(endpoint: Endpoint<B>, readers: ReaderChain) -> Self {
        Self { endpoint, readers }
    }

    pub async fn handle(&self, request: HttpRequest) -> Response {
        debug!("{} {}", request.method(), request.uri());

        match self.respond(request).await {
            Ok(body) => ([(header::CONTENT_TYPE, "application/json")], body).into_response(),
            Err(err) => err.status_code().into_response(),
        }
    }

    async fn respond(&self, request: HttpRequest) -> Result<Vec<u8>, AdapterError> {
        let (parts, body) = request.into_parts();
        let body = to_bytes(body, MAX_BODY_BYTES).await.map_err(|err| {
            error!("request failed: {err}");
            AdapterError::MalformedRequest {
                message: format!("unreadable body: {err}"),
            }
        })?;

        let inbound = InboundRequest::new(parts.uri.query(), &body);
        let params = self
            .readers
            .read(&inbound)
            .inspect_err(|err| error!("request failed: {err}"))?;
        let request = Request::from_parameters(params).fold_ranges();

        let result = self.endpoint.execute(request).await?;

        SearchResponse::from_result(result)
            .to_json()
            .inspect_err(|err| error!("generating response failed: {err}"))
    }
}
