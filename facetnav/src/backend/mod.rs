//! Search backend boundary.
//!
//! The adapter never executes queries itself. A [`Backend`] receives the
//! parsed [`Request`] plus the indices configured on the route and returns a
//! [`SearchResult`] that carries the request back for link derivation.

mod memory;

pub use memory::{MemoryBackend, SortSpec, load_indices};

use std::future::Future;
use std::sync::Arc;

use log::{debug, error};

use crate::{
    errors::{AdapterError, BackendError},
    params::Request,
    query::to_query_string,
    response::SearchResult,
};

/// Executes search requests against an engine.
pub trait Backend: Send + Sync + 'static {
    fn execute(
        &self,
        indices: &[String],
        request: Request,
    ) -> impl Future<Output = Result<SearchResult, BackendError>> + Send;
}

/// A backend bound to the indices of one route.
pub struct Endpoint<B> {
    backend: Arc<B>,
    indices: Vec<String>,
}

impl<B> Clone for Endpoint<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            indices: self.indices.clone(),
        }
    }
}

impl<B: Backend> Endpoint<B> {
    pub fn new(backend: Arc<B>, indices: Vec<String>) -> Self {
        Self { backend, indices }
    }

    #[inline]
    pub fn indices(&self) -> &[String] {
        &self.indices
    }

    pub async fn execute(&self, request: Request) -> Result<SearchResult, AdapterError> {
        debug!("searching {:?} with '{}'", self.indices, to_query_string(&request));

        match self.backend.execute(&self.indices, request).await {
            Ok(result) => {
                debug!(
                    "search matched {} hits in {}ms",
                    result.total_hit_count,
                    result.duration.as_millis()
                );
                Ok(result)
            }
            Err(err) => {
                error!("searching failed: {err}");
                Err(err.into())
            }
        }
    }
}
