//! facetnav: result shaping and faceted navigation for search APIs.
//!
//! A backend executes a search and hands back a [`SearchResult`] bundled with
//! the [`Request`] that produced it. [`SearchResponse::from_result`] turns that
//! bundle into a JSON document whose page, sort, and facet links are query
//! strings reproducing the original request with one dimension changed.
//!
//! ```
//! use facetnav::{BucketStat, Parameter, Request, SearchResponse, SearchResult};
//!
//! let request = Request::new().append(Parameter::single("q", "boots"));
//! let result = SearchResult::new(request)
//!     .with_hits(25, Vec::new())
//!     .with_pagination(10, 10)
//!     .with_aggregation("brand", vec![BucketStat::new("acme", 3)]);
//!
//! let response = SearchResponse::from_result(result);
//! let pages = response.pages.unwrap();
//! assert_eq!(pages.next.as_deref(), Some("q=boots&offset=20&size=10"));
//! assert_eq!(response.buckets["brand"][0].query, "q=boots&brand=acme");
//! ```

pub mod backend;
pub mod errors;
pub mod http;
pub mod params;
pub mod query;
pub mod readers;
pub mod response;

pub use backend::{Backend, Endpoint, MemoryBackend, SortSpec};
pub use errors::*;
pub use http::{HttpApi, Route, SearchHandler};
pub use params::{ParamValue, Parameter, ParameterKind, Request};
pub use query::{parse_query_string, to_query_string};
pub use readers::{InboundRequest, JsonBodyReader, ParamReader, QueryReader, ReaderChain};
pub use response::{
    Bucket, BucketStat, PageState, Pagination, SearchResponse, SearchResult, SortOption, SortOptionState, SortState,
};
