//! # Result Shaping
//!
//! Turns a backend [`SearchResult`] into the navigable [`SearchResponse`]
//! document. Every link in the response (page, sort option, facet bucket) is
//! the query string of the *originating* request with exactly one dimension
//! overridden:
//!
//! | Link            | Override                                       |
//! |-----------------|------------------------------------------------|
//! | `pages.previous`| `offset = offset - page_size`, `size = page_size` |
//! | `pages.next`    | `offset = offset + page_size`, `size = page_size` |
//! | `sort_options`  | `<sort param> = <option name>`                 |
//! | `buckets`       | `<facet> = <bucket value>`                     |
//!
//! Each link is derived from its own copy of the request, so links never
//! observe each other's overrides regardless of iteration order.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

#[cfg(feature = "utoipa")]
use utoipa::ToSchema;

use crate::{errors::AdapterError, params::Request, query::to_query_string};

/// Parameter carrying the pagination offset in navigation links.
pub const OFFSET_PARAM: &str = "offset";
/// Parameter carrying the page size in navigation links.
pub const SIZE_PARAM: &str = "size";

/// A single aggregation bucket as reported by the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct BucketStat {
    pub value: JsonValue,
    pub hit_count: u64,
}

impl BucketStat {
    pub fn new(value: impl Into<JsonValue>, hit_count: u64) -> Self {
        Self {
            value: value.into(),
            hit_count,
        }
    }
}

/// Slice of results that was fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageState {
    pub offset: u64,
    pub page_size: u64,
}

/// A sort option as declared by the search pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortOptionState {
    pub name: String,
    pub selected: bool,
    pub ascending: bool,
}

/// Sort state: the request parameter that selects a sort, plus its options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortState {
    pub param: String,
    pub options: Vec<SortOptionState>,
}

/// Completed search, bundled with the request that produced it.
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub duration: Duration,
    pub total_hit_count: u64,
    pub hits: Vec<Map<String, JsonValue>>,
    pub aggregations: BTreeMap<String, Vec<BucketStat>>,
    pub pagination: Option<PageState>,
    pub sorting: Option<SortState>,
    request: Request,
}

impl SearchResult {
    pub fn new(request: Request) -> Self {
        Self {
            duration: Duration::ZERO,
            total_hit_count: 0,
            hits: Vec::new(),
            aggregations: BTreeMap::new(),
            pagination: None,
            sorting: None,
            request,
        }
    }

    /// The request this result was produced for.
    #[inline]
    pub fn request(&self) -> &Request {
        &self.request
    }

    #[inline]
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    #[inline]
    pub fn with_hits(mut self, total_hit_count: u64, hits: Vec<Map<String, JsonValue>>) -> Self {
        self.total_hit_count = total_hit_count;
        self.hits = hits;
        self
    }

    /// Record the buckets of one facet. An empty list still registers the facet.
    #[inline]
    pub fn with_aggregation(mut self, facet: impl Into<String>, buckets: Vec<BucketStat>) -> Self {
        self.aggregations.insert(facet.into(), buckets);
        self
    }

    #[inline]
    pub fn with_pagination(mut self, offset: u64, page_size: u64) -> Self {
        self.pagination = Some(PageState { offset, page_size });
        self
    }

    #[inline]
    pub fn with_sorting(mut self, sorting: SortState) -> Self {
        self.sorting = Some(sorting);
        self
    }
}

#[cfg_attr(feature = "utoipa", derive(ToSchema))]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bucket {
    #[cfg_attr(feature = "utoipa", schema(value_type = Object))]
    pub value: JsonValue,
    pub count: u64,
    pub query: String,
}

#[cfg_attr(feature = "utoipa", derive(ToSchema))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub count: u64,
    pub current: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
}

#[cfg_attr(feature = "utoipa", derive(ToSchema))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortOption {
    pub name: String,
    pub selected: bool,
    #[serde(rename = "asc")]
    pub ascending: bool,
    pub query: String,
}

/// Response document returned to API clients.
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(rename = "duration_in_ms")]
    pub duration_ms: u64,
    pub total_hit_count: u64,
    #[cfg_attr(feature = "utoipa", schema(value_type = Vec<Object>))]
    pub hits: Vec<Map<String, JsonValue>>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub buckets: BTreeMap<String, Vec<Bucket>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pages: Option<Pagination>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_options: Option<Vec<SortOption>>,
}

impl SearchResponse {
    /// Shape a completed search into the response document.
    pub fn from_result(result: SearchResult) -> Self {
        let buckets = derive_buckets(&result);
        let pages = derive_pagination(&result);
        let sort_options = derive_sort_options(&result);

        Self {
            duration_ms: u64::try_from(result.duration.as_millis()).unwrap_or(u64::MAX),
            total_hit_count: result.total_hit_count,
            hits: result.hits,
            buckets,
            pages,
            sort_options,
        }
    }

    pub fn to_json(&self) -> Result<Vec<u8>, AdapterError> {
        Ok(serde_json::to_vec(self)?)
    }
}

impl From<SearchResult> for SearchResponse {
    fn from(value: SearchResult) -> Self {
        Self::from_result(value)
    }
}

/// Page count, current page, and previous/next links.
///
/// Absent when the search was not paginated or used a zero page size.
pub fn derive_pagination(result: &SearchResult) -> Option<Pagination> {
    let page = result.pagination.filter(|page| page.page_size > 0)?;

    let count = result.total_hit_count.div_ceil(page.page_size).max(1);
    let current = if page.offset < page.page_size {
        1
    } else {
        page.offset / page.page_size + 1
    };

    let request = result.request();
    let link = |offset: u64| {
        let derived = request
            .with_value(OFFSET_PARAM, offset)
            .with_value(SIZE_PARAM, page.page_size);
        to_query_string(&derived)
    };

    Some(Pagination {
        count,
        current,
        // current > 1 implies offset >= page_size
        previous: (current > 1).then(|| link(page.offset - page.page_size)),
        next: (current < count).then(|| link(page.offset.saturating_add(page.page_size))),
    })
}

/// One entry per declared sort option, in declaration order.
pub fn derive_sort_options(result: &SearchResult) -> Option<Vec<SortOption>> {
    let sorting = result.sorting.as_ref()?;
    let request = result.request();

    let options = sorting
        .options
        .iter()
        .map(|option| SortOption {
            name: option.name.clone(),
            selected: option.selected,
            ascending: option.ascending,
            query: to_query_string(&request.with_value(&sorting.param, option.name.as_str())),
        })
        .collect();

    Some(options)
}

/// Buckets for every aggregated facet; facets without buckets map to `[]`.
pub fn derive_buckets(result: &SearchResult) -> BTreeMap<String, Vec<Bucket>> {
    let request = result.request();

    result
        .aggregations
        .iter()
        .map(|(facet, stats)| {
            let buckets = stats
                .iter()
                .map(|stat| Bucket {
                    value: stat.value.clone(),
                    count: stat.hit_count,
                    query: to_query_string(&request.with_value(facet, bucket_text(&stat.value))),
                })
                .collect();
            (facet.clone(), buckets)
        })
        .collect()
}

/// Textual form of an aggregation value used as a filter value in links.
pub fn bucket_text(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        JsonValue::Null => String::new(),
        JsonValue::Bool(b) => b.to_string(),
        JsonValue::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::Parameter;
    use serde_json::json;

    fn base_request() -> Request {
        Request::new().append(Parameter::single("q", "boots"))
    }

    fn paged(total: u64, offset: u64, page_size: u64) -> SearchResult {
        SearchResult::new(base_request())
            .with_hits(total, Vec::new())
            .with_pagination(offset, page_size)
    }

    #[test]
    fn pagination_absent_without_descriptor() {
        let result = SearchResult::new(base_request()).with_hits(10, Vec::new());
        assert!(derive_pagination(&result).is_none());
    }

    #[test]
    fn pagination_absent_for_zero_page_size() {
        assert!(derive_pagination(&paged(10, 0, 0)).is_none());
    }

    #[test]
    fn page_count_is_at_least_one() {
        let pages = derive_pagination(&paged(5, 0, 10)).unwrap();
        assert_eq!(pages.count, 1);
        assert_eq!(pages.current, 1);
        assert!(pages.previous.is_none());
        assert!(pages.next.is_none());

        let empty = derive_pagination(&paged(0, 0, 10)).unwrap();
        assert_eq!(empty.count, 1);
    }

    #[test]
    fn middle_page_links_both_ways() {
        let pages = derive_pagination(&paged(25, 10, 10)).unwrap();
        assert_eq!(pages.current, 2);
        assert_eq!(pages.count, 3);
        assert_eq!(pages.previous.as_deref(), Some("q=boots&offset=0&size=10"));
        assert_eq!(pages.next.as_deref(), Some("q=boots&offset=20&size=10"));
    }

    #[test]
    fn last_page_has_no_next() {
        let pages = derive_pagination(&paged(30, 20, 10)).unwrap();
        assert_eq!(pages.current, pages.count);
        assert!(pages.next.is_none());
        assert_eq!(pages.previous.as_deref(), Some("q=boots&offset=10&size=10"));
    }

    #[test]
    fn mid_page_offset_uses_integer_division() {
        let pages = derive_pagination(&paged(100, 15, 10)).unwrap();
        assert_eq!(pages.current, 2);
        assert_eq!(pages.previous.as_deref(), Some("q=boots&offset=5&size=10"));
        assert_eq!(pages.next.as_deref(), Some("q=boots&offset=25&size=10"));
    }

    #[test]
    fn pagination_overrides_existing_offset_and_size() {
        let request = Request::new()
            .append(Parameter::single("offset", 10u64))
            .append(Parameter::single("size", 10u64))
            .append(Parameter::single("q", "boots"));
        let result = SearchResult::new(request).with_hits(25, Vec::new()).with_pagination(10, 10);
        let pages = derive_pagination(&result).unwrap();
        assert_eq!(pages.previous.as_deref(), Some("offset=0&size=10&q=boots"));
        assert_eq!(pages.next.as_deref(), Some("offset=20&size=10&q=boots"));
        assert_eq!(to_query_string(result.request()), "offset=10&size=10&q=boots");
    }

    #[test]
    fn sort_options_echo_flags_and_override_sort_param() {
        let request = base_request().append(Parameter::single("sort", "price"));
        let result = SearchResult::new(request).with_sorting(SortState {
            param: "sort".to_string(),
            options: vec![
                SortOptionState {
                    name: "price".to_string(),
                    selected: true,
                    ascending: false,
                },
                SortOptionState {
                    name: "date".to_string(),
                    selected: false,
                    ascending: true,
                },
            ],
        });

        let options = derive_sort_options(&result).unwrap();
        assert_eq!(options.len(), 2);
        assert_eq!(options[0].name, "price");
        assert!(options[0].selected);
        assert!(!options[0].ascending);
        assert_eq!(options[0].query, "q=boots&sort=price");
        assert!(!options[1].selected);
        assert!(options[1].ascending);
        assert_eq!(options[1].query, "q=boots&sort=date");
    }

    #[test]
    fn sort_options_absent_without_descriptor() {
        assert!(derive_sort_options(&SearchResult::new(base_request())).is_none());
    }

    #[test]
    fn bucket_links_do_not_interfere() {
        let result = SearchResult::new(base_request())
            .with_aggregation("brand", vec![BucketStat::new("A", 3), BucketStat::new("B", 7)])
            .with_aggregation("color", vec![BucketStat::new("red", 1)]);

        let buckets = derive_buckets(&result);
        let brand = &buckets["brand"];
        assert_eq!(brand[0].query, "q=boots&brand=A");
        assert_eq!(brand[1].query, "q=boots&brand=B");
        assert_eq!(brand[1].count, 7);
        assert!(!buckets["color"][0].query.contains("brand="));
    }

    #[test]
    fn empty_facet_keeps_its_key() {
        let result = SearchResult::new(base_request()).with_aggregation("brand", Vec::new());
        let buckets = derive_buckets(&result);
        assert!(buckets.contains_key("brand"));
        assert!(buckets["brand"].is_empty());
    }

    #[test]
    fn bucket_text_handles_every_json_kind() {
        assert_eq!(bucket_text(&json!("acme")), "acme");
        assert_eq!(bucket_text(&json!(42)), "42");
        assert_eq!(bucket_text(&json!(1.5)), "1.5");
        assert_eq!(bucket_text(&json!(false)), "false");
        assert_eq!(bucket_text(&JsonValue::Null), "");
        assert_eq!(bucket_text(&json!([1, 2])), "[1,2]");
    }

    #[test]
    fn response_omits_absent_sections() {
        let response = SearchResponse::from_result(SearchResult::new(base_request()));
        let json = serde_json::to_value(&response).unwrap();
        let object = json.as_object().unwrap();
        assert!(!object.contains_key("pages"));
        assert!(!object.contains_key("sort_options"));
        assert!(!object.contains_key("buckets"));
        assert_eq!(object["hits"], json!([]));
    }

    #[test]
    fn response_projects_result_fields() {
        let hit = json!({"id": "p1", "name": "Trail boot"}).as_object().unwrap().clone();
        let result = SearchResult::new(base_request())
            .with_duration(Duration::from_micros(12_900))
            .with_hits(1, vec![hit.clone()])
            .with_aggregation("brand", Vec::new())
            .with_pagination(0, 10);

        let json = serde_json::to_value(SearchResponse::from(result)).unwrap();
        assert_eq!(json["duration_in_ms"], 12);
        assert_eq!(json["total_hit_count"], 1);
        assert_eq!(json["hits"][0], JsonValue::Object(hit));
        assert_eq!(json["buckets"]["brand"], json!([]));
        assert_eq!(json["pages"], json!({"count": 1, "current": 1}));
    }
}
