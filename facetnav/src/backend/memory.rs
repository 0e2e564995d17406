use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::time::Instant;

use log::debug;
use serde_json::{Map, Value as JsonValue};

use super::Backend;
use crate::{
    errors::BackendError,
    params::{Parameter, Request},
    response::{BucketStat, OFFSET_PARAM, SIZE_PARAM, SearchResult, SortOptionState, SortState, bucket_text},
};

const DEFAULT_PAGE_SIZE: u64 = 25;
const MAX_PAGE_SIZE: u64 = 100;
const DEFAULT_SORT_PARAM: &str = "sort";

type Document = Map<String, JsonValue>;

/// A named sort option and the document field it orders by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub name: String,
    pub field: String,
    pub ascending: bool,
}

impl SortSpec {
    pub fn new(name: impl Into<String>, field: impl Into<String>, ascending: bool) -> Self {
        Self {
            name: name.into(),
            field: field.into(),
            ascending,
        }
    }
}

/// In-memory search backend over JSON documents.
///
/// Discrete parameters filter on configured facet fields, range parameters
/// filter any numeric field. Facet counts ignore the facet's own filter so
/// sibling values stay reachable.
#[derive(Debug, Clone)]
pub struct MemoryBackend {
    indices: BTreeMap<String, Vec<Document>>,
    facets: Vec<String>,
    sort_param: String,
    sort_options: Vec<SortSpec>,
    default_page_size: u64,
    max_page_size: u64,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            indices: BTreeMap::new(),
            facets: Vec::new(),
            sort_param: DEFAULT_SORT_PARAM.to_string(),
            sort_options: Vec::new(),
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: MAX_PAGE_SIZE,
        }
    }

    #[inline]
    pub fn with_index(mut self, name: impl Into<String>, documents: Vec<Document>) -> Self {
        self.indices.insert(name.into(), documents);
        self
    }

    #[inline]
    pub fn with_indices(mut self, indices: BTreeMap<String, Vec<Document>>) -> Self {
        self.indices.extend(indices);
        self
    }

    #[inline]
    pub fn with_facet(mut self, field: impl Into<String>) -> Self {
        self.facets.push(field.into());
        self
    }

    #[inline]
    pub fn with_sort_param(mut self, param: impl Into<String>) -> Self {
        self.sort_param = param.into();
        self
    }

    #[inline]
    pub fn with_sort(mut self, spec: SortSpec) -> Self {
        self.sort_options.push(spec);
        self
    }

    /// Default page size and the upper clamp applied to requested sizes.
    #[inline]
    pub fn with_page_sizes(mut self, default_size: u64, max_size: u64) -> Self {
        self.max_page_size = max_size.max(1);
        self.default_page_size = default_size.clamp(1, self.max_page_size);
        self
    }

    pub fn index_names(&self) -> impl Iterator<Item = &str> {
        self.indices.keys().map(String::as_str)
    }

    fn documents(&self, indices: &[String]) -> Result<Vec<&Document>, BackendError> {
        if indices.is_empty() {
            return Ok(self.indices.values().flatten().collect());
        }

        let mut documents = Vec::new();
        for index in indices {
            let docs = self
                .indices
                .get(index)
                .ok_or_else(|| BackendError::UnknownIndex { index: index.clone() })?;
            documents.extend(docs.iter());
        }
        Ok(documents)
    }

    fn is_filter(&self, param: &Parameter) -> bool {
        let name = param.name();
        if name == OFFSET_PARAM || name == SIZE_PARAM || name == self.sort_param {
            return false;
        }
        param.is_range() || self.facets.iter().any(|facet| facet == name)
    }

    fn selected_sort(&self, request: &Request) -> Result<Option<usize>, BackendError> {
        if self.sort_options.is_empty() {
            return Ok(None);
        }

        let Some(requested) = request
            .get(&self.sort_param)
            .and_then(|param| param.values().first())
        else {
            return Ok(Some(0));
        };

        let requested = requested.to_string();
        self.sort_options
            .iter()
            .position(|spec| spec.name == requested)
            .map(Some)
            .ok_or_else(|| BackendError::rejected(format!("unsupported sort option: {requested}")))
    }

    fn aggregate(&self, documents: &[&Document], filters: &[&Parameter]) -> BTreeMap<String, Vec<BucketStat>> {
        let mut aggregations = BTreeMap::new();

        for facet in &self.facets {
            let mut counts: BTreeMap<String, BucketStat> = BTreeMap::new();
            let others: Vec<&Parameter> = filters
                .iter()
                .copied()
                .filter(|param| param.name() != facet.as_str())
                .collect();

            for doc in documents.iter().filter(|doc| matches_all(doc, &others)) {
                let mut seen: Vec<String> = Vec::new();
                for value in field_values(doc, facet) {
                    let text = bucket_text(value);
                    if seen.contains(&text) {
                        continue;
                    }
                    counts
                        .entry(text.clone())
                        .or_insert_with(|| BucketStat::new(value.clone(), 0))
                        .hit_count += 1;
                    seen.push(text);
                }
            }

            let mut buckets: Vec<(String, BucketStat)> = counts.into_iter().collect();
            buckets.sort_by(|(a_text, a), (b_text, b)| {
                b.hit_count.cmp(&a.hit_count).then_with(|| a_text.cmp(b_text))
            });
            aggregations.insert(facet.clone(), buckets.into_iter().map(|(_, stat)| stat).collect());
        }

        aggregations
    }
}

impl Backend for MemoryBackend {
    async fn execute(&self, indices: &[String], request: Request) -> Result<SearchResult, BackendError> {
        let started = Instant::now();

        let documents = self.documents(indices)?;
        let offset = parse_count(&request, OFFSET_PARAM)?.unwrap_or(0);
        let size = parse_count(&request, SIZE_PARAM)?
            .unwrap_or(self.default_page_size)
            .clamp(1, self.max_page_size);
        let sort = self.selected_sort(&request)?;

        let filters: Vec<&Parameter> = request.get_all().iter().filter(|param| self.is_filter(param)).collect();
        let mut matching: Vec<&Document> = documents
            .iter()
            .copied()
            .filter(|doc| matches_all(doc, &filters))
            .collect();
        let aggregations = self.aggregate(&documents, &filters);

        debug!("memory backend matched {} of {} documents", matching.len(), documents.len());

        if let Some(spec) = sort.map(|index| &self.sort_options[index]) {
            matching.sort_by(|a, b| compare_field(a, b, &spec.field, spec.ascending));
        }

        let total = matching.len() as u64;
        let hits: Vec<Document> = matching
            .into_iter()
            .skip(usize::try_from(offset).unwrap_or(usize::MAX))
            .take(usize::try_from(size).unwrap_or(usize::MAX))
            .cloned()
            .collect();

        let sorting = sort.map(|selected| SortState {
            param: self.sort_param.clone(),
            options: self
                .sort_options
                .iter()
                .enumerate()
                .map(|(index, spec)| SortOptionState {
                    name: spec.name.clone(),
                    selected: index == selected,
                    ascending: spec.ascending,
                })
                .collect(),
        });

        let mut result = SearchResult::new(request)
            .with_hits(total, hits)
            .with_pagination(offset, size);
        result.aggregations = aggregations;
        result.sorting = sorting;
        Ok(result.with_duration(started.elapsed()))
    }
}

/// Parse a fixture of the form `{"<index>": [{...}, ...], ...}`.
pub fn load_indices(fixture: JsonValue) -> Result<BTreeMap<String, Vec<Document>>, BackendError> {
    let JsonValue::Object(indices) = fixture else {
        return Err(BackendError::rejected("fixture must be an object of index name to documents"));
    };

    let mut loaded = BTreeMap::new();
    for (index, documents) in indices {
        let JsonValue::Array(documents) = documents else {
            return Err(BackendError::rejected(format!("index {index} must be an array of documents")));
        };
        let documents = documents
            .into_iter()
            .map(|doc| match doc {
                JsonValue::Object(map) => Ok(map),
                other => Err(BackendError::rejected(format!(
                    "index {index} contains a non-object document: {other}"
                ))),
            })
            .collect::<Result<Vec<_>, _>>()?;
        loaded.insert(index, documents);
    }
    Ok(loaded)
}

fn parse_count(request: &Request, name: &str) -> Result<Option<u64>, BackendError> {
    let Some(value) = request.get(name).and_then(|param| param.values().first()) else {
        return Ok(None);
    };
    let text = value.to_string();
    text.trim()
        .parse::<u64>()
        .map(Some)
        .map_err(|_| BackendError::rejected(format!("invalid {name}: {text}")))
}

fn field_values<'a>(doc: &'a Document, field: &str) -> Vec<&'a JsonValue> {
    match doc.get(field) {
        Some(JsonValue::Array(items)) => items.iter().filter(|item| !item.is_null()).collect(),
        Some(JsonValue::Null) | None => Vec::new(),
        Some(value) => vec![value],
    }
}

fn matches_all(doc: &Document, filters: &[&Parameter]) -> bool {
    filters.iter().all(|param| matches(doc, param))
}

fn matches(doc: &Document, param: &Parameter) -> bool {
    let values = field_values(doc, param.name());

    if param.is_range() {
        return values.iter().filter_map(|value| value.as_f64()).any(|number| {
            param.min().is_none_or(|min| number >= min) && param.max().is_none_or(|max| number <= max)
        });
    }

    values.iter().any(|value| {
        let text = bucket_text(value);
        param.values().iter().any(|wanted| wanted.to_string() == text)
    })
}

fn compare_field(a: &Document, b: &Document, field: &str, ascending: bool) -> Ordering {
    let ordering = match (a.get(field), b.get(field)) {
        (Some(left), Some(right)) => match (left.as_f64(), right.as_f64()) {
            (Some(l), Some(r)) => l.partial_cmp(&r).unwrap_or(Ordering::Equal),
            _ => bucket_text(left).cmp(&bucket_text(right)),
        },
        // Documents missing the field sort last in both directions.
        (Some(_), None) => return Ordering::Less,
        (None, Some(_)) => return Ordering::Greater,
        (None, None) => Ordering::Equal,
    };

    if ascending { ordering } else { ordering.reverse() }
}
