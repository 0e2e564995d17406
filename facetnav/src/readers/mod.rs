//! Inbound parameter readers.
//!
//! A reader turns the wire view of an HTTP request into discrete
//! [`Parameter`]s, one per distinct key. Readers compose through
//! [`ReaderChain`], which concatenates their output in configured order.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::{errors::AdapterError, params::Parameter};

/// The parts of an HTTP request that readers may consume.
#[derive(Debug, Clone, Copy, Default)]
pub struct InboundRequest<'a> {
    /// Raw query string, without the leading `?`.
    pub query: Option<&'a str>,
    pub body: &'a [u8],
}

impl<'a> InboundRequest<'a> {
    pub fn new(query: Option<&'a str>, body: &'a [u8]) -> Self {
        Self { query, body }
    }
}

pub trait ParamReader: Send + Sync {
    fn read(&self, request: &InboundRequest<'_>) -> Result<Vec<Parameter>, AdapterError>;
}

/// Reads URL query parameters; keys keep their first-appearance order.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryReader;

impl ParamReader for QueryReader {
    fn read(&self, request: &InboundRequest<'_>) -> Result<Vec<Parameter>, AdapterError> {
        let Some(query) = request.query else {
            return Ok(Vec::new());
        };

        let mut grouped: Vec<(String, Vec<String>)> = Vec::new();
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            match grouped.iter_mut().find(|(name, _)| name.as_str() == key) {
                Some((_, values)) => values.push(value.into_owned()),
                None => grouped.push((key.into_owned(), vec![value.into_owned()])),
            }
        }

        grouped
            .into_iter()
            .map(|(name, values)| Parameter::discrete(name, values))
            .collect()
    }
}

/// Reads a JSON object body mapping each key to an array of strings.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonBodyReader;

impl ParamReader for JsonBodyReader {
    fn read(&self, request: &InboundRequest<'_>) -> Result<Vec<Parameter>, AdapterError> {
        let body: BTreeMap<String, Vec<String>> =
            serde_json::from_slice(request.body).map_err(|err| AdapterError::MalformedRequest {
                message: format!("invalid JSON body: {err}"),
            })?;

        body.into_iter()
            .map(|(name, values)| Parameter::discrete(name, values))
            .collect()
    }
}

/// Ordered composition of readers. Outputs are concatenated; parameters from
/// a later reader never replace those of an earlier one.
#[derive(Clone, Default)]
pub struct ReaderChain {
    readers: Vec<Arc<dyn ParamReader>>,
}

impl ReaderChain {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn with(mut self, reader: impl ParamReader + 'static) -> Self {
        self.readers.push(Arc::new(reader));
        self
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.readers.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.readers.is_empty()
    }
}

impl std::fmt::Debug for ReaderChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReaderChain").field("readers", &self.readers.len()).finish()
    }
}

impl ParamReader for ReaderChain {
    fn read(&self, request: &InboundRequest<'_>) -> Result<Vec<Parameter>, AdapterError> {
        let mut params = Vec::new();
        for reader in &self.readers {
            params.extend(reader.read(request)?);
        }
        Ok(params)
    }
}
