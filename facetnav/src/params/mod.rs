//! # Request Parameters
//!
//! A [`Request`] is an insertion-ordered list of [`Parameter`]s describing one
//! search query. Each parameter is either *discrete* (one or more scalar values)
//! or a numeric *range* with independently optional bounds.
//!
//! Requests are plain values: cloning one yields a fully independent copy, and
//! [`Request::with_value`] derives a new request with a single override while
//! leaving the original untouched. Navigation links are built exclusively
//! through derivations so that no two links can observe each other's overrides.
//!
//! ```
//! use facetnav::params::{Parameter, Request};
//!
//! let base = Request::new()
//!     .append(Parameter::single("brand", "acme"))
//!     .append(Parameter::range("price", Some(10.0), None));
//!
//! let next = base.with_value("offset", 20u64);
//! assert!(base.get("offset").is_none());
//! assert_eq!(next.get("offset").unwrap().values()[0].to_string(), "20");
//! ```

use std::fmt;

use crate::errors::AdapterError;

/// Suffix marking the lower bound of a range parameter on the wire.
pub const RANGE_MIN_SUFFIX: &str = "min";
/// Suffix marking the upper bound of a range parameter on the wire.
pub const RANGE_MAX_SUFFIX: &str = "max";

/// Scalar value carried by a discrete parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl ParamValue {
    /// Numeric reading of the value, if it has one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParamValue::Int(v) => Some(*v as f64),
            ParamValue::Float(v) => Some(*v),
            ParamValue::Str(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
            ParamValue::Bool(_) => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Bool(v) => write!(f, "{v}"),
            ParamValue::Int(v) => write!(f, "{v}"),
            ParamValue::Float(v) => write!(f, "{v}"),
            ParamValue::Str(v) => f.write_str(v),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Str(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Str(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Int(value)
    }
}

impl From<u64> for ParamValue {
    fn from(value: u64) -> Self {
        i64::try_from(value)
            .map(ParamValue::Int)
            .unwrap_or_else(|_| ParamValue::Str(value.to_string()))
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        ParamValue::Float(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Bool(value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ParameterKind {
    /// Ordered values; never empty.
    Discrete(Vec<ParamValue>),
    /// Numeric bounds, either of which may be open.
    Range { min: Option<f64>, max: Option<f64> },
}

/// Named unit of query state.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    name: String,
    kind: ParameterKind,
}

impl Parameter {
    /// Create a discrete parameter. At least one value is required.
    pub fn discrete<V, I>(name: impl Into<String>, values: I) -> Result<Self, AdapterError>
    where
        V: Into<ParamValue>,
        I: IntoIterator<Item = V>,
    {
        let name = name.into();
        let values: Vec<ParamValue> = values.into_iter().map(Into::into).collect();
        if values.is_empty() {
            return Err(AdapterError::InvalidRequest {
                message: format!("parameter {name} requires at least one value"),
            });
        }
        Ok(Self {
            name,
            kind: ParameterKind::Discrete(values),
        })
    }

    /// Create a discrete parameter holding exactly one value.
    #[inline]
    pub fn single(name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        Self {
            name: name.into(),
            kind: ParameterKind::Discrete(vec![value.into()]),
        }
    }

    /// Create a range parameter. Both bounds may be absent.
    #[inline]
    pub fn range(name: impl Into<String>, min: Option<f64>, max: Option<f64>) -> Self {
        Self {
            name: name.into(),
            kind: ParameterKind::Range { min, max },
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn kind(&self) -> &ParameterKind {
        &self.kind
    }

    #[inline]
    pub fn is_range(&self) -> bool {
        matches!(self.kind, ParameterKind::Range { .. })
    }

    /// Discrete values in order; empty for range parameters.
    pub fn values(&self) -> &[ParamValue] {
        match &self.kind {
            ParameterKind::Discrete(values) => values,
            ParameterKind::Range { .. } => &[],
        }
    }

    pub fn min(&self) -> Option<f64> {
        match self.kind {
            ParameterKind::Range { min, .. } => min,
            ParameterKind::Discrete(_) => None,
        }
    }

    pub fn max(&self) -> Option<f64> {
        match self.kind {
            ParameterKind::Range { max, .. } => max,
            ParameterKind::Discrete(_) => None,
        }
    }
}

/// Insertion-ordered collection of parameters describing one search query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Request {
    params: Vec<Parameter>,
}

impl Request {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a request by appending every parameter in order.
    pub fn from_parameters(params: impl IntoIterator<Item = Parameter>) -> Self {
        params.into_iter().fold(Self::new(), Request::append)
    }

    /// First parameter registered under `name`.
    pub fn get(&self, name: &str) -> Option<&Parameter> {
        self.params.iter().find(|param| param.name == name)
    }

    /// All parameters in insertion order.
    #[inline]
    pub fn get_all(&self) -> &[Parameter] {
        &self.params
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.params.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Append a parameter. Existing parameters with the same name are kept.
    #[inline]
    pub fn append(mut self, param: Parameter) -> Self {
        self.params.push(param);
        self
    }

    /// Replace-or-insert `name` as a discrete single-value parameter.
    ///
    /// The first parameter with that name is replaced in place; any later
    /// duplicates are removed so the request carries exactly one entry.
    pub fn set(&mut self, name: &str, value: impl Into<ParamValue>) {
        let replacement = Parameter::single(name, value);
        match self.params.iter().position(|param| param.name == name) {
            Some(index) => {
                self.params[index] = replacement;
                let mut seen = 0usize;
                self.params.retain(|param| {
                    if param.name != name {
                        return true;
                    }
                    seen += 1;
                    seen == 1
                });
            }
            None => self.params.push(replacement),
        }
    }

    /// Derive a new request with `name` overridden; `self` is left untouched.
    #[must_use]
    pub fn with_value(&self, name: &str, value: impl Into<ParamValue>) -> Self {
        let mut derived = self.clone();
        derived.set(name, value);
        derived
    }

    /// Fold wire keys `<name>.min` / `<name>.max` into range parameters.
    ///
    /// A key folds only when it carries exactly one numeric value; everything
    /// else passes through unchanged. The folded range takes the position of
    /// the first bound seen for that name.
    #[must_use]
    pub fn fold_ranges(self) -> Self {
        let mut folded: Vec<Parameter> = Vec::with_capacity(self.params.len());

        for param in self.params {
            let Some((base, is_min, bound)) = range_bound(&param) else {
                folded.push(param);
                continue;
            };

            let existing = folded
                .iter_mut()
                .find(|candidate| candidate.is_range() && candidate.name == base);
            match existing {
                Some(Parameter {
                    kind: ParameterKind::Range { min, max },
                    ..
                }) => {
                    if is_min {
                        *min = Some(bound);
                    } else {
                        *max = Some(bound);
                    }
                }
                _ => {
                    let (min, max) = if is_min { (Some(bound), None) } else { (None, Some(bound)) };
                    folded.push(Parameter::range(base, min, max));
                }
            }
        }

        Self { params: folded }
    }
}

impl<'a> IntoIterator for &'a Request {
    type Item = &'a Parameter;
    type IntoIter = std::slice::Iter<'a, Parameter>;

    fn into_iter(self) -> Self::IntoIter {
        self.params.iter()
    }
}

fn range_bound(param: &Parameter) -> Option<(String, bool, f64)> {
    let (base, suffix) = param.name.rsplit_once('.')?;
    let is_min = match suffix {
        RANGE_MIN_SUFFIX => true,
        RANGE_MAX_SUFFIX => false,
        _ => return None,
    };
    if base.is_empty() {
        return None;
    }
    match param.values() {
        [value] => value.as_f64().map(|bound| (base.to_string(), is_min, bound)),
        _ => None,
    }
}
