//! Query-string encoding of a [`Request`].
//!
//! | Parameter                      | Encoded as                          |
//! |--------------------------------|-------------------------------------|
//! | discrete `color = [red, blue]` | `color=red&color=blue`              |
//! | range `price = [10, 99.5]`     | `price.min=10&price.max=99.5`       |
//! | range `price = [*, 50]`        | `price.max=50`                      |
//!
//! Entries follow the request's insertion order and are joined with `&`.
//! Values are written as-is; no percent-encoding is applied, so
//! [`parse_query_string`] reproduces the request only for values free of
//! `+`, `&`, `=` and `%` (the parser decodes `+` as a space).

use crate::params::{Parameter, Request};

pub use crate::params::{RANGE_MAX_SUFFIX, RANGE_MIN_SUFFIX};

/// Serialize a request into its canonical query string.
pub fn to_query_string(request: &Request) -> String {
    let mut parts = Vec::with_capacity(request.len());

    for param in request {
        push_entries(param, &mut parts);
    }

    parts.join("&")
}

fn push_entries(param: &Parameter, parts: &mut Vec<String>) {
    let name = param.name();
    if param.is_range() {
        if let Some(min) = param.min() {
            parts.push(format!("{name}.{RANGE_MIN_SUFFIX}={}", format_numeric(min)));
        }
        if let Some(max) = param.max() {
            parts.push(format!("{name}.{RANGE_MAX_SUFFIX}={}", format_numeric(max)));
        }
    } else {
        for value in param.values() {
            parts.push(format!("{name}={value}"));
        }
    }
}

/// Parse a query string back into a request.
///
/// Values are grouped per key in first-appearance order, then `.min` / `.max`
/// keys are folded into range parameters.
pub fn parse_query_string(query: &str) -> Request {
    let mut grouped: Vec<(String, Vec<String>)> = Vec::new();

    for (key, value) in url::form_urlencoded::parse(query.trim_start_matches('?').as_bytes()) {
        match grouped.iter_mut().find(|(name, _)| name.as_str() == key) {
            Some((_, values)) => values.push(value.into_owned()),
            None => grouped.push((key.into_owned(), vec![value.into_owned()])),
        }
    }

    let params = grouped
        .into_iter()
        .filter_map(|(name, values)| Parameter::discrete(name, values).ok());

    Request::from_parameters(params).fold_ranges()
}

/// Whole numbers print without decimals; fractional values keep their digits.
fn format_numeric(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ParamValue;

    #[test]
    fn discrete_values_keep_order() {
        let request = Request::new()
            .append(Parameter::discrete("color", ["red", "blue"]).unwrap())
            .append(Parameter::single("q", "boots"));
        assert_eq!(to_query_string(&request), "color=red&color=blue&q=boots");
    }

    #[test]
    fn range_with_only_min() {
        let request = Request::new().append(Parameter::range("price", Some(10.0), None));
        assert_eq!(to_query_string(&request), "price.min=10");
    }

    #[test]
    fn range_with_only_max() {
        let request = Request::new().append(Parameter::range("price", None, Some(250.0)));
        assert_eq!(to_query_string(&request), "price.max=250");
    }

    #[test]
    fn range_with_both_bounds_emits_min_first() {
        let request = Request::new().append(Parameter::range("price", Some(10.0), Some(99.5)));
        assert_eq!(to_query_string(&request), "price.min=10&price.max=99.5");
    }

    #[test]
    fn open_range_emits_nothing() {
        let request = Request::new()
            .append(Parameter::range("price", None, None))
            .append(Parameter::single("q", "x"));
        assert_eq!(to_query_string(&request), "q=x");
    }

    #[test]
    fn empty_request_is_empty_string() {
        assert_eq!(to_query_string(&Request::new()), "");
    }

    #[test]
    fn scalar_kinds_render_naturally() {
        let request = Request::new()
            .append(Parameter::single("offset", 20u64))
            .append(Parameter::single("ratio", 0.25))
            .append(Parameter::single("instock", true));
        assert_eq!(to_query_string(&request), "offset=20&ratio=0.25&instock=true");
    }

    #[test]
    fn parse_groups_values_per_key() {
        let request = parse_query_string("?color=red&q=boots&color=blue");
        let names: Vec<&str> = request.get_all().iter().map(Parameter::name).collect();
        assert_eq!(names, ["color", "q"]);
        assert_eq!(
            request.get("color").unwrap().values(),
            &[ParamValue::from("red"), ParamValue::from("blue")]
        );
    }

    #[test]
    fn parse_folds_range_bounds() {
        let request = parse_query_string("price.min=10&price.max=20.5");
        let price = request.get("price").unwrap();
        assert!(price.is_range());
        assert_eq!(price.min(), Some(10.0));
        assert_eq!(price.max(), Some(20.5));
    }

    #[test]
    fn discrete_request_survives_round_trip() {
        let request = Request::new()
            .append(Parameter::discrete("color", ["red", "blue", "red"]).unwrap())
            .append(Parameter::single("q", "trail boot"))
            .append(Parameter::discrete("brand", ["zenith", "acme"]).unwrap());

        let query = to_query_string(&request);
        assert_eq!(query, "color=red&color=blue&color=red&q=trail boot&brand=zenith&brand=acme");
        assert_eq!(parse_query_string(&query), request);
    }

    #[test]
    fn range_request_survives_round_trip() {
        let request = Request::new()
            .append(Parameter::single("q", "boots"))
            .append(Parameter::range("price", Some(10.0), Some(99.5)))
            .append(Parameter::range("weight", None, Some(3.0)))
            .append(Parameter::single("size", "10"));

        let query = to_query_string(&request);
        assert_eq!(query, "q=boots&price.min=10&price.max=99.5&weight.max=3&size=10");
        assert_eq!(parse_query_string(&query), request);
    }

    #[test]
    fn plus_in_values_is_read_back_as_space() {
        let request = Request::new().append(Parameter::single("q", "c++"));
        let back = parse_query_string(&to_query_string(&request));
        assert_eq!(back.get("q").unwrap().values(), &[ParamValue::from("c  ")]);
    }

    #[test]
    fn format_numeric_drops_trailing_zero_fraction() {
        assert_eq!(format_numeric(0.0), "0");
        assert_eq!(format_numeric(-15.0), "-15");
        assert_eq!(format_numeric(1.125), "1.125");
    }
}
