//! Per-request derived state handed to handlers.

use std::collections::HashMap;

use hyper::Method;
use serde_json::{Map, Value};

use crate::error::ApiError;
use crate::matcher::UrlMatch;

/// Everything a handler sees about one request: matched path parameters,
/// query parameters, and the parsed JSON body. Built once per request from
/// the resolved match and passed to the handler by value; nothing on the
/// underlying request is mutated.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub method: Method,
    pub raw_url: String,
    pub params: HashMap<String, String>,
    /// A key that appeared without `=` maps to `None`.
    pub query: HashMap<String, Option<String>>,
    /// Parsed JSON body for POST/PUT/PATCH (malformed input degrades to an
    /// empty object), `Null` for other methods.
    pub body: Value,
}

impl RequestContext {
    pub fn new(method: Method, raw_url: String, matched: UrlMatch, body: Value) -> Self {
        let query = matched
            .query
            .as_deref()
            .map(parse_query)
            .unwrap_or_default();
        Self {
            method,
            raw_url,
            params: matched.params,
            query,
            body,
        }
    }

    /// Path parameter by name. Declared parameters are always captured on a
    /// matched route, so a miss is a routing bug.
    pub fn param(&self, name: &str) -> Result<&str, ApiError> {
        self.params
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| ApiError::Internal(format!("missing path parameter: {name}")))
    }

    /// Query parameter value, when the key is present with a value.
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query.get(key).and_then(|value| value.as_deref())
    }

    /// Body object field, when the body parsed to an object.
    pub fn body_field(&self, key: &str) -> Option<&Value> {
        self.body.as_object().and_then(|body| body.get(key))
    }
}

/// Split a raw query string on `&`, then each pair on the first `=`. Keys and
/// values are taken verbatim: no percent-decoding, no multi-value or array
/// syntax.
fn parse_query(raw: &str) -> HashMap<String, Option<String>> {
    raw.split('&')
        .map(|pair| match pair.split_once('=') {
            Some((key, value)) => (key.to_string(), Some(value.to_string())),
            None => (pair.to_string(), None),
        })
        .collect()
}

/// Parse a buffered request body. Malformed or empty input degrades to an
/// empty JSON object instead of failing the request.
pub(crate) fn parse_body(bytes: &[u8]) -> Value {
    serde_json::from_slice(bytes).unwrap_or_else(|_| Value::Object(Map::new()))
}
