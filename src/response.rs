//! Response building helpers.

use bytes::Bytes;
use http_body_util::Full;
use hyper::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use hyper::{HeaderMap, Response, StatusCode};
use serde::Serialize;

use crate::error::ApiError;

/// A response under construction: status, headers, body bytes.
///
/// Handlers build one of these and return it; the server converts it to the
/// wire response after applying instance-level default headers.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl HttpResponse {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    /// Serialize `data` as the JSON body with the given status.
    pub fn json<T: Serialize>(status: StatusCode, data: &T) -> Result<Self, ApiError> {
        let body = serde_json::to_vec(data)
            .map_err(|err| ApiError::Internal(format!("serialize response: {err}")))?;
        let mut response = Self::new(status);
        response
            .headers
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        response.body = Bytes::from(body);
        Ok(response)
    }

    /// 200 with a JSON body.
    pub fn ok<T: Serialize>(data: &T) -> Result<Self, ApiError> {
        Self::json(StatusCode::OK, data)
    }

    /// 201 with a JSON body.
    pub fn created<T: Serialize>(data: &T) -> Result<Self, ApiError> {
        Self::json(StatusCode::CREATED, data)
    }

    /// 204, empty body.
    pub fn no_content() -> Self {
        Self::new(StatusCode::NO_CONTENT)
    }

    /// `{"error": "<message>"}` with the given status.
    pub fn error(status: StatusCode, message: &str) -> Self {
        let body = serde_json::json!({ "error": message });
        let mut response = Self::new(status);
        response
            .headers
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        response.body = Bytes::from(serde_json::to_vec(&body).unwrap_or_default());
        response
    }

    /// Set a response header, replacing any prior value for the name.
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Fill in defaults for header names the handler did not set.
    pub(crate) fn apply_default_headers(&mut self, defaults: &HeaderMap) {
        for (name, value) in defaults {
            if !self.headers.contains_key(name) {
                self.headers.insert(name.clone(), value.clone());
            }
        }
    }

    pub(crate) fn into_hyper(self) -> Response<Full<Bytes>> {
        let mut response = Response::new(Full::new(self.body));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}
