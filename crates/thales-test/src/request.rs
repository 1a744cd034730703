//! Test request building.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use http::{header, HeaderMap, HeaderName, HeaderValue, Method};
use http_body_util::Full;
use serde::Serialize;
use thales_extract::header::fmt_http_date;
use thales_extract::PathParams;

/// Entry points for building pipeline requests.
///
/// # Example
///
/// ```
/// use thales_test::TestRequest;
///
/// let request = TestRequest::get("/things?limit=10")
///     .bearer_token("abc")
///     .header("If-None-Match", "\"42\"")
///     .build();
/// assert_eq!(request.uri().query(), Some("limit=10"));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct TestRequest;

impl TestRequest {
    /// Creates a GET request.
    pub fn get(uri: impl AsRef<str>) -> TestRequestBuilder {
        TestRequestBuilder::new(Method::GET, uri)
    }

    /// Creates a HEAD request.
    pub fn head(uri: impl AsRef<str>) -> TestRequestBuilder {
        TestRequestBuilder::new(Method::HEAD, uri)
    }

    /// Creates a POST request.
    pub fn post(uri: impl AsRef<str>) -> TestRequestBuilder {
        TestRequestBuilder::new(Method::POST, uri)
    }

    /// Creates a PATCH request.
    pub fn patch(uri: impl AsRef<str>) -> TestRequestBuilder {
        TestRequestBuilder::new(Method::PATCH, uri)
    }

    /// Creates a DELETE request.
    pub fn delete(uri: impl AsRef<str>) -> TestRequestBuilder {
        TestRequestBuilder::new(Method::DELETE, uri)
    }
}

/// Builder for pipeline requests.
#[must_use]
#[derive(Debug)]
pub struct TestRequestBuilder {
    method: Method,
    uri: String,
    headers: HeaderMap,
    params: PathParams,
    body: Bytes,
}

impl TestRequestBuilder {
    /// Creates a builder.
    pub fn new(method: Method, uri: impl AsRef<str>) -> Self {
        Self {
            method,
            uri: uri.as_ref().to_string(),
            headers: HeaderMap::new(),
            params: PathParams::new(),
            body: Bytes::new(),
        }
    }

    /// Sets a header.
    ///
    /// # Panics
    ///
    /// Panics on an invalid name or value.
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        let name = HeaderName::try_from(name.as_ref()).expect("valid header name");
        let value = HeaderValue::try_from(value.as_ref()).expect("valid header value");
        self.headers.insert(name, value);
        self
    }

    /// Sets a typed header.
    pub fn header_typed(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Sets `Authorization: Bearer <token>`.
    pub fn bearer_token(self, token: impl AsRef<str>) -> Self {
        self.header(header::AUTHORIZATION.as_str(), format!("Bearer {}", token.as_ref()))
    }

    /// Sets `If-None-Match` to `etag` exactly as a client echoes an `ETag`.
    pub fn if_none_match(self, etag: impl AsRef<str>) -> Self {
        self.header(header::IF_NONE_MATCH.as_str(), etag.as_ref())
    }

    /// Sets `If-Modified-Since` to `at`.
    pub fn if_modified_since(self, at: DateTime<Utc>) -> Self {
        self.header(header::IF_MODIFIED_SINCE.as_str(), fmt_http_date(at))
    }

    /// Sets `If-Unmodified-Since` to `at`.
    pub fn if_unmodified_since(self, at: DateTime<Utc>) -> Self {
        self.header(header::IF_UNMODIFIED_SINCE.as_str(), fmt_http_date(at))
    }

    /// Records a path parameter the way a router would.
    pub fn path_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name, value);
        self
    }

    /// Sets the raw body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Serializes `value` as the body and sets `Content-Type`.
    ///
    /// # Panics
    ///
    /// Panics if `value` fails to serialize.
    pub fn json<T: Serialize + ?Sized>(mut self, value: &T) -> Self {
        self.body = serde_json::to_vec(value).expect("serializable body").into();
        self.header_typed(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        )
    }

    /// Builds the request.
    ///
    /// # Panics
    ///
    /// Panics if the URI is invalid.
    #[must_use]
    pub fn build(self) -> http::Request<Full<Bytes>> {
        let mut request = http::Request::builder()
            .method(self.method)
            .uri(self.uri)
            .body(Full::new(self.body))
            .expect("valid request");
        *request.headers_mut() = self.headers;
        if !self.params.is_empty() {
            request.extensions_mut().insert(self.params);
        }
        request
    }
}
