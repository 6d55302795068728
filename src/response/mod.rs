//! Response objects produced by the application under test
//!
//! An application builds its responses through a replaceable
//! [`ResponseClass`]. The harness swaps that class for one that adds a JSON
//! accessor (see [`augment`]) while a test runs, and swaps it back afterward.

mod json;

pub use json::{augment, JsonBody, JsonResponse, JsonResponseClass};

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::common::{Error, Result};

/// Header list in the order the handler produced them
pub type Headers = Vec<(String, String)>;

/// Response as produced by an application's request handler, before any
/// response class wraps it
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub headers: Headers,
    pub body: Vec<u8>,
}

impl RawResponse {
    /// Create an empty response with the given status
    pub fn new(status: u16) -> Self {
        Self {
            status,
            ..Self::default()
        }
    }

    /// Create a JSON response the way a `jsonify` helper would
    pub fn json(status: u16, value: &Value) -> Self {
        Self::new(status)
            .with_header("Content-Type", "application/json")
            .with_body(value.to_string())
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }
}

/// Behavior shared by every response the application hands back to a test
pub trait Response: fmt::Debug {
    /// HTTP status code
    fn status(&self) -> u16;

    /// Response headers
    fn headers(&self) -> &[(String, String)];

    /// Raw response body
    fn data(&self) -> &[u8];

    /// Look up a header by case-insensitive name
    fn header(&self, name: &str) -> Option<&str> {
        self.headers()
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Content type without parameters, e.g. `application/json`
    fn mimetype(&self) -> Option<&str> {
        self.header("Content-Type")
            .and_then(|value| value.split(';').next())
            .map(str::trim)
    }

    /// JSON capability of this response, if its class provides one
    fn as_json(&self) -> Option<&dyn JsonBody> {
        None
    }

    /// Decoded JSON body
    ///
    /// Only responses built by a JSON-capable class can answer this; others
    /// report [`Error::JsonUnavailable`].
    fn json(&self) -> Result<&Value> {
        match self.as_json() {
            Some(body) => body.json_body(),
            None => Err(Error::JsonUnavailable),
        }
    }
}

/// Builds response objects from raw handler output
///
/// This is the "response type" an application instantiates for each request.
pub trait ResponseFactory: fmt::Debug + Send + Sync {
    /// Display name, used in logs
    fn name(&self) -> &str;

    /// Wrap a raw response
    fn build(&self, raw: RawResponse) -> Box<dyn Response>;

    /// Whether responses from this class already expose a JSON accessor
    ///
    /// Must be `true` exactly when the built responses return `Some` from
    /// [`Response::as_json`]; `augment` trusts this and wraps the class
    /// otherwise, hiding the responses' own accessor.
    fn defines_json(&self) -> bool;
}

/// Shared handle to a response factory, stored in the application's
/// response-class slot
///
/// Two handles are the same class when they point at the same factory.
#[derive(Clone, Debug)]
pub struct ResponseClass(Arc<dyn ResponseFactory>);

impl ResponseClass {
    pub fn new(factory: impl ResponseFactory + 'static) -> Self {
        Self(Arc::new(factory))
    }

    pub fn name(&self) -> &str {
        self.0.name()
    }

    pub fn build(&self, raw: RawResponse) -> Box<dyn Response> {
        self.0.build(raw)
    }

    pub fn defines_json(&self) -> bool {
        self.0.defines_json()
    }

    /// Identity comparison
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Default for ResponseClass {
    fn default() -> Self {
        Self::new(BaseResponseClass)
    }
}

/// Plain response class with no JSON accessor
#[derive(Debug, Clone, Copy, Default)]
pub struct BaseResponseClass;

impl ResponseFactory for BaseResponseClass {
    fn name(&self) -> &str {
        "Response"
    }

    fn build(&self, raw: RawResponse) -> Box<dyn Response> {
        Box::new(BaseResponse(raw))
    }

    fn defines_json(&self) -> bool {
        false
    }
}

/// Response built by [`BaseResponseClass`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseResponse(pub RawResponse);

impl Response for BaseResponse {
    fn status(&self) -> u16 {
        self.0.status
    }

    fn headers(&self) -> &[(String, String)] {
        &self.0.headers
    }

    fn data(&self) -> &[u8] {
        &self.0.body
    }
}
