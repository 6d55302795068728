//! JSON accessor for test responses
//!
//! Instead of deriving a new response type at runtime, the accessor is a
//! capability: [`JsonResponseClass`] wraps any class and builds
//! [`JsonResponse`] values that delegate to the inner response and add a
//! memoized decode.

use once_cell::sync::OnceCell;
use serde_json::Value;

use super::{RawResponse, Response, ResponseClass, ResponseFactory};
use crate::common::{Error, Result};

/// A response whose body can be read as JSON
pub trait JsonBody {
    /// Decode the body, caching the result on first success
    fn json_body(&self) -> Result<&Value>;
}

/// Extend a response class with a JSON accessor
///
/// A class that already defines one is returned unchanged, so a user-defined
/// accessor is never overridden and augmenting twice never double-wraps.
pub fn augment(original: ResponseClass) -> ResponseClass {
    if original.defines_json() {
        tracing::trace!(class = original.name(), "Response class already defines json");
        return original;
    }

    tracing::debug!(class = original.name(), "Augmenting response class with json accessor");
    ResponseClass::new(JsonResponseClass::new(original))
}

/// Response class produced by [`augment`]
#[derive(Debug)]
pub struct JsonResponseClass {
    inner: ResponseClass,
    name: String,
}

impl JsonResponseClass {
    pub fn new(inner: ResponseClass) -> Self {
        let name = format!("JSONResponse({})", inner.name());
        Self { inner, name }
    }
}

impl ResponseFactory for JsonResponseClass {
    fn name(&self) -> &str {
        &self.name
    }

    fn build(&self, raw: RawResponse) -> Box<dyn Response> {
        Box::new(JsonResponse::new(self.inner.build(raw)))
    }

    fn defines_json(&self) -> bool {
        true
    }
}

/// Inner response plus a lazily decoded JSON body
#[derive(Debug)]
pub struct JsonResponse {
    inner: Box<dyn Response>,
    decoded: OnceCell<Value>,
}

impl JsonResponse {
    pub fn new(inner: Box<dyn Response>) -> Self {
        Self {
            inner,
            decoded: OnceCell::new(),
        }
    }

    /// Whether the body has been decoded yet
    pub fn is_decoded(&self) -> bool {
        self.decoded.get().is_some()
    }
}

impl Response for JsonResponse {
    fn status(&self) -> u16 {
        self.inner.status()
    }

    fn headers(&self) -> &[(String, String)] {
        self.inner.headers()
    }

    fn data(&self) -> &[u8] {
        self.inner.data()
    }

    fn header(&self, name: &str) -> Option<&str> {
        self.inner.header(name)
    }

    fn mimetype(&self) -> Option<&str> {
        self.inner.mimetype()
    }

    fn as_json(&self) -> Option<&dyn JsonBody> {
        Some(self)
    }
}

impl JsonBody for JsonResponse {
    fn json_body(&self) -> Result<&Value> {
        // Failures are not cached; every read of a bad body reports again.
        self.decoded
            .get_or_try_init(|| serde_json::from_slice(self.inner.data()).map_err(Error::JsonDecode))
    }
}
