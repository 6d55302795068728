//! The application under test, as the harness sees it
//!
//! Building, routing and validating the application are its own business.
//! The harness only needs a config store, the response-class slot, a way
//! to create execution contexts and a way to hand it a request.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::common::Result;
use crate::context::ExecutionContext;
use crate::response::{Headers, RawResponse, Response, ResponseClass};

/// Application configuration: upper-case keys to JSON values
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config(BTreeMap<String, Value>);

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Store a value, returning the one it replaced
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Value of the `DEBUG` flag (absent or non-boolean counts as off)
    pub fn debug(&self) -> bool {
        self.get("DEBUG").and_then(Value::as_bool).unwrap_or(false)
    }
}

impl FromIterator<(String, Value)> for Config {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// In-process request handed to [`Application::dispatch`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: String,
    pub path: String,
    pub headers: Headers,
    pub body: Vec<u8>,
}

impl Request {
    pub fn new(method: &str, path: &str) -> Self {
        Self {
            method: method.to_ascii_uppercase(),
            path: path.to_string(),
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    pub fn get(path: &str) -> Self {
        Self::new("GET", path)
    }

    pub fn post(path: &str) -> Self {
        Self::new("POST", path)
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    /// Append a header list, e.g. one of the `accept_*` fixtures
    pub fn with_headers(mut self, headers: Headers) -> Self {
        self.headers.extend(headers);
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Look up a header by case-insensitive name
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// A web application instance under test
pub trait Application {
    /// Execution context produced by [`Application::test_request_context`]
    type Context: ExecutionContext + 'static;

    /// Current configuration
    fn config(&self) -> &Config;

    /// Write one configuration key
    ///
    /// The application owns validation; a rejected value is an error.
    fn set_config(&mut self, key: &str, value: Value) -> Result<()>;

    /// Class currently used to build responses
    fn response_class(&self) -> ResponseClass;

    /// Replace the response class
    fn set_response_class(&mut self, class: ResponseClass);

    /// Create a context that makes request-bound accessors work without a
    /// real request. The context is returned inactive.
    fn test_request_context(&self) -> Result<Self::Context>;

    /// Route a request to its handler
    fn handle(&self, request: &Request) -> Result<RawResponse>;

    /// Handle a request and wrap the result in the current response class
    fn dispatch(&self, request: &Request) -> Result<Box<dyn Response>> {
        let raw = self.handle(request)?;
        Ok(self.response_class().build(raw))
    }

    /// Whether the application runs in debug mode
    fn debug(&self) -> bool {
        self.config().debug()
    }
}
