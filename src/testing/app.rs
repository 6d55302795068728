//! In-memory application used to exercise the harness
//!
//! Routes are plain closures. Request-bound helpers such as
//! [`MemoryApp::url_for`] only work while a context is pushed, which makes
//! the context lifecycle observable from a test body.

use std::cell::Cell;
use std::collections::BTreeSet;
use std::fmt;
use std::rc::Rc;

use serde_json::Value;

use crate::app::{Application, Config, Request};
use crate::common::{Error, Result};
use crate::context::ExecutionContext;
use crate::response::{RawResponse, ResponseClass};

type Handler = Box<dyn Fn(&Request) -> RawResponse>;

struct Route {
    method: String,
    path: String,
    endpoint: String,
    handler: Handler,
}

/// Context bookkeeping shared between the app and its contexts
#[derive(Debug, Default)]
struct ContextState {
    depth: Cell<usize>,
    pushes: Cell<usize>,
    pops: Cell<usize>,
}

/// Simple routed application with an observable context lifecycle
pub struct MemoryApp {
    name: String,
    config: Config,
    response_class: ResponseClass,
    routes: Vec<Route>,
    contexts: Rc<ContextState>,
    rejected_keys: BTreeSet<String>,
    panicking_keys: BTreeSet<String>,
    fail_context: bool,
    fail_pop: bool,
}

impl MemoryApp {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            config: Config::new(),
            response_class: ResponseClass::default(),
            routes: Vec::new(),
            contexts: Rc::new(ContextState::default()),
            rejected_keys: BTreeSet::new(),
            panicking_keys: BTreeSet::new(),
            fail_context: false,
            fail_pop: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Seed a config value, as an application factory would
    pub fn with_config(mut self, key: &str, value: Value) -> Self {
        self.config.insert(key, value);
        self
    }

    /// Register a route
    pub fn route<F>(mut self, method: &str, path: &str, endpoint: &str, handler: F) -> Self
    where
        F: Fn(&Request) -> RawResponse + 'static,
    {
        self.routes.push(Route {
            method: method.to_ascii_uppercase(),
            path: path.to_string(),
            endpoint: endpoint.to_string(),
            handler: Box::new(handler),
        });
        self
    }

    /// Make `set_config` refuse this key
    pub fn reject_config_key(mut self, key: &str) -> Self {
        self.rejected_keys.insert(key.to_string());
        self
    }

    /// Make `set_config` panic on this key, like a buggy config hook
    pub fn panic_on_config_key(mut self, key: &str) -> Self {
        self.panicking_keys.insert(key.to_string());
        self
    }

    /// Make context creation fail, as a misconfigured application would
    pub fn failing_context(mut self) -> Self {
        self.fail_context = true;
        self
    }

    /// Make every context pop fail
    pub fn failing_pop(mut self) -> Self {
        self.fail_pop = true;
        self
    }

    /// Build the URL for an endpoint; needs an active context
    pub fn url_for(&self, endpoint: &str) -> Result<String> {
        if !self.has_request_context() {
            return Err(Error::OutsideContext(format!("url_for('{}')", endpoint)));
        }

        let route = self
            .routes
            .iter()
            .find(|r| r.endpoint == endpoint)
            .ok_or_else(|| Error::route_not_found("*", endpoint))?;

        match self.config.get("SERVER_NAME").and_then(Value::as_str) {
            Some(server) => Ok(format!("http://{}{}", server, route.path)),
            None => Ok(route.path.clone()),
        }
    }

    pub fn has_request_context(&self) -> bool {
        self.contexts.depth.get() > 0
    }

    /// Number of push calls made on this app's contexts
    pub fn context_pushes(&self) -> usize {
        self.contexts.pushes.get()
    }

    /// Number of pop calls made on this app's contexts
    pub fn context_pops(&self) -> usize {
        self.contexts.pops.get()
    }
}

impl fmt::Debug for MemoryApp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryApp")
            .field("name", &self.name)
            .field("config", &self.config)
            .field("response_class", &self.response_class.name())
            .field("routes", &self.routes.len())
            .finish_non_exhaustive()
    }
}

impl Application for MemoryApp {
    type Context = MemoryContext;

    fn config(&self) -> &Config {
        &self.config
    }

    fn set_config(&mut self, key: &str, value: Value) -> Result<()> {
        if self.panicking_keys.contains(key) {
            panic!("config hook for '{}' crashed", key);
        }
        if self.rejected_keys.contains(key) {
            return Err(Error::config_rejected(key, "key is not accepted by this application"));
        }
        self.config.insert(key, value);
        Ok(())
    }

    fn response_class(&self) -> ResponseClass {
        self.response_class.clone()
    }

    fn set_response_class(&mut self, class: ResponseClass) {
        self.response_class = class;
    }

    fn test_request_context(&self) -> Result<MemoryContext> {
        if self.fail_context {
            return Err(Error::ContextCreate(format!(
                "application '{}' is not configured",
                self.name
            )));
        }
        Ok(MemoryContext {
            state: Rc::clone(&self.contexts),
            pushed: false,
            fail_pop: self.fail_pop,
        })
    }

    fn handle(&self, request: &Request) -> Result<RawResponse> {
        self.routes
            .iter()
            .find(|r| r.method == request.method && r.path == request.path)
            .map(|r| (r.handler)(request))
            .ok_or_else(|| Error::route_not_found(&request.method, &request.path))
    }
}

/// Execution context of a [`MemoryApp`]
#[derive(Debug)]
pub struct MemoryContext {
    state: Rc<ContextState>,
    pushed: bool,
    fail_pop: bool,
}

impl ExecutionContext for MemoryContext {
    fn push(&mut self) -> Result<()> {
        if self.pushed {
            return Err(Error::ContextPush("context already pushed".to_string()));
        }
        self.pushed = true;
        self.state.pushes.set(self.state.pushes.get() + 1);
        self.state.depth.set(self.state.depth.get() + 1);
        Ok(())
    }

    fn pop(&mut self) -> Result<()> {
        self.state.pops.set(self.state.pops.get() + 1);
        if !self.pushed {
            return Err(Error::ContextPop("context was never pushed".to_string()));
        }
        if self.fail_pop {
            return Err(Error::ContextPop("teardown handler raised".to_string()));
        }
        self.pushed = false;
        self.state.depth.set(self.state.depth.get() - 1);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::Response;
    use serde_json::json;

    fn app() -> MemoryApp {
        MemoryApp::new("memory").route("GET", "/ping", "ping", |_req| {
            RawResponse::json(200, &json!({"ping": "pong"}))
        })
    }

    #[test]
    fn test_url_for_requires_context() {
        let app = app();
        assert!(matches!(app.url_for("ping"), Err(Error::OutsideContext(_))));

        let mut ctx = app.test_request_context().unwrap();
        ctx.push().unwrap();
        assert_eq!(app.url_for("ping").unwrap(), "/ping");
        ctx.pop().unwrap();
        assert!(!app.has_request_context());
    }

    #[test]
    fn test_url_for_uses_server_name() {
        let app = app().with_config("SERVER_NAME", json!("example.test"));
        let mut ctx = app.test_request_context().unwrap();
        ctx.push().unwrap();
        assert_eq!(app.url_for("ping").unwrap(), "http://example.test/ping");
        ctx.pop().unwrap();
    }

    #[test]
    fn test_context_cannot_push_twice() {
        let app = app();
        let mut ctx = app.test_request_context().unwrap();
        ctx.push().unwrap();
        assert!(ctx.push().is_err());
        assert_eq!(app.context_pushes(), 1);
        ctx.pop().unwrap();
    }

    #[test]
    fn test_dispatch_uses_current_response_class() {
        let app = app();
        let res = app.dispatch(&Request::get("/ping")).unwrap();
        assert_eq!(res.status(), 200);
        assert!(res.as_json().is_none());

        assert!(matches!(
            app.dispatch(&Request::get("/missing")),
            Err(Error::RouteNotFound { .. })
        ));
    }
}
