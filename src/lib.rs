//! Application test harness
//!
//! Fixtures for testing web applications: while a test that requests the
//! `app` fixture runs, responses expose a lazily decoded `json()` accessor,
//! an execution context is pushed so request-bound helpers work, and
//! `app(...)` marker options are written into the application config.

pub mod app;
pub mod commands;
pub mod common;
pub mod config_override;
pub mod context;
pub mod fixtures;
pub mod harness;
pub mod reporter;
pub mod response;
pub mod testing;

// Re-export commonly used types for tests
pub use app::{Application, Config, Request};
pub use common::{Error, Result};
pub use context::{ContextScope, ExecutionContext};
pub use harness::{
    FixtureRequest, Harness, HarnessOptions, Marker, Outcome, TestItem, TestPhase, APP_FIXTURE,
};
pub use response::{augment, JsonBody, RawResponse, Response, ResponseClass};
