//! Error types for the application harness
//!
//! Messages name the fixture or marker involved so a failing test report
//! points straight at the declaration that needs fixing.

use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the harness
#[derive(Error, Debug)]
pub enum Error {
    // === Fixture Errors ===
    #[error("Fixture '{0}' was not requested by this test. Declare it with TestItem::fixture(\"{0}\")")]
    FixtureNotRequested(String),

    #[error("Unknown marker '{0}'. Register it in the harness or in app-harness.toml [markers]")]
    UnknownMarker(String),

    // === Execution Context Errors ===
    #[error("Failed to create execution context: {0}")]
    ContextCreate(String),

    #[error("Failed to push execution context: {0}")]
    ContextPush(String),

    #[error("Failed to pop execution context: {0}")]
    ContextPop(String),

    #[error("Working outside of an execution context: {0}")]
    OutsideContext(String),

    // === Application Errors ===
    #[error("Application rejected config key '{key}': {reason}")]
    ConfigRejected { key: String, reason: String },

    #[error("No route matches {method} {path}")]
    RouteNotFound { method: String, path: String },

    // === Response Errors ===
    #[error("Failed to decode response body as JSON: {0}")]
    JsonDecode(#[source] serde_json::Error),

    #[error("Response has no JSON accessor. Request the 'app' fixture so its response class is augmented")]
    JsonUnavailable,

    // === Configuration Errors ===
    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    // === Serialization Errors ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Test Errors ===
    #[error("Panicked: {0}")]
    Panicked(String),

    #[error("Test assertion failed: {0}")]
    TestAssertion(String),
}

impl Error {
    /// Create a config rejected error
    pub fn config_rejected(key: &str, reason: &str) -> Self {
        Self::ConfigRejected {
            key: key.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create a route not found error
    pub fn route_not_found(method: &str, path: &str) -> Self {
        Self::RouteNotFound {
            method: method.to_string(),
            path: path.to_string(),
        }
    }
}
