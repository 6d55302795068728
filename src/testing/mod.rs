//! Reference application for exercising the harness
//!
//! [`MemoryApp`] implements [`crate::app::Application`] entirely in memory:
//! closure routes, a config map, and contexts whose push/pop calls are
//! counted. It stands in for a real web framework in tests and in
//! `app-harness selftest`.

mod app;
pub mod selftest;

pub use app::{MemoryApp, MemoryContext};
