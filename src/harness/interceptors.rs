//! Setup hooks run for every test
//!
//! Each interceptor checks on its own whether the test requested the `app`
//! fixture and does nothing otherwise. Cleanup is registered as a finalizer
//! the moment the corresponding setup succeeds.

use super::{FixtureRequest, TestPhase, APP_FIXTURE, APP_MARKER};
use crate::app::Application;
use crate::common::Result;
use crate::config_override::{self, AppOptions};
use crate::context::ContextScope;
use crate::response::augment;

/// A setup hook the harness runs before each test body
pub trait Interceptor<A: Application> {
    /// Name used in logs and reports
    fn name(&self) -> &'static str;

    /// Prepare the test
    ///
    /// Returns the phase the test reached, or `None` if the interceptor did
    /// not apply to this test. An error aborts setup and the body never runs.
    fn setup(&self, request: &mut FixtureRequest<'_, A>) -> Result<Option<TestPhase>>;
}

/// Installs a JSON-capable response class for the duration of the test
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseClassInterceptor;

impl<A: Application> Interceptor<A> for ResponseClassInterceptor {
    fn name(&self) -> &'static str {
        "response_class"
    }

    fn setup(&self, request: &mut FixtureRequest<'_, A>) -> Result<Option<TestPhase>> {
        if !request.requests(APP_FIXTURE) {
            return Ok(None);
        }

        let app = request.app()?;
        let original = app.response_class();
        app.set_response_class(augment(original.clone()));

        request.add_finalizer("restore_response_class", move |app: &mut A| {
            tracing::debug!(class = original.name(), "Restoring response class");
            app.set_response_class(original);
            Ok(())
        });

        Ok(Some(TestPhase::ResponseAugmented))
    }
}

/// Pushes a request context before the test and pops it afterward
#[derive(Debug, Clone, Copy, Default)]
pub struct ContextInterceptor;

impl<A: Application> Interceptor<A> for ContextInterceptor {
    fn name(&self) -> &'static str {
        "request_context"
    }

    fn setup(&self, request: &mut FixtureRequest<'_, A>) -> Result<Option<TestPhase>> {
        if !request.requests(APP_FIXTURE) {
            return Ok(None);
        }

        let scope = ContextScope::enter(&*request.app()?)?;
        request.add_finalizer("pop_request_context", move |_app: &mut A| scope.exit());

        Ok(Some(TestPhase::ContextActive))
    }
}

/// Applies `app(...)` marker options to the application config
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfigInterceptor;

impl<A: Application> Interceptor<A> for ConfigInterceptor {
    fn name(&self) -> &'static str {
        "configure_application"
    }

    fn setup(&self, request: &mut FixtureRequest<'_, A>) -> Result<Option<TestPhase>> {
        if !request.requests(APP_FIXTURE) {
            return Ok(None);
        }

        let options = AppOptions::from_markers(request.markers_named(APP_MARKER));
        config_override::apply(request.app()?, options.as_ref())?;

        Ok(Some(TestPhase::ConfigApplied))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harness::{Marker, TestItem};
    use crate::testing::MemoryApp;
    use serde_json::json;

    #[test]
    fn test_response_class_swapped_and_restored() {
        let mut app = MemoryApp::new("int");
        let before = app.response_class();
        let item = TestItem::new("t", |_req| Ok(())).fixture("app");

        let mut request = FixtureRequest::new(&item, &mut app);
        let phase = ResponseClassInterceptor.setup(&mut request).unwrap();
        assert_eq!(phase, Some(TestPhase::ResponseAugmented));
        assert!(request.app().unwrap().response_class().defines_json());

        assert!(request.finish().is_empty());
        drop(request);
        assert!(app.response_class().ptr_eq(&before));
    }

    #[test]
    fn test_gate_closed_without_app_fixture() {
        let mut app = MemoryApp::new("int").with_config("DEBUG", json!(true));
        let before = app.response_class();
        let item = TestItem::new("t", |_req| Ok(()))
            .marker(Marker::new("app").kwarg("debug", false));

        let mut request = FixtureRequest::new(&item, &mut app);
        assert_eq!(ResponseClassInterceptor.setup(&mut request).unwrap(), None);
        assert_eq!(ContextInterceptor.setup(&mut request).unwrap(), None);
        assert_eq!(ConfigInterceptor.setup(&mut request).unwrap(), None);
        assert_eq!(request.pending_finalizers(), 0);
        drop(request);

        assert!(app.response_class().ptr_eq(&before));
        assert!(app.config().debug());
        assert_eq!(app.context_pushes(), 0);
    }

    #[test]
    fn test_context_failure_registers_no_finalizer() {
        let mut app = MemoryApp::new("int").failing_context();
        let item = TestItem::new("t", |_req| Ok(())).fixture("app");

        let mut request = FixtureRequest::new(&item, &mut app);
        assert!(ContextInterceptor.setup(&mut request).is_err());
        assert_eq!(request.pending_finalizers(), 0);
    }
}
