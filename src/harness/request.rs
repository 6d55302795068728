//! Per-test view handed to interceptors and to the test body
//!
//! The request borrows the application for one test and owns the
//! finalizers registered during setup. Finalizers run in reverse order of
//! registration, either when the harness finishes the test or, if the test
//! is abandoned by unwinding, when the request is dropped.

use std::panic::{self, AssertUnwindSafe};

use super::{panic_message, Marker, TestItem, APP_FIXTURE};
use crate::app::{Application, Config};
use crate::common::{Error, Result};

type Finalizer<A> = Box<dyn FnOnce(&mut A) -> Result<()>>;

/// A finalizer that failed during teardown
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeardownError {
    pub finalizer: &'static str,
    pub message: String,
}

/// Fixture access for one running test
pub struct FixtureRequest<'a, A: Application> {
    item: &'a TestItem<A>,
    app: &'a mut A,
    finalizers: Vec<(&'static str, Finalizer<A>)>,
}

impl<'a, A: Application> FixtureRequest<'a, A> {
    pub(crate) fn new(item: &'a TestItem<A>, app: &'a mut A) -> Self {
        Self {
            item,
            app,
            finalizers: Vec::new(),
        }
    }

    /// Name of the running test
    pub fn name(&self) -> &'a str {
        self.item.name()
    }

    /// Whether the test declared the given fixture
    pub fn requests(&self, fixture: &str) -> bool {
        self.item.fixtures().contains(fixture)
    }

    /// Every marker with the given name, in declaration order
    pub fn markers_named<'n>(&self, name: &'n str) -> impl Iterator<Item = &'a Marker> + 'n
    where
        'a: 'n,
    {
        self.item.markers().iter().filter(move |m| m.name() == name)
    }

    pub fn markers(&self) -> &'a [Marker] {
        self.item.markers()
    }

    /// The application, if the test asked for it
    pub fn app(&mut self) -> Result<&mut A> {
        if !self.requests(APP_FIXTURE) {
            return Err(Error::FixtureNotRequested(APP_FIXTURE.to_string()));
        }
        Ok(&mut *self.app)
    }

    /// The application's configuration, available when `app` is requested
    pub fn config(&self) -> Result<&Config> {
        if !self.requests(APP_FIXTURE) {
            return Err(Error::FixtureNotRequested(APP_FIXTURE.to_string()));
        }
        Ok(self.app.config())
    }

    /// Register cleanup to run after the test, whatever its outcome
    pub fn add_finalizer<F>(&mut self, name: &'static str, finalizer: F)
    where
        F: FnOnce(&mut A) -> Result<()> + 'static,
    {
        tracing::trace!(finalizer = name, test = self.item.name(), "Finalizer registered");
        self.finalizers.push((name, Box::new(finalizer)));
    }

    /// Number of finalizers still pending
    pub fn pending_finalizers(&self) -> usize {
        self.finalizers.len()
    }

    /// Run every pending finalizer, last registered first
    ///
    /// A failing or panicking finalizer does not stop the ones after it.
    pub(crate) fn finish(&mut self) -> Vec<TeardownError> {
        let mut errors = Vec::new();
        while let Some((name, finalizer)) = self.finalizers.pop() {
            let app = &mut *self.app;
            let result = panic::catch_unwind(AssertUnwindSafe(move || finalizer(app)))
                .unwrap_or_else(|payload| Err(Error::Panicked(panic_message(payload.as_ref()))));
            if let Err(e) = result {
                tracing::warn!(finalizer = name, test = self.item.name(), error = %e, "Finalizer failed");
                errors.push(TeardownError {
                    finalizer: name,
                    message: e.to_string(),
                });
            }
        }
        errors
    }
}

impl<A: Application> Drop for FixtureRequest<'_, A> {
    fn drop(&mut self) {
        if !self.finalizers.is_empty() {
            tracing::debug!(
                test = self.item.name(),
                pending = self.finalizers.len(),
                "Running finalizers for abandoned test"
            );
            self.finish();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryApp;
    use serde_json::json;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn item(fixtures: &[&str]) -> TestItem<MemoryApp> {
        fixtures
            .iter()
            .fold(TestItem::new("t", |_req| Ok(())), |item, f| item.fixture(*f))
    }

    #[test]
    fn test_app_requires_declaration() {
        let mut app = MemoryApp::new("req");
        let item = item(&[]);
        let mut request = FixtureRequest::new(&item, &mut app);
        assert!(matches!(request.app(), Err(Error::FixtureNotRequested(_))));
        assert!(request.config().is_err());
    }

    #[test]
    fn test_config_fixture() {
        let mut app = MemoryApp::new("req").with_config("TESTING", json!(true));
        let item = item(&["app"]);
        let request = FixtureRequest::new(&item, &mut app);
        assert_eq!(request.config().unwrap().get("TESTING"), Some(&json!(true)));
    }

    #[test]
    fn test_finalizers_run_lifo_and_continue_after_failure() {
        let mut app = MemoryApp::new("req");
        let item = item(&["app"]);
        let order = Rc::new(RefCell::new(Vec::new()));
        let mut request = FixtureRequest::new(&item, &mut app);

        for name in ["first", "second", "third"] {
            let order = Rc::clone(&order);
            request.add_finalizer(name, move |_app| {
                order.borrow_mut().push(name);
                if name == "second" {
                    return Err(Error::TestAssertion("boom".to_string()));
                }
                Ok(())
            });
        }

        let errors = request.finish();
        assert_eq!(*order.borrow(), vec!["third", "second", "first"]);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].finalizer, "second");
        assert_eq!(request.pending_finalizers(), 0);
    }

    #[test]
    fn test_panicking_finalizer_becomes_teardown_error() {
        let mut app = MemoryApp::new("req").with_config("DEBUG", json!(true));
        let item = item(&["app"]);
        let mut request = FixtureRequest::new(&item, &mut app);

        request.add_finalizer("reset_debug", |app| app.set_config("DEBUG", json!(false)));
        request.add_finalizer("crashes", |_app| panic!("finalizer crashed"));

        let errors = request.finish();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].finalizer, "crashes");
        assert_eq!(errors[0].message, "Panicked: finalizer crashed");
        drop(request);
        assert!(!app.config().debug());
    }

    #[test]
    fn test_markers_named_in_declaration_order() {
        let mut app = MemoryApp::new("req");
        let item = item(&["app"])
            .marker(Marker::new("app").kwarg("testing", true))
            .marker(Marker::new("slow"))
            .marker(Marker::new("app").kwarg("debug", false));
        let request = FixtureRequest::new(&item, &mut app);

        let names: Vec<String> = request
            .markers_named("app")
            .map(|m| m.to_string())
            .collect();
        assert_eq!(names, vec!["app(testing=true)", "app(debug=false)"]);
    }

    #[test]
    fn test_drop_runs_pending_finalizers() {
        let mut app = MemoryApp::new("req").with_config("DEBUG", json!(true));
        let item = item(&["app"]);
        {
            let mut request = FixtureRequest::new(&item, &mut app);
            request.add_finalizer("reset_debug", |app| {
                app.set_config("DEBUG", json!(false))
            });
        }
        assert!(!app.config().debug());
    }
}
