//! Test lifecycle around an application
//!
//! The [`Harness`] owns the option surface, the marker vocabulary and the
//! interceptors. For every test it:
//! 1. Runs each interceptor's setup (augment response class, push context,
//!    apply `app(...)` options), stopping at the first error or panic
//! 2. Runs the body, catching errors and panics as test failures
//! 3. Runs every registered finalizer, last first, recording failures and
//!    panics separately from the test outcome

mod interceptors;
mod item;
mod markers;
mod options;
mod request;

pub use interceptors::{ConfigInterceptor, ContextInterceptor, Interceptor, ResponseClassInterceptor};
pub use item::{Marker, TestBody, TestItem};
pub use markers::{MarkerRegistry, MarkerSpec, APP_MARKER_LINE};
pub use options::HarnessOptions;
pub use request::{FixtureRequest, TeardownError};

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::{Duration, Instant};

use crate::app::Application;
use crate::common::config::HarnessConfig;
use crate::common::Error;

/// Fixture name a test declares to opt into the application lifecycle
pub const APP_FIXTURE: &str = "app";

/// Marker carrying per-test application options
pub const APP_MARKER: &str = "app";

/// Lifecycle state of a test that requested the application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestPhase {
    Idle,
    ResponseAugmented,
    ContextActive,
    ConfigApplied,
    Running,
    /// Context popped; `success` is the body's verdict
    ContextInactive { success: bool },
}

/// How a test ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Passed,
    /// The body returned an error or panicked
    Failed(String),
    /// Setup failed before the body could run
    SetupError(String),
}

impl Outcome {
    pub fn is_passed(&self) -> bool {
        matches!(self, Outcome::Passed)
    }
}

/// Result of running one test
#[derive(Debug, Clone)]
pub struct TestReport {
    pub name: String,
    pub outcome: Outcome,
    /// Phases in the order they were reached
    pub phases: Vec<TestPhase>,
    /// Finalizer failures, reported apart from the outcome
    pub teardown_errors: Vec<TeardownError>,
    pub duration: Duration,
}

impl TestReport {
    pub fn passed(&self) -> bool {
        self.outcome.is_passed()
    }

    /// Whether the given phase was reached
    pub fn reached(&self, phase: TestPhase) -> bool {
        self.phases.contains(&phase)
    }
}

/// Results of a whole run
#[derive(Debug, Clone, Default)]
pub struct SessionSummary {
    pub reports: Vec<TestReport>,
    pub duration: Duration,
}

impl SessionSummary {
    pub fn passed(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Passed))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Failed(_)))
    }

    /// Tests that never ran because setup failed
    pub fn errors(&self) -> usize {
        self.count(|o| matches!(o, Outcome::SetupError(_)))
    }

    pub fn teardown_errors(&self) -> usize {
        self.reports.iter().map(|r| r.teardown_errors.len()).sum()
    }

    /// True when every test passed and every teardown succeeded
    pub fn is_success(&self) -> bool {
        self.passed() == self.reports.len() && self.teardown_errors() == 0
    }

    fn count(&self, pred: impl Fn(&Outcome) -> bool) -> usize {
        self.reports.iter().filter(|r| pred(&r.outcome)).count()
    }
}

/// Registry of options, markers and interceptors; runs tests against one
/// application at a time
pub struct Harness<A: Application> {
    options: HarnessOptions,
    markers: MarkerRegistry,
    interceptors: Vec<Box<dyn Interceptor<A>>>,
}

impl<A: Application> Harness<A> {
    /// Harness with the built-in `app` marker and the three lifecycle
    /// interceptors, in order: response class, request context, config
    pub fn new(options: HarnessOptions) -> Self {
        Self {
            options,
            markers: MarkerRegistry::with_defaults(),
            interceptors: vec![
                Box::new(ResponseClassInterceptor),
                Box::new(ContextInterceptor),
                Box::new(ConfigInterceptor),
            ],
        }
    }

    /// Harness whose options and extra markers come from a config file
    pub fn with_config(options: HarnessOptions, config: &HarnessConfig) -> Self {
        let mut harness = Self::new(options.resolve(config));
        for line in &config.markers {
            harness.markers.register_line(line);
        }
        harness
    }

    pub fn options(&self) -> &HarnessOptions {
        &self.options
    }

    /// Port for the live server collaborator, if configured
    pub fn liveserver_port(&self) -> Option<u16> {
        self.options.liveserver_port
    }

    pub fn markers(&self) -> &MarkerRegistry {
        &self.markers
    }

    /// Append an interceptor; it runs after the built-in ones
    pub fn register_interceptor(&mut self, interceptor: Box<dyn Interceptor<A>>) {
        self.interceptors.push(interceptor);
    }

    /// Names of the installed interceptors, in run order
    pub fn interceptor_names(&self) -> Vec<&'static str> {
        self.interceptors.iter().map(|i| i.name()).collect()
    }

    /// Run one test against the application
    pub fn run_test(&self, app: &mut A, item: &TestItem<A>) -> TestReport {
        let span = tracing::info_span!("test", name = item.name());
        let _enter = span.enter();
        let start = Instant::now();

        let mut phases = vec![TestPhase::Idle];
        if let Err(e) = self.check_markers(item) {
            tracing::warn!(error = %e, "Test setup failed");
            return self.report(item, Outcome::SetupError(e.to_string()), phases, Vec::new(), start);
        }

        let mut request = FixtureRequest::new(item, app);

        for interceptor in &self.interceptors {
            let setup = panic::catch_unwind(AssertUnwindSafe(|| interceptor.setup(&mut request)))
                .unwrap_or_else(|payload| Err(Error::Panicked(panic_message(payload.as_ref()))));
            match setup {
                Ok(Some(phase)) => phases.push(phase),
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(interceptor = interceptor.name(), error = %e, "Test setup failed");
                    let teardown_errors = request.finish();
                    close_context(&mut phases, false);
                    return self.report(
                        item,
                        Outcome::SetupError(e.to_string()),
                        phases,
                        teardown_errors,
                        start,
                    );
                }
            }
        }

        phases.push(TestPhase::Running);
        tracing::debug!("Running test body");

        let body = item.body();
        let outcome = match panic::catch_unwind(AssertUnwindSafe(|| body(&mut request))) {
            Ok(Ok(())) => Outcome::Passed,
            Ok(Err(e)) => Outcome::Failed(e.to_string()),
            Err(payload) => Outcome::Failed(Error::Panicked(panic_message(payload.as_ref())).to_string()),
        };

        let teardown_errors = request.finish();
        close_context(&mut phases, outcome.is_passed());
        self.report(item, outcome, phases, teardown_errors, start)
    }

    /// Run tests one after another against the same application
    pub fn run_session(&self, app: &mut A, items: &[TestItem<A>]) -> SessionSummary {
        let start = Instant::now();
        let reports = items.iter().map(|item| self.run_test(app, item)).collect();
        let summary = SessionSummary {
            reports,
            duration: start.elapsed(),
        };

        tracing::info!(
            passed = summary.passed(),
            failed = summary.failed(),
            errors = summary.errors(),
            "Test session finished"
        );
        summary
    }

    fn check_markers(&self, item: &TestItem<A>) -> Result<(), Error> {
        if !self.options.strict_markers {
            return Ok(());
        }
        match item.markers().iter().find(|m| !self.markers.contains(m.name())) {
            Some(marker) => Err(Error::UnknownMarker(marker.name().to_string())),
            None => Ok(()),
        }
    }

    fn report(
        &self,
        item: &TestItem<A>,
        outcome: Outcome,
        phases: Vec<TestPhase>,
        teardown_errors: Vec<TeardownError>,
        start: Instant,
    ) -> TestReport {
        tracing::debug!(outcome = ?outcome, "Test finished");
        TestReport {
            name: item.name().to_string(),
            outcome,
            phases,
            teardown_errors,
            duration: start.elapsed(),
        }
    }
}

/// Record the terminal phase if a context was ever activated
fn close_context(phases: &mut Vec<TestPhase>, success: bool) {
    if phases.contains(&TestPhase::ContextActive) {
        phases.push(TestPhase::ContextInactive { success });
    }
}

/// Text of a caught panic payload
fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panic_message_variants() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");

        let payload: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(payload.as_ref()), "bang");

        let payload: Box<dyn Any + Send> = Box::new(7_u8);
        assert_eq!(panic_message(payload.as_ref()), "non-string panic payload");
    }

    #[test]
    fn test_close_context_only_after_activation() {
        let mut phases = vec![TestPhase::Idle, TestPhase::Running];
        close_context(&mut phases, true);
        assert_eq!(phases.len(), 2);

        let mut phases = vec![TestPhase::Idle, TestPhase::ContextActive];
        close_context(&mut phases, false);
        assert_eq!(phases.last(), Some(&TestPhase::ContextInactive { success: false }));
    }

    #[test]
    fn test_summary_counts() {
        let report = |outcome| TestReport {
            name: "t".to_string(),
            outcome,
            phases: Vec::new(),
            teardown_errors: Vec::new(),
            duration: Duration::ZERO,
        };
        let summary = SessionSummary {
            reports: vec![
                report(Outcome::Passed),
                report(Outcome::Failed("x".to_string())),
                report(Outcome::SetupError("y".to_string())),
            ],
            duration: Duration::ZERO,
        };
        assert_eq!(summary.passed(), 1);
        assert_eq!(summary.failed(), 1);
        assert_eq!(summary.errors(), 1);
        assert!(!summary.is_success());
    }
}
