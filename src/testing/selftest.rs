//! Lifecycle checks run by `app-harness selftest`
//!
//! A short session against [`MemoryApp`] that touches every interceptor:
//! the JSON accessor, the request context, `app(...)` overrides and the
//! opt-in gate. After the session the application must be back in its
//! original state.

use serde_json::json;

use super::MemoryApp;
use crate::app::{Application, Request};
use crate::common::{Error, Result};
use crate::harness::{FixtureRequest, Harness, Marker, SessionSummary, TestItem};
use crate::response::{RawResponse, Response};

fn ensure(cond: bool, what: &str) -> Result<()> {
    if cond {
        Ok(())
    } else {
        Err(Error::TestAssertion(what.to_string()))
    }
}

fn app() -> MemoryApp {
    MemoryApp::new("selftest")
        .with_config("DEBUG", json!(true))
        .route("GET", "/ping", "ping", |_req| {
            RawResponse::json(200, &json!({"ping": "pong"}))
        })
}

fn items() -> Vec<TestItem<MemoryApp>> {
    vec![
        TestItem::new("json_accessor", |req: &mut FixtureRequest<'_, MemoryApp>| {
            let res = req.app()?.dispatch(&Request::get("/ping"))?;
            ensure(res.json()? == &json!({"ping": "pong"}), "decoded /ping body")
        })
        .fixture("app"),
        TestItem::new("request_context", |req: &mut FixtureRequest<'_, MemoryApp>| {
            let url = req.app()?.url_for("ping")?;
            ensure(url == "/ping", "url_for inside the request context")
        })
        .fixture("app"),
        TestItem::new("config_override", |req: &mut FixtureRequest<'_, MemoryApp>| {
            ensure(!req.app()?.debug(), "DEBUG overridden by app(debug=false)")
        })
        .fixture("app")
        .marker(Marker::new("app").kwarg("debug", false)),
        TestItem::new("opt_in_gate", |req: &mut FixtureRequest<'_, MemoryApp>| {
            ensure(req.app().is_err(), "app unavailable without the fixture")
        }),
    ]
}

/// Run the built-in checks, then verify the application was restored
pub fn run(harness: &Harness<MemoryApp>) -> Result<SessionSummary> {
    let mut app = app();
    let original = app.response_class();

    let summary = harness.run_session(&mut app, &items());

    ensure(
        app.response_class().ptr_eq(&original),
        "response class restored after the session",
    )?;
    ensure(
        !app.has_request_context() && app.context_pushes() == app.context_pops(),
        "every pushed context was popped",
    )?;
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harness::HarnessOptions;

    #[test]
    fn test_selftest_session_passes() {
        let summary = run(&Harness::new(HarnessOptions::default())).unwrap();
        assert_eq!(summary.reports.len(), 4);
        assert!(summary.is_success());
    }
}
