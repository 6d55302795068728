//! Terminal rendering of test reports

use colored::Colorize;

use crate::harness::{Outcome, SessionSummary, TestReport};

/// One line per test, plus indented teardown failures
pub fn render_report(report: &TestReport) -> String {
    let mut out = match &report.outcome {
        Outcome::Passed => format!("  {} {}", "✓".green(), report.name),
        Outcome::Failed(reason) => format!("  {} {}: {}", "✗".red(), report.name, reason),
        Outcome::SetupError(reason) => {
            format!("  {} {} (setup error): {}", "E".yellow().bold(), report.name, reason)
        }
    };

    for teardown in &report.teardown_errors {
        out.push_str(&format!(
            "\n      {} teardown '{}' failed: {}",
            "!".yellow(),
            teardown.finalizer,
            teardown.message
        ));
    }

    out
}

/// Closing summary line, e.g. `2 passed, 1 failed in 0.01s`
pub fn render_summary(summary: &SessionSummary) -> String {
    let mut parts = vec![format!("{} passed", summary.passed())];
    if summary.failed() > 0 {
        parts.push(format!("{} failed", summary.failed()));
    }
    if summary.errors() > 0 {
        parts.push(format!("{} errors", summary.errors()));
    }
    if summary.teardown_errors() > 0 {
        parts.push(format!("{} teardown errors", summary.teardown_errors()));
    }

    let line = format!(
        "{} in {:.2}s",
        parts.join(", "),
        summary.duration.as_secs_f64()
    );

    if summary.is_success() {
        line.green().bold().to_string()
    } else {
        line.red().bold().to_string()
    }
}

/// Print every report followed by the summary
pub fn print_session(summary: &SessionSummary) {
    println!("\n{}", "Running Tests:".blue().bold());
    for report in &summary.reports {
        println!("{}", render_report(report));
    }
    println!("\n{}\n", render_summary(summary));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harness::TeardownError;
    use std::time::Duration;

    fn report(outcome: Outcome) -> TestReport {
        TestReport {
            name: "test_ping".to_string(),
            outcome,
            phases: Vec::new(),
            teardown_errors: Vec::new(),
            duration: Duration::ZERO,
        }
    }

    #[test]
    fn test_render_failed_report() {
        let line = render_report(&report(Outcome::Failed("expected 200".to_string())));
        assert!(line.contains("test_ping: expected 200"));
    }

    #[test]
    fn test_render_teardown_errors() {
        let mut r = report(Outcome::Passed);
        r.teardown_errors.push(TeardownError {
            finalizer: "pop_request_context",
            message: "boom".to_string(),
        });
        let text = render_report(&r);
        assert!(text.contains("teardown 'pop_request_context' failed: boom"));
    }

    #[test]
    fn test_render_summary_counts() {
        let summary = SessionSummary {
            reports: vec![
                report(Outcome::Passed),
                report(Outcome::SetupError("no context".to_string())),
            ],
            duration: Duration::ZERO,
        };
        let line = render_summary(&summary);
        assert!(line.contains("1 passed, 1 errors in 0.00s"));
    }
}
