//! Execution context activation around a test
//!
//! A [`ContextScope`] owns one pushed context. It pops it on
//! [`ContextScope::exit`], or on drop if the scope is abandoned mid-test
//! (panic, cancellation). Either way the pop happens exactly once.

use crate::app::Application;
use crate::common::Result;

/// A resource that makes application-global accessors (URL building,
/// session, request-local data) behave as if a request were being served
pub trait ExecutionContext {
    /// Activate the context
    fn push(&mut self) -> Result<()>;

    /// Deactivate the context
    fn pop(&mut self) -> Result<()>;
}

/// An activated context awaiting deactivation
#[must_use = "dropping the scope pops the context immediately"]
#[derive(Debug)]
pub struct ContextScope<C: ExecutionContext> {
    ctx: Option<C>,
}

impl<C: ExecutionContext> ContextScope<C> {
    /// Create a context from the application and push it
    ///
    /// Nothing needs undoing if this fails: a context that never pushed is
    /// simply dropped.
    pub fn enter<A>(app: &A) -> Result<Self>
    where
        A: Application<Context = C> + ?Sized,
    {
        let mut ctx = app.test_request_context()?;
        ctx.push()?;
        tracing::debug!("Execution context pushed");
        Ok(Self { ctx: Some(ctx) })
    }

    /// Pop the context
    pub fn exit(mut self) -> Result<()> {
        match self.ctx.take() {
            Some(mut ctx) => {
                ctx.pop()?;
                tracing::debug!("Execution context popped");
                Ok(())
            }
            None => Ok(()),
        }
    }

    /// The active context
    pub fn context(&self) -> Option<&C> {
        self.ctx.as_ref()
    }
}

impl<C: ExecutionContext> Drop for ContextScope<C> {
    fn drop(&mut self) {
        if let Some(mut ctx) = self.ctx.take() {
            match ctx.pop() {
                Ok(()) => tracing::debug!("Execution context popped on drop"),
                Err(e) => tracing::warn!(error = %e, "Failed to pop execution context on drop"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryApp;

    #[test]
    fn test_enter_then_exit() {
        let app = MemoryApp::new("ctx");
        let scope = ContextScope::enter(&app).unwrap();
        assert!(app.has_request_context());
        assert!(scope.context().is_some());

        scope.exit().unwrap();
        assert!(!app.has_request_context());
        assert_eq!(app.context_pushes(), 1);
        assert_eq!(app.context_pops(), 1);
    }

    #[test]
    fn test_drop_pops_once() {
        let app = MemoryApp::new("ctx");
        {
            let _scope = ContextScope::enter(&app).unwrap();
            assert!(app.has_request_context());
        }
        assert!(!app.has_request_context());
        assert_eq!(app.context_pops(), 1);
    }

    #[test]
    fn test_failed_enter_schedules_nothing() {
        let app = MemoryApp::new("ctx").failing_context();
        assert!(ContextScope::enter(&app).is_err());
        assert_eq!(app.context_pushes(), 0);
        assert_eq!(app.context_pops(), 0);
    }

    #[test]
    fn test_failed_exit_is_not_retried_on_drop() {
        let app = MemoryApp::new("ctx").failing_pop();
        let scope = ContextScope::enter(&app).unwrap();
        assert!(scope.exit().is_err());
        assert_eq!(app.context_pops(), 1);
    }
}
