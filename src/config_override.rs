//! Per-test configuration overrides from the `app` marker
//!
//! ```text
//! TestItem::new("test_something", body)
//!     .fixture("app")
//!     .marker(Marker::new("app").kwarg("debug", false))
//! ```
//!
//! Before the body runs, `DEBUG` is set to `false` in the application config.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::app::Application;
use crate::common::Result;
use crate::harness::Marker;

/// Options declared on a test through the `app` marker
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppOptions(BTreeMap<String, Value>);

impl AppOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge the keyword arguments of the given markers
    ///
    /// A key set by a later marker replaces the same key from an earlier one.
    /// `None` when there are no markers at all.
    pub fn from_markers<'m>(markers: impl IntoIterator<Item = &'m Marker>) -> Option<Self> {
        markers.into_iter().fold(None, |merged, marker| {
            let mut options: Self = merged.unwrap_or_default();
            for (key, value) in marker.kwargs() {
                options.0.insert(key.clone(), value.clone());
            }
            Some(options)
        })
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }
}

/// Write every option into the application config under its upper-cased key
///
/// Values are passed through untouched; the application decides whether
/// they are acceptable.
pub fn apply<A>(app: &mut A, options: Option<&AppOptions>) -> Result<()>
where
    A: Application + ?Sized,
{
    let Some(options) = options else {
        return Ok(());
    };

    for (key, value) in options.iter() {
        let key = key.to_uppercase();
        tracing::debug!(key = %key, value = %value, "Applying config override");
        app.set_config(&key, value.clone())?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Error;
    use crate::testing::MemoryApp;
    use serde_json::json;

    #[test]
    fn test_absent_options_are_noop() {
        let mut app = MemoryApp::new("cfg").with_config("DEBUG", json!(true));
        let before = app.config().clone();
        apply(&mut app, None).unwrap();
        assert_eq!(app.config(), &before);
    }

    #[test]
    fn test_keys_are_uppercased_and_override() {
        let mut app = MemoryApp::new("cfg").with_config("DEBUG", json!(true));
        let options = AppOptions::new()
            .with("debug", false)
            .with("secret_key", "s3cret");

        apply(&mut app, Some(&options)).unwrap();

        assert_eq!(app.config().get("DEBUG"), Some(&json!(false)));
        assert_eq!(app.config().get("SECRET_KEY"), Some(&json!("s3cret")));
        assert!(!app.config().contains_key("debug"));
    }

    #[test]
    fn test_from_markers_merges_later_wins() {
        let first = Marker::new("app").kwarg("testing", true).kwarg("debug", true);
        let second = Marker::new("app").kwarg("debug", false);

        let options = AppOptions::from_markers([&first, &second]).unwrap();

        assert_eq!(
            options,
            AppOptions::new().with("testing", true).with("debug", false)
        );
        assert!(AppOptions::from_markers(std::iter::empty::<&Marker>()).is_none());
    }

    #[test]
    fn test_application_rejection_propagates() {
        let mut app = MemoryApp::new("cfg").reject_config_key("SERVER_NAME");
        let options = AppOptions::new().with("server_name", 42);
        let err = apply(&mut app, Some(&options)).unwrap_err();
        assert!(matches!(err, Error::ConfigRejected { .. }));
    }
}
