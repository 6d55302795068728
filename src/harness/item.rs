//! Test items: a body plus the fixtures and markers it declares

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde_json::Value;

use super::FixtureRequest;
use crate::app::Application;
use crate::common::Result;

/// Body of a test. Returning an error or panicking fails the test.
pub type TestBody<A> = Box<dyn Fn(&mut FixtureRequest<'_, A>) -> Result<()>>;

/// Declarative annotation attached to a test, e.g. `app(debug=false)`
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    name: String,
    kwargs: BTreeMap<String, Value>,
}

impl Marker {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kwargs: BTreeMap::new(),
        }
    }

    /// Add a keyword argument
    pub fn kwarg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.kwargs.insert(key.into(), value.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kwargs(&self) -> &BTreeMap<String, Value> {
        &self.kwargs
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        for (i, (key, value)) in self.kwargs.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}={}", key, value)?;
        }
        write!(f, ")")
    }
}

/// A single test as collected by the runner
pub struct TestItem<A: Application> {
    name: String,
    fixtures: BTreeSet<String>,
    markers: Vec<Marker>,
    body: TestBody<A>,
}

impl<A: Application> TestItem<A> {
    pub fn new(
        name: impl Into<String>,
        body: impl Fn(&mut FixtureRequest<'_, A>) -> Result<()> + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            fixtures: BTreeSet::new(),
            markers: Vec::new(),
            body: Box::new(body),
        }
    }

    /// Declare a fixture the test depends on
    pub fn fixture(mut self, name: impl Into<String>) -> Self {
        self.fixtures.insert(name.into());
        self
    }

    /// Attach a marker
    pub fn marker(mut self, marker: Marker) -> Self {
        self.markers.push(marker);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fixtures(&self) -> &BTreeSet<String> {
        &self.fixtures
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub(crate) fn body(&self) -> &TestBody<A> {
        &self.body
    }
}

impl<A: Application> fmt::Debug for TestItem<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestItem")
            .field("name", &self.name)
            .field("fixtures", &self.fixtures)
            .field("markers", &self.markers)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_display() {
        let marker = Marker::new("app").kwarg("debug", false).kwarg("name", "x");
        assert_eq!(marker.to_string(), "app(debug=false, name=\"x\")");
    }

    #[test]
    fn test_marker_without_kwargs() {
        assert_eq!(Marker::new("slow").to_string(), "slow()");
    }
}
