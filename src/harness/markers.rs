//! Marker vocabulary recognized by the harness
//!
//! Markers are registered with ini-style lines, `name(args): description`,
//! so the same text can come from code or from `app-harness.toml`.

use std::collections::BTreeMap;

use super::APP_MARKER;

/// Registration line for the built-in `app` marker
pub const APP_MARKER_LINE: &str = "app(options): pass options to your application factory";

/// A registered marker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerSpec {
    /// Bare name, e.g. `app`
    pub name: String,
    /// Name plus argument hint, e.g. `app(options)`
    pub signature: String,
    pub description: String,
}

impl MarkerSpec {
    /// Parse a `name(args): description` line
    ///
    /// Returns `None` for a line without a usable name.
    pub fn parse(line: &str) -> Option<Self> {
        let (signature, description) = match line.split_once(':') {
            Some((sig, desc)) => (sig.trim(), desc.trim()),
            None => (line.trim(), ""),
        };

        let name = signature
            .split_once('(')
            .map(|(name, _)| name)
            .unwrap_or(signature)
            .trim();

        if name.is_empty() || !name.chars().all(|c| c.is_alphanumeric() || c == '_') {
            return None;
        }

        Some(Self {
            name: name.to_string(),
            signature: signature.to_string(),
            description: description.to_string(),
        })
    }
}

/// Known markers, keyed by name
#[derive(Debug, Clone, Default)]
pub struct MarkerRegistry {
    markers: BTreeMap<String, MarkerSpec>,
}

impl MarkerRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the built-in `app` marker
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register_line(APP_MARKER_LINE);
        registry
    }

    /// Register a marker from a `name(args): description` line
    ///
    /// Returns false and logs a warning for an unparsable line. A later
    /// registration of the same name replaces the earlier one.
    pub fn register_line(&mut self, line: &str) -> bool {
        match MarkerSpec::parse(line) {
            Some(spec) => {
                tracing::trace!(marker = %spec.name, "Marker registered");
                self.markers.insert(spec.name.clone(), spec);
                true
            }
            None => {
                tracing::warn!(line = %line, "Ignoring invalid marker registration");
                false
            }
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.markers.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&MarkerSpec> {
        self.markers.get(name)
    }

    /// Registered markers in name order
    pub fn iter(&self) -> impl Iterator<Item = &MarkerSpec> {
        self.markers.values()
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    /// Whether the built-in `app` marker is present
    pub fn has_app_marker(&self) -> bool {
        self.contains(APP_MARKER)
    }
}
