//! Dotted property paths.

use std::fmt;

/// A mapped property identified by its dot-separated path, e.g.
/// `address.city`.
///
/// Paths are independent of the type that declares them: two paths are equal
/// when their dotted forms are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PropertyPath(String);

impl PropertyPath {
    /// Parses a dotted path. Empty segments are dropped.
    pub fn parse(path: &str) -> Self {
        Self(
            path.split('.')
                .filter(|segment| !segment.is_empty())
                .collect::<Vec<_>>()
                .join("."),
        )
    }

    /// A path of a single segment.
    pub fn root(segment: &str) -> Self {
        Self(segment.to_string())
    }

    /// Returns the path of `segment` nested below this one.
    pub fn child(&self, segment: &str) -> Self {
        if self.0.is_empty() {
            Self::root(segment)
        } else {
            Self(format!("{}.{}", self.0, segment))
        }
    }

    /// Iterates over the path's segments.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('.').filter(|segment| !segment.is_empty())
    }

    /// The last segment, i.e. the property's own name.
    pub fn leaf(&self) -> &str {
        self.0.rsplit('.').next().unwrap_or_default()
    }

    pub fn to_dot_path(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PropertyPath {
    fn from(path: &str) -> Self {
        Self::parse(path)
    }
}
