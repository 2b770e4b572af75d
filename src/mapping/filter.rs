//! Projection filtering by property path.

use std::collections::HashSet;
use std::sync::Arc;

use crate::mapping::path::PropertyPath;

/// Decides whether a mapped property is part of a query's projection.
///
/// A filter built without a property set accepts every path. A filter built
/// from a set owns its own copy of that set; later changes to the caller's
/// collection have no effect.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PropertyFilter {
    #[default]
    AcceptAll,
    Only(Arc<HashSet<String>>),
}

impl PropertyFilter {
    pub fn accept_all() -> Self {
        Self::AcceptAll
    }

    /// Builds a filter accepting exactly the given dotted paths.
    pub fn only<I, S>(properties: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Only(Arc::new(properties.into_iter().map(Into::into).collect()))
    }

    /// Builds a filter from an optional property set; `None` accepts all.
    pub fn from_properties(properties: Option<&HashSet<String>>) -> Self {
        match properties {
            Some(properties) => Self::only(properties.iter().cloned()),
            None => Self::AcceptAll,
        }
    }

    pub fn includes(&self, path: &PropertyPath) -> bool {
        match self {
            Self::AcceptAll => true,
            Self::Only(properties) => properties.contains(path.to_dot_path()),
        }
    }

    pub fn is_restricted(&self) -> bool {
        matches!(self, Self::Only(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accept_all_includes_deep_paths() {
        let filter = PropertyFilter::from_properties(None);
        assert!(filter.includes(&PropertyPath::parse("name")));
        assert!(filter.includes(&PropertyPath::parse("a.b.c.d.e.f")));
        assert!(!filter.is_restricted());
    }

    #[test]
    fn test_only_matches_exact_dotted_form() {
        let filter = PropertyFilter::only(["name", "address.city"]);
        assert!(filter.includes(&PropertyPath::parse("name")));
        assert!(filter.includes(&PropertyPath::parse("address.city")));
        assert!(!filter.includes(&PropertyPath::parse("address")));
        assert!(!filter.includes(&PropertyPath::parse("age")));
    }

    #[test]
    fn test_source_set_is_copied() {
        let mut source: HashSet<String> = ["name".to_string()].into_iter().collect();
        let filter = PropertyFilter::from_properties(Some(&source));

        source.insert("age".to_string());
        source.remove("name");

        assert!(filter.includes(&PropertyPath::parse("name")));
        assert!(!filter.includes(&PropertyPath::parse("age")));
    }

    #[test]
    fn test_filter_is_shareable_across_threads() {
        let filter = PropertyFilter::only(["name"]);
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let filter = filter.clone();
                std::thread::spawn(move || filter.includes(&PropertyPath::parse("name")))
            })
            .collect();
        for handle in handles {
            assert!(handle.join().unwrap());
        }
    }
}
