//! Example probes and their matching options.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::AppError;
use crate::mapping::{Entity, PropertyPath};

/// How string values of a probe are compared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StringMatcher {
    #[default]
    Default,
    Exact,
    Starting,
    Ending,
    Containing,
    Regex,
}

impl FromStr for StringMatcher {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "default" => Ok(Self::Default),
            "exact" => Ok(Self::Exact),
            "starting" => Ok(Self::Starting),
            "ending" => Ok(Self::Ending),
            "containing" => Ok(Self::Containing),
            "regex" => Ok(Self::Regex),
            other => Err(AppError::InvalidExample(format!(
                "unknown string matcher '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for StringMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Default => "default",
            Self::Exact => "exact",
            Self::Starting => "starting",
            Self::Ending => "ending",
            Self::Containing => "containing",
            Self::Regex => "regex",
        };
        f.write_str(name)
    }
}

/// What to do with probe fields that are `null`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum NullHandler {
    #[default]
    Ignore,
    Include,
}

/// How the conditions of an example are combined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum MatchMode {
    #[default]
    All,
    Any,
}

/// Per-path overrides of the matcher-wide string options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PropertySpecifier {
    pub string_matcher: Option<StringMatcher>,
    pub ignore_case: Option<bool>,
}

impl PropertySpecifier {
    pub fn matcher(string_matcher: StringMatcher) -> Self {
        Self {
            string_matcher: Some(string_matcher),
            ignore_case: None,
        }
    }

    pub fn ignore_case(mut self, ignore_case: bool) -> Self {
        self.ignore_case = Some(ignore_case);
        self
    }
}

/// Options controlling how an example's probe is turned into conditions.
///
/// Built by value; every `with_*` call returns the updated matcher.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExampleMatcher {
    mode: MatchMode,
    null_handler: NullHandler,
    string_matcher: StringMatcher,
    ignore_case: bool,
    ignored_paths: BTreeSet<PropertyPath>,
    specifiers: BTreeMap<PropertyPath, PropertySpecifier>,
}

impl ExampleMatcher {
    /// All conditions must hold.
    pub fn matching_all() -> Self {
        Self::default()
    }

    /// Any condition may hold.
    pub fn matching_any() -> Self {
        Self {
            mode: MatchMode::Any,
            ..Self::default()
        }
    }

    pub fn with_ignore_paths<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.ignored_paths
            .extend(paths.into_iter().map(|p| PropertyPath::parse(p.as_ref())));
        self
    }

    pub fn with_null_handler(mut self, null_handler: NullHandler) -> Self {
        self.null_handler = null_handler;
        self
    }

    pub fn with_include_null_values(self) -> Self {
        self.with_null_handler(NullHandler::Include)
    }

    pub fn with_string_matcher(mut self, string_matcher: StringMatcher) -> Self {
        self.string_matcher = string_matcher;
        self
    }

    pub fn with_ignore_case(mut self, ignore_case: bool) -> Self {
        self.ignore_case = ignore_case;
        self
    }

    /// Overrides string matching for a single path.
    pub fn with_matcher(mut self, path: &str, specifier: PropertySpecifier) -> Self {
        self.specifiers.insert(PropertyPath::parse(path), specifier);
        self
    }

    pub fn mode(&self) -> MatchMode {
        self.mode
    }

    pub fn null_handler(&self) -> NullHandler {
        self.null_handler
    }

    pub fn is_ignored(&self, path: &PropertyPath) -> bool {
        self.ignored_paths.contains(path)
    }

    pub fn string_matcher_for(&self, path: &PropertyPath) -> StringMatcher {
        self.specifiers
            .get(path)
            .and_then(|s| s.string_matcher)
            .unwrap_or(self.string_matcher)
    }

    pub fn ignore_case_for(&self, path: &PropertyPath) -> bool {
        self.specifiers
            .get(path)
            .and_then(|s| s.ignore_case)
            .unwrap_or(self.ignore_case)
    }
}

/// A probe of entity type `T` plus the options used to match it.
///
/// The probe is captured as a JSON object when the example is built; fields
/// that serialize to `null` are unset unless the matcher includes nulls.
/// Examples are immutable.
pub struct Example<T> {
    entity: String,
    probe: serde_json::Map<String, JsonValue>,
    matcher: ExampleMatcher,
    _type: PhantomData<fn() -> T>,
}

impl<T> fmt::Debug for Example<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Example")
            .field("entity", &self.entity)
            .field("probe", &self.probe)
            .field("matcher", &self.matcher)
            .finish()
    }
}

impl<T> Clone for Example<T> {
    fn clone(&self) -> Self {
        Self {
            entity: self.entity.clone(),
            probe: self.probe.clone(),
            matcher: self.matcher.clone(),
            _type: PhantomData,
        }
    }
}

impl<T: Entity> Example<T> {
    /// Creates an example matching every set field of `probe` exactly.
    pub fn of(probe: &T) -> Result<Self, AppError> {
        Self::with_matcher(probe, ExampleMatcher::default())
    }

    pub fn with_matcher(probe: &T, matcher: ExampleMatcher) -> Result<Self, AppError> {
        let value = serde_json::to_value(probe)
            .map_err(|e| AppError::InvalidExample(format!("{}: {}", T::ENTITY, e)))?;
        Self::from_value(T::ENTITY, value, matcher)
    }
}

impl Example<JsonValue> {
    /// Creates an untyped example for `entity` from a JSON object.
    pub fn dynamic(entity: &str, probe: JsonValue, matcher: ExampleMatcher) -> Result<Self, AppError> {
        Self::from_value(entity, probe, matcher)
    }
}

impl<T> Example<T> {
    fn from_value(entity: &str, probe: JsonValue, matcher: ExampleMatcher) -> Result<Self, AppError> {
        match probe {
            JsonValue::Object(probe) => Ok(Self {
                entity: entity.to_string(),
                probe,
                matcher,
                _type: PhantomData,
            }),
            other => Err(AppError::InvalidExample(format!(
                "probe for {} must be an object, got {}",
                entity, other
            ))),
        }
    }

    pub fn entity(&self) -> &str {
        &self.entity
    }

    pub fn probe(&self) -> &serde_json::Map<String, JsonValue> {
        &self.probe
    }

    pub fn matcher(&self) -> &ExampleMatcher {
        &self.matcher
    }
}
