//! Building matching predicates from examples.

use serde_json::{Map, Value as JsonValue};

use crate::error::AppError;
use crate::graph::Params;
use crate::mapping::{EntityDescriptor, MappingContext, PropertyPath};
use crate::query::example::{Example, MatchMode, NullHandler, StringMatcher};

/// Comparison applied by a single [`Condition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Equals,
    StartsWith,
    EndsWith,
    Contains,
    Matches,
    IsNull,
}

impl From<StringMatcher> for Operator {
    fn from(matcher: StringMatcher) -> Self {
        match matcher {
            StringMatcher::Default | StringMatcher::Exact => Operator::Equals,
            StringMatcher::Starting => Operator::StartsWith,
            StringMatcher::Ending => Operator::EndsWith,
            StringMatcher::Containing => Operator::Contains,
            StringMatcher::Regex => Operator::Matches,
        }
    }
}

/// One term of a predicate: `property <operator> $parameter`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition {
    /// Domain path of the probe field.
    pub path: PropertyPath,
    /// Node property the path is stored in.
    pub property: String,
    pub operator: Operator,
    /// Bound parameter name; `None` for [`Operator::IsNull`].
    pub parameter: Option<String>,
    pub ignore_case: bool,
}

/// Conditions derived from an example, combined with AND (or OR for
/// [`MatchMode::Any`]), plus the values they bind.
///
/// An empty predicate matches every node carrying the entity's labels.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchingPredicate {
    entity: String,
    labels: Vec<String>,
    mode: MatchMode,
    conditions: Vec<Condition>,
    parameters: Params,
}

impl MatchingPredicate {
    /// Translates `example` into conditions using `mapping`.
    ///
    /// # Errors
    ///
    /// - [`AppError::UnknownEntity`] if the example's entity is not mapped
    /// - [`AppError::MappingResolution`] if a set probe field is not mapped
    /// - [`AppError::InvalidExample`] if a composite field holds a scalar
    pub fn create<T>(mapping: &dyn MappingContext, example: &Example<T>) -> Result<Self, AppError> {
        let descriptor = mapping.describe(example.entity())?;
        let mut builder = Builder {
            mapping,
            example,
            conditions: Vec::new(),
            parameters: Params::new(),
        };
        builder.walk(descriptor, &PropertyPath::root(""), "", example.probe())?;

        tracing::debug!(
            "Built predicate for {} with {} condition(s)",
            example.entity(),
            builder.conditions.len()
        );

        Ok(Self {
            entity: example.entity().to_string(),
            labels: descriptor.labels(),
            mode: example.matcher().mode(),
            conditions: builder.conditions,
            parameters: builder.parameters,
        })
    }

    pub fn entity(&self) -> &str {
        &self.entity
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn mode(&self) -> MatchMode {
        self.mode
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn parameters(&self) -> &Params {
        &self.parameters
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }
}

struct Builder<'a, T> {
    mapping: &'a dyn MappingContext,
    example: &'a Example<T>,
    conditions: Vec<Condition>,
    parameters: Params,
}

impl<T> Builder<'_, T> {
    fn walk(
        &mut self,
        descriptor: &EntityDescriptor,
        prefix: &PropertyPath,
        graph_prefix: &str,
        object: &Map<String, JsonValue>,
    ) -> Result<(), AppError> {
        let mapping = self.mapping;
        let example = self.example;
        let matcher = example.matcher();

        for (field, value) in object {
            let path = prefix.child(field);
            if matcher.is_ignored(&path) {
                tracing::debug!("Skipping ignored probe field {}", path);
                continue;
            }

            let property = descriptor
                .property(field)
                .ok_or_else(|| AppError::MappingResolution {
                    entity: self.example.entity().to_string(),
                    path: path.to_string(),
                })?;
            let graph_name = format!("{}{}", graph_prefix, property.graph_name());

            match (value, &property.composite) {
                (JsonValue::Null, Some(_)) => {
                    tracing::debug!("Skipping unset composite {}", path);
                }
                (JsonValue::Null, None) => match matcher.null_handler() {
                    NullHandler::Ignore => tracing::debug!("Skipping null probe field {}", path),
                    NullHandler::Include => self.conditions.push(Condition {
                        path,
                        property: graph_name,
                        operator: Operator::IsNull,
                        parameter: None,
                        ignore_case: false,
                    }),
                },
                (JsonValue::Object(nested), Some(composite)) => {
                    let nested_descriptor = mapping.describe(composite)?;
                    self.walk(nested_descriptor, &path, &format!("{}.", graph_name), nested)?;
                }
                (other, Some(_)) => {
                    return Err(AppError::InvalidExample(format!(
                        "{} of {} is composite but the probe holds {}",
                        path,
                        self.example.entity(),
                        other
                    )))
                }
                (JsonValue::String(text), None) => {
                    let string_matcher = matcher.string_matcher_for(&path);
                    let ignore_case = matcher.ignore_case_for(&path);
                    let operator = Operator::from(string_matcher);

                    // Regex carries case-insensitivity inline.
                    let (value, ignore_case) = match operator {
                        Operator::Matches if ignore_case => (format!("(?i){}", text), false),
                        _ => (text.clone(), ignore_case),
                    };
                    self.push(path, graph_name, operator, JsonValue::String(value), ignore_case);
                }
                (other, None) => {
                    self.push(path, graph_name, Operator::Equals, other.clone(), false);
                }
            }
        }
        Ok(())
    }

    fn push(
        &mut self,
        path: PropertyPath,
        property: String,
        operator: Operator,
        value: JsonValue,
        ignore_case: bool,
    ) {
        let parameter = self.parameter_name(&path);
        self.parameters.insert(parameter.clone(), value);
        self.conditions.push(Condition {
            path,
            property,
            operator,
            parameter: Some(parameter),
            ignore_case,
        });
    }

    /// Derives a unique parameter name from the dotted path.
    fn parameter_name(&self, path: &PropertyPath) -> String {
        let base: String = path
            .to_dot_path()
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();

        let mut candidate = base.clone();
        let mut suffix = 1;
        while self.parameters.contains_key(&candidate) {
            candidate = format!("{}_{}", base, suffix);
            suffix += 1;
        }
        candidate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::{PropertyDescriptor, SchemaMappingContext};
    use crate::query::example::{ExampleMatcher, PropertySpecifier};
    use serde_json::json;

    fn mapping() -> SchemaMappingContext {
        SchemaMappingContext::new([
            EntityDescriptor::new("Person")
                .with_property(PropertyDescriptor::simple("firstName"))
                .with_property(PropertyDescriptor::simple("lastName").stored_as("last_name"))
                .with_property(PropertyDescriptor::simple("age"))
                .with_property(PropertyDescriptor::simple("address_city"))
                .with_property(PropertyDescriptor::composite("address", "Address")),
            EntityDescriptor::new("Address").with_property(PropertyDescriptor::simple("city")),
        ])
        .unwrap()
    }

    fn create(probe: JsonValue, matcher: ExampleMatcher) -> Result<MatchingPredicate, AppError> {
        let example = Example::dynamic("Person", probe, matcher)?;
        MatchingPredicate::create(&mapping(), &example)
    }

    #[test]
    fn test_ignored_field_produces_no_condition() {
        let predicate = create(
            json!({"firstName": "John", "lastName": "Smith"}),
            ExampleMatcher::default().with_ignore_paths(["firstName"]),
        )
        .unwrap();

        assert_eq!(predicate.conditions().len(), 1);
        let condition = &predicate.conditions()[0];
        assert_eq!(condition.path, PropertyPath::parse("lastName"));
        assert_eq!(condition.property, "last_name");
        assert_eq!(condition.operator, Operator::Equals);
        let parameter = condition.parameter.as_ref().unwrap();
        assert_eq!(predicate.parameters()[parameter], json!("Smith"));
        assert!(predicate
            .conditions()
            .iter()
            .all(|c| c.path.to_dot_path() != "firstName"));
    }

    #[test]
    fn test_empty_probe_matches_all() {
        let predicate = create(json!({"lastName": null}), ExampleMatcher::default()).unwrap();
        assert!(predicate.is_empty());
        assert!(predicate.parameters().is_empty());
        assert_eq!(predicate.labels(), ["Person".to_string()]);
    }

    #[test]
    fn test_unknown_field_fails_eagerly() {
        let err = create(json!({"nickname": "Jo"}), ExampleMatcher::default()).unwrap_err();
        assert!(matches!(err, AppError::MappingResolution { ref path, .. } if path == "nickname"));
    }

    #[test]
    fn test_ignored_unknown_field_is_not_an_error() {
        let predicate = create(
            json!({"nickname": "Jo"}),
            ExampleMatcher::default().with_ignore_paths(["nickname"]),
        )
        .unwrap();
        assert!(predicate.is_empty());
    }

    #[test]
    fn test_include_nulls_builds_is_null() {
        let predicate = create(
            json!({"firstName": null}),
            ExampleMatcher::default().with_include_null_values(),
        )
        .unwrap();
        assert_eq!(predicate.conditions()[0].operator, Operator::IsNull);
        assert_eq!(predicate.conditions()[0].parameter, None);
        assert!(predicate.parameters().is_empty());
    }

    #[test]
    fn test_composite_recurses_with_unique_parameters() {
        let predicate = create(
            json!({"address": {"city": "London"}, "address_city": "Paris"}),
            ExampleMatcher::default(),
        )
        .unwrap();

        let names: Vec<_> = predicate
            .conditions()
            .iter()
            .map(|c| c.parameter.clone().unwrap())
            .collect();
        assert_eq!(names.len(), 2);
        assert_ne!(names[0], names[1]);
        for name in &names {
            assert!(predicate.parameters().contains_key(name));
        }
        let nested = predicate
            .conditions()
            .iter()
            .find(|c| c.path.to_dot_path() == "address.city")
            .unwrap();
        assert_eq!(nested.property, "address.city");
    }

    #[test]
    fn test_composite_with_scalar_is_invalid() {
        let err = create(json!({"address": "London"}), ExampleMatcher::default()).unwrap_err();
        assert!(matches!(err, AppError::InvalidExample(_)));
    }

    #[test]
    fn test_string_matchers_and_case() {
        let predicate = create(
            json!({"firstName": "jo", "lastName": "^Sm", "age": 42}),
            ExampleMatcher::default()
                .with_string_matcher(StringMatcher::Starting)
                .with_ignore_case(true)
                .with_matcher("lastName", PropertySpecifier::matcher(StringMatcher::Regex)),
        )
        .unwrap();

        let by_path = |p: &str| {
            predicate
                .conditions()
                .iter()
                .find(|c| c.path.to_dot_path() == p)
                .unwrap()
                .clone()
        };

        let first = by_path("firstName");
        assert_eq!(first.operator, Operator::StartsWith);
        assert!(first.ignore_case);

        let last = by_path("lastName");
        assert_eq!(last.operator, Operator::Matches);
        assert!(!last.ignore_case);
        assert_eq!(
            predicate.parameters()[last.parameter.as_ref().unwrap()],
            json!("(?i)^Sm")
        );

        let age = by_path("age");
        assert_eq!(age.operator, Operator::Equals);
        assert!(!age.ignore_case);
    }

    #[test]
    fn test_any_mode_is_carried() {
        let predicate = create(json!({"age": 1}), ExampleMatcher::matching_any()).unwrap();
        assert_eq!(predicate.mode(), MatchMode::Any);
    }
}
