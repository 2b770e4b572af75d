//! Mapping between domain types and graph nodes.
//!
//! A [`MappingContext`] describes, per entity type, which node labels it is
//! stored under and which node properties its fields map to. Composite
//! properties (embedded values) are stored flattened on the owning node with
//! a dotted prefix, so `address.city` on a `Person` lives in the node
//! property `address.city`.
//!
//! # Example
//!
//! ```ignore
//! let mapping = SchemaMappingContext::new([
//!     EntityDescriptor::new("Person")
//!         .with_id("id")
//!         .with_property(PropertyDescriptor::simple("id"))
//!         .with_property(PropertyDescriptor::simple("lastName").stored_as("last_name"))
//!         .with_property(PropertyDescriptor::composite("address", "Address")),
//!     EntityDescriptor::new("Address")
//!         .with_property(PropertyDescriptor::simple("city")),
//! ])?;
//! ```

mod filter;
mod path;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

pub use filter::PropertyFilter;
pub use path::PropertyPath;

/// A domain type that can be used as a query-by-example probe.
///
/// `ENTITY` names the descriptor the type is registered under in the mapping
/// context. Probe fields are read through the type's `Serialize` impl, so
/// serde renames apply and `None` fields count as unset.
pub trait Entity: Serialize {
    const ENTITY: &'static str;
}

/// Mapping of one domain field to a node property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyDescriptor {
    /// Field name as it appears in the serialized domain value.
    pub name: String,
    /// Node property name, when different from the field name.
    #[serde(default)]
    pub graph_name: Option<String>,
    /// Entity descriptor of an embedded value stored on the same node.
    #[serde(default)]
    pub composite: Option<String>,
}

impl PropertyDescriptor {
    pub fn simple(name: &str) -> Self {
        Self {
            name: name.to_string(),
            graph_name: None,
            composite: None,
        }
    }

    pub fn composite(name: &str, entity: &str) -> Self {
        Self {
            name: name.to_string(),
            graph_name: None,
            composite: Some(entity.to_string()),
        }
    }

    /// Stores the field under a different node property name.
    pub fn stored_as(mut self, graph_name: &str) -> Self {
        self.graph_name = Some(graph_name.to_string());
        self
    }

    pub fn graph_name(&self) -> &str {
        self.graph_name.as_deref().unwrap_or(&self.name)
    }
}

/// Mapping of a domain type to a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityDescriptor {
    pub name: String,
    /// Node labels; the entity name is used when empty.
    #[serde(default)]
    pub labels: Vec<String>,
    /// Field always included in projections.
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub properties: Vec<PropertyDescriptor>,
}

impl EntityDescriptor {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            labels: Vec::new(),
            id: None,
            properties: Vec::new(),
        }
    }

    pub fn with_label(mut self, label: &str) -> Self {
        self.labels.push(label.to_string());
        self
    }

    pub fn with_id(mut self, field: &str) -> Self {
        self.id = Some(field.to_string());
        self
    }

    pub fn with_property(mut self, property: PropertyDescriptor) -> Self {
        self.properties.push(property);
        self
    }

    /// Node labels, falling back to the entity name.
    pub fn labels(&self) -> Vec<String> {
        if self.labels.is_empty() {
            vec![self.name.clone()]
        } else {
            self.labels.clone()
        }
    }

    pub fn property(&self, name: &str) -> Option<&PropertyDescriptor> {
        self.properties.iter().find(|p| p.name == name)
    }
}

/// A property path resolved to its node property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedProperty {
    pub path: PropertyPath,
    pub graph_name: String,
}

/// Describes how domain types map to graph nodes.
pub trait MappingContext: Send + Sync {
    /// Returns the descriptor registered for `entity`.
    ///
    /// # Errors
    ///
    /// [`AppError::UnknownEntity`] if no descriptor is registered.
    fn describe(&self, entity: &str) -> Result<&EntityDescriptor, AppError>;

    /// Resolves a (possibly nested) property path of `entity` to the simple
    /// node property it is stored in.
    ///
    /// # Errors
    ///
    /// [`AppError::MappingResolution`] if any segment is unmapped, if an
    /// inner segment is not composite, or if the path ends on a composite.
    fn resolve(&self, entity: &str, path: &PropertyPath) -> Result<ResolvedProperty, AppError> {
        let unresolved = || AppError::MappingResolution {
            entity: entity.to_string(),
            path: path.to_string(),
        };

        let mut descriptor = self.describe(entity)?;
        let mut graph_segments: Vec<&str> = Vec::new();
        let mut segments = path.segments().peekable();

        while let Some(segment) = segments.next() {
            let property = descriptor.property(segment).ok_or_else(unresolved)?;
            graph_segments.push(property.graph_name());

            match (&property.composite, segments.peek().is_some()) {
                (None, false) => {
                    return Ok(ResolvedProperty {
                        path: path.clone(),
                        graph_name: graph_segments.join("."),
                    })
                }
                (Some(composite), true) => descriptor = self.describe(composite)?,
                _ => return Err(unresolved()),
            }
        }

        Err(unresolved())
    }
}

/// A mapping context backed by a fixed set of descriptors.
#[derive(Debug, Clone, Default)]
pub struct SchemaMappingContext {
    entities: HashMap<String, EntityDescriptor>,
}

impl SchemaMappingContext {
    /// Builds a context and validates that every composite property refers
    /// to a registered descriptor.
    pub fn new<I>(descriptors: I) -> Result<Self, AppError>
    where
        I: IntoIterator<Item = EntityDescriptor>,
    {
        let entities: HashMap<String, EntityDescriptor> = descriptors
            .into_iter()
            .map(|d| (d.name.clone(), d))
            .collect();

        for descriptor in entities.values() {
            for property in &descriptor.properties {
                if let Some(composite) = &property.composite {
                    if !entities.contains_key(composite) {
                        return Err(AppError::UnknownEntity(format!(
                            "{} (composite property {}.{})",
                            composite, descriptor.name, property.name
                        )));
                    }
                }
            }
        }

        tracing::debug!("Registered {} entity mappings", entities.len());
        Ok(Self { entities })
    }
}

impl MappingContext for SchemaMappingContext {
    fn describe(&self, entity: &str) -> Result<&EntityDescriptor, AppError> {
        self.entities
            .get(entity)
            .ok_or_else(|| AppError::UnknownEntity(entity.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapping() -> SchemaMappingContext {
        SchemaMappingContext::new([
            EntityDescriptor::new("Person")
                .with_property(PropertyDescriptor::simple("lastName").stored_as("last_name"))
                .with_property(PropertyDescriptor::composite("address", "Address")),
            EntityDescriptor::new("Address")
                .with_property(PropertyDescriptor::simple("city"))
                .with_property(PropertyDescriptor::composite("geo", "Geo")),
            EntityDescriptor::new("Geo").with_property(PropertyDescriptor::simple("lat")),
        ])
        .unwrap()
    }

    #[test]
    fn test_resolve_simple_renamed() {
        let resolved = mapping()
            .resolve("Person", &PropertyPath::parse("lastName"))
            .unwrap();
        assert_eq!(resolved.graph_name, "last_name");
    }

    #[test]
    fn test_resolve_nested_composite() {
        let resolved = mapping()
            .resolve("Person", &PropertyPath::parse("address.geo.lat"))
            .unwrap();
        assert_eq!(resolved.graph_name, "address.geo.lat");
    }

    #[test]
    fn test_resolve_rejects_unknown_and_composite_leaf() {
        let mapping = mapping();
        for path in ["nickname", "address", "lastName.first", "address.zip"] {
            let err = mapping
                .resolve("Person", &PropertyPath::parse(path))
                .unwrap_err();
            assert!(
                matches!(err, AppError::MappingResolution { ref path, .. } if !path.is_empty()),
                "{path}"
            );
        }
    }

    #[test]
    fn test_unknown_entity() {
        assert!(matches!(
            mapping().describe("Robot"),
            Err(AppError::UnknownEntity(_))
        ));
    }

    #[test]
    fn test_new_rejects_dangling_composite() {
        let result = SchemaMappingContext::new([EntityDescriptor::new("Person")
            .with_property(PropertyDescriptor::composite("address", "Address"))]);
        assert!(matches!(result, Err(AppError::UnknownEntity(_))));
    }

    #[test]
    fn test_labels_default_to_entity_name() {
        assert_eq!(EntityDescriptor::new("Person").labels(), vec!["Person"]);
        assert_eq!(
            EntityDescriptor::new("Person")
                .with_label("Human")
                .with_label("Agent")
                .labels(),
            vec!["Human", "Agent"]
        );
    }
}
