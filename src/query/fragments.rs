//! Driver-agnostic description of a query: what to match, how to order and
//! page, and which properties to return.

use std::collections::HashSet;

use crate::domain::{Direction, Pageable, Sort, Window};
use crate::error::AppError;
use crate::mapping::{EntityDescriptor, MappingContext, PropertyFilter, PropertyPath};
use crate::query::example::Example;
use crate::query::predicate::MatchingPredicate;

/// An ordering resolved to the node property it sorts by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortItem {
    pub path: PropertyPath,
    pub property: String,
    pub direction: Direction,
    pub ignore_case: bool,
}

/// A property returned by a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Projected {
    /// A simple property stored as `graph_name` on the node.
    Property { name: String, graph_name: String },
    /// An embedded value assembled from flattened node properties.
    Composite { name: String, children: Vec<Projected> },
}

impl Projected {
    pub fn name(&self) -> &str {
        match self {
            Projected::Property { name, .. } | Projected::Composite { name, .. } => name,
        }
    }
}

/// Everything a statement compiler needs to render one query.
///
/// Building fragments performs no I/O. Sort properties and the projection
/// are resolved against the mapping here, so a bad sort fails before any
/// statement is sent.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryFragments {
    predicate: MatchingPredicate,
    orders: Vec<SortItem>,
    window: Option<Window>,
    filter: PropertyFilter,
    returned: Vec<Projected>,
}

impl QueryFragments {
    /// Assembles fragments for an example.
    pub fn for_example<T>(
        mapping: &dyn MappingContext,
        example: &Example<T>,
        sort: &Sort,
        pageable: &Pageable,
        filter: PropertyFilter,
    ) -> Result<Self, AppError> {
        let predicate = MatchingPredicate::create(mapping, example)?;
        Self::for_predicate(mapping, predicate, sort, pageable, filter)
    }

    /// Assembles fragments for an already built predicate.
    ///
    /// The ordering is `sort` followed by the pageable's own sort; the
    /// window comes from the pageable. If a property appears more than once
    /// only its first ordering is kept.
    pub fn for_predicate(
        mapping: &dyn MappingContext,
        predicate: MatchingPredicate,
        sort: &Sort,
        pageable: &Pageable,
        filter: PropertyFilter,
    ) -> Result<Self, AppError> {
        let entity = predicate.entity().to_string();

        let mut seen = HashSet::new();
        let mut orders = Vec::new();
        for order in sort.and(&pageable.sort()).iter() {
            let path = PropertyPath::parse(&order.property);
            let resolved = mapping.resolve(&entity, &path)?;
            if seen.insert(resolved.graph_name.clone()) {
                orders.push(SortItem {
                    path,
                    property: resolved.graph_name,
                    direction: order.direction,
                    ignore_case: order.ignore_case,
                });
            }
        }

        let descriptor = mapping.describe(&entity)?;
        let mut visiting = vec![descriptor.name.clone()];
        let returned = project(
            mapping,
            descriptor,
            &PropertyPath::root(""),
            "",
            &filter,
            &mut visiting,
        )?;

        Ok(Self {
            predicate,
            orders,
            window: pageable.window(),
            filter,
            returned,
        })
    }

    pub fn entity(&self) -> &str {
        self.predicate.entity()
    }

    pub fn predicate(&self) -> &MatchingPredicate {
        &self.predicate
    }

    pub fn orders(&self) -> &[SortItem] {
        &self.orders
    }

    pub fn window(&self) -> Option<Window> {
        self.window
    }

    pub fn filter(&self) -> &PropertyFilter {
        &self.filter
    }

    pub fn returned(&self) -> &[Projected] {
        &self.returned
    }
}

/// Computes the returned property tree of `descriptor` below `prefix`.
///
/// A composite whose own path passes the filter is returned whole; otherwise
/// only its individually selected children are. The root entity's id is
/// always returned.
fn project(
    mapping: &dyn MappingContext,
    descriptor: &EntityDescriptor,
    prefix: &PropertyPath,
    graph_prefix: &str,
    filter: &PropertyFilter,
    visiting: &mut Vec<String>,
) -> Result<Vec<Projected>, AppError> {
    let mut returned = Vec::new();

    for property in &descriptor.properties {
        let path = prefix.child(&property.name);
        let graph_name = format!("{}{}", graph_prefix, property.graph_name());

        match &property.composite {
            Some(composite) => {
                if visiting.contains(composite) {
                    tracing::debug!("Not projecting recursive composite {}", path);
                    continue;
                }
                let nested = mapping.describe(composite)?;
                let nested_filter = if filter.includes(&path) {
                    PropertyFilter::AcceptAll
                } else {
                    filter.clone()
                };

                visiting.push(composite.clone());
                let children = project(
                    mapping,
                    nested,
                    &path,
                    &format!("{}.", graph_name),
                    &nested_filter,
                    visiting,
                )?;
                visiting.pop();

                if !children.is_empty() {
                    returned.push(Projected::Composite {
                        name: property.name.clone(),
                        children,
                    });
                }
            }
            None => {
                let is_id =
                    prefix.is_empty() && descriptor.id.as_deref() == Some(property.name.as_str());
                if is_id || filter.includes(&path) {
                    returned.push(Projected::Property {
                        name: property.name.clone(),
                        graph_name,
                    });
                }
            }
        }
    }

    Ok(returned)
}
