//! Shared fixtures: a small people graph held in memory.
//!
//! [`InMemoryGraph`] evaluates fragments directly against JSON nodes, so the
//! executors and fluent queries can be exercised without a database.

#![allow(dead_code)]

use std::cmp::Ordering;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
use std::sync::Arc;

use async_stream::try_stream;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value as JsonValue};

use graphqbe::domain::Direction;
use graphqbe::error::AppError;
use graphqbe::mapping::{
    Entity, EntityDescriptor, MappingContext, PropertyDescriptor, SchemaMappingContext,
};
use graphqbe::operations::{GraphOperations, ReactiveGraphOperations, ResultStream};
use graphqbe::query::{
    Condition, MatchMode, MatchingPredicate, Operator, Projected, QueryFragments,
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub city: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    pub id: Option<i64>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub age: Option<i64>,
    pub address: Option<Address>,
}

impl Entity for Person {
    const ENTITY: &'static str = "Person";
}

impl Person {
    pub fn last_name(last_name: &str) -> Self {
        Self {
            last_name: Some(last_name.to_string()),
            ..Self::default()
        }
    }
}

/// A projection of [`Person`] used with `as_type`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonName {
    pub first_name: String,
}

pub fn mapping() -> Arc<dyn MappingContext> {
    Arc::new(
        SchemaMappingContext::new([
            EntityDescriptor::new("Person")
                .with_id("id")
                .with_property(PropertyDescriptor::simple("id"))
                .with_property(PropertyDescriptor::simple("firstName"))
                .with_property(PropertyDescriptor::simple("lastName").stored_as("last_name"))
                .with_property(PropertyDescriptor::simple("age"))
                .with_property(PropertyDescriptor::composite("address", "Address")),
            EntityDescriptor::new("Address").with_property(PropertyDescriptor::simple("city")),
        ])
        .expect("valid mapping"),
    )
}

/// Five Smiths and two others, in insertion order.
pub fn people() -> Vec<JsonValue> {
    [
        (1, "John", "Smith", 30, "London"),
        (2, "Jane", "Smith", 25, "Paris"),
        (3, "Adam", "Smith", 41, "London"),
        (4, "Zoe", "Smith", 19, "Berlin"),
        (5, "Eve", "Smith", 35, "London"),
        (6, "Ada", "Lovelace", 36, "London"),
        (7, "Alan", "Turing", 41, "Wilmslow"),
    ]
    .into_iter()
    .map(|(id, first, last, age, city)| {
        json!({
            "id": id,
            "firstName": first,
            "last_name": last,
            "age": age,
            "address.city": city,
        })
    })
    .collect()
}

/// Graph operations evaluated in memory over flattened `Person` nodes.
pub struct InMemoryGraph {
    nodes: Vec<JsonValue>,
    fluent: bool,
    pub find_calls: AtomicUsize,
    pub count_calls: AtomicUsize,
}

impl InMemoryGraph {
    pub fn with_people() -> Self {
        Self {
            nodes: people(),
            fluent: true,
            find_calls: AtomicUsize::new(0),
            count_calls: AtomicUsize::new(0),
        }
    }

    pub fn without_fluent_support() -> Self {
        Self {
            fluent: false,
            ..Self::with_people()
        }
    }

    pub fn finds(&self) -> usize {
        self.find_calls.load(AtomicOrdering::SeqCst)
    }

    pub fn counts(&self) -> usize {
        self.count_calls.load(AtomicOrdering::SeqCst)
    }

    fn matching<'a>(&'a self, predicate: &'a MatchingPredicate) -> impl Iterator<Item = &'a JsonValue> {
        self.nodes.iter().filter(move |node| {
            let mut results = predicate
                .conditions()
                .iter()
                .map(|c| holds(node, c, predicate));
            match predicate.mode() {
                MatchMode::All => results.all(|r| r),
                MatchMode::Any => predicate.is_empty() || results.any(|r| r),
            }
        })
    }

    /// Matches, orders, windows and projects like the compiled statement.
    fn select(&self, fragments: &QueryFragments) -> Vec<JsonValue> {
        let mut selected: Vec<&JsonValue> = self.matching(fragments.predicate()).collect();

        selected.sort_by(|a, b| {
            for item in fragments.orders() {
                let ordering = compare(
                    a.get(&item.property),
                    b.get(&item.property),
                    item.ignore_case,
                );
                let ordering = match item.direction {
                    Direction::Asc => ordering,
                    Direction::Desc => ordering.reverse(),
                };
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            Ordering::Equal
        });

        let (skip, limit) = match fragments.window() {
            Some(window) => (window.skip as usize, window.limit as usize),
            None => (0, usize::MAX),
        };

        selected
            .into_iter()
            .skip(skip)
            .take(limit)
            .map(|node| project(node, fragments.returned()))
            .collect()
    }
}

fn holds(node: &JsonValue, condition: &Condition, predicate: &MatchingPredicate) -> bool {
    let value = node.get(&condition.property).unwrap_or(&JsonValue::Null);
    let Some(parameter) = &condition.parameter else {
        return value.is_null();
    };
    let expected = &predicate.parameters()[parameter];

    match (value, expected) {
        (JsonValue::String(actual), JsonValue::String(expected)) => {
            let (actual, expected) = if condition.ignore_case {
                (actual.to_lowercase(), expected.to_lowercase())
            } else {
                (actual.clone(), expected.clone())
            };
            match condition.operator {
                Operator::Equals => actual == expected,
                Operator::StartsWith => actual.starts_with(&expected),
                Operator::EndsWith => actual.ends_with(&expected),
                Operator::Contains => actual.contains(&expected),
                Operator::Matches => panic!("regex is not evaluated in memory"),
                Operator::IsNull => false,
            }
        }
        (actual, expected) => condition.operator == Operator::Equals && actual == expected,
    }
}

fn compare(a: Option<&JsonValue>, b: Option<&JsonValue>, ignore_case: bool) -> Ordering {
    match (a, b) {
        (Some(JsonValue::Number(a)), Some(JsonValue::Number(b))) => a
            .as_f64()
            .partial_cmp(&b.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(JsonValue::String(a)), Some(JsonValue::String(b))) if ignore_case => {
            a.to_lowercase().cmp(&b.to_lowercase())
        }
        (Some(JsonValue::String(a)), Some(JsonValue::String(b))) => a.cmp(b),
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}

fn project(node: &JsonValue, returned: &[Projected]) -> JsonValue {
    let mut object = Map::new();
    for projected in returned {
        match projected {
            Projected::Property { name, graph_name } => {
                let value = node.get(graph_name).cloned().unwrap_or(JsonValue::Null);
                object.insert(name.clone(), value);
            }
            Projected::Composite { name, children } => {
                object.insert(name.clone(), project(node, children));
            }
        }
    }
    JsonValue::Object(object)
}

fn decode<R: DeserializeOwned>(value: JsonValue) -> Result<R, AppError> {
    serde_json::from_value(value).map_err(|e| AppError::Decode {
        column: "result".to_string(),
        message: e.to_string(),
    })
}

impl GraphOperations for InMemoryGraph {
    fn find_all<R>(&self, fragments: &QueryFragments) -> Result<Vec<R>, AppError>
    where
        R: DeserializeOwned + Send + 'static,
    {
        self.find_calls.fetch_add(1, AtomicOrdering::SeqCst);
        self.select(fragments).into_iter().map(decode).collect()
    }

    fn count(&self, predicate: &MatchingPredicate) -> Result<u64, AppError> {
        self.count_calls.fetch_add(1, AtomicOrdering::SeqCst);
        Ok(self.matching(predicate).count() as u64)
    }

    fn supports_fluent_find(&self) -> bool {
        self.fluent
    }
}

#[async_trait]
impl ReactiveGraphOperations for InMemoryGraph {
    fn find_all<'a, R>(&'a self, fragments: &QueryFragments) -> ResultStream<'a, R>
    where
        R: DeserializeOwned + Send + 'static,
    {
        let fragments = fragments.clone();
        Box::pin(try_stream! {
            self.find_calls.fetch_add(1, AtomicOrdering::SeqCst);
            for value in self.select(&fragments) {
                yield decode::<R>(value)?;
            }
        })
    }

    async fn count(&self, predicate: &MatchingPredicate) -> Result<u64, AppError> {
        self.count_calls.fetch_add(1, AtomicOrdering::SeqCst);
        tokio::task::yield_now().await;
        Ok(self.matching(predicate).count() as u64)
    }

    fn supports_fluent_find(&self) -> bool {
        self.fluent
    }
}

pub fn first_names<'a>(people: impl IntoIterator<Item = &'a Person>) -> Vec<&'a str> {
    people
        .into_iter()
        .map(|p| p.first_name.as_deref().unwrap_or_default())
        .collect()
}
