//! Rendering query fragments as Cypher.

use crate::domain::Direction;
use crate::graph::Params;
use crate::query::example::MatchMode;
use crate::query::fragments::{Projected, QueryFragments, SortItem};
use crate::query::predicate::{Condition, MatchingPredicate, Operator};

/// Variable bound to the matched node.
pub const NODE: &str = "n";
/// Column holding each result's property map.
pub const RESULT_COLUMN: &str = "result";
/// Column holding the result of a count statement.
pub const COUNT_COLUMN: &str = "count";

/// A rendered statement with its parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub cypher: String,
    pub params: Params,
}

/// Turns fragments into executable statements.
///
/// Find statements return one row per match with the projected properties
/// as a map in [`RESULT_COLUMN`]. Count statements return a single row with
/// [`COUNT_COLUMN`].
pub trait StatementCompiler: Send + Sync {
    fn compile_match(&self, fragments: &QueryFragments) -> Statement;

    fn compile_count(&self, predicate: &MatchingPredicate) -> Statement;
}

/// The default Cypher renderer.
#[derive(Debug, Clone, Copy, Default)]
pub struct CypherGenerator;

impl StatementCompiler for CypherGenerator {
    fn compile_match(&self, fragments: &QueryFragments) -> Statement {
        let predicate = fragments.predicate();
        let mut cypher = match_clause(predicate);

        cypher.push_str(&format!(
            "\nRETURN {} AS {}",
            map_projection(fragments.returned()),
            RESULT_COLUMN
        ));

        if !fragments.orders().is_empty() {
            let orders: Vec<String> = fragments.orders().iter().map(order_item).collect();
            cypher.push_str(&format!("\nORDER BY {}", orders.join(", ")));
        }

        if let Some(window) = fragments.window() {
            cypher.push_str(&format!("\nSKIP {} LIMIT {}", window.skip, window.limit));
        }

        Statement {
            cypher,
            params: predicate.parameters().clone(),
        }
    }

    fn compile_count(&self, predicate: &MatchingPredicate) -> Statement {
        let mut cypher = match_clause(predicate);
        cypher.push_str(&format!("\nRETURN count({}) AS {}", NODE, COUNT_COLUMN));
        Statement {
            cypher,
            params: predicate.parameters().clone(),
        }
    }
}

fn match_clause(predicate: &MatchingPredicate) -> String {
    let labels: String = predicate
        .labels()
        .iter()
        .map(|label| format!(":{}", escape(label)))
        .collect();
    let mut cypher = format!("MATCH ({}{})", NODE, labels);

    if !predicate.is_empty() {
        let joiner = match predicate.mode() {
            MatchMode::All => " AND ",
            MatchMode::Any => " OR ",
        };
        let terms: Vec<String> = predicate.conditions().iter().map(term).collect();
        cypher.push_str(&format!("\nWHERE {}", terms.join(joiner)));
    }
    cypher
}

fn term(condition: &Condition) -> String {
    let property = property(&condition.property);
    let Some(parameter) = &condition.parameter else {
        return format!("{} IS NULL", property);
    };

    let (left, right) = if condition.ignore_case {
        (format!("toLower({})", property), format!("toLower(${})", parameter))
    } else {
        (property, format!("${}", parameter))
    };

    let operator = match condition.operator {
        Operator::Equals => "=",
        Operator::StartsWith => "STARTS WITH",
        Operator::EndsWith => "ENDS WITH",
        Operator::Contains => "CONTAINS",
        Operator::Matches => "=~",
        Operator::IsNull => return format!("{} IS NULL", left),
    };
    format!("{} {} {}", left, operator, right)
}

fn order_item(item: &SortItem) -> String {
    let property = property(&item.property);
    let direction = match item.direction {
        Direction::Asc => "ASC",
        Direction::Desc => "DESC",
    };
    if item.ignore_case {
        format!("toLower({}) {}", property, direction)
    } else {
        format!("{} {}", property, direction)
    }
}

fn map_projection(returned: &[Projected]) -> String {
    let entries: Vec<String> = returned
        .iter()
        .map(|projected| match projected {
            Projected::Property { name, graph_name } => {
                format!("{}: {}", escape(name), property(graph_name))
            }
            Projected::Composite { name, children } => {
                format!("{}: {}", escape(name), map_projection(children))
            }
        })
        .collect();
    format!("{{{}}}", entries.join(", "))
}

fn property(graph_name: &str) -> String {
    format!("{}.{}", NODE, escape(graph_name))
}

/// Quotes a name with backticks unless it is a plain identifier.
fn escape(name: &str) -> String {
    let mut chars = name.chars();
    let plain = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if plain {
        name.to_string()
    } else {
        format!("`{}`", name.replace('`', "``"))
    }
}
