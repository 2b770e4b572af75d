//! Result ordering.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Asc => f.write_str("ASC"),
            Direction::Desc => f.write_str("DESC"),
        }
    }
}

/// Ordering by a single (dotted) domain property.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Order {
    pub property: String,
    pub direction: Direction,
    #[serde(default)]
    pub ignore_case: bool,
}

impl Order {
    pub fn asc(property: &str) -> Self {
        Self {
            property: property.to_string(),
            direction: Direction::Asc,
            ignore_case: false,
        }
    }

    pub fn desc(property: &str) -> Self {
        Self {
            property: property.to_string(),
            direction: Direction::Desc,
            ignore_case: false,
        }
    }

    /// Compares values case-insensitively.
    pub fn ignore_case(mut self) -> Self {
        self.ignore_case = true;
        self
    }
}

/// Parses `name`, `+name` (ascending) or `-name` (descending).
impl FromStr for Order {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (direction, property) = match s.strip_prefix('-') {
            Some(rest) => (Direction::Desc, rest),
            None => (Direction::Asc, s.strip_prefix('+').unwrap_or(s)),
        };
        if property.is_empty() {
            return Err(AppError::InvalidExample(format!(
                "empty sort property in '{}'",
                s
            )));
        }
        Ok(Self {
            property: property.to_string(),
            direction,
            ignore_case: false,
        })
    }
}

/// An ordered sequence of [`Order`]s. Earlier orders take precedence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Sort {
    orders: Vec<Order>,
}

impl Sort {
    pub fn unsorted() -> Self {
        Self::default()
    }

    pub fn by<I: IntoIterator<Item = Order>>(orders: I) -> Self {
        Self {
            orders: orders.into_iter().collect(),
        }
    }

    /// Returns a sort made of this sort's orders followed by `other`'s.
    ///
    /// Neither operand is modified. Duplicate properties are kept; the
    /// first occurrence wins when rendered.
    pub fn and(&self, other: &Sort) -> Sort {
        Sort {
            orders: self.orders.iter().chain(&other.orders).cloned().collect(),
        }
    }

    pub fn is_sorted(&self) -> bool {
        !self.orders.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Order> {
        self.orders.iter()
    }
}

impl From<Order> for Sort {
    fn from(order: Order) -> Self {
        Self {
            orders: vec![order],
        }
    }
}

impl<'a> IntoIterator for &'a Sort {
    type Item = &'a Order;
    type IntoIter = std::slice::Iter<'a, Order>;

    fn into_iter(self) -> Self::IntoIter {
        self.orders.iter()
    }
}
