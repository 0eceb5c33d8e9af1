//! Queries over stored entities.
//!
//! A query selects one kind, optionally restricted to the descendants of an
//! ancestor key, filtered on property values, ordered on a single property and
//! capped by a limit. Ancestor-scoped queries are strongly consistent; all
//! others may miss very recent writes.

use crate::key::Key;
use crate::Properties;
use serde_json::Value;
use std::cmp::Ordering;

/// Comparison applied by a filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    /// `=`
    Eq,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
}

impl FilterOp {
    /// Parse an operator token such as `"="` or `">="`.
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "=" => Some(FilterOp::Eq),
            "<" => Some(FilterOp::Lt),
            "<=" => Some(FilterOp::Le),
            ">" => Some(FilterOp::Gt),
            ">=" => Some(FilterOp::Ge),
            _ => None,
        }
    }

    fn accepts(self, ordering: Ordering) -> bool {
        match self {
            FilterOp::Eq => ordering == Ordering::Equal,
            FilterOp::Lt => ordering == Ordering::Less,
            FilterOp::Le => ordering != Ordering::Greater,
            FilterOp::Gt => ordering == Ordering::Greater,
            FilterOp::Ge => ordering != Ordering::Less,
        }
    }
}

/// A property filter.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    /// Property name.
    pub field: String,
    /// Comparison.
    pub op: FilterOp,
    /// Value to compare against.
    pub value: Value,
}

impl Filter {
    /// Whether the properties satisfy this filter.
    ///
    /// Entities without the property never match. A list property matches
    /// when any of its elements does.
    pub fn matches(&self, properties: &Properties) -> bool {
        match properties.get(&self.field) {
            None => false,
            Some(Value::Array(items)) if !self.value.is_array() => {
                items.iter().any(|item| self.matches_value(item))
            }
            Some(actual) => self.matches_value(actual),
        }
    }

    fn matches_value(&self, actual: &Value) -> bool {
        if self.op == FilterOp::Eq {
            return compare(actual, &self.value) == Some(Ordering::Equal) || actual == &self.value;
        }
        compare(actual, &self.value).is_some_and(|ordering| self.op.accepts(ordering))
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Smallest first.
    Ascending,
    /// Largest first.
    Descending,
}

/// Ordering on one property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    /// Property name.
    pub field: String,
    /// Sort direction.
    pub direction: Direction,
}

impl Order {
    /// Parse `"field"` (ascending) or `"-field"` (descending).
    pub fn parse(raw: &str) -> Self {
        match raw.strip_prefix('-') {
            Some(field) => Self {
                field: field.to_string(),
                direction: Direction::Descending,
            },
            None => Self {
                field: raw.to_string(),
                direction: Direction::Ascending,
            },
        }
    }
}

/// A query over one kind.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    kind: String,
    ancestor: Option<Key>,
    filters: Vec<Filter>,
    order: Option<Order>,
    limit: Option<usize>,
}

impl Query {
    /// Select entities of a kind.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            ancestor: None,
            filters: Vec::new(),
            order: None,
            limit: None,
        }
    }

    /// Restrict to descendants of `ancestor` (inclusive).
    pub fn ancestor(mut self, ancestor: &Key) -> Self {
        self.ancestor = Some(ancestor.clone());
        self
    }

    /// Add an equality filter.
    pub fn filter_eq(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter(field, FilterOp::Eq, value)
    }

    /// Add a filter with an explicit operator.
    pub fn filter(mut self, field: impl Into<String>, op: FilterOp, value: impl Into<Value>) -> Self {
        self.filters.push(Filter {
            field: field.into(),
            op,
            value: value.into(),
        });
        self
    }

    /// Order results; prefix the field with `-` for descending.
    pub fn order(mut self, raw: &str) -> Self {
        self.order = Some(Order::parse(raw));
        self
    }

    /// Cap the number of results.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// The selected kind.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// The ancestor scope, if any.
    pub fn ancestor_key(&self) -> Option<&Key> {
        self.ancestor.as_ref()
    }

    /// Property filters.
    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    /// Result ordering, if any.
    pub fn ordering(&self) -> Option<&Order> {
        self.order.as_ref()
    }

    /// Result cap, if any.
    pub fn result_limit(&self) -> Option<usize> {
        self.limit
    }

    /// Whether this query is served with strong consistency.
    pub fn is_ancestor_scoped(&self) -> bool {
        self.ancestor.is_some()
    }

    /// Whether an entity at `key` with `properties` is selected.
    ///
    /// Ordering on a property the entity lacks excludes the entity.
    pub fn matches(&self, key: &Key, properties: &Properties) -> bool {
        if key.kind() != self.kind {
            return false;
        }
        if let Some(ancestor) = &self.ancestor {
            if !ancestor.is_ancestor_of(key) {
                return false;
            }
        }
        if let Some(order) = &self.order {
            if !properties.contains_key(&order.field) {
                return false;
            }
        }
        self.filters.iter().all(|f| f.matches(properties))
    }

    /// Compare two matched entities under this query's ordering.
    pub fn compare(&self, a: &Properties, b: &Properties) -> Ordering {
        let Some(order) = &self.order else {
            return Ordering::Equal;
        };
        let ordering = match (a.get(&order.field), b.get(&order.field)) {
            (Some(x), Some(y)) => compare(x, y).unwrap_or(Ordering::Equal),
            _ => Ordering::Equal,
        };
        match order.direction {
            Direction::Ascending => ordering,
            Direction::Descending => ordering.reverse(),
        }
    }
}

/// Compare two property values of the same type.
///
/// Numbers compare numerically, strings lexically and booleans with `false`
/// first. Mixed or structured values are not ordered.
pub fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        (Value::Number(x), Value::Number(y)) => match (x.as_i64(), y.as_i64()) {
            (Some(x), Some(y)) => Some(x.cmp(&y)),
            _ => x.as_f64()?.partial_cmp(&y.as_f64()?),
        },
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        _ => None,
    }
}
