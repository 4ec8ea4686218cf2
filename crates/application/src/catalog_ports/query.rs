use std::cmp::Ordering;

use serde_json::Value;

use super::Document;

/// Storage-neutral document predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Matches every document.
    All,
    /// Every nested filter must match.
    And(Vec<Filter>),
    /// Any nested filter may match.
    Or(Vec<Filter>),
    /// Field equals the value.
    Eq {
        /// Document field.
        field: String,
        /// Expected value.
        value: Value,
    },
    /// Field equals one of the values.
    In {
        /// Document field.
        field: String,
        /// Accepted values.
        values: Vec<Value>,
    },
    /// Array field contains at least one of the values.
    ContainsAny {
        /// Document array field.
        field: String,
        /// Candidate members.
        values: Vec<Value>,
    },
    /// String field contains the text, ignoring case. The text is literal.
    ContainsText {
        /// Document string field.
        field: String,
        /// Literal substring.
        text: String,
    },
    /// Field falls within optional bounds over numbers or ISO date strings.
    Range {
        /// Document field.
        field: String,
        /// Lower bound.
        lower: Option<RangeBound>,
        /// Upper bound.
        upper: Option<RangeBound>,
    },
}

/// One side of a range filter.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeBound {
    /// Bound value.
    pub value: Value,
    /// Whether the bound itself matches.
    pub inclusive: bool,
}

impl RangeBound {
    /// Inclusive bound.
    #[must_use]
    pub fn inclusive(value: impl Into<Value>) -> Self {
        Self {
            value: value.into(),
            inclusive: true,
        }
    }

    /// Exclusive bound.
    #[must_use]
    pub fn exclusive(value: impl Into<Value>) -> Self {
        Self {
            value: value.into(),
            inclusive: false,
        }
    }
}

impl Filter {
    /// Equality filter.
    #[must_use]
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Eq {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Conjunction that drops `All` members and unwraps single members.
    #[must_use]
    pub fn and(filters: Vec<Filter>) -> Self {
        let mut filters = filters
            .into_iter()
            .filter(|filter| *filter != Self::All)
            .collect::<Vec<_>>();
        match filters.len() {
            0 => Self::All,
            1 => filters.remove(0),
            _ => Self::And(filters),
        }
    }

    /// Evaluates the filter against a document.
    #[must_use]
    pub fn matches(&self, document: &Document) -> bool {
        match self {
            Self::All => true,
            Self::And(filters) => filters.iter().all(|filter| filter.matches(document)),
            Self::Or(filters) => filters.iter().any(|filter| filter.matches(document)),
            Self::Eq { field, value } => document
                .get(field)
                .is_some_and(|stored| values_equal(stored, value)),
            Self::In { field, values } => document
                .get(field)
                .is_some_and(|stored| values.iter().any(|value| values_equal(stored, value))),
            Self::ContainsAny { field, values } => document
                .get(field)
                .and_then(Value::as_array)
                .is_some_and(|members| {
                    members
                        .iter()
                        .any(|member| values.iter().any(|value| values_equal(member, value)))
                }),
            Self::ContainsText { field, text } => document
                .get(field)
                .and_then(Value::as_str)
                .is_some_and(|stored| stored.to_lowercase().contains(&text.to_lowercase())),
            Self::Range {
                field,
                lower,
                upper,
            } => document.get(field).is_some_and(|stored| {
                let above = lower.as_ref().is_none_or(|bound| {
                    matches!(
                        (compare_values(stored, &bound.value), bound.inclusive),
                        (Some(Ordering::Greater), _) | (Some(Ordering::Equal), true)
                    )
                });
                let below = upper.as_ref().is_none_or(|bound| {
                    matches!(
                        (compare_values(stored, &bound.value), bound.inclusive),
                        (Some(Ordering::Less), _) | (Some(Ordering::Equal), true)
                    )
                });
                above && below
            }),
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    /// Smallest first.
    Ascending,
    /// Largest first.
    Descending,
}

/// One sort criterion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    /// Document field.
    pub field: String,
    /// Direction.
    pub direction: SortDirection,
}

impl SortKey {
    /// Ascending criterion.
    #[must_use]
    pub fn ascending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Ascending,
        }
    }

    /// Descending criterion.
    #[must_use]
    pub fn descending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Descending,
        }
    }
}

/// Pagination and ordering for a find.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FindOptions {
    /// Maximum documents returned.
    pub limit: usize,
    /// Documents skipped after sorting.
    pub skip: usize,
    /// Criteria in precedence order.
    pub sort: Vec<SortKey>,
}

impl FindOptions {
    /// Options returning up to `limit` documents in `_id` order.
    #[must_use]
    pub fn first(limit: usize) -> Self {
        Self {
            limit,
            skip: 0,
            sort: vec![SortKey::ascending("_id")],
        }
    }

    /// Orders two documents by the sort criteria.
    ///
    /// Missing values sort after present ones in ascending order.
    #[must_use]
    pub fn compare(&self, left: &Document, right: &Document) -> Ordering {
        for key in &self.sort {
            let ordering = match (left.get(&key.field), right.get(&key.field)) {
                (None | Some(Value::Null), None | Some(Value::Null)) => Ordering::Equal,
                (None | Some(Value::Null), Some(_)) => Ordering::Greater,
                (Some(_), None | Some(Value::Null)) => Ordering::Less,
                (Some(left), Some(right)) => {
                    compare_values(left, right).unwrap_or(Ordering::Equal)
                }
            };
            let ordering = match key.direction {
                SortDirection::Ascending => ordering,
                SortDirection::Descending => ordering.reverse(),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }

        Ordering::Equal
    }
}

fn values_equal(left: &Value, right: &Value) -> bool {
    match (left.as_f64(), right.as_f64()) {
        (Some(left), Some(right)) => left == right,
        _ => left == right,
    }
}

fn compare_values(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Number(left), Value::Number(right)) => left.as_f64()?.partial_cmp(&right.as_f64()?),
        (Value::String(left), Value::String(right)) => Some(left.cmp(right)),
        (Value::Bool(left), Value::Bool(right)) => Some(left.cmp(right)),
        _ => None,
    }
}
