//! Typed, parameterized row filters
//!
//! A `Filter` is an AND-list of conditions over a field enum. Rendering never
//! interpolates values; every value becomes a positional parameter.

use rusqlite::types::Value;

/// A filterable column of some rowset
pub trait Field: Copy + std::fmt::Debug {
    /// Qualified SQL column, e.g. `mh.grouping_id`
    fn column(&self) -> &'static str;
}

#[derive(Debug, Clone, PartialEq)]
pub enum Condition<F> {
    Eq(F, Value),
    Ne(F, Value),
    IsNull(F),
    NotNull(F),
    Gt(F, Value),
    Lte(F, Value),
    In(F, Vec<Value>),
    /// Field matches a regular expression (`regex` crate syntax)
    Regex(F, String),
}

impl<F: Field> Condition<F> {
    fn render(&self, params: &mut Vec<Value>) -> String {
        match self {
            // `col = NULL` matches nothing; treat it as a null test
            Condition::Eq(field, Value::Null) => format!("{} IS NULL", field.column()),
            Condition::Ne(field, Value::Null) => format!("{} IS NOT NULL", field.column()),
            Condition::Eq(field, value) => {
                params.push(value.clone());
                format!("{} = ?", field.column())
            }
            Condition::Ne(field, value) => {
                params.push(value.clone());
                format!("{} <> ?", field.column())
            }
            Condition::IsNull(field) => format!("{} IS NULL", field.column()),
            Condition::NotNull(field) => format!("{} IS NOT NULL", field.column()),
            Condition::Gt(field, value) => {
                params.push(value.clone());
                format!("{} > ?", field.column())
            }
            Condition::Lte(field, value) => {
                params.push(value.clone());
                format!("{} <= ?", field.column())
            }
            Condition::In(_, values) if values.is_empty() => "0".to_string(),
            Condition::In(field, values) => {
                params.extend(values.iter().cloned());
                format!("{} IN ({})", field.column(), placeholders(values.len()))
            }
            Condition::Regex(field, pattern) => {
                params.push(Value::Text(pattern.clone()));
                format!("{} REGEXP ?", field.column())
            }
        }
    }
}

/// Conjunction of conditions
#[derive(Debug, Clone, PartialEq)]
pub struct Filter<F> {
    conditions: Vec<Condition<F>>,
}

impl<F> Default for Filter<F> {
    fn default() -> Self {
        Self { conditions: Vec::new() }
    }
}

impl<F: Field> Filter<F> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn and(mut self, condition: Condition<F>) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn eq(self, field: F, value: impl Into<Value>) -> Self {
        self.and(Condition::Eq(field, value.into()))
    }

    pub fn ne(self, field: F, value: impl Into<Value>) -> Self {
        self.and(Condition::Ne(field, value.into()))
    }

    pub fn is_null(self, field: F) -> Self {
        self.and(Condition::IsNull(field))
    }

    pub fn not_null(self, field: F) -> Self {
        self.and(Condition::NotNull(field))
    }

    pub fn gt(self, field: F, value: impl Into<Value>) -> Self {
        self.and(Condition::Gt(field, value.into()))
    }

    pub fn lte(self, field: F, value: impl Into<Value>) -> Self {
        self.and(Condition::Lte(field, value.into()))
    }

    pub fn one_of<V: Into<Value>>(self, field: F, values: impl IntoIterator<Item = V>) -> Self {
        self.and(Condition::In(field, values.into_iter().map(Into::into).collect()))
    }

    /// `field REGEXP pattern`; query sets register `REGEXP` on demand
    pub fn matches(self, field: F, pattern: impl Into<String>) -> Self {
        self.and(Condition::Regex(field, pattern.into()))
    }

    /// Combine with another filter over the same fields
    pub fn merge(mut self, other: &Filter<F>) -> Self {
        self.conditions.extend(other.conditions.iter().cloned());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Render as ` WHERE ...` (or an empty string) plus its parameters
    pub fn to_where_clause(&self) -> (String, Vec<Value>) {
        if self.conditions.is_empty() {
            return (String::new(), Vec::new());
        }

        let mut params = Vec::new();
        let clauses: Vec<String> = self
            .conditions
            .iter()
            .map(|condition| condition.render(&mut params))
            .collect();

        (format!(" WHERE {}", clauses.join(" AND ")), params)
    }
}

/// `?, ?, ?` for `n` parameters
pub(crate) fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}
