//! Declarative WHERE conditions.
//!
//! A [`Condition`] is built from one of the caller-facing shapes — a primary
//! key value, a column→value map, a raw fragment with its own parameters, or
//! a composition of those — and renders to a SQL fragment plus an ordered
//! parameter list. Scalar values are always bound, never interpolated; raw
//! fragments are the caller's explicit opt-in.

use activerow_core::{Error, Result, SqlExecutor, Value};
use std::collections::BTreeMap;

/// A WHERE condition tree.
#[derive(Debug, Clone, Default)]
pub enum Condition {
    /// No constraint; renders to nothing.
    #[default]
    None,

    /// `column = value`, or `column IS NULL` when the value is NULL.
    Eq {
        column: String,
        value: Value,
    },

    /// `column IN (...)`. An empty value list renders a never-true clause.
    In {
        column: String,
        values: Vec<Value>,
    },

    /// A raw SQL fragment with positional `?` parameters (caller opt-in).
    Raw {
        sql: String,
        params: Vec<Value>,
    },

    /// Conjunction of sub-conditions.
    All(Vec<Condition>),

    /// Disjunction of sub-conditions.
    Any(Vec<Condition>),
}

impl Condition {
    /// `column = value` equality.
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Condition::Eq {
            column: column.into(),
            value: value.into(),
        }
    }

    /// `column IN (values)`.
    pub fn in_values(column: impl Into<String>, values: Vec<Value>) -> Self {
        Condition::In {
            column: column.into(),
            values,
        }
    }

    /// A raw fragment with its bound parameters.
    pub fn raw(sql: impl Into<String>, params: Vec<Value>) -> Self {
        Condition::Raw {
            sql: sql.into(),
            params,
        }
    }

    /// Conjunction.
    pub fn all(conditions: Vec<Condition>) -> Self {
        Condition::All(conditions)
    }

    /// Disjunction.
    pub fn any(conditions: Vec<Condition>) -> Self {
        Condition::Any(conditions)
    }

    /// Equality over a column→value map (AND of all pairs).
    pub fn from_attributes(attributes: &BTreeMap<String, Value>) -> Self {
        Condition::All(
            attributes
                .iter()
                .map(|(column, value)| Condition::eq(column.clone(), value.clone()))
                .collect(),
        )
    }

    /// A primary key constraint, composite-safe.
    ///
    /// Fails with a configuration error when the value count does not match
    /// the key column count.
    #[allow(clippy::result_large_err)]
    pub fn by_key(columns: &[String], values: &[Value]) -> Result<Self> {
        if columns.len() != values.len() {
            return Err(Error::config(format!(
                "key has {} column(s) but {} value(s) were supplied",
                columns.len(),
                values.len()
            )));
        }
        Ok(Condition::All(
            columns
                .iter()
                .zip(values.iter())
                .map(|(column, value)| Condition::eq(column.clone(), value.clone()))
                .collect(),
        ))
    }

    /// Combine with another condition under AND.
    ///
    /// Empty sides disappear rather than producing `() AND (...)` noise.
    #[must_use]
    pub fn and(self, other: Condition) -> Condition {
        match (self.is_empty(), other.is_empty()) {
            (true, true) => Condition::None,
            (true, false) => other,
            (false, true) => self,
            (false, false) => Condition::All(vec![self, other]),
        }
    }

    /// Whether this condition constrains anything.
    pub fn is_empty(&self) -> bool {
        match self {
            Condition::None => true,
            Condition::All(items) | Condition::Any(items) => {
                items.iter().all(Condition::is_empty)
            }
            Condition::Eq { .. } | Condition::In { .. } | Condition::Raw { .. } => false,
        }
    }

    /// Render to a SQL fragment, appending bound parameters in order.
    ///
    /// Identifiers are quoted through the executor's rule; returns an empty
    /// string for unconstrained conditions.
    pub fn render(&self, quoter: &dyn SqlExecutor, params: &mut Vec<Value>) -> String {
        match self {
            Condition::None => String::new(),
            Condition::Eq { column, value } => {
                let column = quoter.quote_qualified(column);
                if value.is_null() {
                    format!("{column} IS NULL")
                } else {
                    params.push(value.clone());
                    format!("{column} = ?")
                }
            }
            Condition::In { column, values } => {
                if values.is_empty() {
                    // IN () is not valid SQL; an empty key set matches nothing.
                    return "1 = 0".to_string();
                }
                let column = quoter.quote_qualified(column);
                let placeholders = vec!["?"; values.len()].join(", ");
                params.extend(values.iter().cloned());
                format!("{column} IN ({placeholders})")
            }
            Condition::Raw { sql, params: own } => {
                params.extend(own.iter().cloned());
                sql.clone()
            }
            Condition::All(items) => Self::render_group(items, " AND ", quoter, params),
            Condition::Any(items) => Self::render_group(items, " OR ", quoter, params),
        }
    }

    fn render_group(
        items: &[Condition],
        separator: &str,
        quoter: &dyn SqlExecutor,
        params: &mut Vec<Value>,
    ) -> String {
        let fragments: Vec<String> = items
            .iter()
            .filter(|c| !c.is_empty())
            .map(|c| c.render(quoter, params))
            .collect();
        match fragments.len() {
            0 => String::new(),
            1 => fragments.into_iter().next().unwrap_or_default(),
            _ => format!("({})", fragments.join(separator)),
        }
    }
}
