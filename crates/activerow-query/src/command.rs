//! Statement construction for INSERT, UPDATE, DELETE, and SELECT.

use activerow_core::{SqlExecutor, Value};

use crate::condition::Condition;
use crate::criteria::Criteria;

/// A finished statement template plus its ordered bound parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    /// SQL text with `?` positional placeholders.
    pub sql: String,
    /// Parameters in placeholder order.
    pub params: Vec<Value>,
}

impl Statement {
    /// Create a statement.
    pub fn new(sql: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }
}

/// Pure statement construction against an identifier-quoting rule.
///
/// The builder never executes anything; execution belongs to the
/// [`SqlExecutor`]. It borrows the executor solely for its quoting rule.
#[derive(Clone, Copy)]
pub struct CommandBuilder<'a> {
    quoter: &'a dyn SqlExecutor,
}

impl<'a> CommandBuilder<'a> {
    /// Create a builder that quotes identifiers through the given executor.
    pub fn new(quoter: &'a dyn SqlExecutor) -> Self {
        Self { quoter }
    }

    /// `INSERT INTO table (cols...) VALUES (?...)`.
    pub fn insert(&self, table: &str, values: &[(String, Value)]) -> Statement {
        let columns: Vec<String> = values
            .iter()
            .map(|(name, _)| self.quoter.quote_identifier(name))
            .collect();
        let placeholders = vec!["?"; values.len()].join(", ");
        let params: Vec<Value> = values.iter().map(|(_, value)| value.clone()).collect();

        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.quoter.quote_identifier(table),
            columns.join(", "),
            placeholders
        );
        Statement::new(sql, params)
    }

    /// `UPDATE table SET col = ?, ... WHERE ...`.
    pub fn update(
        &self,
        table: &str,
        sets: &[(String, Value)],
        condition: &Condition,
    ) -> Statement {
        let mut params = Vec::new();
        let assignments: Vec<String> = sets
            .iter()
            .map(|(name, value)| {
                params.push(value.clone());
                format!("{} = ?", self.quoter.quote_identifier(name))
            })
            .collect();

        let mut sql = format!(
            "UPDATE {} SET {}",
            self.quoter.quote_identifier(table),
            assignments.join(", ")
        );
        self.push_where(&mut sql, condition, &mut params);
        Statement::new(sql, params)
    }

    /// Counter increments: `SET col = col + ?` for positive deltas and
    /// `col = col - ?` with the magnitude for negative ones.
    pub fn update_counters(
        &self,
        table: &str,
        deltas: &[(String, i64)],
        condition: &Condition,
    ) -> Statement {
        let mut params = Vec::new();
        let assignments: Vec<String> = deltas
            .iter()
            .map(|(name, delta)| {
                let column = self.quoter.quote_identifier(name);
                let op = if *delta < 0 { "-" } else { "+" };
                params.push(Value::BigInt(delta.abs()));
                format!("{column} = {column} {op} ?")
            })
            .collect();

        let mut sql = format!(
            "UPDATE {} SET {}",
            self.quoter.quote_identifier(table),
            assignments.join(", ")
        );
        self.push_where(&mut sql, condition, &mut params);
        Statement::new(sql, params)
    }

    /// `DELETE FROM table WHERE ...`.
    pub fn delete(&self, table: &str, condition: &Condition) -> Statement {
        let mut params = Vec::new();
        let mut sql = format!("DELETE FROM {}", self.quoter.quote_identifier(table));
        self.push_where(&mut sql, condition, &mut params);
        Statement::new(sql, params)
    }

    /// `SELECT ... FROM table ...` from a full criteria.
    pub fn select(&self, table: &str, criteria: &Criteria) -> Statement {
        let projection = criteria
            .select
            .as_ref()
            .map_or_else(|| "*".to_string(), |cols| cols.join(", "));
        self.select_projection(table, &projection, criteria)
    }

    /// `SELECT COUNT(*) FROM table ...` honoring the criteria constraints.
    pub fn select_count(&self, table: &str, criteria: &Criteria) -> Statement {
        self.select_projection(table, "COUNT(*)", criteria)
    }

    fn select_projection(&self, table: &str, projection: &str, criteria: &Criteria) -> Statement {
        let mut params = Vec::new();
        let mut sql = format!(
            "SELECT {} FROM {}",
            projection,
            self.quoter.quote_identifier(table)
        );
        if let Some(alias) = &criteria.alias {
            sql.push_str(" AS ");
            sql.push_str(&self.quoter.quote_identifier(alias));
        }
        for join in &criteria.joins {
            sql.push(' ');
            sql.push_str(join);
        }
        self.push_where(&mut sql, &criteria.condition, &mut params);
        if let Some(group) = &criteria.group {
            sql.push_str(" GROUP BY ");
            sql.push_str(group);
        }
        let having = criteria.having.render(self.quoter, &mut params);
        if !having.is_empty() {
            sql.push_str(" HAVING ");
            sql.push_str(&having);
        }
        if let Some(order) = &criteria.order {
            sql.push_str(" ORDER BY ");
            sql.push_str(order);
        }
        if let Some(limit) = criteria.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }
        if let Some(offset) = criteria.offset {
            sql.push_str(&format!(" OFFSET {offset}"));
        }
        Statement::new(sql, params)
    }

    fn push_where(&self, sql: &mut String, condition: &Condition, params: &mut Vec<Value>) {
        let fragment = condition.render(self.quoter, params);
        if !fragment.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&fragment);
        }
    }
}

impl std::fmt::Debug for CommandBuilder<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandBuilder").finish_non_exhaustive()
    }
}
