//! The SQL execution boundary.
//!
//! This core never talks to a database directly. Every read or write goes
//! through [`SqlExecutor`], implemented by an external driver (or a test
//! double). Statements are templates with `?` positional placeholders; all
//! scalar values travel as bound parameters.

use crate::Result;
use crate::row::Row;
use crate::value::Value;

/// A database executor capable of running parametrized statements.
///
/// Every operation is a blocking round trip and returns only after
/// completion. Cancellation, timeouts, and transactional scope are the
/// executor's (or the caller's) responsibility; this core issues statements
/// one at a time and never wraps multi-statement sequences in an implicit
/// transaction.
pub trait SqlExecutor: Send + Sync {
    /// Execute a write statement (INSERT, UPDATE, DELETE); returns rows affected.
    fn execute(&self, sql: &str, params: &[Value]) -> Result<u64>;

    /// Execute a read statement and return all rows.
    fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>>;

    /// Execute a read statement and return the first row, if any.
    fn query_one(&self, sql: &str, params: &[Value]) -> Result<Option<Row>> {
        Ok(self.query(sql, params)?.into_iter().next())
    }

    /// The key generated by the most recent INSERT.
    ///
    /// `sequence` is the auto-increment sequence identifier from the table
    /// schema, for engines that need one; engines with per-connection
    /// last-insert-id semantics may ignore it.
    fn last_insert_id(&self, sequence: Option<&str>) -> Result<Value>;

    /// Quote an identifier according to the engine's quoting rule.
    ///
    /// The default doubles embedded quotes and wraps in ANSI double quotes.
    fn quote_identifier(&self, name: &str) -> String {
        let escaped = name.replace('"', "\"\"");
        format!("\"{escaped}\"")
    }

    /// Quote a possibly qualified identifier (`alias.column`), quoting each part.
    fn quote_qualified(&self, name: &str) -> String {
        name.split('.')
            .map(|part| self.quote_identifier(part))
            .collect::<Vec<_>>()
            .join(".")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoopExecutor;

    impl SqlExecutor for NoopExecutor {
        fn execute(&self, _sql: &str, _params: &[Value]) -> Result<u64> {
            Ok(0)
        }

        fn query(&self, _sql: &str, _params: &[Value]) -> Result<Vec<Row>> {
            Ok(vec![Row::new(vec!["one".into()], vec![Value::Int(1)])])
        }

        fn last_insert_id(&self, _sequence: Option<&str>) -> Result<Value> {
            Ok(Value::BigInt(1))
        }
    }

    #[test]
    fn default_quoting_is_ansi() {
        let ex = NoopExecutor;
        assert_eq!(ex.quote_identifier("name"), "\"name\"");
        assert_eq!(ex.quote_identifier("we\"ird"), "\"we\"\"ird\"");
        assert_eq!(ex.quote_qualified("t.name"), "\"t\".\"name\"");
    }

    #[test]
    fn query_one_takes_first_row() {
        let ex = NoopExecutor;
        let row = ex.query_one("SELECT 1", &[]).unwrap().unwrap();
        assert_eq!(row.get_by_name("one"), Some(&Value::Int(1)));
    }
}
