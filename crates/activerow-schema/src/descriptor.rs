//! Entity type descriptors.

use serde::{Deserialize, Serialize};

use activerow_core::Value;

/// A single column of a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSchema {
    /// Column name.
    pub name: String,
    /// Whether the column accepts NULL.
    pub nullable: bool,
    /// Default value, if the table declares one.
    pub default: Option<Value>,
}

impl ColumnSchema {
    /// Create a nullable column with no default.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nullable: true,
            default: None,
        }
    }

    /// Mark the column NOT NULL.
    #[must_use]
    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// Set the declared default value.
    #[must_use]
    pub fn default_value(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }
}

/// The descriptor for one entity type: table name, ordered columns, primary
/// key, and optional auto-increment sequence.
///
/// Descriptors are immutable after first load and shared out of the
/// [`SchemaRegistry`](crate::SchemaRegistry) behind an `Arc`; only an
/// explicit `refresh` replaces one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSchema {
    /// Table name.
    pub table: String,
    /// Columns in declaration order.
    pub columns: Vec<ColumnSchema>,
    /// Primary key column names (possibly composite).
    pub primary_key: Vec<String>,
    /// Auto-increment sequence identifier, if the key is generated.
    pub sequence_name: Option<String>,
}

impl TableSchema {
    /// Create a schema with no columns; used by builders and test fixtures.
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: Vec::new(),
            primary_key: Vec::new(),
            sequence_name: None,
        }
    }

    /// Append a column.
    #[must_use]
    pub fn column(mut self, column: ColumnSchema) -> Self {
        self.columns.push(column);
        self
    }

    /// Set the primary key column list.
    #[must_use]
    pub fn primary_key(mut self, columns: &[&str]) -> Self {
        self.primary_key = columns.iter().map(|&c| c.to_string()).collect();
        self
    }

    /// Set the auto-increment sequence identifier.
    #[must_use]
    pub fn sequence(mut self, name: impl Into<String>) -> Self {
        self.sequence_name = Some(name.into());
        self
    }

    /// Look up a column by name.
    pub fn find_column(&self, name: &str) -> Option<&ColumnSchema> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Check whether the table has a column.
    pub fn has_column(&self, name: &str) -> bool {
        self.find_column(name).is_some()
    }

    /// All column names, in declaration order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Check whether a column is part of the primary key.
    pub fn is_primary_key(&self, name: &str) -> bool {
        self.primary_key.iter().any(|pk| pk == name)
    }

    /// Whether the primary key is composite.
    pub fn has_composite_key(&self) -> bool {
        self.primary_key.len() > 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn customers() -> TableSchema {
        TableSchema::new("customers")
            .column(ColumnSchema::new("id").not_null())
            .column(ColumnSchema::new("name").not_null())
            .column(ColumnSchema::new("status").default_value(Value::Text("active".into())))
            .primary_key(&["id"])
            .sequence("customers_id_seq")
    }

    #[test]
    fn column_lookup() {
        let schema = customers();
        assert!(schema.has_column("name"));
        assert!(!schema.has_column("missing"));
        assert_eq!(schema.column_names(), vec!["id", "name", "status"]);
    }

    #[test]
    fn primary_key_helpers() {
        let schema = customers();
        assert!(schema.is_primary_key("id"));
        assert!(!schema.is_primary_key("name"));
        assert!(!schema.has_composite_key());

        let link = TableSchema::new("memberships").primary_key(&["org_id", "user_id"]);
        assert!(link.has_composite_key());
    }

    #[test]
    fn declared_defaults_survive() {
        let schema = customers();
        let status = schema.find_column("status").unwrap();
        assert_eq!(status.default, Some(Value::Text("active".into())));
        assert!(status.nullable);
    }
}
