//! The schema introspection boundary.

use activerow_core::Result;

use crate::descriptor::TableSchema;

/// External collaborator that reads table metadata out of the database.
///
/// One `introspect` call is one round trip; the
/// [`SchemaRegistry`](crate::SchemaRegistry) guarantees it is issued at most
/// once per table until an explicit refresh.
pub trait SchemaIntrospector: Send + Sync {
    /// Introspect a table: columns (name, nullable, default), primary key
    /// columns, and the auto-increment sequence identifier if any.
    ///
    /// Implementations should fail with `Error::Schema` when the table does
    /// not exist.
    fn introspect(&self, table: &str) -> Result<TableSchema>;
}
