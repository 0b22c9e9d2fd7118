//! Table metadata registry for ActiveRow.
//!
//! `activerow-schema` is the **metadata layer**. It owns the entity type
//! descriptors and the process-wide cache that serves them.
//!
//! # Role In The Architecture
//!
//! - [`TableSchema`] / [`ColumnSchema`]: immutable per-entity-type descriptors.
//! - [`SchemaIntrospector`]: the collaborator trait the external driver
//!   implements to read table metadata.
//! - [`SchemaRegistry`]: append-only cache with one introspection round trip
//!   per table and explicit `refresh`.

pub mod descriptor;
pub mod introspect;
pub mod registry;

pub use descriptor::{ColumnSchema, TableSchema};
pub use introspect::SchemaIntrospector;
pub use registry::SchemaRegistry;
