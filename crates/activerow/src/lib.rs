//! ActiveRow: an active-record ORM core.
//!
//! Records bind in-memory attribute maps to rows of a relational table,
//! track their lifecycle (new / clean / dirty / deleted) through a persisted
//! snapshot, and resolve declared relations lazily or in batches.
//!
//! # Role In The Architecture
//!
//! - [`Record`] + [`AttributeStore`]: per-instance state and dirty tracking.
//! - [`EntityDef`] / [`RelationDef`]: declarative entity and relation
//!   templates, registered once in an [`EntityRegistry`].
//! - [`Finder`]: key/criteria finders and the batched relation resolver
//!   (the N+1 mitigation: one query per relation per owner batch).
//! - [`Context`]: explicit collaborator bundle — SQL executor, schema
//!   registry, entity registry, optional validator and lifecycle hooks.
//!
//! The SQL layer, schema introspector, and validation subsystem are
//! external collaborators reached only through traits; this crate issues
//! statements and interprets rows, nothing more.
//!
//! # Example
//!
//! ```ignore
//! let mut entities = EntityRegistry::new();
//! entities.register(
//!     EntityDef::new("customer", "customers")
//!         .relation(RelationDef::has_many("orders", "order", "customer_id")),
//! );
//! entities.register(EntityDef::new("order", "orders"));
//!
//! let schemas = SchemaRegistry::new(Box::new(introspector));
//! let ctx = Context::new(&executor, &schemas, &entities);
//!
//! let finder = Finder::new(&ctx, "customer")?;
//! let customers = finder.find_all_with(Criteria::new(), &["orders"])?;
//! ```

pub mod attributes;
pub mod context;
pub mod finder;
pub mod hooks;
pub mod record;
pub mod relation;
pub mod validate;

pub use attributes::AttributeStore;
pub use context::Context;
pub use finder::Finder;
pub use hooks::{Decision, LifecycleHooks};
pub use record::{
    Record, RecordCollection, RecordKey, RecordState, RelatedValue, SaveOptions, SaveOutcome,
};
pub use relation::{
    EntityDef, EntityRegistry, JunctionTable, RelationDef, RelationKind, RelationOptions,
    RelationOverride, split_key,
};
pub use validate::{RecordValidator, Rule, RuleKind, RuleValidator, matches_pattern};

// Re-export the sibling crates so most users depend on `activerow` alone.
pub use activerow_core::{
    Error, Result, Row, SqlExecutor, ValidationError, ValidationErrorKind, Value,
};
pub use activerow_query::{CommandBuilder, Condition, Criteria, Statement};
pub use activerow_schema::{ColumnSchema, SchemaIntrospector, SchemaRegistry, TableSchema};
