//! Record instances and the persistence lifecycle.
//!
//! A [`Record`] binds an in-memory attribute map to one row of a table. Its
//! lifecycle runs New → Clean ↔ Dirty → Deleted, with the persisted snapshot
//! in the [`AttributeStore`] as the source of truth: `is_new()` holds exactly
//! when the snapshot is absent.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use activerow_core::{Error, Result, Row, ValidationError, Value};
use activerow_query::{Condition, Criteria};
use activerow_schema::TableSchema;

use crate::attributes::AttributeStore;
use crate::context::Context;
use crate::finder::Finder;
use crate::relation::{EntityDef, RelationOverride};

static NULL_VALUE: Value = Value::Null;

/// Observable lifecycle state of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordState {
    /// Never persisted; insert is the only valid write.
    New,
    /// Persisted with no pending changes.
    Clean,
    /// Persisted with a non-empty dirty set.
    Dirty,
    /// Deleted; like New for the state machine, kept distinct for
    /// observability.
    Deleted,
}

impl RecordState {
    /// Lower-case name used in error messages and traces.
    pub fn name(self) -> &'static str {
        match self {
            RecordState::New => "new",
            RecordState::Clean => "clean",
            RecordState::Dirty => "dirty",
            RecordState::Deleted => "deleted",
        }
    }
}

/// Primary-key identity of a record.
///
/// Two records are identity-equal iff their table name and key tuple match;
/// content equality is deliberately not implied.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordKey {
    /// Table name.
    pub table: String,
    /// Primary key values, in key column order.
    pub values: Vec<Value>,
}

impl RecordKey {
    /// A stable string form usable as a map key.
    pub fn lookup_key(&self) -> String {
        self.values
            .iter()
            .map(Value::index_key)
            .collect::<Vec<_>>()
            .join("\u{1f}")
    }
}

/// The outcome of `save`/`insert`/`update`.
///
/// Both falsy paths are normal, non-exceptional short-circuits; they are
/// distinguished so callers and traces can tell a validation failure from a
/// hook veto.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// The write was issued (or was a no-op with an empty dirty set).
    Saved,
    /// Validation failed; errors are on the record, nothing was written.
    Invalid,
    /// A before-hook vetoed the operation; nothing was written.
    Vetoed,
}

impl SaveOutcome {
    /// The boolean view: did the operation succeed?
    pub fn saved(self) -> bool {
        matches!(self, SaveOutcome::Saved)
    }
}

/// Options for [`Record::save_with`].
#[derive(Debug, Clone, Default)]
pub struct SaveOptions {
    /// Skip the validation pass entirely.
    pub skip_validation: bool,
    /// Restrict validation and update to these attributes.
    pub attributes: Option<Vec<String>>,
}

/// An ordered collection of related records, optionally keyed by a column.
#[derive(Debug, Clone, Default)]
pub struct RecordCollection {
    records: Vec<Record>,
    index: Option<BTreeMap<String, usize>>,
}

impl RecordCollection {
    pub(crate) fn new(records: Vec<Record>, index_by: Option<&str>) -> Self {
        let index = index_by.map(|column| {
            records
                .iter()
                .enumerate()
                .map(|(position, record)| (record.get(column).index_key(), position))
                .collect()
        });
        Self { records, index }
    }

    /// The records, in result order.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Look up a record by its index-column value (requires `index_by`).
    pub fn get(&self, key: &str) -> Option<&Record> {
        let index = self.index.as_ref()?;
        index.get(key).and_then(|&position| self.records.get(position))
    }

    /// Whether the collection was declared with an index column.
    pub fn is_indexed(&self) -> bool {
        self.index.is_some()
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the collection is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterate over the records in order.
    pub fn iter(&self) -> impl Iterator<Item = &Record> {
        self.records.iter()
    }

    /// Consume into the underlying records.
    pub fn into_records(self) -> Vec<Record> {
        self.records
    }
}

/// A resolved relation value, cached per record per relation name.
#[derive(Debug, Clone)]
pub enum RelatedValue {
    /// BelongsTo / HasOne result.
    One(Option<Box<Record>>),
    /// HasMany / ManyToMany result; never null, possibly empty.
    Many(RecordCollection),
    /// Stat aggregate result.
    Scalar(Value),
}

impl RelatedValue {
    /// The single related record, if this is a One value.
    pub fn as_record(&self) -> Option<&Record> {
        match self {
            RelatedValue::One(record) => record.as_deref(),
            _ => None,
        }
    }

    /// The collection, if this is a Many value.
    pub fn as_collection(&self) -> Option<&RecordCollection> {
        match self {
            RelatedValue::Many(collection) => Some(collection),
            _ => None,
        }
    }

    /// The aggregate scalar, if this is a Stat value.
    pub fn as_scalar(&self) -> Option<&Value> {
        match self {
            RelatedValue::Scalar(value) => Some(value),
            _ => None,
        }
    }
}

/// An active record: current attributes, persisted snapshot, resolved
/// relation cache, and validation errors.
///
/// Instances are owned by one logical caller at a time; they are not
/// internally synchronized.
#[derive(Debug, Clone)]
pub struct Record {
    entity: Arc<EntityDef>,
    schema: Arc<TableSchema>,
    attrs: AttributeStore,
    related: HashMap<String, RelatedValue>,
    errors: ValidationError,
    deleted: bool,
}

impl Record {
    /// Create a new, unpersisted record for a registered entity.
    #[allow(clippy::result_large_err)]
    pub fn new(ctx: &Context<'_>, entity: &str) -> Result<Self> {
        let entity = ctx
            .entities()
            .get(entity)
            .ok_or_else(|| Error::config(format!("entity '{entity}' is not registered")))?;
        let schema = ctx.schemas().describe(&entity.table)?;
        Ok(Self {
            entity,
            schema,
            attrs: AttributeStore::new(),
            related: HashMap::new(),
            errors: ValidationError::new(),
            deleted: false,
        })
    }

    /// Hydrate a record from a query result row.
    ///
    /// Only schema columns are taken from the row, so decorated result sets
    /// (junction key aliases, aggregates) never leak into attributes. The
    /// snapshot is set to the hydrated values.
    pub(crate) fn hydrate(entity: Arc<EntityDef>, schema: Arc<TableSchema>, row: &Row) -> Self {
        let mut attrs = AttributeStore::new();
        for column in &schema.columns {
            if let Some(value) = row.get_by_name(&column.name) {
                attrs.set(column.name.clone(), value.clone());
            }
        }
        attrs.mark_persisted(attrs.current().clone());
        Self {
            entity,
            schema,
            attrs,
            related: HashMap::new(),
            errors: ValidationError::new(),
            deleted: false,
        }
    }

    /// The entity declaration this record belongs to.
    pub fn entity(&self) -> &EntityDef {
        &self.entity
    }

    /// The table schema this record is bound to.
    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    /// The backing table name.
    pub fn table(&self) -> &str {
        &self.schema.table
    }

    // ------------------------------------------------------------------
    // Attribute access
    // ------------------------------------------------------------------

    /// The current value of an attribute; NULL when unset.
    pub fn get(&self, name: &str) -> &Value {
        self.attrs.get(name).unwrap_or(&NULL_VALUE)
    }

    /// Set an attribute value.
    ///
    /// Names outside the table schema are stored but never persisted.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.attrs.set(name, value);
    }

    /// Set several attributes at once.
    pub fn set_many(&mut self, values: BTreeMap<String, Value>) {
        self.attrs.set_many(values);
    }

    /// Whether an attribute currently has a value.
    pub fn is_set(&self, name: &str) -> bool {
        self.attrs.is_set(name)
    }

    /// Remove an attribute value.
    pub fn unset(&mut self, name: &str) -> Option<Value> {
        self.attrs.unset(name)
    }

    /// Whether the schema declares this column.
    pub fn has_attribute(&self, name: &str) -> bool {
        self.schema.has_column(name)
    }

    /// Attribute values; all schema columns when `names` is unset, with NULL
    /// for missing ones.
    pub fn attributes(&self, names: Option<&[&str]>) -> BTreeMap<String, Value> {
        match names {
            Some(names) => self.attrs.all(names),
            None => self.attrs.all(&self.schema.column_names()),
        }
    }

    /// The dirty subset of attributes (schema columns only).
    pub fn changed(&self, names: Option<&[&str]>) -> BTreeMap<String, Value> {
        self.attrs
            .changed(names)
            .into_iter()
            .filter(|(name, _)| self.schema.has_column(name))
            .collect()
    }

    /// Whether the record has never been persisted.
    pub fn is_new(&self) -> bool {
        self.attrs.is_new()
    }

    /// The observable lifecycle state.
    pub fn state(&self) -> RecordState {
        if self.deleted {
            RecordState::Deleted
        } else if self.is_new() {
            RecordState::New
        } else if self.changed(None).is_empty() {
            RecordState::Clean
        } else {
            RecordState::Dirty
        }
    }

    /// Validation errors from the last `validate`/`save` pass.
    pub fn errors(&self) -> &ValidationError {
        &self.errors
    }

    /// Record an error from a custom validation pass.
    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.add_custom(field, message);
    }

    /// Clear recorded validation errors.
    pub fn clear_errors(&mut self) {
        self.errors = ValidationError::new();
    }

    // ------------------------------------------------------------------
    // Identity
    // ------------------------------------------------------------------

    /// Current primary key values, NULL for unset components.
    pub fn primary_key(&self) -> Vec<Value> {
        self.schema
            .primary_key
            .iter()
            .map(|col| self.get(col).clone())
            .collect()
    }

    /// Current primary key as a column→value map.
    pub fn primary_key_map(&self) -> BTreeMap<String, Value> {
        self.schema
            .primary_key
            .iter()
            .map(|col| (col.clone(), self.get(col).clone()))
            .collect()
    }

    /// The primary key as of the persisted snapshot.
    ///
    /// This — not the possibly mutated current key — is what update, delete,
    /// counter, and refresh statements key on.
    #[allow(clippy::result_large_err)]
    pub fn old_primary_key(&self) -> Result<Vec<Value>> {
        self.schema
            .primary_key
            .iter()
            .map(|col| {
                self.attrs.old_value(col).cloned().ok_or_else(|| {
                    Error::config(format!(
                        "record has no persisted value for key column '{col}'"
                    ))
                })
            })
            .collect()
    }

    /// The snapshot primary key as a column→value map.
    #[allow(clippy::result_large_err)]
    pub fn old_primary_key_map(&self) -> Result<BTreeMap<String, Value>> {
        let values = self.old_primary_key()?;
        Ok(self
            .schema
            .primary_key
            .iter()
            .cloned()
            .zip(values)
            .collect())
    }

    /// Identity key from the current attribute values.
    ///
    /// `None` while any key component is unset or NULL.
    pub fn key(&self) -> Option<RecordKey> {
        let values = self.primary_key();
        if values.iter().any(Value::is_null) {
            return None;
        }
        Some(RecordKey {
            table: self.schema.table.clone(),
            values,
        })
    }

    /// Primary-key identity comparison: same table, same key tuple.
    pub fn same_identity(&self, other: &Record) -> bool {
        match (self.key(), other.key()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }

    // ------------------------------------------------------------------
    // Relations
    // ------------------------------------------------------------------

    /// Resolve a declared relation, consulting the per-record cache.
    ///
    /// The first call issues the query and caches the result; later calls
    /// are pure cache reads until [`unset_related`](Self::unset_related).
    #[allow(clippy::result_large_err)]
    pub fn related(&mut self, ctx: &Context<'_>, name: &str) -> Result<&RelatedValue> {
        if !self.related.contains_key(name) {
            let finder = Finder::new(ctx, &self.entity.name)?;
            let value = finder.resolve_for(&*self, name, None)?;
            self.related.insert(name.to_string(), value);
        }
        Ok(&self.related[name])
    }

    /// Resolve a relation with caller overrides, refreshing the cache.
    #[allow(clippy::result_large_err)]
    pub fn related_with(
        &mut self,
        ctx: &Context<'_>,
        name: &str,
        overrides: &RelationOverride<'_>,
    ) -> Result<&RelatedValue> {
        let finder = Finder::new(ctx, &self.entity.name)?;
        let value = finder.resolve_for(&*self, name, Some(overrides))?;
        self.related.insert(name.to_string(), value);
        Ok(&self.related[name])
    }

    /// The cached relation value, if resolved.
    pub fn related_cached(&self, name: &str) -> Option<&RelatedValue> {
        self.related.get(name)
    }

    /// Invalidate a cached relation so the next access re-queries.
    pub fn unset_related(&mut self, name: &str) -> Option<RelatedValue> {
        self.related.remove(name)
    }

    pub(crate) fn set_related_cache(&mut self, name: &str, value: RelatedValue) {
        self.related.insert(name.to_string(), value);
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Validate through the context's validator; true when valid.
    ///
    /// Without an attached validator every record is valid.
    pub fn validate(&mut self, ctx: &Context<'_>, attributes: Option<&[String]>) -> bool {
        self.errors = match ctx.validator() {
            Some(validator) => validator.validate(self, attributes),
            None => ValidationError::new(),
        };
        self.errors.is_empty()
    }

    /// Validate, then insert or update depending on `is_new()`.
    #[allow(clippy::result_large_err)]
    pub fn save(&mut self, ctx: &Context<'_>) -> Result<SaveOutcome> {
        self.save_with(ctx, &SaveOptions::default())
    }

    /// `save` with explicit options.
    #[allow(clippy::result_large_err)]
    #[tracing::instrument(level = "debug", skip(self, ctx), fields(table = %self.schema.table))]
    pub fn save_with(&mut self, ctx: &Context<'_>, options: &SaveOptions) -> Result<SaveOutcome> {
        if !options.skip_validation && !self.validate(ctx, options.attributes.as_deref()) {
            tracing::debug!(
                errors = self.errors.len(),
                "Validation failed, save aborted"
            );
            return Ok(SaveOutcome::Invalid);
        }
        if self.is_new() {
            self.insert(ctx)
        } else if let Some(names) = &options.attributes {
            let names: Vec<&str> = names.iter().map(String::as_str).collect();
            self.perform_update(ctx, Some(&names))
        } else {
            self.perform_update(ctx, None)
        }
    }

    /// Insert the record; the snapshot becomes the post-insert values.
    ///
    /// Captures a generated key through the executor when the schema
    /// declares a sequence and the (single-column) key is unset.
    #[allow(clippy::result_large_err)]
    #[tracing::instrument(level = "debug", skip(self, ctx), fields(table = %self.schema.table))]
    pub fn insert(&mut self, ctx: &Context<'_>) -> Result<SaveOutcome> {
        if !self.is_new() {
            return Err(Error::invalid_state("insert", self.state().name()));
        }
        if let Some(hooks) = ctx.hooks() {
            if !hooks.before_insert(self).allowed() {
                tracing::debug!("Insert vetoed by before-hook");
                return Ok(SaveOutcome::Vetoed);
            }
        }

        let values = self.persistable_values();
        let stmt = ctx.commands().insert(&self.schema.table, &values);
        ctx.executor().execute(&stmt.sql, &stmt.params)?;

        if self.schema.sequence_name.is_some() && self.schema.primary_key.len() == 1 {
            let pk = self.schema.primary_key[0].clone();
            if !self.attrs.is_set(&pk) {
                let id = ctx
                    .executor()
                    .last_insert_id(self.schema.sequence_name.as_deref())?;
                self.attrs.set(pk, id);
            }
        }

        let snapshot: BTreeMap<String, Value> = self
            .attrs
            .current()
            .iter()
            .filter(|(name, _)| self.schema.has_column(name))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();
        self.attrs.mark_persisted(snapshot);
        self.deleted = false;

        if let Some(hooks) = ctx.hooks() {
            hooks.after_insert(self);
        }
        Ok(SaveOutcome::Saved)
    }

    /// Update the dirty attributes, keyed by the old primary key.
    ///
    /// An empty dirty set succeeds without a round trip.
    #[allow(clippy::result_large_err)]
    pub fn update(&mut self, ctx: &Context<'_>) -> Result<SaveOutcome> {
        self.perform_update(ctx, None)
    }

    /// Update only the named attributes (those that are dirty).
    #[allow(clippy::result_large_err)]
    pub fn update_attributes(&mut self, ctx: &Context<'_>, names: &[&str]) -> Result<SaveOutcome> {
        self.perform_update(ctx, Some(names))
    }

    #[allow(clippy::result_large_err)]
    #[tracing::instrument(level = "debug", skip(self, ctx, names), fields(table = %self.schema.table))]
    fn perform_update(&mut self, ctx: &Context<'_>, names: Option<&[&str]>) -> Result<SaveOutcome> {
        if self.is_new() {
            return Err(Error::invalid_state("update", self.state().name()));
        }
        if let Some(hooks) = ctx.hooks() {
            if !hooks.before_update(self).allowed() {
                tracing::debug!("Update vetoed by before-hook");
                return Ok(SaveOutcome::Vetoed);
            }
        }

        let dirty = self.changed(names);
        if dirty.is_empty() {
            tracing::debug!("Empty dirty set, no statement issued");
            return Ok(SaveOutcome::Saved);
        }

        let condition =
            Condition::by_key(&self.schema.primary_key, &self.old_primary_key()?)?;
        let sets: Vec<(String, Value)> = dirty.iter().map(|(n, v)| (n.clone(), v.clone())).collect();
        let stmt = ctx.commands().update(&self.schema.table, &sets, &condition);
        tracing::debug!(columns = sets.len(), "Issuing partial update");
        ctx.executor().execute(&stmt.sql, &stmt.params)?;

        let written: Vec<String> = dirty.keys().cloned().collect();
        self.attrs.advance_snapshot(&written);

        if let Some(hooks) = ctx.hooks() {
            hooks.after_update(self);
        }
        Ok(SaveOutcome::Saved)
    }

    /// Delete the row behind this record.
    ///
    /// The snapshot is cleared and the instance becomes un-updatable;
    /// returns `false` when the before-hook vetoes.
    #[allow(clippy::result_large_err)]
    #[tracing::instrument(level = "debug", skip(self, ctx), fields(table = %self.schema.table))]
    pub fn delete(&mut self, ctx: &Context<'_>) -> Result<bool> {
        if self.is_new() {
            return Err(Error::invalid_state("delete", self.state().name()));
        }
        if let Some(hooks) = ctx.hooks() {
            if !hooks.before_delete(self).allowed() {
                tracing::debug!("Delete vetoed by before-hook");
                return Ok(false);
            }
        }

        let condition =
            Condition::by_key(&self.schema.primary_key, &self.old_primary_key()?)?;
        let stmt = ctx.commands().delete(&self.schema.table, &condition);
        ctx.executor().execute(&stmt.sql, &stmt.params)?;

        self.attrs.mark_deleted();
        self.deleted = true;

        if let Some(hooks) = ctx.hooks() {
            hooks.after_delete(self);
        }
        Ok(true)
    }

    /// Apply counter deltas with a single increment statement, then adjust
    /// the in-memory attributes by the same deltas — no re-fetch.
    ///
    /// Returns whether a row was affected; memory is only adjusted when
    /// storage changed.
    #[allow(clippy::result_large_err)]
    #[tracing::instrument(level = "debug", skip(self, ctx, deltas), fields(table = %self.schema.table))]
    pub fn update_counters(&mut self, ctx: &Context<'_>, deltas: &[(&str, i64)]) -> Result<bool> {
        if self.is_new() {
            return Err(Error::invalid_state("update", self.state().name()));
        }

        let condition =
            Condition::by_key(&self.schema.primary_key, &self.old_primary_key()?)?;
        let owned: Vec<(String, i64)> = deltas
            .iter()
            .map(|&(name, delta)| (name.to_string(), delta))
            .collect();
        let stmt = ctx
            .commands()
            .update_counters(&self.schema.table, &owned, &condition);
        let affected = ctx.executor().execute(&stmt.sql, &stmt.params)?;
        if affected == 0 {
            return Ok(false);
        }

        for (name, delta) in owned {
            let base = self.attrs.get(&name).and_then(Value::as_i64).unwrap_or(0);
            self.attrs.set(name.clone(), Value::BigInt(base + delta));
            self.attrs.advance_snapshot(&[name]);
        }
        Ok(true)
    }

    /// Re-read all attributes from storage by the old primary key.
    ///
    /// Returns `false` and leaves the instance unchanged when the row is
    /// gone; the record does not transition to Deleted.
    #[allow(clippy::result_large_err)]
    pub fn refresh(&mut self, ctx: &Context<'_>) -> Result<bool> {
        self.perform_refresh(ctx, None)
    }

    /// Re-read only the named attributes from storage.
    #[allow(clippy::result_large_err)]
    pub fn refresh_attributes(&mut self, ctx: &Context<'_>, names: &[&str]) -> Result<bool> {
        self.perform_refresh(ctx, Some(names))
    }

    #[allow(clippy::result_large_err)]
    #[tracing::instrument(level = "debug", skip(self, ctx, names), fields(table = %self.schema.table))]
    fn perform_refresh(&mut self, ctx: &Context<'_>, names: Option<&[&str]>) -> Result<bool> {
        if self.is_new() {
            return Err(Error::invalid_state("refresh", self.state().name()));
        }

        let condition =
            Condition::by_key(&self.schema.primary_key, &self.old_primary_key()?)?;
        let criteria = Criteria::new().filter(condition).limit(1);
        let stmt = ctx.commands().select(&self.schema.table, &criteria);
        let Some(row) = ctx.executor().query_one(&stmt.sql, &stmt.params)? else {
            tracing::debug!("Row is gone, record left unchanged");
            return Ok(false);
        };

        let wanted: Vec<String> = match names {
            Some(names) => names.iter().map(|&n| n.to_string()).collect(),
            None => self
                .schema
                .column_names()
                .iter()
                .map(|&n| n.to_string())
                .collect(),
        };
        let mut touched = Vec::new();
        for name in &wanted {
            if let Some(value) = row.get_by_name(name) {
                self.attrs.set(name.clone(), value.clone());
                touched.push(name.clone());
            }
        }
        self.attrs.advance_snapshot(&touched);
        Ok(true)
    }

    fn persistable_values(&self) -> Vec<(String, Value)> {
        self.attrs
            .current()
            .iter()
            .filter(|(name, _)| self.schema.has_column(name))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use activerow_schema::ColumnSchema;

    fn order_schema() -> Arc<TableSchema> {
        Arc::new(
            TableSchema::new("orders")
                .column(ColumnSchema::new("id").not_null())
                .column(ColumnSchema::new("customer_id"))
                .column(ColumnSchema::new("total"))
                .primary_key(&["id"]),
        )
    }

    fn order_entity() -> Arc<EntityDef> {
        Arc::new(EntityDef::new("order", "orders"))
    }

    fn hydrated(id: i64, customer_id: i64) -> Record {
        let row = Row::new(
            vec!["id".into(), "customer_id".into(), "total".into()],
            vec![
                Value::BigInt(id),
                Value::BigInt(customer_id),
                Value::Double(9.5),
            ],
        );
        Record::hydrate(order_entity(), order_schema(), &row)
    }

    #[test]
    fn hydration_snapshots_and_is_clean() {
        let record = hydrated(1, 10);
        assert!(!record.is_new());
        assert_eq!(record.state(), RecordState::Clean);
        assert!(record.changed(None).is_empty());
        assert_eq!(record.get("customer_id"), &Value::BigInt(10));
    }

    #[test]
    fn hydration_ignores_extra_row_columns() {
        let row = Row::new(
            vec!["id".into(), "__owner_0".into()],
            vec![Value::BigInt(1), Value::BigInt(99)],
        );
        let record = Record::hydrate(order_entity(), order_schema(), &row);
        assert!(!record.is_set("__owner_0"));
        assert_eq!(record.get("__owner_0"), &Value::Null);
    }

    #[test]
    fn identity_requires_matching_table_and_key() {
        let a = hydrated(1, 10);
        let b = hydrated(1, 20);
        let c = hydrated(2, 10);

        assert!(a.same_identity(&b));
        assert!(!a.same_identity(&c));
    }

    #[test]
    fn key_is_none_while_unset() {
        let row = Row::new(vec!["customer_id".into()], vec![Value::BigInt(10)]);
        let record = Record::hydrate(order_entity(), order_schema(), &row);
        assert!(record.key().is_none());
    }

    #[test]
    fn record_key_lookup_is_stable() {
        let key = RecordKey {
            table: "orders".into(),
            values: vec![Value::BigInt(1), Value::Text("a".into())],
        };
        assert_eq!(key.lookup_key(), "1\u{1f}a");
    }

    #[test]
    fn collection_indexing() {
        let records = vec![hydrated(1, 10), hydrated(2, 20)];
        let collection = RecordCollection::new(records, Some("id"));
        assert!(collection.is_indexed());
        assert_eq!(collection.len(), 2);
        assert_eq!(
            collection.get("2").unwrap().get("customer_id"),
            &Value::BigInt(20)
        );
        assert!(collection.get("3").is_none());
    }

    #[test]
    fn unindexed_collection_has_no_key_lookup() {
        let collection = RecordCollection::new(vec![hydrated(1, 10)], None);
        assert!(!collection.is_indexed());
        assert!(collection.get("1").is_none());
    }

    #[test]
    fn save_outcome_boolean_view() {
        assert!(SaveOutcome::Saved.saved());
        assert!(!SaveOutcome::Invalid.saved());
        assert!(!SaveOutcome::Vetoed.saved());
    }
}
