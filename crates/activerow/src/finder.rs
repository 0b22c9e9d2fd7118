//! Finders and the relation resolver.
//!
//! A [`Finder`] reads records of one entity: by key, by criteria, or by
//! resolving a declared relation for one or many owner records. Relation
//! resolution is always batched — one query serves the whole owner set, and
//! rows are partitioned back to their owners by key — so eager loading N
//! owners costs one query per relation instead of N.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use activerow_core::{Error, Result, Value};
use activerow_query::{Condition, Criteria};
use activerow_schema::TableSchema;

use crate::context::Context;
use crate::record::{Record, RecordCollection, RelatedValue};
use crate::relation::{
    EntityDef, JunctionTable, RelationDef, RelationKind, RelationOverride, split_key,
};

/// Result column carrying a stat aggregate.
const STAT_ALIAS: &str = "__stat";
/// Result column prefix carrying junction owner keys; stripped on hydration.
const OWNER_ALIAS_PREFIX: &str = "__owner_";
/// Junction table alias in many-to-many queries.
const JUNCTION_ALIAS: &str = "j";

/// Read-side entry point for one entity.
pub struct Finder<'a> {
    ctx: Context<'a>,
    entity: Arc<EntityDef>,
    schema: Arc<TableSchema>,
}

impl<'a> Finder<'a> {
    /// Create a finder for a registered entity.
    #[allow(clippy::result_large_err)]
    pub fn new(ctx: &Context<'a>, entity: &str) -> Result<Self> {
        let entity_def = ctx
            .entities()
            .get(entity)
            .ok_or_else(|| Error::config(format!("entity '{entity}' is not registered")))?;
        let schema = ctx.schemas().describe(&entity_def.table)?;
        Ok(Self {
            ctx: *ctx,
            entity: entity_def,
            schema,
        })
    }

    /// The entity declaration this finder reads.
    pub fn entity(&self) -> &EntityDef {
        &self.entity
    }

    /// The table schema this finder reads.
    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    // ------------------------------------------------------------------
    // Record finders
    // ------------------------------------------------------------------

    /// Find one record by its (single-column) primary key value.
    #[allow(clippy::result_large_err)]
    pub fn find_by_pk(&self, pk: impl Into<Value>) -> Result<Option<Record>> {
        let key_cols = &self.schema.primary_key;
        if key_cols.len() != 1 {
            return Err(Error::config(format!(
                "table '{}' has a {}-column key; use find_by_pk_map",
                self.schema.table,
                key_cols.len()
            )));
        }
        self.find(Criteria::new().filter(Condition::eq(key_cols[0].clone(), pk)))
    }

    /// Find one record by a (possibly composite) primary key map.
    #[allow(clippy::result_large_err)]
    pub fn find_by_pk_map(&self, key: &BTreeMap<String, Value>) -> Result<Option<Record>> {
        if key.len() != self.schema.primary_key.len()
            || self.schema.primary_key.iter().any(|col| !key.contains_key(col))
        {
            return Err(Error::config(format!(
                "key map does not match the primary key of '{}' ({})",
                self.schema.table,
                self.schema.primary_key.join(", ")
            )));
        }
        self.find(Criteria::new().filter(Condition::from_attributes(key)))
    }

    /// Find the first record matching the criteria.
    #[allow(clippy::result_large_err)]
    pub fn find(&self, criteria: Criteria) -> Result<Option<Record>> {
        let criteria = criteria.limit(1);
        let stmt = self.ctx.commands().select(&self.schema.table, &criteria);
        let row = self.ctx.executor().query_one(&stmt.sql, &stmt.params)?;
        Ok(row.map(|row| self.hydrate_row(&row)))
    }

    /// Find all records matching the criteria.
    #[allow(clippy::result_large_err)]
    #[tracing::instrument(level = "debug", skip(self, criteria), fields(entity = %self.entity.name))]
    pub fn find_all(&self, criteria: Criteria) -> Result<Vec<Record>> {
        let stmt = self.ctx.commands().select(&self.schema.table, &criteria);
        let rows = self.ctx.executor().query(&stmt.sql, &stmt.params)?;
        tracing::debug!(rows = rows.len(), "Hydrating result set");
        Ok(rows.iter().map(|row| self.hydrate_row(row)).collect())
    }

    /// Find the first record with the given attribute values.
    #[allow(clippy::result_large_err)]
    pub fn find_by_attributes(
        &self,
        attributes: &BTreeMap<String, Value>,
    ) -> Result<Option<Record>> {
        self.find(Criteria::new().filter(Condition::from_attributes(attributes)))
    }

    /// Find all records with the given attribute values.
    #[allow(clippy::result_large_err)]
    pub fn find_all_by_attributes(
        &self,
        attributes: &BTreeMap<String, Value>,
    ) -> Result<Vec<Record>> {
        self.find_all(Criteria::new().filter(Condition::from_attributes(attributes)))
    }

    /// The criteria of a named scope declared on this entity.
    #[allow(clippy::result_large_err)]
    pub fn scoped(&self, name: &str) -> Result<Criteria> {
        self.entity.scopes.get(name).cloned().ok_or_else(|| {
            Error::config(format!(
                "entity '{}' declares no scope '{name}'",
                self.entity.name
            ))
        })
    }

    /// Count records matching the criteria.
    #[allow(clippy::result_large_err)]
    pub fn count(&self, criteria: &Criteria) -> Result<u64> {
        let stmt = self.ctx.commands().select_count(&self.schema.table, criteria);
        let row = self.ctx.executor().query_one(&stmt.sql, &stmt.params)?;
        Ok(row
            .and_then(|row| row.get(0).and_then(Value::as_i64))
            .unwrap_or(0)
            .max(0) as u64)
    }

    /// Whether any record matches the condition.
    #[allow(clippy::result_large_err)]
    pub fn exists(&self, condition: Condition) -> Result<bool> {
        Ok(self.count(&Criteria::new().filter(condition))? > 0)
    }

    /// Find all records and eager-load the named relations.
    ///
    /// Issues one query for the records plus one per relation across the
    /// whole result set.
    #[allow(clippy::result_large_err)]
    pub fn find_all_with(&self, criteria: Criteria, with: &[&str]) -> Result<Vec<Record>> {
        let mut records = self.find_all(criteria)?;
        for name in with {
            self.populate(&mut records, name, None)?;
        }
        Ok(records)
    }

    /// Batch-resolve a relation and attach the results to the records.
    #[allow(clippy::result_large_err)]
    pub fn populate(
        &self,
        records: &mut [Record],
        relation: &str,
        overrides: Option<&RelationOverride<'_>>,
    ) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }
        let values = {
            let refs: Vec<&Record> = records.iter().collect();
            self.resolve_related(&refs, relation, overrides)?
        };
        for (record, value) in records.iter_mut().zip(values) {
            record.set_related_cache(relation, value);
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Bulk writes
    // ------------------------------------------------------------------

    /// Update all matching rows; returns rows affected.
    #[allow(clippy::result_large_err)]
    pub fn update_all(&self, values: &[(String, Value)], condition: &Condition) -> Result<u64> {
        let stmt = self.ctx.commands().update(&self.schema.table, values, condition);
        self.ctx.executor().execute(&stmt.sql, &stmt.params)
    }

    /// Apply counter deltas to all matching rows; returns rows affected.
    #[allow(clippy::result_large_err)]
    pub fn update_all_counters(
        &self,
        deltas: &[(String, i64)],
        condition: &Condition,
    ) -> Result<u64> {
        let stmt = self
            .ctx
            .commands()
            .update_counters(&self.schema.table, deltas, condition);
        self.ctx.executor().execute(&stmt.sql, &stmt.params)
    }

    /// Delete all matching rows; returns rows affected.
    #[allow(clippy::result_large_err)]
    pub fn delete_all(&self, condition: &Condition) -> Result<u64> {
        let stmt = self.ctx.commands().delete(&self.schema.table, condition);
        self.ctx.executor().execute(&stmt.sql, &stmt.params)
    }

    // ------------------------------------------------------------------
    // Relation resolution
    // ------------------------------------------------------------------

    /// Resolve a relation for one owner.
    #[allow(clippy::result_large_err)]
    pub fn resolve_for(
        &self,
        owner: &Record,
        relation: &str,
        overrides: Option<&RelationOverride<'_>>,
    ) -> Result<RelatedValue> {
        let mut values = self.resolve_related(&[owner], relation, overrides)?;
        values
            .pop()
            .ok_or_else(|| Error::config("relation resolver produced no value"))
    }

    /// Resolve a relation for a batch of owners, one value per owner.
    ///
    /// The declared template is cloned and overrides applied; the template
    /// itself is never mutated. The whole batch is served by a single
    /// target query (plus the bridge query for "through" relations).
    #[allow(clippy::result_large_err)]
    #[tracing::instrument(
        level = "debug",
        skip(self, owners, overrides),
        fields(entity = %self.entity.name, relation = relation, owners = owners.len())
    )]
    pub fn resolve_related(
        &self,
        owners: &[&Record],
        relation: &str,
        overrides: Option<&RelationOverride<'_>>,
    ) -> Result<Vec<RelatedValue>> {
        let template = self
            .entity
            .relation_def(relation)
            .ok_or_else(|| Error::unknown_relation(&self.entity.name, relation))?;
        let rel = match overrides {
            Some(overrides) => overrides.apply(template.clone()),
            None => template.clone(),
        };

        if owners.is_empty() {
            return Ok(Vec::new());
        }
        if let Some(bridge) = rel.through.clone() {
            return self.resolve_through(owners, &rel, &bridge);
        }
        self.resolve_kind(owners, &rel)
    }

    fn resolve_kind(&self, owners: &[&Record], rel: &RelationDef) -> Result<Vec<RelatedValue>> {
        match &rel.kind {
            RelationKind::BelongsTo { foreign_key } => {
                self.resolve_belongs_to(owners, rel, foreign_key)
            }
            RelationKind::HasOne { foreign_key } => self.resolve_has(owners, rel, foreign_key, false),
            RelationKind::HasMany { foreign_key } => self.resolve_has(owners, rel, foreign_key, true),
            RelationKind::ManyToMany { junction } => {
                self.resolve_many_to_many(owners, rel, junction)
            }
            RelationKind::Stat {
                foreign_key,
                expression,
                default,
            } => self.resolve_stat(owners, rel, foreign_key, expression, default),
        }
    }

    /// BelongsTo: owner FK columns point at the target primary key.
    fn resolve_belongs_to(
        &self,
        owners: &[&Record],
        rel: &RelationDef,
        foreign_key: &str,
    ) -> Result<Vec<RelatedValue>> {
        let target = self.target_finder(rel)?;
        let fk_cols = split_key(foreign_key);
        let pk_cols = target.schema.primary_key.clone();
        check_key_arity(rel, &fk_cols, &pk_cols, &target.schema.table)?;

        let owner_tuples: Vec<Option<Vec<Value>>> =
            owners.iter().map(|o| key_tuple(o, &fk_cols)).collect();
        let distinct = distinct_tuples(&owner_tuples);
        if distinct.is_empty() {
            return Ok(owners.iter().map(|_| RelatedValue::One(None)).collect());
        }

        let criteria = self
            .relation_criteria(&target, rel)?
            .filter(key_set_condition(&pk_cols, &distinct));
        let mut records = target.find_all(criteria)?;
        target.populate_all(&mut records, &rel.options.with)?;

        let mut by_key: HashMap<String, Record> = HashMap::new();
        for record in records {
            if let Some(tuple) = key_tuple(&record, &pk_cols) {
                by_key.insert(tuple_key(&tuple), record);
            }
        }

        Ok(owner_tuples
            .into_iter()
            .map(|tuple| {
                let related = tuple.and_then(|t| by_key.get(&tuple_key(&t)).cloned());
                RelatedValue::One(related.map(Box::new))
            })
            .collect())
    }

    /// HasOne / HasMany: target FK columns point at the owner primary key.
    fn resolve_has(
        &self,
        owners: &[&Record],
        rel: &RelationDef,
        foreign_key: &str,
        many: bool,
    ) -> Result<Vec<RelatedValue>> {
        let target = self.target_finder(rel)?;
        let fk_cols = split_key(foreign_key);
        let owner_cols = self.schema.primary_key.clone();
        check_key_arity(rel, &fk_cols, &owner_cols, &self.schema.table)?;

        let owner_tuples: Vec<Option<Vec<Value>>> =
            owners.iter().map(|o| key_tuple(o, &owner_cols)).collect();
        let distinct = distinct_tuples(&owner_tuples);
        if distinct.is_empty() {
            return Ok(owner_tuples
                .iter()
                .map(|_| empty_value(rel, many))
                .collect());
        }

        let criteria = self
            .relation_criteria(&target, rel)?
            .filter(key_set_condition(&fk_cols, &distinct));
        let mut records = target.find_all(criteria)?;
        target.populate_all(&mut records, &rel.options.with)?;

        let mut buckets: HashMap<String, Vec<Record>> = HashMap::new();
        for record in records {
            if let Some(tuple) = key_tuple(&record, &fk_cols) {
                buckets.entry(tuple_key(&tuple)).or_default().push(record);
            }
        }

        Ok(owner_tuples
            .into_iter()
            .map(|tuple| {
                let matched = tuple.and_then(|t| buckets.get(&tuple_key(&t)));
                if many {
                    let records = matched.cloned().unwrap_or_default();
                    RelatedValue::Many(RecordCollection::new(
                        records,
                        rel.options.index_by.as_deref(),
                    ))
                } else {
                    RelatedValue::One(matched.and_then(|r| r.first().cloned()).map(Box::new))
                }
            })
            .collect())
    }

    /// ManyToMany: one query joining the junction, owner keys carried as
    /// reserved alias columns and stripped before hydration.
    fn resolve_many_to_many(
        &self,
        owners: &[&Record],
        rel: &RelationDef,
        junction: &JunctionTable,
    ) -> Result<Vec<RelatedValue>> {
        let target = self.target_finder(rel)?;
        let owner_cols = self.schema.primary_key.clone();
        let target_pk = target.schema.primary_key.clone();
        let j_owner_cols = junction.owner_key_columns();
        let j_target_cols = junction.target_key_columns();
        check_key_arity(rel, &j_owner_cols, &owner_cols, &self.schema.table)?;
        check_key_arity(rel, &j_target_cols, &target_pk, &target.schema.table)?;

        let owner_tuples: Vec<Option<Vec<Value>>> =
            owners.iter().map(|o| key_tuple(o, &owner_cols)).collect();
        let distinct = distinct_tuples(&owner_tuples);
        if distinct.is_empty() {
            return Ok(owner_tuples
                .iter()
                .map(|_| empty_value(rel, true))
                .collect());
        }

        let quoter = self.ctx.executor();
        let t_alias = rel
            .options
            .criteria
            .alias
            .clone()
            .unwrap_or_else(|| "t".to_string());

        let mut select: Vec<String> = target
            .schema
            .column_names()
            .iter()
            .map(|col| quoter.quote_qualified(&format!("{t_alias}.{col}")))
            .collect();
        for (i, col) in j_owner_cols.iter().enumerate() {
            select.push(format!(
                "{} AS {}",
                quoter.quote_qualified(&format!("{JUNCTION_ALIAS}.{col}")),
                quoter.quote_identifier(&format!("{OWNER_ALIAS_PREFIX}{i}"))
            ));
        }

        let join_kw = rel
            .options
            .join_kind
            .clone()
            .unwrap_or_else(|| "INNER JOIN".to_string());
        let on: Vec<String> = j_target_cols
            .iter()
            .zip(target_pk.iter())
            .map(|(junction_col, pk_col)| {
                format!(
                    "{} = {}",
                    quoter.quote_qualified(&format!("{JUNCTION_ALIAS}.{junction_col}")),
                    quoter.quote_qualified(&format!("{t_alias}.{pk_col}"))
                )
            })
            .collect();
        let join = format!(
            "{join_kw} {} AS {} ON {}",
            quoter.quote_identifier(&junction.table),
            quoter.quote_identifier(JUNCTION_ALIAS),
            on.join(" AND ")
        );

        let qualified_owner_cols: Vec<String> = j_owner_cols
            .iter()
            .map(|col| format!("{JUNCTION_ALIAS}.{col}"))
            .collect();

        let criteria = self
            .relation_criteria(&target, rel)?
            .merge(
                Criteria::new()
                    .select(select)
                    .alias(t_alias)
                    .join(join),
            )
            .filter(key_set_condition(&qualified_owner_cols, &distinct));

        let stmt = self.ctx.commands().select(&target.schema.table, &criteria);
        let rows = self.ctx.executor().query(&stmt.sql, &stmt.params)?;

        let mut keys: Vec<String> = Vec::with_capacity(rows.len());
        let mut records: Vec<Record> = Vec::with_capacity(rows.len());
        for row in &rows {
            let mut tuple = Vec::with_capacity(j_owner_cols.len());
            let mut complete = true;
            for i in 0..j_owner_cols.len() {
                match row.get_by_name(&format!("{OWNER_ALIAS_PREFIX}{i}")) {
                    Some(value) if !value.is_null() => tuple.push(value.clone()),
                    _ => {
                        complete = false;
                        break;
                    }
                }
            }
            if !complete {
                continue;
            }
            keys.push(tuple_key(&tuple));
            records.push(target.hydrate_row(row));
        }
        target.populate_all(&mut records, &rel.options.with)?;

        let mut buckets: HashMap<String, Vec<Record>> = HashMap::new();
        for (key, record) in keys.into_iter().zip(records) {
            buckets.entry(key).or_default().push(record);
        }

        Ok(owner_tuples
            .into_iter()
            .map(|tuple| {
                let records = tuple
                    .and_then(|t| buckets.get(&tuple_key(&t)).cloned())
                    .unwrap_or_default();
                RelatedValue::Many(RecordCollection::new(
                    records,
                    rel.options.index_by.as_deref(),
                ))
            })
            .collect())
    }

    /// Stat: one grouped aggregate query, one scalar per owner.
    fn resolve_stat(
        &self,
        owners: &[&Record],
        rel: &RelationDef,
        foreign_key: &str,
        expression: &str,
        default: &Value,
    ) -> Result<Vec<RelatedValue>> {
        let target = self.target_finder(rel)?;
        let fk_cols = split_key(foreign_key);
        let owner_cols = self.schema.primary_key.clone();
        check_key_arity(rel, &fk_cols, &owner_cols, &self.schema.table)?;

        let owner_tuples: Vec<Option<Vec<Value>>> =
            owners.iter().map(|o| key_tuple(o, &owner_cols)).collect();
        let distinct = distinct_tuples(&owner_tuples);
        if distinct.is_empty() {
            return Ok(owner_tuples
                .iter()
                .map(|_| RelatedValue::Scalar(default.clone()))
                .collect());
        }

        let quoter = self.ctx.executor();
        let mut select: Vec<String> = fk_cols
            .iter()
            .map(|col| quoter.quote_identifier(col))
            .collect();
        select.push(format!(
            "{expression} AS {}",
            quoter.quote_identifier(STAT_ALIAS)
        ));
        let group = fk_cols
            .iter()
            .map(|col| quoter.quote_identifier(col))
            .collect::<Vec<_>>()
            .join(", ");

        let criteria = self
            .relation_criteria(&target, rel)?
            .merge(Criteria::new().select(select).group(group))
            .filter(key_set_condition(&fk_cols, &distinct));

        let stmt = self.ctx.commands().select(&target.schema.table, &criteria);
        let rows = self.ctx.executor().query(&stmt.sql, &stmt.params)?;

        let mut by_key: HashMap<String, Value> = HashMap::new();
        for row in &rows {
            let mut tuple = Vec::with_capacity(fk_cols.len());
            let mut complete = true;
            for col in &fk_cols {
                match row.get_by_name(col) {
                    Some(value) if !value.is_null() => tuple.push(value.clone()),
                    _ => {
                        complete = false;
                        break;
                    }
                }
            }
            if !complete {
                continue;
            }
            let scalar = row.get_by_name(STAT_ALIAS).cloned().unwrap_or(Value::Null);
            by_key.insert(tuple_key(&tuple), scalar);
        }

        Ok(owner_tuples
            .into_iter()
            .map(|tuple| {
                let scalar = tuple
                    .and_then(|t| by_key.get(&tuple_key(&t)).cloned())
                    .unwrap_or_else(|| default.clone());
                RelatedValue::Scalar(scalar)
            })
            .collect())
    }

    /// "Through": resolve the bridge relation first, then resolve the target
    /// relation against the bridge records and regroup per original owner.
    fn resolve_through(
        &self,
        owners: &[&Record],
        rel: &RelationDef,
        bridge_name: &str,
    ) -> Result<Vec<RelatedValue>> {
        if matches!(rel.kind, RelationKind::ManyToMany { .. }) {
            return Err(Error::config(format!(
                "relation '{}': 'through' cannot be combined with a junction declaration",
                rel.name
            )));
        }
        let bridge_template = self.entity.relation_def(bridge_name).ok_or_else(|| {
            Error::config(format!(
                "relation '{}' bridges through unknown relation '{bridge_name}'",
                rel.name
            ))
        })?;
        let bridge_target = bridge_template.target.clone();

        let bridge_values = self.resolve_related(owners, bridge_name, None)?;

        let mut bridge_records: Vec<Record> = Vec::new();
        let mut owner_of: Vec<usize> = Vec::new();
        for (owner_idx, value) in bridge_values.into_iter().enumerate() {
            match value {
                RelatedValue::One(Some(record)) => {
                    bridge_records.push(*record);
                    owner_of.push(owner_idx);
                }
                RelatedValue::One(None) => {}
                RelatedValue::Many(collection) => {
                    for record in collection.into_records() {
                        bridge_records.push(record);
                        owner_of.push(owner_idx);
                    }
                }
                RelatedValue::Scalar(_) => {
                    return Err(Error::config(format!(
                        "relation '{}': cannot bridge through stat relation '{bridge_name}'",
                        rel.name
                    )));
                }
            }
        }

        let bridge_finder = Finder::new(&self.ctx, &bridge_target)?;
        let mut inner = rel.clone();
        inner.through = None;
        let inner_values = {
            let refs: Vec<&Record> = bridge_records.iter().collect();
            bridge_finder.resolve_kind(&refs, &inner)?
        };

        let mut grouped: Vec<Vec<RelatedValue>> = owners.iter().map(|_| Vec::new()).collect();
        for (value, &owner_idx) in inner_values.into_iter().zip(owner_of.iter()) {
            grouped[owner_idx].push(value);
        }

        Ok(grouped
            .into_iter()
            .map(|values| combine_through(rel, values))
            .collect())
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn hydrate_row(&self, row: &activerow_core::Row) -> Record {
        Record::hydrate(Arc::clone(&self.entity), Arc::clone(&self.schema), row)
    }

    #[allow(clippy::result_large_err)]
    fn populate_all(&self, records: &mut [Record], with: &[String]) -> Result<()> {
        for name in with {
            self.populate(records, name, None)?;
        }
        Ok(())
    }

    #[allow(clippy::result_large_err)]
    fn target_finder(&self, rel: &RelationDef) -> Result<Finder<'a>> {
        if self.ctx.entities().get(&rel.target).is_none() {
            return Err(Error::config(format!(
                "relation '{}' targets unregistered entity '{}'",
                rel.name, rel.target
            )));
        }
        Finder::new(&self.ctx, &rel.target)
    }

    /// The declared criteria of a relation plus any referenced named scopes
    /// of the target entity.
    #[allow(clippy::result_large_err)]
    fn relation_criteria(&self, target: &Finder<'_>, rel: &RelationDef) -> Result<Criteria> {
        let mut criteria = rel.options.criteria.clone();
        for scope in &rel.options.scopes {
            let scoped = target.entity.scopes.get(scope).ok_or_else(|| {
                Error::config(format!(
                    "relation '{}' references unknown scope '{scope}' on entity '{}'",
                    rel.name, target.entity.name
                ))
            })?;
            criteria = criteria.merge(scoped.clone());
        }
        Ok(criteria)
    }
}

impl std::fmt::Debug for Finder<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Finder")
            .field("entity", &self.entity.name)
            .field("table", &self.schema.table)
            .finish_non_exhaustive()
    }
}

/// The key values of a record for the given columns; `None` when any
/// component is unset or NULL (a NULL key never matches).
fn key_tuple(record: &Record, columns: &[String]) -> Option<Vec<Value>> {
    let mut values = Vec::with_capacity(columns.len());
    for column in columns {
        let value = record.get(column);
        if value.is_null() {
            return None;
        }
        values.push(value.clone());
    }
    Some(values)
}

/// Stable string form of a key tuple, usable as a map key.
fn tuple_key(values: &[Value]) -> String {
    values
        .iter()
        .map(Value::index_key)
        .collect::<Vec<_>>()
        .join("\u{1f}")
}

/// Order-preserving distinct over present key tuples.
fn distinct_tuples(tuples: &[Option<Vec<Value>>]) -> Vec<Vec<Value>> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for tuple in tuples.iter().flatten() {
        if seen.insert(tuple_key(tuple)) {
            out.push(tuple.clone());
        }
    }
    out
}

/// Constrain key columns to a tuple set: a single IN for plain keys, an OR
/// of per-tuple conjunctions for composite keys.
fn key_set_condition(columns: &[String], tuples: &[Vec<Value>]) -> Condition {
    if columns.len() == 1 {
        Condition::in_values(
            columns[0].clone(),
            tuples.iter().map(|t| t[0].clone()).collect(),
        )
    } else {
        Condition::any(
            tuples
                .iter()
                .map(|tuple| {
                    Condition::all(
                        columns
                            .iter()
                            .zip(tuple.iter())
                            .map(|(column, value)| Condition::eq(column.clone(), value.clone()))
                            .collect(),
                    )
                })
                .collect(),
        )
    }
}

#[allow(clippy::result_large_err)]
fn check_key_arity(
    rel: &RelationDef,
    declared: &[String],
    key: &[String],
    table: &str,
) -> Result<()> {
    if declared.is_empty() || declared.len() != key.len() {
        return Err(Error::config(format!(
            "relation '{}': key spec ({}) does not match the {}-column key of '{table}'",
            rel.name,
            declared.join(", "),
            key.len()
        )));
    }
    Ok(())
}

fn empty_value(rel: &RelationDef, many: bool) -> RelatedValue {
    if many {
        RelatedValue::Many(RecordCollection::new(
            Vec::new(),
            rel.options.index_by.as_deref(),
        ))
    } else {
        RelatedValue::One(None)
    }
}

/// Fold the per-bridge-record values of a "through" relation into one value
/// for the original owner.
fn combine_through(rel: &RelationDef, values: Vec<RelatedValue>) -> RelatedValue {
    match &rel.kind {
        RelationKind::HasMany { .. } => {
            // The same target can be reachable via several bridge records;
            // dedupe by primary-key identity, keeping first-seen order.
            let mut seen: HashSet<String> = HashSet::new();
            let mut records = Vec::new();
            for value in values {
                match value {
                    RelatedValue::Many(collection) => {
                        for record in collection.into_records() {
                            match record.key() {
                                Some(key) if !seen.insert(key.lookup_key()) => {}
                                _ => records.push(record),
                            }
                        }
                    }
                    RelatedValue::One(Some(record)) => records.push(*record),
                    _ => {}
                }
            }
            RelatedValue::Many(RecordCollection::new(
                records,
                rel.options.index_by.as_deref(),
            ))
        }
        RelationKind::HasOne { .. } | RelationKind::BelongsTo { .. } => {
            for value in values {
                match value {
                    RelatedValue::One(Some(record)) => return RelatedValue::One(Some(record)),
                    RelatedValue::Many(collection) => {
                        if let Some(record) = collection.into_records().into_iter().next() {
                            return RelatedValue::One(Some(Box::new(record)));
                        }
                    }
                    _ => {}
                }
            }
            RelatedValue::One(None)
        }
        RelationKind::Stat { default, .. } => {
            let mut any = false;
            let mut int_sum: i64 = 0;
            let mut float_sum: f64 = 0.0;
            let mut is_float = false;
            for value in values {
                if let RelatedValue::Scalar(scalar) = value {
                    if let Some(n) = scalar.as_i64() {
                        int_sum += n;
                        any = true;
                    } else if let Some(f) = scalar.as_f64() {
                        float_sum += f;
                        is_float = true;
                        any = true;
                    }
                }
            }
            if !any {
                RelatedValue::Scalar(default.clone())
            } else if is_float {
                RelatedValue::Scalar(Value::Double(float_sum + int_sum as f64))
            } else {
                RelatedValue::Scalar(Value::BigInt(int_sum))
            }
        }
        // Guarded against before bridge resolution.
        RelationKind::ManyToMany { .. } => RelatedValue::Many(RecordCollection::default()),
    }
}
