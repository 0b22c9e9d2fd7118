//! Relation declarations.
//!
//! Relations are declared once per entity as read-only templates. Resolving
//! one for a specific record clones the template and may overlay
//! caller-supplied options or pass the clone through a pure transformation;
//! the stored template is never mutated.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use activerow_core::Value;
use activerow_query::{Condition, Criteria};

/// The junction table of a many-to-many relation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JunctionTable {
    /// The junction table name (e.g. `"post_tags"`).
    pub table: String,
    /// Junction column(s) pointing at the owner, comma-separated when the
    /// owner key is composite.
    pub owner_key: String,
    /// Junction column(s) pointing at the target, comma-separated when the
    /// target key is composite.
    pub target_key: String,
}

impl JunctionTable {
    /// Declare a junction table.
    pub fn new(
        table: impl Into<String>,
        owner_key: impl Into<String>,
        target_key: impl Into<String>,
    ) -> Self {
        Self {
            table: table.into(),
            owner_key: owner_key.into(),
            target_key: target_key.into(),
        }
    }

    /// The owner-side key columns.
    pub fn owner_key_columns(&self) -> Vec<String> {
        split_key(&self.owner_key)
    }

    /// The target-side key columns.
    pub fn target_key_columns(&self) -> Vec<String> {
        split_key(&self.target_key)
    }
}

/// The kind of a relation, each variant carrying only its own fields.
#[derive(Debug, Clone, PartialEq)]
pub enum RelationKind {
    /// The owner's foreign key points at the target's primary key.
    BelongsTo {
        /// FK column(s) on the owner, comma-separated when composite.
        foreign_key: String,
    },

    /// The target's foreign key points at the owner's primary key; at most
    /// one related record.
    HasOne {
        /// FK column(s) on the target, comma-separated when composite.
        foreign_key: String,
    },

    /// The target's foreign key points at the owner's primary key; a
    /// collection of related records.
    HasMany {
        /// FK column(s) on the target, comma-separated when composite.
        foreign_key: String,
    },

    /// Owner and target joined through a junction table.
    ManyToMany {
        junction: JunctionTable,
    },

    /// A grouped aggregate over the target, one scalar per owner.
    Stat {
        /// FK column(s) on the target, comma-separated when composite.
        foreign_key: String,
        /// Aggregate expression (e.g. `COUNT(*)`, `SUM(total)`).
        expression: String,
        /// Value assigned to owners with no matching rows.
        default: Value,
    },
}

impl RelationKind {
    /// Whether resolution yields a collection.
    pub fn is_collection(&self) -> bool {
        matches!(self, RelationKind::HasMany { .. } | RelationKind::ManyToMany { .. })
    }

    /// Short name used in traces and error messages.
    pub fn name(&self) -> &'static str {
        match self {
            RelationKind::BelongsTo { .. } => "belongs_to",
            RelationKind::HasOne { .. } => "has_one",
            RelationKind::HasMany { .. } => "has_many",
            RelationKind::ManyToMany { .. } => "many_to_many",
            RelationKind::Stat { .. } => "stat",
        }
    }
}

/// Query-shaping options attached to a relation declaration.
///
/// `criteria` carries the declared filter/order/group/having/limit/offset/
/// select/alias; the rest is relation-specific.
#[derive(Debug, Clone, Default)]
pub struct RelationOptions {
    /// Declared query shape, merged into the resolution query.
    pub criteria: Criteria,
    /// Key collections by this column's value instead of position.
    pub index_by: Option<String>,
    /// Relations of the target to eager-load alongside this one.
    pub with: Vec<String>,
    /// Join keyword for the junction hop (`"INNER JOIN"` when unset).
    pub join_kind: Option<String>,
    /// Named scopes of the target entity to merge in at resolve time.
    pub scopes: Vec<String>,
}

impl RelationOptions {
    /// Overlay another set of options onto this one.
    ///
    /// Criteria merge (conditions AND, shape fields replaced when set);
    /// `with` and `scopes` append; scalar fields are replaced when set.
    #[must_use]
    pub fn merge(mut self, overlay: RelationOptions) -> Self {
        self.criteria = self.criteria.merge(overlay.criteria);
        if overlay.index_by.is_some() {
            self.index_by = overlay.index_by;
        }
        self.with.extend(overlay.with);
        if overlay.join_kind.is_some() {
            self.join_kind = overlay.join_kind;
        }
        self.scopes.extend(overlay.scopes);
        self
    }
}

/// A declared relation: a read-only template resolved on demand.
#[derive(Debug, Clone)]
pub struct RelationDef {
    /// Relation name, unique per entity.
    pub name: String,
    /// Target entity name in the [`EntityRegistry`].
    pub target: String,
    /// Kind plus kind-specific join condition.
    pub kind: RelationKind,
    /// Bridging relation name for indirect ("through") associations.
    pub through: Option<String>,
    /// Query-shaping options.
    pub options: RelationOptions,
}

impl RelationDef {
    fn new(name: impl Into<String>, target: impl Into<String>, kind: RelationKind) -> Self {
        Self {
            name: name.into(),
            target: target.into(),
            kind,
            through: None,
            options: RelationOptions::default(),
        }
    }

    /// Declare a belongs-to relation (FK on the owner).
    pub fn belongs_to(
        name: impl Into<String>,
        target: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        Self::new(
            name,
            target,
            RelationKind::BelongsTo {
                foreign_key: foreign_key.into(),
            },
        )
    }

    /// Declare a has-one relation (FK on the target, single record).
    pub fn has_one(
        name: impl Into<String>,
        target: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        Self::new(
            name,
            target,
            RelationKind::HasOne {
                foreign_key: foreign_key.into(),
            },
        )
    }

    /// Declare a has-many relation (FK on the target, collection).
    pub fn has_many(
        name: impl Into<String>,
        target: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        Self::new(
            name,
            target,
            RelationKind::HasMany {
                foreign_key: foreign_key.into(),
            },
        )
    }

    /// Declare a many-to-many relation through a junction table.
    pub fn many_to_many(
        name: impl Into<String>,
        target: impl Into<String>,
        junction: JunctionTable,
    ) -> Self {
        Self::new(name, target, RelationKind::ManyToMany { junction })
    }

    /// Declare a stat relation: `COUNT(*)` per owner, default `0`.
    pub fn stat(
        name: impl Into<String>,
        target: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        Self::new(
            name,
            target,
            RelationKind::Stat {
                foreign_key: foreign_key.into(),
                expression: "COUNT(*)".to_string(),
                default: Value::BigInt(0),
            },
        )
    }

    /// Replace the stat aggregate expression (no-op on other kinds).
    #[must_use]
    pub fn expression(mut self, expr: impl Into<String>) -> Self {
        if let RelationKind::Stat { expression, .. } = &mut self.kind {
            *expression = expr.into();
        }
        self
    }

    /// Replace the stat default value (no-op on other kinds).
    #[must_use]
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        if let RelationKind::Stat { default, .. } = &mut self.kind {
            *default = value.into();
        }
        self
    }

    /// Resolve through another relation of the owner.
    #[must_use]
    pub fn through(mut self, relation: impl Into<String>) -> Self {
        self.through = Some(relation.into());
        self
    }

    /// AND an extra filter into the relation query.
    #[must_use]
    pub fn filter(mut self, condition: Condition) -> Self {
        self.options.criteria = self.options.criteria.filter(condition);
        self
    }

    /// Declared ordering for the related rows.
    #[must_use]
    pub fn order(mut self, expression: impl Into<String>) -> Self {
        self.options.criteria = self.options.criteria.order(expression);
        self
    }

    /// Declared GROUP BY.
    #[must_use]
    pub fn group(mut self, expression: impl Into<String>) -> Self {
        self.options.criteria = self.options.criteria.group(expression);
        self
    }

    /// Declared HAVING.
    #[must_use]
    pub fn having(mut self, condition: Condition) -> Self {
        self.options.criteria = self.options.criteria.having(condition);
        self
    }

    /// Declared LIMIT.
    #[must_use]
    pub fn limit(mut self, limit: u64) -> Self {
        self.options.criteria = self.options.criteria.limit(limit);
        self
    }

    /// Declared OFFSET.
    #[must_use]
    pub fn offset(mut self, offset: u64) -> Self {
        self.options.criteria = self.options.criteria.offset(offset);
        self
    }

    /// Alias for the target table in the relation query.
    #[must_use]
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.options.criteria = self.options.criteria.alias(alias);
        self
    }

    /// Key the resolved collection by this column's value.
    #[must_use]
    pub fn index_by(mut self, column: impl Into<String>) -> Self {
        self.options.index_by = Some(column.into());
        self
    }

    /// Eager-load these target relations alongside this one.
    #[must_use]
    pub fn with(mut self, relations: &[&str]) -> Self {
        self.options
            .with
            .extend(relations.iter().map(|&r| r.to_string()));
        self
    }

    /// Join keyword for the junction hop.
    #[must_use]
    pub fn join_kind(mut self, keyword: impl Into<String>) -> Self {
        self.options.join_kind = Some(keyword.into());
        self
    }

    /// Reference a named scope of the target entity.
    #[must_use]
    pub fn scope(mut self, name: impl Into<String>) -> Self {
        self.options.scopes.push(name.into());
        self
    }
}

/// A caller-supplied override applied to a cloned relation template.
pub enum RelationOverride<'a> {
    /// Overlay these options onto the template's.
    Options(RelationOptions),
    /// A pure transformation of the cloned template.
    Transform(&'a dyn Fn(RelationDef) -> RelationDef),
}

impl RelationOverride<'_> {
    /// Apply this override to a cloned template.
    #[must_use]
    pub fn apply(&self, template: RelationDef) -> RelationDef {
        match self {
            RelationOverride::Options(overlay) => {
                let mut def = template;
                def.options = def.options.merge(overlay.clone());
                def
            }
            RelationOverride::Transform(f) => f(template),
        }
    }
}

impl std::fmt::Debug for RelationOverride<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RelationOverride::Options(options) => {
                f.debug_tuple("Options").field(options).finish()
            }
            RelationOverride::Transform(_) => f.debug_tuple("Transform").finish(),
        }
    }
}

/// The declaration of one record class: table, relations, named scopes.
#[derive(Debug, Clone, Default)]
pub struct EntityDef {
    /// Entity name, unique in the registry.
    pub name: String,
    /// Backing table name.
    pub table: String,
    /// Relation templates by name.
    pub relations: BTreeMap<String, RelationDef>,
    /// Named criteria reusable from relation options and finder calls.
    pub scopes: BTreeMap<String, Criteria>,
}

impl EntityDef {
    /// Declare an entity.
    pub fn new(name: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table: table.into(),
            relations: BTreeMap::new(),
            scopes: BTreeMap::new(),
        }
    }

    /// Add a relation template.
    #[must_use]
    pub fn relation(mut self, def: RelationDef) -> Self {
        self.relations.insert(def.name.clone(), def);
        self
    }

    /// Add a named scope.
    #[must_use]
    pub fn scope(mut self, name: impl Into<String>, criteria: Criteria) -> Self {
        self.scopes.insert(name.into(), criteria);
        self
    }

    /// Look up a relation template.
    pub fn relation_def(&self, name: &str) -> Option<&RelationDef> {
        self.relations.get(name)
    }
}

/// Registry of entity declarations, keyed by entity name.
///
/// Relation targets are resolved by name through this registry, which keeps
/// cyclic relation graphs unproblematic.
#[derive(Debug, Default)]
pub struct EntityRegistry {
    entities: HashMap<String, Arc<EntityDef>>,
}

impl EntityRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an entity, returning the shared handle.
    pub fn register(&mut self, def: EntityDef) -> Arc<EntityDef> {
        let def = Arc::new(def);
        self.entities.insert(def.name.clone(), Arc::clone(&def));
        def
    }

    /// Look up an entity by name.
    pub fn get(&self, name: &str) -> Option<Arc<EntityDef>> {
        self.entities.get(name).map(Arc::clone)
    }
}

/// Split a comma-separated key declaration into its columns.
pub fn split_key(spec: &str) -> Vec<String> {
    spec.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_composite_keys() {
        assert_eq!(split_key("org_id, user_id"), vec!["org_id", "user_id"]);
        assert_eq!(split_key("customer_id"), vec!["customer_id"]);
        assert!(split_key("").is_empty());
    }

    #[test]
    fn builders_shape_options() {
        let rel = RelationDef::has_many("orders", "order", "customer_id")
            .order("created_at DESC")
            .index_by("id")
            .limit(50);

        assert!(rel.kind.is_collection());
        assert_eq!(rel.options.criteria.order.as_deref(), Some("created_at DESC"));
        assert_eq!(rel.options.index_by.as_deref(), Some("id"));
        assert_eq!(rel.options.criteria.limit, Some(50));
    }

    #[test]
    fn stat_defaults() {
        let rel = RelationDef::stat("order_count", "order", "customer_id");
        match &rel.kind {
            RelationKind::Stat {
                expression,
                default,
                ..
            } => {
                assert_eq!(expression, "COUNT(*)");
                assert_eq!(default, &Value::BigInt(0));
            }
            other => panic!("unexpected kind {other:?}"),
        }

        let sum = RelationDef::stat("revenue", "order", "customer_id")
            .expression("SUM(total)")
            .default_value(Value::Double(0.0));
        match &sum.kind {
            RelationKind::Stat { expression, .. } => assert_eq!(expression, "SUM(total)"),
            other => panic!("unexpected kind {other:?}"),
        }
    }

    #[test]
    fn override_overlay_does_not_touch_template() {
        let template = RelationDef::has_many("orders", "order", "customer_id").limit(10);

        let overlay = RelationOverride::Options(RelationOptions {
            criteria: Criteria::new().limit(3),
            ..RelationOptions::default()
        });
        let resolved = overlay.apply(template.clone());

        assert_eq!(resolved.options.criteria.limit, Some(3));
        assert_eq!(template.options.criteria.limit, Some(10));
    }

    #[test]
    fn override_transform_is_pure() {
        let template = RelationDef::has_many("orders", "order", "customer_id");
        let transform = |def: RelationDef| def.order("id DESC");
        let resolved = RelationOverride::Transform(&transform).apply(template.clone());

        assert_eq!(resolved.options.criteria.order.as_deref(), Some("id DESC"));
        assert!(template.options.criteria.order.is_none());
    }

    #[test]
    fn registry_round_trip() {
        let mut registry = EntityRegistry::new();
        registry.register(
            EntityDef::new("customer", "customers")
                .relation(RelationDef::has_many("orders", "order", "customer_id")),
        );

        let customer = registry.get("customer").unwrap();
        assert!(customer.relation_def("orders").is_some());
        assert!(customer.relation_def("payments").is_none());
        assert!(registry.get("order").is_none());
    }

    #[test]
    fn junction_composite_columns() {
        let junction = JunctionTable::new("memberships", "org_id, user_id", "team_id");
        assert_eq!(junction.owner_key_columns(), vec!["org_id", "user_id"]);
        assert_eq!(junction.target_key_columns(), vec!["team_id"]);
    }
}
