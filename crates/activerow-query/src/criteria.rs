//! Query-shaping criteria.

use crate::condition::Condition;

/// The declarative shape of a SELECT: projection, constraints, grouping,
/// ordering, and pagination.
///
/// Criteria are plain data. Relation templates carry one, callers build one
/// for finder calls, and override overlays merge one into another; the
/// statement text is only produced by the
/// [`CommandBuilder`](crate::CommandBuilder).
#[derive(Debug, Clone, Default)]
pub struct Criteria {
    /// Projection: pre-rendered select list entries. `None` selects `*`.
    pub select: Option<Vec<String>>,
    /// WHERE tree.
    pub condition: Condition,
    /// Raw JOIN fragments, appended after FROM in order (caller opt-in).
    pub joins: Vec<String>,
    /// GROUP BY expression.
    pub group: Option<String>,
    /// HAVING tree.
    pub having: Condition,
    /// ORDER BY expression (e.g. `"created_at DESC"`).
    pub order: Option<String>,
    /// LIMIT row count.
    pub limit: Option<u64>,
    /// OFFSET row count.
    pub offset: Option<u64>,
    /// Table alias for FROM.
    pub alias: Option<String>,
}

impl Criteria {
    /// An unconstrained criteria.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the projection.
    #[must_use]
    pub fn select(mut self, columns: Vec<String>) -> Self {
        self.select = Some(columns);
        self
    }

    /// AND a condition into the WHERE tree.
    #[must_use]
    pub fn filter(mut self, condition: Condition) -> Self {
        self.condition = std::mem::take(&mut self.condition).and(condition);
        self
    }

    /// Append a raw JOIN fragment.
    #[must_use]
    pub fn join(mut self, fragment: impl Into<String>) -> Self {
        self.joins.push(fragment.into());
        self
    }

    /// Set the GROUP BY expression.
    #[must_use]
    pub fn group(mut self, expression: impl Into<String>) -> Self {
        self.group = Some(expression.into());
        self
    }

    /// AND a condition into the HAVING tree.
    #[must_use]
    pub fn having(mut self, condition: Condition) -> Self {
        self.having = std::mem::take(&mut self.having).and(condition);
        self
    }

    /// Set the ORDER BY expression.
    #[must_use]
    pub fn order(mut self, expression: impl Into<String>) -> Self {
        self.order = Some(expression.into());
        self
    }

    /// Set the LIMIT.
    #[must_use]
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Set the OFFSET.
    #[must_use]
    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Alias the FROM table.
    #[must_use]
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Overlay another criteria onto this one.
    ///
    /// Conditions combine under AND and joins append; scalar shape fields
    /// (select, group, order, limit, offset, alias) are replaced when the
    /// overlay sets them.
    #[must_use]
    pub fn merge(mut self, overlay: Criteria) -> Self {
        self.condition = std::mem::take(&mut self.condition).and(overlay.condition);
        self.having = std::mem::take(&mut self.having).and(overlay.having);
        self.joins.extend(overlay.joins);
        if overlay.select.is_some() {
            self.select = overlay.select;
        }
        if overlay.group.is_some() {
            self.group = overlay.group;
        }
        if overlay.order.is_some() {
            self.order = overlay.order;
        }
        if overlay.limit.is_some() {
            self.limit = overlay.limit;
        }
        if overlay.offset.is_some() {
            self.offset = overlay.offset;
        }
        if overlay.alias.is_some() {
            self.alias = overlay.alias;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use activerow_core::Value;

    #[test]
    fn filter_accumulates_under_and() {
        let criteria = Criteria::new()
            .filter(Condition::eq("a", 1i64))
            .filter(Condition::eq("b", 2i64));
        assert!(matches!(criteria.condition, Condition::All(_)));
    }

    #[test]
    fn merge_overlays_shape_fields() {
        let base = Criteria::new()
            .order("id ASC")
            .limit(10)
            .filter(Condition::eq("status", "active"));
        let overlay = Criteria::new()
            .order("created_at DESC")
            .filter(Condition::eq("kind", "retail"));

        let merged = base.merge(overlay);
        assert_eq!(merged.order.as_deref(), Some("created_at DESC"));
        assert_eq!(merged.limit, Some(10));
        assert!(!merged.condition.is_empty());
    }

    #[test]
    fn merge_appends_joins() {
        let base = Criteria::new().join("JOIN a ON a.id = t.a_id");
        let merged = base.merge(Criteria::new().join("JOIN b ON b.id = t.b_id"));
        assert_eq!(merged.joins.len(), 2);
    }

    #[test]
    fn merge_keeps_base_when_overlay_is_empty() {
        let base = Criteria::new()
            .select(vec!["id".into()])
            .filter(Condition::in_values("id", vec![Value::BigInt(1)]))
            .alias("t");
        let merged = base.clone().merge(Criteria::new());
        assert_eq!(merged.select, base.select);
        assert_eq!(merged.alias, base.alias);
    }
}
