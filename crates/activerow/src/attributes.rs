//! Per-instance attribute bookkeeping.
//!
//! An [`AttributeStore`] holds a record's current column values and the
//! last-persisted snapshot, and computes the dirty set by diffing the two.
//! It is pure in-memory state: every method is a total function, no I/O.

use std::collections::BTreeMap;

use activerow_core::Value;

/// Current attribute values plus the last-persisted snapshot.
///
/// The snapshot is the lifecycle marker: absent means the instance has never
/// been persisted (new, or deleted). Columns are kept in a `BTreeMap` so
/// statement construction downstream sees a deterministic order.
#[derive(Debug, Clone, Default)]
pub struct AttributeStore {
    current: BTreeMap<String, Value>,
    snapshot: Option<BTreeMap<String, Value>>,
}

impl AttributeStore {
    /// An empty, unpersisted store.
    pub fn new() -> Self {
        Self::default()
    }

    /// The current value of an attribute, if set.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.current.get(name)
    }

    /// Set an attribute value.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.current.insert(name.into(), value.into());
    }

    /// Set several attributes at once.
    pub fn set_many(&mut self, values: BTreeMap<String, Value>) {
        self.current.extend(values);
    }

    /// Whether an attribute currently has a value (NULL counts as set).
    pub fn is_set(&self, name: &str) -> bool {
        self.current.contains_key(name)
    }

    /// Remove an attribute value, returning it.
    ///
    /// An unset attribute simply stops participating in persistence; it is
    /// not recorded as dirty.
    pub fn unset(&mut self, name: &str) -> Option<Value> {
        self.current.remove(name)
    }

    /// The values of the requested attributes; missing ones yield NULL.
    pub fn all(&self, names: &[&str]) -> BTreeMap<String, Value> {
        names
            .iter()
            .map(|&name| {
                let value = self.current.get(name).cloned().unwrap_or(Value::Null);
                (name.to_string(), value)
            })
            .collect()
    }

    /// Every currently-set attribute.
    pub fn current(&self) -> &BTreeMap<String, Value> {
        &self.current
    }

    /// The dirty subset: attributes whose current value differs from the
    /// snapshot. With no snapshot, every currently-set attribute is dirty.
    ///
    /// `names`, when given, restricts the result to those attributes.
    pub fn changed(&self, names: Option<&[&str]>) -> BTreeMap<String, Value> {
        let wanted = |name: &str| names.is_none_or(|names| names.contains(&name));

        match &self.snapshot {
            None => self
                .current
                .iter()
                .filter(|(name, _)| wanted(name))
                .map(|(name, value)| (name.clone(), value.clone()))
                .collect(),
            Some(snapshot) => self
                .current
                .iter()
                .filter(|(name, value)| wanted(name) && snapshot.get(*name) != Some(*value))
                .map(|(name, value)| (name.clone(), value.clone()))
                .collect(),
        }
    }

    /// Whether the instance has never been persisted.
    pub fn is_new(&self) -> bool {
        self.snapshot.is_none()
    }

    /// The last-persisted snapshot, if any.
    pub fn snapshot(&self) -> Option<&BTreeMap<String, Value>> {
        self.snapshot.as_ref()
    }

    /// The snapshot value of an attribute.
    pub fn old_value(&self, name: &str) -> Option<&Value> {
        self.snapshot.as_ref().and_then(|s| s.get(name))
    }

    /// Record the given values as the persisted state.
    pub fn mark_persisted(&mut self, values: BTreeMap<String, Value>) {
        self.snapshot = Some(values);
    }

    /// Advance the snapshot to the current values for just the given columns.
    ///
    /// Used after a partial UPDATE so only the written columns stop being
    /// dirty. No-op while unpersisted.
    pub fn advance_snapshot(&mut self, names: &[String]) {
        let Some(snapshot) = self.snapshot.as_mut() else {
            return;
        };
        for name in names {
            match self.current.get(name) {
                Some(value) => {
                    snapshot.insert(name.clone(), value.clone());
                }
                None => {
                    snapshot.remove(name);
                }
            }
        }
    }

    /// Clear the snapshot, returning the instance to the unpersisted state.
    pub fn mark_deleted(&mut self) {
        self.snapshot = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn persisted_store() -> AttributeStore {
        let mut store = AttributeStore::new();
        store.set("id", 1i64);
        store.set("name", "Ada");
        store.set("status", "active");
        store.mark_persisted(store.current().clone());
        store
    }

    #[test]
    fn new_store_is_new_and_fully_dirty() {
        let mut store = AttributeStore::new();
        assert!(store.is_new());
        store.set("name", "Ada");
        let changed = store.changed(None);
        assert_eq!(changed.len(), 1);
        assert!(changed.contains_key("name"));
    }

    #[test]
    fn persisting_clears_the_dirty_set() {
        let store = persisted_store();
        assert!(!store.is_new());
        assert!(store.changed(None).is_empty());
    }

    #[test]
    fn mutation_after_persist_is_dirty() {
        let mut store = persisted_store();
        store.set("name", "Grace");
        let changed = store.changed(None);
        assert_eq!(changed.len(), 1);
        assert_eq!(changed.get("name"), Some(&Value::Text("Grace".into())));
    }

    #[test]
    fn changed_honors_the_name_filter() {
        let mut store = persisted_store();
        store.set("name", "Grace");
        store.set("status", "inactive");
        let changed = store.changed(Some(&["status"]));
        assert_eq!(changed.len(), 1);
        assert!(changed.contains_key("status"));
    }

    #[test]
    fn all_yields_null_for_missing_columns() {
        let store = persisted_store();
        let all = store.all(&["name", "missing"]);
        assert_eq!(all.get("name"), Some(&Value::Text("Ada".into())));
        assert_eq!(all.get("missing"), Some(&Value::Null));
    }

    #[test]
    fn advance_snapshot_is_partial() {
        let mut store = persisted_store();
        store.set("name", "Grace");
        store.set("status", "inactive");

        store.advance_snapshot(&["name".to_string()]);

        let changed = store.changed(None);
        assert_eq!(changed.len(), 1);
        assert!(changed.contains_key("status"));
        assert_eq!(store.old_value("name"), Some(&Value::Text("Grace".into())));
    }

    #[test]
    fn mark_deleted_returns_to_new() {
        let mut store = persisted_store();
        store.mark_deleted();
        assert!(store.is_new());
        assert!(store.snapshot().is_none());
        // Everything still set is dirty again.
        assert_eq!(store.changed(None).len(), 3);
    }

    #[test]
    fn unset_does_not_dirty() {
        let mut store = persisted_store();
        store.unset("status");
        assert!(store.changed(None).is_empty());
        assert!(!store.is_set("status"));
    }

    #[test]
    fn setting_equal_value_is_not_dirty() {
        let mut store = persisted_store();
        store.set("name", "Ada");
        assert!(store.changed(None).is_empty());
    }
}
