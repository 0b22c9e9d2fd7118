//! Lifecycle hooks.
//!
//! Before-hooks decide whether an operation proceeds; a veto is a normal
//! short-circuit (the operation reports a falsy outcome), never an error.
//! After-hooks observe the completed operation.

use crate::record::Record;

/// The outcome of a before-hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Decision {
    /// Let the operation proceed.
    #[default]
    Proceed,
    /// Veto the operation; it returns a falsy outcome without error.
    Abort,
}

impl Decision {
    /// Whether the operation may proceed.
    pub fn allowed(self) -> bool {
        matches!(self, Decision::Proceed)
    }
}

/// Observer for the record lifecycle.
///
/// All methods have no-op defaults; implement the ones you need. Hooks run
/// synchronously inside the operation that triggers them.
pub trait LifecycleHooks {
    /// Runs before an INSERT is issued.
    fn before_insert(&self, record: &Record) -> Decision {
        let _ = record;
        Decision::Proceed
    }

    /// Runs after a successful INSERT (snapshot already advanced).
    fn after_insert(&self, record: &Record) {
        let _ = record;
    }

    /// Runs before an UPDATE is issued.
    fn before_update(&self, record: &Record) -> Decision {
        let _ = record;
        Decision::Proceed
    }

    /// Runs after a successful UPDATE.
    fn after_update(&self, record: &Record) {
        let _ = record;
    }

    /// Runs before a DELETE is issued.
    fn before_delete(&self, record: &Record) -> Decision {
        let _ = record;
        Decision::Proceed
    }

    /// Runs after a successful DELETE (snapshot already cleared).
    fn after_delete(&self, record: &Record) {
        let _ = record;
    }
}
