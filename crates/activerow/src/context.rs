//! The collaborator bundle threaded through every operation.

use activerow_core::SqlExecutor;
use activerow_query::CommandBuilder;
use activerow_schema::SchemaRegistry;

use crate::hooks::LifecycleHooks;
use crate::relation::EntityRegistry;
use crate::validate::RecordValidator;

/// Explicit handles to the external collaborators.
///
/// A `Context` is cheap to construct and passed by reference into every
/// finder and lifecycle call; there are no global connection or registry
/// singletons, so test doubles and multi-database use fall out naturally.
#[derive(Clone, Copy)]
pub struct Context<'a> {
    executor: &'a dyn SqlExecutor,
    schemas: &'a SchemaRegistry,
    entities: &'a EntityRegistry,
    validator: Option<&'a dyn RecordValidator>,
    hooks: Option<&'a dyn LifecycleHooks>,
}

impl<'a> Context<'a> {
    /// Bundle the required collaborators.
    pub fn new(
        executor: &'a dyn SqlExecutor,
        schemas: &'a SchemaRegistry,
        entities: &'a EntityRegistry,
    ) -> Self {
        Self {
            executor,
            schemas,
            entities,
            validator: None,
            hooks: None,
        }
    }

    /// Attach the validation collaborator.
    #[must_use]
    pub fn with_validator(mut self, validator: &'a dyn RecordValidator) -> Self {
        self.validator = Some(validator);
        self
    }

    /// Attach the lifecycle hook observer.
    #[must_use]
    pub fn with_hooks(mut self, hooks: &'a dyn LifecycleHooks) -> Self {
        self.hooks = Some(hooks);
        self
    }

    /// The SQL execution layer.
    pub fn executor(&self) -> &'a dyn SqlExecutor {
        self.executor
    }

    /// The table metadata registry.
    pub fn schemas(&self) -> &'a SchemaRegistry {
        self.schemas
    }

    /// The entity declaration registry.
    pub fn entities(&self) -> &'a EntityRegistry {
        self.entities
    }

    /// The validation collaborator, if attached.
    pub fn validator(&self) -> Option<&'a dyn RecordValidator> {
        self.validator
    }

    /// The lifecycle hooks, if attached.
    pub fn hooks(&self) -> Option<&'a dyn LifecycleHooks> {
        self.hooks
    }

    /// A statement builder quoting through this context's executor.
    pub fn commands(&self) -> CommandBuilder<'a> {
        CommandBuilder::new(self.executor)
    }
}

impl std::fmt::Debug for Context<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("has_validator", &self.validator.is_some())
            .field("has_hooks", &self.hooks.is_some())
            .finish_non_exhaustive()
    }
}
