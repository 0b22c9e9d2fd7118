//! Error types for ActiveRow operations.

use std::fmt;

/// The primary error type for all ActiveRow operations.
///
/// Validation failures and lifecycle-hook vetoes are deliberately *not*
/// represented here: both are normal falsy outcomes reported through
/// [`ValidationError`] lists and `SaveOutcome`, never raised.
#[derive(Debug)]
pub enum Error {
    /// Malformed relation or key declarations, discovered at resolve time.
    Config(ConfigError),
    /// A relation name was requested that the entity does not declare.
    UnknownRelation(UnknownRelationError),
    /// An operation was attempted on a record whose lifecycle state forbids it.
    InvalidState(InvalidStateError),
    /// A table or its columns could not be introspected.
    Schema(SchemaError),
    /// A failure surfaced by the external SQL execution layer.
    Storage(StorageError),
    /// Value conversion errors.
    Type(TypeError),
}

/// Malformed relation/key declaration detail.
///
/// Declarations are lazy templates, so these are only ever raised when a
/// relation is resolved, never when it is declared.
#[derive(Debug)]
pub struct ConfigError {
    pub message: String,
}

/// An entity was asked for a relation it does not declare.
#[derive(Debug)]
pub struct UnknownRelationError {
    pub entity: String,
    pub relation: String,
}

/// Lifecycle state violation detail.
#[derive(Debug)]
pub struct InvalidStateError {
    /// The operation that was refused ("update", "delete", "insert").
    pub operation: &'static str,
    /// The state the record was in.
    pub state: &'static str,
    pub message: String,
}

/// Introspection failure detail.
#[derive(Debug)]
pub struct SchemaError {
    pub table: String,
    pub message: String,
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

/// A failure from the external SQL execution layer, propagated unmodified.
///
/// This core adds no retry or backoff policy; that belongs to the executor
/// or the caller.
#[derive(Debug)]
pub struct StorageError {
    pub sql: Option<String>,
    pub message: String,
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

/// Value conversion failure detail.
#[derive(Debug)]
pub struct TypeError {
    pub expected: &'static str,
    pub actual: String,
    pub column: Option<String>,
}

impl Error {
    /// Shorthand for a [`ConfigError`].
    pub fn config(message: impl Into<String>) -> Self {
        Error::Config(ConfigError {
            message: message.into(),
        })
    }

    /// Shorthand for an [`UnknownRelationError`].
    pub fn unknown_relation(entity: impl Into<String>, relation: impl Into<String>) -> Self {
        Error::UnknownRelation(UnknownRelationError {
            entity: entity.into(),
            relation: relation.into(),
        })
    }

    /// Shorthand for an [`InvalidStateError`].
    pub fn invalid_state(operation: &'static str, state: &'static str) -> Self {
        Error::InvalidState(InvalidStateError {
            operation,
            state,
            message: format!("cannot {operation} a {state} record"),
        })
    }

    /// Shorthand for a [`SchemaError`] with no source.
    pub fn schema(table: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Schema(SchemaError {
            table: table.into(),
            message: message.into(),
            source: None,
        })
    }

    /// Wrap an executor failure, keeping the statement for context.
    pub fn storage(
        sql: Option<&str>,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        Error::Storage(StorageError {
            sql: sql.map(str::to_string),
            message: source.to_string(),
            source: Some(source),
        })
    }

    /// Get the SQL that caused this error, if available.
    pub fn sql(&self) -> Option<&str> {
        match self {
            Error::Storage(e) => e.sql.as_deref(),
            _ => None,
        }
    }

    /// Is this a state-machine violation?
    pub fn is_invalid_state(&self) -> bool {
        matches!(self, Error::InvalidState(_))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Config(e) => write!(f, "Configuration error: {}", e.message),
            Error::UnknownRelation(e) => write!(
                f,
                "Unknown relation '{}' on entity '{}'",
                e.relation, e.entity
            ),
            Error::InvalidState(e) => write!(f, "Invalid state: {}", e.message),
            Error::Schema(e) => write!(f, "Schema error for table '{}': {}", e.table, e.message),
            Error::Storage(e) => {
                if let Some(sql) = &e.sql {
                    write!(f, "Storage error: {} (statement: {})", e.message, sql)
                } else {
                    write!(f, "Storage error: {}", e.message)
                }
            }
            Error::Type(e) => {
                if let Some(col) = &e.column {
                    write!(
                        f,
                        "Type error in column '{}': expected {}, found {}",
                        col, e.expected, e.actual
                    )
                } else {
                    write!(f, "Type error: expected {}, found {}", e.expected, e.actual)
                }
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Schema(e) => e
                .source
                .as_deref()
                .map(|err| err as &(dyn std::error::Error + 'static)),
            Error::Storage(e) => e
                .source
                .as_deref()
                .map(|err| err as &(dyn std::error::Error + 'static)),
            _ => None,
        }
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Error::Config(err)
    }
}

impl From<UnknownRelationError> for Error {
    fn from(err: UnknownRelationError) -> Self {
        Error::UnknownRelation(err)
    }
}

impl From<InvalidStateError> for Error {
    fn from(err: InvalidStateError) -> Self {
        Error::InvalidState(err)
    }
}

impl From<SchemaError> for Error {
    fn from(err: SchemaError) -> Self {
        Error::Schema(err)
    }
}

impl From<StorageError> for Error {
    fn from(err: StorageError) -> Self {
        Error::Storage(err)
    }
}

impl From<TypeError> for Error {
    fn from(err: TypeError) -> Self {
        Error::Type(err)
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Display for UnknownRelationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown relation '{}' on '{}'", self.relation, self.entity)
    }
}

impl fmt::Display for InvalidStateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Display for TypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "expected {}, found {}", self.expected, self.actual)
    }
}

/// Validation error for field-level and record-level validation.
///
/// This is a data carrier, not an [`Error`] variant: failed validation is
/// reported through a record's error list and a falsy save outcome.
#[derive(Debug, Clone, Default)]
pub struct ValidationError {
    /// The individual field errors, in the order they were recorded.
    pub errors: Vec<FieldValidationError>,
}

/// A single validation error for an attribute.
#[derive(Debug, Clone)]
pub struct FieldValidationError {
    /// The attribute name that failed validation.
    pub field: String,
    /// The kind of validation that failed.
    pub kind: ValidationErrorKind,
    /// Human-readable error message.
    pub message: String,
}

/// The type of validation constraint that was violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Required attribute is missing/null.
    Required,
    /// String is shorter than minimum length.
    MinLength,
    /// String is longer than maximum length.
    MaxLength,
    /// Value is below minimum.
    Min,
    /// Value is above maximum.
    Max,
    /// Value doesn't match regex pattern.
    Pattern,
    /// Custom validation failed.
    Custom,
}

impl ValidationError {
    /// Create a new empty validation error container.
    pub fn new() -> Self {
        Self { errors: Vec::new() }
    }

    /// Check if there are any validation errors.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Number of recorded errors.
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Add a field validation error.
    pub fn add(
        &mut self,
        field: impl Into<String>,
        kind: ValidationErrorKind,
        message: impl Into<String>,
    ) {
        self.errors.push(FieldValidationError {
            field: field.into(),
            kind,
            message: message.into(),
        });
    }

    /// Add a required attribute error.
    pub fn add_required(&mut self, field: impl Into<String>) {
        self.add(field, ValidationErrorKind::Required, "is required");
    }

    /// Add a min length error.
    pub fn add_min_length(&mut self, field: impl Into<String>, min: usize, actual: usize) {
        self.add(
            field,
            ValidationErrorKind::MinLength,
            format!("must be at least {min} characters, got {actual}"),
        );
    }

    /// Add a max length error.
    pub fn add_max_length(&mut self, field: impl Into<String>, max: usize, actual: usize) {
        self.add(
            field,
            ValidationErrorKind::MaxLength,
            format!("must be at most {max} characters, got {actual}"),
        );
    }

    /// Add a min value error.
    pub fn add_min(
        &mut self,
        field: impl Into<String>,
        min: impl fmt::Display,
        actual: impl fmt::Display,
    ) {
        self.add(
            field,
            ValidationErrorKind::Min,
            format!("must be at least {min}, got {actual}"),
        );
    }

    /// Add a max value error.
    pub fn add_max(
        &mut self,
        field: impl Into<String>,
        max: impl fmt::Display,
        actual: impl fmt::Display,
    ) {
        self.add(
            field,
            ValidationErrorKind::Max,
            format!("must be at most {max}, got {actual}"),
        );
    }

    /// Add a pattern match error.
    pub fn add_pattern(&mut self, field: impl Into<String>, pattern: &str) {
        self.add(
            field,
            ValidationErrorKind::Pattern,
            format!("must match pattern '{pattern}'"),
        );
    }

    /// Add a custom validation error.
    pub fn add_custom(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.add(field, ValidationErrorKind::Custom, message);
    }

    /// Errors recorded for a specific attribute.
    pub fn for_field<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a FieldValidationError> {
        self.errors.iter().filter(move |e| e.field == field)
    }

    /// Merge another error list into this one.
    pub fn extend(&mut self, other: ValidationError) {
        self.errors.extend(other.errors);
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.errors.is_empty() {
            write!(f, "validation passed")
        } else if self.errors.len() == 1 {
            let err = &self.errors[0];
            write!(f, "validation error on '{}': {}", err.field, err.message)
        } else {
            writeln!(f, "validation errors:")?;
            for err in &self.errors {
                writeln!(f, "  - {}: {}", err.field, err.message)?;
            }
            Ok(())
        }
    }
}

/// Result type alias for ActiveRow operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_error_keeps_sql_context() {
        let source: Box<dyn std::error::Error + Send + Sync> =
            "duplicate key".to_string().into();
        let err = Error::storage(Some("INSERT INTO t (a) VALUES (?)"), source);

        assert_eq!(err.sql(), Some("INSERT INTO t (a) VALUES (?)"));
        assert!(err.to_string().contains("duplicate key"));
    }

    #[test]
    fn invalid_state_message() {
        let err = Error::invalid_state("update", "new");
        assert!(err.is_invalid_state());
        assert_eq!(err.to_string(), "Invalid state: cannot update a new record");
    }

    #[test]
    fn validation_error_collects_per_field() {
        let mut errors = ValidationError::new();
        errors.add_required("name");
        errors.add_min_length("name", 3, 1);
        errors.add_max("age", 150, 200);

        assert_eq!(errors.len(), 3);
        assert_eq!(errors.for_field("name").count(), 2);
        assert_eq!(errors.for_field("age").count(), 1);
        assert!(!errors.is_empty());
    }

    #[test]
    fn unknown_relation_display() {
        let err = Error::unknown_relation("customer", "orderz");
        assert_eq!(
            err.to_string(),
            "Unknown relation 'orderz' on entity 'customer'"
        );
    }
}
