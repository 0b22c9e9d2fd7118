//! Core types and collaborator traits for ActiveRow.
//!
//! This crate provides the foundational abstractions shared by the rest of
//! the workspace:
//!
//! - [`Value`] dynamic SQL values used for attributes and bound parameters
//! - [`Row`] result rows with shared column metadata
//! - [`SqlExecutor`] the trait boundary to the external SQL layer
//! - the error taxonomy and [`Result`] alias

pub mod error;
pub mod executor;
pub mod row;
pub mod value;

pub use error::{
    ConfigError, Error, FieldValidationError, InvalidStateError, Result, SchemaError,
    StorageError, TypeError, UnknownRelationError, ValidationError, ValidationErrorKind,
};
pub use executor::SqlExecutor;
pub use row::{ColumnInfo, Row};
pub use value::Value;
