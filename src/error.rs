//! Error types for the virtualization core

use crate::value::ValueType;
use thiserror::Error;

/// Errors raised by the table, value and script subsystems.
///
/// All of these are unrecoverable at the point they are raised: nothing in
/// the core retries or downgrades them to a null result. Backend tables
/// produce values of this same taxonomy, so the join engine can propagate
/// their failures unchanged.
#[derive(Error, Debug)]
pub enum EngineError {
    /// A reference names a datasource, table or variable that does not exist
    #[error("unable to resolve '{0}'")]
    Resolution(String),

    /// A derivation script depends on itself transitively
    #[error("circular dependency on variable '{0}'")]
    CircularVariableDependency(String),

    /// A value could not be represented in the requested type
    #[error("value conversion failed: {0}")]
    ValueConversion(String),

    /// No conversion rule exists between the two types at all
    #[error("no conversion from {0} to {1}")]
    UnsupportedConversion(ValueType, ValueType),

    /// A row was requested for an entity absent from a table
    #[error("no such entity: {0}")]
    EntityNotFound(String),

    /// Malformed input or a backend's own failure
    #[error("invalid data: {0}")]
    InvalidData(String),
}

pub type EngineResult<T> = Result<T, EngineError>;
