use thiserror::Error;

use crate::planner::error::PlannerError;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid schema: {reason}")]
    InvalidSchema { reason: String },

    #[error("Table '{name}' already exists")]
    TableExists { name: String },

    #[error("Table '{name}' not found")]
    TableNotFound { name: String },

    #[error("Table name '{name}' exceeds {max} bytes")]
    TableNameTooLong { name: String, max: usize },

    #[error("Table has {count} columns (max: {max})")]
    TooManyColumns { count: usize, max: usize },

    #[error("Column name '{name}' exceeds {max} bytes")]
    ColumnNameTooLong { name: String, max: usize },

    #[error("Maximum table count exceeded (max: {max})")]
    TableCapacityExceeded { max: usize },

    #[error("Key not found")]
    KeyNotFound,

    #[error("Unknown column '{name}'")]
    UnknownColumn { name: String },

    #[error("Malformed predicate: {0}")]
    MalformedPredicate(#[from] PlannerError),

    #[error("Unsupported value type tag: {0}")]
    UnsupportedValueType(u8),

    #[error("Type mismatch: expected {expected}, got {actual}")]
    TypeMismatch { expected: String, actual: String },

    #[error("Row has {actual} values but the table expects {expected}")]
    ArityMismatch { expected: usize, actual: usize },

    #[error("Unsupported operation: {operation}")]
    UnsupportedOperation { operation: String },

    #[error("Serialization/deserialization error: {details}")]
    SerializationError { details: String },

    #[error("Corrupted database: {reason}")]
    CorruptedDatabase { reason: String },

    #[error("Corrupted index: {reason}")]
    CorruptedIndex { reason: String },

    #[error("Database file is full: offset {offset} does not fit a node pointer")]
    StorageFull { offset: u64 },

    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },
}

pub type Result<T> = std::result::Result<T, DatabaseError>;
