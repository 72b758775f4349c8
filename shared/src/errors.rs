//! Shared error types for the chaos control plane

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SharedError {
    #[error("Serialization failed: {message}")]
    SerializationError { message: String },

    #[error("Deserialization failed: {message}")]
    DeserializationError { message: String },

    #[error("Invalid UUID: {input}")]
    InvalidUuid { input: String },

    #[error("Invalid instance id: {input} (expected namespace/name)")]
    InvalidInstanceId { input: String },

    #[error("Unrecognized {field} value: {value}")]
    UnknownVariant { field: &'static str, value: String },
}

pub type SharedResult<T> = Result<T, SharedError>;
