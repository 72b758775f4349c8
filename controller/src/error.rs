//! Controller-specific error types

use std::fmt;
use thiserror::Error;

use shared::{JvmAction, JvmTarget, PodMode, SharedError};

/// One violated constraint, attributed to a document field path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub field: String,
    pub message: String,
}

impl Violation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Formats a violation list as `a: x; b: y`
pub struct Violations<'a>(pub &'a [Violation]);

impl fmt::Display for Violations<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, v) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{v}")?;
        }
        Ok(())
    }
}

#[derive(Error, Debug)]
pub enum ControllerError {
    #[error("Invalid fault specification: {}", Violations(.violations))]
    Validation { violations: Vec<Violation> },

    #[error("No eligible instances to select from (mode {mode})")]
    InsufficientCandidates { mode: PodMode },

    #[error("Action {action} is not supported on target {target}")]
    UnsupportedCombination { action: JvmAction, target: JvmTarget },

    #[error("Malformed parameters for {action} on {target}: {}", Violations(.violations))]
    MalformedParameter {
        action: JvmAction,
        target: JvmTarget,
        violations: Vec<Violation>,
    },

    #[error("Selector matched no instances: {selector}")]
    NoMatch { selector: String },

    #[error("Delivery to {instance} failed: {message}")]
    Delivery { instance: String, message: String },

    #[error("Inventory error: {message}")]
    Inventory { message: String },

    #[error("Configuration error: {field}")]
    ConfigurationError { field: String },

    #[error("Shared component error: {0}")]
    SharedError(#[from] SharedError),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("YAML serialization error: {0}")]
    YamlError(#[from] serde_yaml::Error),
}

impl ControllerError {
    /// Violations carried by validation-class errors
    pub fn violations(&self) -> &[Violation] {
        match self {
            ControllerError::Validation { violations }
            | ControllerError::MalformedParameter { violations, .. } => violations,
            _ => &[],
        }
    }
}

pub type ControllerResult<T> = Result<T, ControllerError>;
