//! Agent-specific error types

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use shared::{AgentErrorBody, ExperimentId, InstructionKind, SharedError};

#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Instruction kind {got:?} posted to the {expected:?} endpoint")]
    KindMismatch {
        expected: InstructionKind,
        got: InstructionKind,
    },

    #[error("Invalid instruction body: {message}")]
    InvalidBody { status: StatusCode, message: String },

    #[error("Experiment {experiment_id} is already active with a different fault")]
    ConflictingFault { experiment_id: ExperimentId },

    #[error("Failed to bind {address}: {message}")]
    ServerStartup { address: String, message: String },

    #[error("Shared component error: {0}")]
    SharedError(#[from] SharedError),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type AgentResult<T> = Result<T, AgentError>;

impl AgentError {
    pub fn status(&self) -> StatusCode {
        match self {
            AgentError::KindMismatch { .. } => StatusCode::BAD_REQUEST,
            AgentError::InvalidBody { status, .. } => *status,
            AgentError::ConflictingFault { .. } => StatusCode::CONFLICT,
            AgentError::ServerStartup { .. } | AgentError::SharedError(_) | AgentError::IoError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<JsonRejection> for AgentError {
    fn from(rejection: JsonRejection) -> Self {
        AgentError::InvalidBody {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl IntoResponse for AgentError {
    fn into_response(self) -> Response {
        let body = AgentErrorBody {
            error: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}
