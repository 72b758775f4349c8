//! Controller → agent instructions
//!
//! The body posted to an agent's `/v1/faults/apply` or `/v1/faults/recover`
//! endpoint. Payloads are only constructed by the controller's dispatcher once
//! every parameter check has passed.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::messages::spec::{JvmAction, JvmTarget};
use crate::types::ExperimentId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstructionKind {
    Apply,
    Recover,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstructionPayload {
    pub experiment_id: ExperimentId,
    pub kind: InstructionKind,
    pub action: JvmAction,
    pub target: JvmTarget,
    pub flags: BTreeMap<String, String>,
    pub matchers: BTreeMap<String, String>,
}

impl InstructionPayload {
    /// The instruction that reverts this one on the same instance
    pub fn to_recovery(&self) -> Self {
        Self {
            kind: InstructionKind::Recover,
            ..self.clone()
        }
    }
}

/// Agent acknowledgement of an instruction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentAck {
    pub experiment_id: ExperimentId,
    pub kind: InstructionKind,
    /// False when the instruction was a no-op (already applied)
    pub changed: bool,
    pub active_faults: usize,
}

/// Structured error body returned by an agent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentErrorBody {
    pub error: String,
}
