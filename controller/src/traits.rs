//! Trait definitions with mockall annotations for testing
//!
//! The two external collaborators of the selection/dispatch core. Both are
//! injected into the experiment runner so the core can be driven by mocks.

use shared::{AgentAck, InstanceId, InstructionPayload, Selector};

use crate::error::ControllerResult;

/// Per-instance delivery failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryError {
    pub instance: InstanceId,
    pub message: String,
}

impl std::fmt::Display for DeliveryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.instance, self.message)
    }
}

/// Resolves a selector query into the currently eligible instances
#[mockall::automock]
pub trait SelectorEvaluator: Send + Sync {
    /// Evaluate a selector query
    ///
    /// # Returns
    /// Eligible instances in a stable order, or `NoMatch` when nothing matched
    fn evaluate(&self, selector: &Selector) -> ControllerResult<Vec<InstanceId>>;
}

/// Out-of-band channel to the agent running inside each instance
#[mockall::automock]
#[async_trait::async_trait]
pub trait AgentTransport: Send + Sync {
    /// Deliver an apply instruction to one instance
    async fn apply(&self, instance: &InstanceId, payload: &InstructionPayload) -> Result<AgentAck, DeliveryError>;

    /// Deliver a recovery instruction to one instance
    async fn recover(&self, instance: &InstanceId, payload: &InstructionPayload) -> Result<AgentAck, DeliveryError>;
}
