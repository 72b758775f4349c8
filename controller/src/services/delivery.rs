//! Concurrent fan-out of instructions to the instances of a plan
//!
//! One outbound call per instance, all in flight together. Each call is
//! bounded by its own timeout and a failure is recorded against its instance
//! without touching the others.

use chrono::Utc;
use futures_util::future::join_all;
use std::time::Duration;

use shared::{
    component_debug, component_warn, AgentAck, ComponentId, InstanceId, InstancePhase, InstanceRecord,
    InstructionKind, InstructionPayload,
};

use crate::core::ResolutionPlan;
use crate::traits::{AgentTransport, DeliveryError};

/// Result of delivering one instruction to one instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryOutcome {
    pub instance: InstanceId,
    pub result: Result<AgentAck, DeliveryError>,
}

/// Outcomes for every instance of a plan, in plan order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReport {
    pub kind: InstructionKind,
    pub outcomes: Vec<DeliveryOutcome>,
}

impl DeliveryReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &DeliveryError> {
        self.outcomes.iter().filter_map(|o| o.result.as_ref().err())
    }

    pub fn all_succeeded(&self) -> bool {
        self.outcomes.iter().all(|o| o.result.is_ok())
    }

    /// Per-instance status records
    pub fn records(&self) -> Vec<InstanceRecord> {
        let now = Utc::now();
        self.outcomes
            .iter()
            .map(|outcome| {
                let (phase, error) = match (&outcome.result, self.kind) {
                    (Ok(_), InstructionKind::Apply) => (InstancePhase::Injected, None),
                    (Ok(_), InstructionKind::Recover) => (InstancePhase::Recovered, None),
                    (Err(e), InstructionKind::Apply) => (InstancePhase::InjectFailed, Some(e.message.clone())),
                    (Err(e), InstructionKind::Recover) => (InstancePhase::RecoverFailed, Some(e.message.clone())),
                };
                InstanceRecord {
                    instance: outcome.instance.clone(),
                    phase,
                    error,
                    updated_at: now,
                }
            })
            .collect()
    }
}

/// Deliver `payload` to every instance of `plan` concurrently
pub async fn deliver<T>(
    transport: &T,
    plan: &ResolutionPlan,
    payload: &InstructionPayload,
    timeout: Duration,
) -> DeliveryReport
where
    T: AgentTransport + ?Sized,
{
    let calls = plan.instances.iter().map(|instance| async move {
        let call = async {
            match payload.kind {
                InstructionKind::Apply => transport.apply(instance, payload).await,
                InstructionKind::Recover => transport.recover(instance, payload).await,
            }
        };

        let result = match tokio::time::timeout(timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(DeliveryError {
                instance: instance.clone(),
                message: format!("no acknowledgement within {}ms", timeout.as_millis()),
            }),
        };

        match &result {
            Ok(ack) => {
                component_debug!(
                    ComponentId::current(),
                    instance = %instance,
                    kind = ?payload.kind,
                    changed = ack.changed,
                    "instruction acknowledged"
                );
            }
            Err(e) => {
                component_warn!(
                    ComponentId::current(),
                    instance = %instance,
                    kind = ?payload.kind,
                    error = %e.message,
                    "instruction delivery failed"
                );
            }
        }

        DeliveryOutcome {
            instance: instance.clone(),
            result,
        }
    });

    DeliveryReport {
        kind: payload.kind,
        outcomes: join_all(calls).await,
    }
}
