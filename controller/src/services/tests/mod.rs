//! Service-specific tests
//!
//! Each service has its own test file; shared builders live in `common`.

#[cfg(test)]
mod delivery;

#[cfg(test)]
pub mod common {
    use shared::{ExperimentId, InstanceId, InstructionKind, InstructionPayload, JvmAction, JvmTarget, PodMode};

    use crate::core::ResolutionPlan;

    pub fn instances(names: &[&str]) -> Vec<InstanceId> {
        names.iter().map(|n| InstanceId::new("shop", *n)).collect()
    }

    pub fn plan(names: &[&str]) -> ResolutionPlan {
        let instances = instances(names);
        ResolutionPlan {
            mode: PodMode::All,
            eligible_count: instances.len(),
            instances,
            drawn_percent: None,
        }
    }

    pub fn apply_payload() -> InstructionPayload {
        InstructionPayload {
            experiment_id: ExperimentId::new(),
            kind: InstructionKind::Apply,
            action: JvmAction::CodeCacheFilling,
            target: JvmTarget::Jvm,
            flags: Default::default(),
            matchers: Default::default(),
        }
    }
}
