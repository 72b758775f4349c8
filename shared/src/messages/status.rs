//! Experiment status types
//!
//! Every delivery outcome is attributed to one instance; the experiment
//! phase is derived from the per-instance records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{ExperimentId, InstanceId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExperimentPhase {
    /// Every selected instance acknowledged the fault
    Injected,
    /// Some instances acknowledged, some failed
    PartiallyInjected,
    /// No instance acknowledged the fault
    Failed,
    /// Every injected instance acknowledged recovery
    Recovered,
    /// Recovery failed on at least one instance
    PartiallyRecovered,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InstancePhase {
    Injected,
    InjectFailed,
    Recovered,
    RecoverFailed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceRecord {
    pub instance: InstanceId,
    pub phase: InstancePhase,
    pub error: Option<String>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExperimentStatus {
    pub experiment_id: ExperimentId,
    pub phase: ExperimentPhase,
    pub records: Vec<InstanceRecord>,
}

impl ExperimentStatus {
    pub fn failed_instances(&self) -> impl Iterator<Item = &InstanceRecord> {
        self.records.iter().filter(|r| {
            matches!(r.phase, InstancePhase::InjectFailed | InstancePhase::RecoverFailed)
        })
    }

    pub fn injected_instances(&self) -> impl Iterator<Item = &InstanceId> {
        self.records
            .iter()
            .filter(|r| r.phase == InstancePhase::Injected)
            .map(|r| &r.instance)
    }
}
