//! Active fault bookkeeping
//!
//! The agent holds at most one fault per experiment id. Applying the same
//! instruction twice, or recovering an experiment that is not active, leaves
//! the table unchanged and reports `changed: false`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::collections::HashMap;
use std::time::Instant;
use tokio::sync::RwLock;

use shared::{ExperimentId, InstructionPayload, JvmAction, JvmTarget};

use crate::error::{AgentError, AgentResult};

/// A fault currently installed in this instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveFault {
    pub experiment_id: ExperimentId,
    pub action: JvmAction,
    pub target: JvmTarget,
    pub flags: BTreeMap<String, String>,
    pub matchers: BTreeMap<String, String>,
    pub applied_at: DateTime<Utc>,
}

impl ActiveFault {
    fn from_payload(payload: &InstructionPayload) -> Self {
        Self {
            experiment_id: payload.experiment_id,
            action: payload.action,
            target: payload.target,
            flags: payload.flags.clone(),
            matchers: payload.matchers.clone(),
            applied_at: Utc::now(),
        }
    }

    fn same_fault(&self, payload: &InstructionPayload) -> bool {
        self.action == payload.action
            && self.target == payload.target
            && self.flags == payload.flags
            && self.matchers == payload.matchers
    }
}

#[derive(Debug)]
pub struct AgentState {
    faults: RwLock<HashMap<ExperimentId, ActiveFault>>,
    started_at: Instant,
}

impl Default for AgentState {
    fn default() -> Self {
        Self::new()
    }
}

impl AgentState {
    pub fn new() -> Self {
        Self {
            faults: RwLock::new(HashMap::new()),
            started_at: Instant::now(),
        }
    }

    /// Install a fault; returns whether the table changed
    pub async fn apply(&self, payload: &InstructionPayload) -> AgentResult<(bool, usize)> {
        let mut faults = self.faults.write().await;
        if let Some(existing) = faults.get(&payload.experiment_id) {
            if existing.same_fault(payload) {
                return Ok((false, faults.len()));
            }
            return Err(AgentError::ConflictingFault {
                experiment_id: payload.experiment_id,
            });
        }
        faults.insert(payload.experiment_id, ActiveFault::from_payload(payload));
        Ok((true, faults.len()))
    }

    /// Remove a fault; returns whether the table changed
    pub async fn recover(&self, experiment_id: &ExperimentId) -> (bool, usize) {
        let mut faults = self.faults.write().await;
        let removed = faults.remove(experiment_id).is_some();
        (removed, faults.len())
    }

    /// Active faults, oldest first
    pub async fn active(&self) -> Vec<ActiveFault> {
        let mut active: Vec<ActiveFault> = self.faults.read().await.values().cloned().collect();
        active.sort_by_key(|f| f.applied_at);
        active
    }

    pub async fn active_count(&self) -> usize {
        self.faults.read().await.len()
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
