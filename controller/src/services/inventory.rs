//! Inventory-backed selector evaluation
//!
//! Evaluates selector queries against a static inventory of running
//! instances loaded from a JSON or YAML file:
//!
//! ```yaml
//! - namespace: shop
//!   name: checkout-0
//!   labels: { app: checkout }
//!   node: node-a
//!   phase: Running
//!   agentAddress: 10.1.0.12:9288
//! ```
//!
//! Results are ordered by namespace, then name, so the same inventory and
//! selector always produce the same eligible sequence.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use shared::{InstanceId, Selector};

use crate::error::{ControllerError, ControllerResult};
use crate::traits::SelectorEvaluator;

/// One running workload unit as recorded in the inventory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryInstance {
    pub namespace: String,
    pub name: String,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    #[serde(default)]
    pub annotations: BTreeMap<String, String>,
    #[serde(default)]
    pub node: String,
    #[serde(default = "default_phase")]
    pub phase: String,
    /// `host[:port]` of the in-instance agent
    #[serde(default)]
    pub agent_address: Option<String>,
}

fn default_phase() -> String {
    "Running".to_string()
}

impl InventoryInstance {
    pub fn id(&self) -> InstanceId {
        InstanceId::new(&self.namespace, &self.name)
    }

    fn field(&self, path: &str) -> Option<&str> {
        match path {
            "metadata.name" => Some(&self.name),
            "metadata.namespace" => Some(&self.namespace),
            "spec.nodeName" => Some(&self.node),
            "status.phase" => Some(&self.phase),
            _ => None,
        }
    }

    /// Whether every populated criterion of `selector` holds
    pub fn matches(&self, selector: &Selector) -> bool {
        if !selector.pods.is_empty() {
            let listed = selector
                .pods
                .get(&self.namespace)
                .is_some_and(|names| names.iter().any(|n| n == &self.name));
            if !listed {
                return false;
            }
        }

        if !selector.namespaces.is_empty() && !selector.namespaces.contains(&self.namespace) {
            return false;
        }
        if !selector.nodes.is_empty() && !selector.nodes.contains(&self.node) {
            return false;
        }
        if !selector.pod_phase_selectors.is_empty() && !selector.pod_phase_selectors.contains(&self.phase) {
            return false;
        }

        let labels_match = selector
            .label_selectors
            .iter()
            .all(|(k, v)| self.labels.get(k) == Some(v));
        let annotations_match = selector
            .annotation_selectors
            .iter()
            .all(|(k, v)| self.annotations.get(k) == Some(v));
        let fields_match = selector
            .field_selectors
            .iter()
            .all(|(path, v)| self.field(path) == Some(v.as_str()));
        let expressions_match = selector
            .expression_selectors
            .iter()
            .all(|expr| expr.matches(&self.labels));

        labels_match && annotations_match && fields_match && expressions_match
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Inventory {
    pub instances: Vec<InventoryInstance>,
}

impl Inventory {
    pub fn new(instances: Vec<InventoryInstance>) -> Self {
        Self { instances }
    }

    pub fn parse(text: &str) -> ControllerResult<Self> {
        let inventory: Inventory = serde_yaml::from_str(text).map_err(|e| ControllerError::Inventory {
            message: e.to_string(),
        })?;
        inventory.check_unique()?;
        Ok(inventory)
    }

    pub fn from_path(path: impl AsRef<Path>) -> ControllerResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| ControllerError::Inventory {
            message: format!("failed to read {}: {e}", path.display()),
        })?;
        Self::parse(&text)
    }

    fn check_unique(&self) -> ControllerResult<()> {
        let mut seen = std::collections::HashSet::new();
        for instance in &self.instances {
            if !seen.insert(instance.id()) {
                return Err(ControllerError::Inventory {
                    message: format!("duplicate instance {}", instance.id()),
                });
            }
        }
        Ok(())
    }

    /// Agent addresses keyed by instance
    pub fn agent_endpoints(&self) -> HashMap<InstanceId, String> {
        self.instances
            .iter()
            .filter_map(|i| i.agent_address.clone().map(|addr| (i.id(), addr)))
            .collect()
    }
}

/// Selector evaluator over a fixed inventory snapshot
#[derive(Debug, Clone)]
pub struct InventorySelector {
    inventory: Inventory,
}

impl InventorySelector {
    pub fn new(inventory: Inventory) -> Self {
        Self { inventory }
    }

    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }
}

impl SelectorEvaluator for InventorySelector {
    fn evaluate(&self, selector: &Selector) -> ControllerResult<Vec<InstanceId>> {
        let mut eligible: Vec<InstanceId> = self
            .inventory
            .instances
            .iter()
            .filter(|instance| instance.matches(selector))
            .map(InventoryInstance::id)
            .collect();

        if eligible.is_empty() {
            return Err(ControllerError::NoMatch {
                selector: serde_json::to_string(selector)?,
            });
        }

        eligible.sort();
        tracing::debug!(matched = eligible.len(), "evaluated selector against inventory");
        Ok(eligible)
    }
}
