//! Core identifiers used throughout the chaos control plane

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;
use uuid::Uuid;

use crate::errors::SharedError;

/// Global component ID singleton - set once at startup
static COMPONENT_ID: OnceLock<ComponentId> = OnceLock::new();

/// Used when the crates are embedded as libraries and no binary called `init_*`
static EMBEDDED: ComponentId = ComponentId::Embedded;

/// Identifier for any component in the system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComponentId {
    /// The `chaosctl` controller process
    Controller,
    /// An in-instance agent process
    Agent,
    /// Library use without a registered binary
    Embedded,
}

impl ComponentId {
    /// Initialize the global component ID for the controller
    pub fn init_controller() -> &'static ComponentId {
        COMPONENT_ID.get_or_init(|| ComponentId::Controller)
    }

    /// Initialize the global component ID for an agent
    pub fn init_agent() -> &'static ComponentId {
        COMPONENT_ID.get_or_init(|| ComponentId::Agent)
    }

    /// Get the global component ID, `Embedded` if no binary registered one
    pub fn current() -> &'static ComponentId {
        COMPONENT_ID.get().unwrap_or(&EMBEDDED)
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComponentId::Controller => write!(f, "controller"),
            ComponentId::Agent => write!(f, "agent"),
            ComponentId::Embedded => write!(f, "embedded"),
        }
    }
}

/// A running workload unit that can receive a fault (e.g. a pod)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InstanceId {
    pub namespace: String,
    pub name: String,
}

impl InstanceId {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

impl std::str::FromStr for InstanceId {
    type Err = SharedError;

    /// Parses `namespace/name`; a bare name lands in the `default` namespace
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('/') {
            Some((ns, name)) if !ns.is_empty() && !name.is_empty() && !name.contains('/') => {
                Ok(InstanceId::new(ns, name))
            }
            None if !s.is_empty() => Ok(InstanceId::new("default", s)),
            _ => Err(SharedError::InvalidInstanceId { input: s.to_string() }),
        }
    }
}

/// Unique identifier for one experiment run
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExperimentId(Uuid);

impl ExperimentId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_string(s: &str) -> Result<Self, SharedError> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| SharedError::InvalidUuid { input: s.to_string() })
    }
}

impl Default for ExperimentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ExperimentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
