//! Controller library for JVM fault experiments
//!
//! Validates declarative fault documents, resolves which instances a fault
//! lands on, builds the agent instruction and delivers it concurrently.
//! The selector evaluator and the agent transport are injected so the whole
//! pipeline can be driven by mocks.

pub mod config;
pub mod core;
pub mod error;
pub mod experiment;
pub mod services;
pub mod traits;

// Re-export commonly used types
pub use config::{ControllerConfig, DEFAULT_AGENT_PORT};
pub use core::{ModeValue, ResolutionPlan};
pub use error::{ControllerError, ControllerResult, Violation};
pub use experiment::{Experiment, ExperimentRunner, PreparedExperiment};
pub use traits::{AgentTransport, DeliveryError, MockAgentTransport, MockSelectorEvaluator, SelectorEvaluator};
