//! Shared types for the JVM chaos control plane
//!
//! Contains the types that cross the controller ↔ agent boundary plus the
//! declarative fault document both sides understand. Controller-internal
//! types (plans, inventory records) live in the controller crate.

pub mod errors;
pub mod logging;
pub mod messages;
pub mod types;

pub use errors::*;
pub use types::*;

pub use messages::{
    // Declarative documents
    FaultDocument, FaultSpecification, JvmFault, ObjectMeta, RawFaultSpec, API_VERSION, KIND,

    // Closed enums
    JvmAction, JvmTarget, PodMode,

    // Selectable capability
    HasMode, HasSelector, HasValue, SelectSpec,

    // Selector query
    ExpressionOperator, LabelExpression, Selector,

    // Controller ↔ agent
    AgentAck, AgentErrorBody, InstructionKind, InstructionPayload,

    // Status
    ExperimentPhase, ExperimentStatus, InstancePhase, InstanceRecord,
};
