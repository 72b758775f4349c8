//! Service implementations
//!
//! Real implementations of the collaborator traits plus the delivery
//! fan-out. These are the parts of the controller that perform I/O.

pub mod delivery;
pub mod http_agent;
pub mod inventory;

#[cfg(test)]
mod tests;

// Re-export all service implementations
pub use delivery::{deliver, DeliveryOutcome, DeliveryReport};
pub use http_agent::HttpAgentTransport;
pub use inventory::{Inventory, InventoryInstance, InventorySelector};
