//! In-instance fault agent
//!
//! Receives apply/recover instructions from the controller over HTTP and keeps
//! the table of faults active in this instance.

pub mod error;
pub mod server;
pub mod state;

pub use error::{AgentError, AgentResult};
pub use server::{bind, build_router, serve};
pub use state::{ActiveFault, AgentState};
