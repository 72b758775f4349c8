//! Message and document types exchanged between components
//!
//! - `spec`: declarative fault documents and the closed enums they use
//! - `selector`: instance selector query
//! - `instruction`: controller → agent payloads and acknowledgements
//! - `status`: per-instance experiment status

pub mod instruction;
pub mod selector;
pub mod spec;
pub mod status;

pub use instruction::*;
pub use selector::*;
pub use spec::*;
pub use status::*;
