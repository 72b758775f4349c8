//! Core selection and dispatch logic
//!
//! Pure, synchronous functions over their inputs with no I/O dependencies.
//! Randomness is always injected per call.

pub mod dispatcher;
pub mod duration;
pub mod resolver;
pub mod validation;

pub use dispatcher::{build, check_parameters, recovery_of, supported_targets, supports};
pub use duration::parse_duration;
pub use resolver::{percent_count, resolve, resolve_seeded, resolve_spec, ModeValue, ResolutionPlan};
pub use validation::{validate, validate_spec};
