//! Shared contracts for soul-actions controllers
//!
//! This crate holds everything the registry and the pipeline compiler agree on:
//! - `ProtoRequest` / `ProtoResponse` transport seams
//! - `ActionError` and validation failure descriptions
//! - the `Reply` outcome tag returned by handlers
//! - policy traits (stages, access control, validators, error handlers) and
//!   closure adapters for them

pub mod context;
pub mod errors;
#[cfg(feature = "memory")]
pub mod memory;
pub mod policy;
pub mod prelude;
pub mod reply;

pub use context::{ProtoRequest, ProtoResponse, StageOutcome};
pub use errors::{to_http_response, ActionError, ValidationFailure, Violation};
pub use policy::{
    AccessControl, ActionHandler, ErrorHandler, PolicySet, Stage, Validator,
};
pub use reply::{ActionResult, Reply};
