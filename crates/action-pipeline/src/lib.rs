//! Action pipeline compiler
//!
//! Turns a controller's registered actions plus its global policies into one
//! compiled pipeline per action name. Each pipeline runs, in order:
//! global pre-steps, action pre-steps, global/action access control,
//! global/action validation, the handler, then action and global error
//! handlers. Handler and error-handler results are normalized into at most one
//! response write.

#[cfg(feature = "with-axum")]
pub mod adapters;
pub mod compiler;
pub mod controller;
pub mod errors;
pub mod guard;
pub mod normalize;
pub mod prelude;
#[cfg(feature = "schema-json")]
pub mod schema;
pub mod settings;
pub mod stages;

pub use compiler::{CompiledAction, CompiledActions, ControllerHooks, PipelineCompiler};
pub use controller::Controller;
pub use settings::{load_settings, HttpSettings, PipelineSettings};
pub use stages::{Scope, StageKind, StageLabel};
