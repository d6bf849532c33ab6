pub use crate::compiler::{
    AccessDeniedFactory, CompiledAction, CompiledActions, ControllerHooks, PipelineCompiler,
    ValidationFormatter,
};
pub use crate::controller::Controller;
pub use crate::errors::{SchemaError, SettingsError};
pub use crate::normalize::{apply_reply, OnEmpty};
#[cfg(feature = "schema-json")]
pub use crate::schema::JsonSchemaValidator;
pub use crate::settings::{load_settings, HttpSettings, PipelineSettings};
pub use crate::stages::{RecoverStage, Scope, StageKind, StageLabel};
pub use action_registry::{ActionRegistry, ActionSpec};
pub use action_types::prelude::*;
