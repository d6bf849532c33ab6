//! soul-actions
//!
//! Declare named actions on a [`Controller`], attach validation, access
//! control, pre-steps and error handling at controller or action scope, then
//! compile everything once into per-action pipelines:
//!
//! ```ignore
//! let mut controller = Controller::new(state);
//! controller
//!     .set_on_error(render_errors)
//!     .action("create", ActionSpec::new(create).validator(schema));
//! let actions = controller.compile_actions();
//! actions.get("create").unwrap().run(&mut req, &mut rsp).await?;
//! ```

pub mod telemetry;

pub use action_pipeline::{
    compiler, controller, guard, normalize, settings, stages, CompiledAction, CompiledActions,
    Controller, ControllerHooks, PipelineCompiler, PipelineSettings,
};
pub use action_registry::{ActionRegistry, ActionSpec};
pub use action_types::{
    ActionError, ActionResult, PolicySet, ProtoRequest, ProtoResponse, Reply, StageOutcome,
};

#[cfg(feature = "http")]
pub use action_pipeline::adapters::http;
#[cfg(feature = "schema-json")]
pub use action_pipeline::schema::JsonSchemaValidator;

pub mod prelude {
    pub use crate::telemetry::init_logging;
    pub use action_pipeline::prelude::*;
}
