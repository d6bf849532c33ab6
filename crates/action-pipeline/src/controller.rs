use crate::compiler::{CompiledActions, ControllerHooks, PipelineCompiler};
use crate::settings::PipelineSettings;
use action_registry::{ActionRegistry, ActionSpec};
use action_types::{
    AccessControl, ActionError, ErrorHandler, PolicySet, Stage, ValidationFailure, Validator,
};
use std::fmt;
use std::sync::Arc;

/// A group of named actions sharing state and global policies.
///
/// Configure it, register actions, then call [`Controller::compile_actions`]
/// and mount the result on whatever transport you use.
pub struct Controller<S> {
    state: Arc<S>,
    policy: PolicySet,
    hooks: ControllerHooks,
    registry: ActionRegistry<S>,
}

impl<S> Controller<S>
where
    S: Send + Sync + 'static,
{
    pub fn new(state: S) -> Self {
        Self::from_arc(Arc::new(state))
    }

    pub fn from_arc(state: Arc<S>) -> Self {
        Self {
            state,
            policy: PolicySet::default(),
            hooks: ControllerHooks::default(),
            registry: ActionRegistry::new(),
        }
    }

    pub fn with_settings(state: S, settings: &PipelineSettings) -> Self {
        let mut controller = Self::new(state);
        controller.hooks = ControllerHooks::with_denied_message(&settings.access_denied_message);
        controller
    }

    pub fn state(&self) -> &Arc<S> {
        &self.state
    }

    pub fn policy(&self) -> &PolicySet {
        &self.policy
    }

    pub fn policy_mut(&mut self) -> &mut PolicySet {
        &mut self.policy
    }

    pub fn set_validator(&mut self, validator: Arc<dyn Validator>) -> &mut Self {
        self.policy.validator = Some(validator);
        self
    }

    pub fn set_access_control(&mut self, access_control: Arc<dyn AccessControl>) -> &mut Self {
        self.policy.access_control = Some(access_control);
        self
    }

    pub fn add_middleware(&mut self, stage: Arc<dyn Stage>) -> &mut Self {
        self.policy.middlewares.push(stage);
        self
    }

    pub fn set_on_error(&mut self, handler: Arc<dyn ErrorHandler>) -> &mut Self {
        self.policy.on_error = Some(handler);
        self
    }

    /// Replaces how validation failures become pipeline errors.
    pub fn set_validation_formatter<F>(&mut self, formatter: F) -> &mut Self
    where
        F: Fn(ValidationFailure) -> ActionError + Send + Sync + 'static,
    {
        self.hooks.validation_formatter = Arc::new(formatter);
        self
    }

    /// Replaces the error raised when access control answers `false`.
    pub fn set_access_denied<F>(&mut self, factory: F) -> &mut Self
    where
        F: Fn() -> ActionError + Send + Sync + 'static,
    {
        self.hooks.access_denied = Arc::new(factory);
        self
    }

    pub fn hooks(&self) -> &ControllerHooks {
        &self.hooks
    }

    /// Declares an action. Re-using a name replaces the earlier declaration.
    pub fn action(&mut self, name: impl Into<String>, spec: ActionSpec<S>) -> &mut Self {
        self.registry.register(name, spec);
        self
    }

    pub fn registry(&self) -> &ActionRegistry<S> {
        &self.registry
    }

    pub fn compile_actions(&self) -> CompiledActions {
        PipelineCompiler::new(Arc::clone(&self.state), self.hooks.clone())
            .compile(&self.policy, self.registry.get_all())
    }
}

impl<S> fmt::Debug for Controller<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Controller")
            .field("policy", &self.policy)
            .field("actions", &self.registry.names().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}
