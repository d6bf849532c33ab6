//! Pipeline compiler
//!
//! Flattens global and per-action policies into one ordered chain of links per
//! action. Absent policies contribute no link at all.

use crate::guard::FinalizeGuard;
use crate::stages::{
    AccessControlStage, HandlerStage, Link, RecoverWith, Scope, StageKind, StageLabel,
    ValidationStage,
};
use action_registry::ActionSpec;
use action_types::{
    ActionError, PolicySet, ProtoRequest, ProtoResponse, Stage, StageOutcome, ValidationFailure,
};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// Maps a validator's failure onto the error that travels down the chain.
pub type ValidationFormatter = Arc<dyn Fn(ValidationFailure) -> ActionError + Send + Sync>;

/// Produces the error raised when an access predicate answers `false`.
pub type AccessDeniedFactory = Arc<dyn Fn() -> ActionError + Send + Sync>;

pub const DEFAULT_ACCESS_DENIED: &str = "Access denied";

/// Controller-level hooks consulted while compiling.
#[derive(Clone)]
pub struct ControllerHooks {
    pub validation_formatter: ValidationFormatter,
    pub access_denied: AccessDeniedFactory,
}

impl ControllerHooks {
    pub fn with_denied_message(message: impl Into<String>) -> Self {
        let message: Arc<str> = Arc::from(message.into());
        Self {
            validation_formatter: Arc::new(ActionError::Validation),
            access_denied: Arc::new(move || ActionError::access_denied(message.as_ref())),
        }
    }
}

impl Default for ControllerHooks {
    fn default() -> Self {
        Self::with_denied_message(DEFAULT_ACCESS_DENIED)
    }
}

impl fmt::Debug for ControllerHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControllerHooks").finish_non_exhaustive()
    }
}

pub struct PipelineCompiler<S> {
    state: Arc<S>,
    hooks: ControllerHooks,
}

impl<S> PipelineCompiler<S>
where
    S: Send + Sync + 'static,
{
    pub fn new(state: Arc<S>, hooks: ControllerHooks) -> Self {
        Self { state, hooks }
    }

    /// Compiles every registered action against `global`.
    pub fn compile(
        &self,
        global: &PolicySet,
        specs: &BTreeMap<String, ActionSpec<S>>,
    ) -> CompiledActions {
        let actions: BTreeMap<String, CompiledAction> = specs
            .iter()
            .map(|(name, spec)| (name.clone(), self.compile_one(global, name, spec)))
            .collect();
        info!(actions = actions.len(), "compiled controller actions");
        CompiledActions { actions }
    }

    pub fn compile_one(
        &self,
        global: &PolicySet,
        name: &str,
        spec: &ActionSpec<S>,
    ) -> CompiledAction {
        let action: Arc<str> = Arc::from(name);
        let local = spec.policy();
        let mut links: Vec<(StageLabel, Link)> = Vec::new();

        for (scope, policy) in [(Scope::Global, global), (Scope::Action, local)] {
            for stage in &policy.middlewares {
                links.push((
                    StageLabel::new(scope, StageKind::Middleware),
                    Link::Step(Arc::clone(stage)),
                ));
            }
        }
        for (scope, policy) in [(Scope::Global, global), (Scope::Action, local)] {
            if let Some(predicate) = &policy.access_control {
                let stage = AccessControlStage::new(
                    Arc::clone(predicate),
                    Arc::clone(&self.hooks.access_denied),
                );
                links.push((
                    StageLabel::new(scope, StageKind::AccessControl),
                    Link::Step(Arc::new(stage)),
                ));
            }
        }
        for (scope, policy) in [(Scope::Global, global), (Scope::Action, local)] {
            if let Some(validator) = &policy.validator {
                let stage = ValidationStage::new(
                    Arc::clone(validator),
                    Arc::clone(&self.hooks.validation_formatter),
                );
                links.push((
                    StageLabel::new(scope, StageKind::Validation),
                    Link::Step(Arc::new(stage)),
                ));
            }
        }

        let handler = HandlerStage::new(
            Arc::clone(&self.state),
            Arc::clone(spec.handler()),
            Arc::clone(&action),
        );
        links.push((
            StageLabel::new(Scope::Action, StageKind::Handler),
            Link::Step(Arc::new(handler)),
        ));

        for (scope, policy) in [(Scope::Action, local), (Scope::Global, global)] {
            if let Some(on_error) = &policy.on_error {
                let stage = RecoverWith::new(Arc::clone(on_error), scope, Arc::clone(&action));
                links.push((
                    StageLabel::new(scope, StageKind::ErrorHandler),
                    Link::Recover(Arc::new(stage)),
                ));
            }
        }

        debug!(action = %action, links = links.len(), "compiled action pipeline");
        CompiledAction {
            inner: Arc::new(Pipeline { action, links }),
        }
    }
}

struct Pipeline {
    action: Arc<str>,
    links: Vec<(StageLabel, Link)>,
}

/// A ready-to-run pipeline for one action. Cheap to clone.
#[derive(Clone)]
pub struct CompiledAction {
    inner: Arc<Pipeline>,
}

impl CompiledAction {
    pub fn name(&self) -> &str {
        &self.inner.action
    }

    /// Stage order as compiled, for inspection and tests.
    pub fn layout(&self) -> Vec<StageLabel> {
        self.inner.links.iter().map(|(label, _)| *label).collect()
    }

    /// Drives one request through the chain.
    ///
    /// `Ok(ShortCircuit)` means a stage finished the request (normally the
    /// handler or an error handler). `Ok(Continue)` means every step passed
    /// without anyone finishing it. `Err` is an error no error handler
    /// recovered; the caller owns turning it into a response.
    pub async fn run(
        &self,
        req: &mut dyn ProtoRequest,
        rsp: &mut dyn ProtoResponse,
    ) -> Result<StageOutcome, ActionError> {
        let action = self.inner.action.as_ref();
        let mut guard = FinalizeGuard::new(rsp, action);
        let mut pending: Option<ActionError> = None;

        for (label, link) in &self.inner.links {
            match (link, pending.take()) {
                (Link::Step(stage), None) => match stage.handle(req, &mut guard).await {
                    Ok(StageOutcome::Continue) => {}
                    Ok(StageOutcome::ShortCircuit) => {
                        debug!(action, stage = %label, "chain finished");
                        return Ok(StageOutcome::ShortCircuit);
                    }
                    Err(err) => {
                        debug!(action, stage = %label, code = err.code(), error = %err, "stage failed");
                        pending = Some(err);
                    }
                },
                (Link::Step(_), Some(err)) => pending = Some(err),
                (Link::Recover(stage), Some(err)) => {
                    match stage.recover(err, req, &mut guard).await {
                        Ok(outcome) => {
                            debug!(action, stage = %label, "error recovered");
                            return Ok(outcome);
                        }
                        Err(err) => pending = Some(err),
                    }
                }
                (Link::Recover(_), None) => {}
            }
        }

        match pending {
            Some(err) => Err(err),
            None => Ok(StageOutcome::Continue),
        }
    }
}

#[async_trait]
impl Stage for CompiledAction {
    async fn handle(
        &self,
        req: &mut dyn ProtoRequest,
        rsp: &mut dyn ProtoResponse,
    ) -> Result<StageOutcome, ActionError> {
        self.run(req, rsp).await
    }
}

impl fmt::Debug for CompiledAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledAction")
            .field("name", &self.name())
            .field("layout", &self.layout())
            .finish()
    }
}

/// Action name to compiled pipeline.
#[derive(Clone, Debug, Default)]
pub struct CompiledActions {
    actions: BTreeMap<String, CompiledAction>,
}

impl CompiledActions {
    pub fn get(&self, name: &str) -> Option<&CompiledAction> {
        self.actions.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.actions.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.actions.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CompiledAction)> {
        self.actions
            .iter()
            .map(|(name, action)| (name.as_str(), action))
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

impl IntoIterator for CompiledActions {
    type Item = (String, CompiledAction);
    type IntoIter = std::collections::btree_map::IntoIter<String, CompiledAction>;

    fn into_iter(self) -> Self::IntoIter {
        self.actions.into_iter()
    }
}
