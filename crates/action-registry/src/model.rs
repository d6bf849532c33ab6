use action_types::policy::{AccessControl, ActionHandler, ErrorHandler, PolicySet, Stage, Validator};
use std::fmt;
use std::sync::Arc;

/// A handler plus the optional per-action policies.
pub struct ActionSpec<S> {
    handler: Arc<dyn ActionHandler<S>>,
    policy: PolicySet,
}

impl<S> ActionSpec<S> {
    pub fn new(handler: Arc<dyn ActionHandler<S>>) -> Self {
        Self {
            handler,
            policy: PolicySet::default(),
        }
    }

    /// Equivalent of passing a parameter object alongside the handler.
    pub fn with_params(handler: Arc<dyn ActionHandler<S>>, params: PolicySet) -> Self {
        Self {
            handler,
            policy: params,
        }
    }

    pub fn validator(mut self, validator: Arc<dyn Validator>) -> Self {
        self.policy.validator = Some(validator);
        self
    }

    pub fn access_control(mut self, access_control: Arc<dyn AccessControl>) -> Self {
        self.policy.access_control = Some(access_control);
        self
    }

    pub fn middleware(mut self, stage: Arc<dyn Stage>) -> Self {
        self.policy.middlewares.push(stage);
        self
    }

    pub fn middlewares(mut self, stages: impl IntoIterator<Item = Arc<dyn Stage>>) -> Self {
        self.policy.middlewares.extend(stages);
        self
    }

    pub fn on_error(mut self, handler: Arc<dyn ErrorHandler>) -> Self {
        self.policy.on_error = Some(handler);
        self
    }

    pub fn handler(&self) -> &Arc<dyn ActionHandler<S>> {
        &self.handler
    }

    pub fn policy(&self) -> &PolicySet {
        &self.policy
    }
}

impl<S> Clone for ActionSpec<S> {
    fn clone(&self) -> Self {
        Self {
            handler: Arc::clone(&self.handler),
            policy: self.policy.clone(),
        }
    }
}

impl<S> fmt::Debug for ActionSpec<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionSpec")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}
