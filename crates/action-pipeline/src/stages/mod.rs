//! Built-in pipeline stages.
//!
//! Every compiled link is either a [`Stage`] that runs on the happy path or a
//! [`RecoverStage`] that only runs once an error is pending.

pub mod access_control;
pub mod handler;
pub mod recover;
pub mod validation;

pub use access_control::AccessControlStage;
pub use handler::HandlerStage;
pub use recover::RecoverWith;
pub use validation::ValidationStage;

use action_types::{ActionError, ProtoRequest, ProtoResponse, Stage, StageOutcome};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

/// A stage that receives the pending error instead of being skipped by it.
#[async_trait]
pub trait RecoverStage: Send + Sync {
    async fn recover(
        &self,
        err: ActionError,
        req: &mut dyn ProtoRequest,
        rsp: &mut dyn ProtoResponse,
    ) -> Result<StageOutcome, ActionError>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Scope {
    Global,
    Action,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StageKind {
    Middleware,
    AccessControl,
    Validation,
    Handler,
    ErrorHandler,
}

/// Where a compiled link came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct StageLabel {
    pub scope: Scope,
    pub kind: StageKind,
}

impl StageLabel {
    pub const fn new(scope: Scope, kind: StageKind) -> Self {
        Self { scope, kind }
    }
}

impl fmt::Display for StageLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scope = match self.scope {
            Scope::Global => "global",
            Scope::Action => "action",
        };
        let kind = match self.kind {
            StageKind::Middleware => "middleware",
            StageKind::AccessControl => "access_control",
            StageKind::Validation => "validation",
            StageKind::Handler => "handler",
            StageKind::ErrorHandler => "on_error",
        };
        write!(f, "{scope}.{kind}")
    }
}

#[derive(Clone)]
pub(crate) enum Link {
    Step(Arc<dyn Stage>),
    Recover(Arc<dyn RecoverStage>),
}
