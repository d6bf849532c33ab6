use crate::compiler::AccessDeniedFactory;
use action_types::{AccessControl, ActionError, ProtoRequest, ProtoResponse, Stage, StageOutcome};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Runs an access predicate; a `false` answer fails the chain with the
/// controller's access-denied error.
pub struct AccessControlStage {
    predicate: Arc<dyn AccessControl>,
    denied: AccessDeniedFactory,
}

impl AccessControlStage {
    pub fn new(predicate: Arc<dyn AccessControl>, denied: AccessDeniedFactory) -> Self {
        Self { predicate, denied }
    }
}

#[async_trait]
impl Stage for AccessControlStage {
    async fn handle(
        &self,
        req: &mut dyn ProtoRequest,
        _rsp: &mut dyn ProtoResponse,
    ) -> Result<StageOutcome, ActionError> {
        if self.predicate.check(&*req).await? {
            return Ok(StageOutcome::Continue);
        }
        debug!(method = req.method(), path = req.path(), "access denied");
        Err((self.denied)())
    }
}
