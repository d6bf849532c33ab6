use super::{RecoverStage, Scope};
use crate::normalize::{apply_reply, panic_message, OnEmpty};
use action_types::{ActionError, ErrorHandler, ProtoRequest, ProtoResponse, StageOutcome};
use async_trait::async_trait;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, warn};

/// Hands the pending error to an error handler. Recovery ends the chain;
/// an `Err` from the handler escalates to the next scope.
pub struct RecoverWith {
    handler: Arc<dyn ErrorHandler>,
    scope: Scope,
    action: Arc<str>,
}

impl RecoverWith {
    pub fn new(handler: Arc<dyn ErrorHandler>, scope: Scope, action: Arc<str>) -> Self {
        Self {
            handler,
            scope,
            action,
        }
    }
}

#[async_trait]
impl RecoverStage for RecoverWith {
    async fn recover(
        &self,
        err: ActionError,
        req: &mut dyn ProtoRequest,
        rsp: &mut dyn ProtoResponse,
    ) -> Result<StageOutcome, ActionError> {
        debug!(
            action = %self.action,
            scope = ?self.scope,
            code = err.code(),
            "error handler invoked"
        );
        let call = self.handler.on_error(err, req, rsp);
        let reply = match AssertUnwindSafe(call).catch_unwind().await {
            Ok(result) => result?,
            Err(payload) => {
                let message = panic_message(&*payload);
                warn!(action = %self.action, scope = ?self.scope, %message, "error handler panicked");
                return Err(ActionError::internal(format!(
                    "error handler panicked: {message}"
                )));
            }
        };
        apply_reply(reply, rsp, OnEmpty::Suppress).await?;
        Ok(StageOutcome::ShortCircuit)
    }
}
