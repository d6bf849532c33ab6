use crate::normalize::{apply_reply, panic_message, OnEmpty};
use action_types::{
    ActionError, ActionHandler, ProtoRequest, ProtoResponse, Stage, StageOutcome,
};
use async_trait::async_trait;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::warn;

/// Invokes the action handler with the controller state and writes its reply.
///
/// A panic inside the handler is reported as an internal error so the error
/// handlers still get their turn.
pub struct HandlerStage<S> {
    state: Arc<S>,
    handler: Arc<dyn ActionHandler<S>>,
    action: Arc<str>,
}

impl<S> HandlerStage<S> {
    pub fn new(state: Arc<S>, handler: Arc<dyn ActionHandler<S>>, action: Arc<str>) -> Self {
        Self {
            state,
            handler,
            action,
        }
    }
}

#[async_trait]
impl<S> Stage for HandlerStage<S>
where
    S: Send + Sync + 'static,
{
    async fn handle(
        &self,
        req: &mut dyn ProtoRequest,
        rsp: &mut dyn ProtoResponse,
    ) -> Result<StageOutcome, ActionError> {
        let call = self.handler.call(self.state.as_ref(), req, rsp);
        let reply = match AssertUnwindSafe(call).catch_unwind().await {
            Ok(result) => result?,
            Err(payload) => {
                let message = panic_message(&*payload);
                warn!(action = %self.action, %message, "action handler panicked");
                return Err(ActionError::internal(format!("handler panicked: {message}")));
            }
        };
        apply_reply(reply, rsp, OnEmpty::Finish).await?;
        Ok(StageOutcome::ShortCircuit)
    }
}
