use crate::compiler::ValidationFormatter;
use action_types::{ActionError, ProtoRequest, ProtoResponse, Stage, StageOutcome, Validator};
use async_trait::async_trait;
use std::sync::Arc;

pub struct ValidationStage {
    validator: Arc<dyn Validator>,
    formatter: ValidationFormatter,
}

impl ValidationStage {
    pub fn new(validator: Arc<dyn Validator>, formatter: ValidationFormatter) -> Self {
        Self {
            validator,
            formatter,
        }
    }
}

#[async_trait]
impl Stage for ValidationStage {
    async fn handle(
        &self,
        req: &mut dyn ProtoRequest,
        _rsp: &mut dyn ProtoResponse,
    ) -> Result<StageOutcome, ActionError> {
        match self.validator.validate(&*req).await {
            Ok(()) => Ok(StageOutcome::Continue),
            Err(failure) => Err((self.formatter)(failure)),
        }
    }
}
