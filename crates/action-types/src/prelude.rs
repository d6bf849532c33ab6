pub use crate::context::{ProtoRequest, ProtoResponse, StageOutcome};
pub use crate::errors::{codes, to_http_response, ActionError, ValidationFailure, Violation};
#[cfg(feature = "memory")]
pub use crate::memory::{MemoryRequest, MemoryResponse, Written};
pub use crate::policy::{
    access_async_fn, access_fn, error_fn, handler_fn, stage_fn, validator_fn, AccessControl,
    ActionHandler, ErrorHandler, PolicySet, Stage, Validator,
};
pub use crate::reply::{ActionResult, Reply};
