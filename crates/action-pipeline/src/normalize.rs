//! Turning a handler outcome into (at most) one response write.

use action_types::{ActionError, ProtoResponse, Reply};
use std::any::Any;
use tracing::debug;

/// What an `Empty` reply means at the point it is applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OnEmpty {
    /// Handler scope: finalize with an empty body.
    Finish,
    /// Error-handler scope: the error was swallowed, write nothing.
    Suppress,
}

/// Applies `reply` to `rsp` unless the response has already been written.
pub async fn apply_reply(
    reply: Reply,
    rsp: &mut dyn ProtoResponse,
    on_empty: OnEmpty,
) -> Result<(), ActionError> {
    if rsp.is_finalized() {
        if !reply.is_empty() {
            debug!("response already written by the handler, returned value dropped");
        }
        return Ok(());
    }
    match reply {
        Reply::Structured(body) => rsp.emit_structured(body).await,
        Reply::Raw(body) => rsp.emit_raw(body).await,
        Reply::Empty => match on_empty {
            OnEmpty::Finish => rsp.emit_empty().await,
            OnEmpty::Suppress => Ok(()),
        },
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
