use action_types::{ActionError, ProtoResponse};
use async_trait::async_trait;
use serde_json::Value;
use tracing::warn;

/// Wraps the transport response for the duration of one pipeline run and
/// rejects every write after the first.
pub struct FinalizeGuard<'a> {
    inner: &'a mut dyn ProtoResponse,
    action: &'a str,
    claimed: bool,
}

impl<'a> FinalizeGuard<'a> {
    pub fn new(inner: &'a mut dyn ProtoResponse, action: &'a str) -> Self {
        let claimed = inner.is_finalized();
        Self {
            inner,
            action,
            claimed,
        }
    }

    fn ensure_open(&self) -> Result<(), ActionError> {
        if self.is_finalized() {
            warn!(action = %self.action, "response write rejected: already finalized");
            return Err(ActionError::AlreadyFinalized);
        }
        Ok(())
    }

    /// Only a successful write finalizes; a failed one leaves the response
    /// open for the error handlers.
    fn settle(&mut self, written: Result<(), ActionError>) -> Result<(), ActionError> {
        match written {
            Ok(()) => {
                self.claimed = true;
                Ok(())
            }
            Err(err) => {
                warn!(action = %self.action, error = %err, "response write failed");
                Err(err)
            }
        }
    }
}

#[async_trait]
impl<'a> ProtoResponse for FinalizeGuard<'a> {
    fn set_status(&mut self, code: u16) {
        if self.is_finalized() {
            warn!(action = %self.action, code, "status change ignored after finalization");
            return;
        }
        self.inner.set_status(code);
    }

    fn insert_header(&mut self, name: &str, value: &str) {
        if self.is_finalized() {
            warn!(action = %self.action, header = name, "header ignored after finalization");
            return;
        }
        self.inner.insert_header(name, value);
    }

    fn is_finalized(&self) -> bool {
        self.claimed || self.inner.is_finalized()
    }

    async fn emit_structured(&mut self, body: Value) -> Result<(), ActionError> {
        self.ensure_open()?;
        let written = self.inner.emit_structured(body).await;
        self.settle(written)
    }

    async fn emit_raw(&mut self, body: String) -> Result<(), ActionError> {
        self.ensure_open()?;
        let written = self.inner.emit_raw(body).await;
        self.settle(written)
    }

    async fn emit_empty(&mut self) -> Result<(), ActionError> {
        self.ensure_open()?;
        let written = self.inner.emit_empty().await;
        self.settle(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use action_types::memory::{MemoryResponse, Written};
    use serde_json::json;

    #[tokio::test]
    async fn second_write_is_rejected() {
        let mut rsp = MemoryResponse::new();
        {
            let mut guard = FinalizeGuard::new(&mut rsp, "demo");
            guard.emit_structured(json!({"ok": true})).await.unwrap();
            let err = guard.emit_raw("again".into()).await.unwrap_err();
            assert!(matches!(err, ActionError::AlreadyFinalized));
            guard.set_status(500);
        }
        assert_eq!(rsp.write_count(), 1);
        assert_eq!(rsp.status, 200);
        assert_eq!(rsp.body(), Some(&Written::Structured(json!({"ok": true}))));
    }

    struct BrokenPipe {
        attempts: usize,
    }

    #[async_trait]
    impl ProtoResponse for BrokenPipe {
        fn set_status(&mut self, _code: u16) {}

        fn insert_header(&mut self, _name: &str, _value: &str) {}

        fn is_finalized(&self) -> bool {
            false
        }

        async fn emit_structured(&mut self, _body: Value) -> Result<(), ActionError> {
            self.attempts += 1;
            Err(ActionError::internal("socket closed"))
        }

        async fn emit_raw(&mut self, _body: String) -> Result<(), ActionError> {
            self.attempts += 1;
            Err(ActionError::internal("socket closed"))
        }

        async fn emit_empty(&mut self) -> Result<(), ActionError> {
            self.attempts += 1;
            Err(ActionError::internal("socket closed"))
        }
    }

    #[tokio::test]
    async fn failed_write_does_not_finalize() {
        let mut rsp = BrokenPipe { attempts: 0 };
        {
            let mut guard = FinalizeGuard::new(&mut rsp, "demo");
            let err = guard.emit_structured(json!({"ok": true})).await.unwrap_err();
            assert!(matches!(err, ActionError::Internal(_)));
            assert!(!guard.is_finalized());
            let err = guard.emit_raw("retry".into()).await.unwrap_err();
            assert!(matches!(err, ActionError::Internal(_)));
        }
        assert_eq!(rsp.attempts, 2);
    }

    #[tokio::test]
    async fn already_written_response_starts_claimed() {
        let mut rsp = MemoryResponse::new();
        rsp.emit_empty().await.unwrap();
        let mut guard = FinalizeGuard::new(&mut rsp, "demo");
        assert!(guard.is_finalized());
        assert!(guard.emit_empty().await.is_err());
    }
}
