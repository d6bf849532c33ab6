use crate::errors::ActionError;
use async_trait::async_trait;
use http::Extensions;
use serde_json::{Map, Value};

/// Result of running one stage: keep going, or the chain is done with this request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StageOutcome {
    Continue,
    ShortCircuit,
}

/// Read side of the transport. Pre-steps may attach typed values through
/// [`ProtoRequest::extensions_mut`] for later stages to pick up.
pub trait ProtoRequest: Send + Sync {
    fn method(&self) -> &str;
    fn path(&self) -> &str;
    fn header(&self, name: &str) -> Option<String>;
    fn query(&self) -> &Map<String, Value>;
    fn params(&self) -> &Map<String, Value>;
    fn body(&self) -> &Value;
    fn extensions(&self) -> &Extensions;
    fn extensions_mut(&mut self) -> &mut Extensions;

    /// JSON view handed to schema validators.
    fn as_value(&self) -> Value {
        serde_json::json!({
            "method": self.method(),
            "path": self.path(),
            "query": Value::Object(self.query().clone()),
            "params": Value::Object(self.params().clone()),
            "body": self.body().clone(),
        })
    }
}

/// Write side of the transport. Each `emit_*` call finalizes the response.
#[async_trait]
pub trait ProtoResponse: Send {
    fn set_status(&mut self, code: u16);
    fn insert_header(&mut self, name: &str, value: &str);
    fn is_finalized(&self) -> bool;
    async fn emit_structured(&mut self, body: Value) -> Result<(), ActionError>;
    async fn emit_raw(&mut self, body: String) -> Result<(), ActionError>;
    async fn emit_empty(&mut self) -> Result<(), ActionError>;
}
