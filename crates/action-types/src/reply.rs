use crate::errors::ActionError;
use serde::Serialize;
use serde_json::Value;

/// What a handler (or error handler) produced.
///
/// Paired with `Err(ActionError)` this is the full outcome tag the pipeline
/// normalizes into a response write.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Reply {
    #[default]
    Empty,
    Structured(Value),
    Raw(String),
}

pub type ActionResult = Result<Reply, ActionError>;

impl Reply {
    pub fn structured<T: Serialize + ?Sized>(value: &T) -> Result<Self, ActionError> {
        Ok(Reply::Structured(serde_json::to_value(value)?))
    }

    pub fn raw(value: impl ToString) -> Self {
        Reply::Raw(value.to_string())
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Reply::Empty)
    }
}

impl From<Value> for Reply {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Reply::Empty,
            Value::String(s) => Reply::Raw(s),
            Value::Bool(b) => Reply::Raw(b.to_string()),
            Value::Number(n) => Reply::Raw(n.to_string()),
            structured @ (Value::Array(_) | Value::Object(_)) => Reply::Structured(structured),
        }
    }
}

impl From<Option<Value>> for Reply {
    fn from(value: Option<Value>) -> Self {
        value.map(Reply::from).unwrap_or(Reply::Empty)
    }
}

impl From<String> for Reply {
    fn from(value: String) -> Self {
        Reply::Raw(value)
    }
}

impl From<&str> for Reply {
    fn from(value: &str) -> Self {
        Reply::Raw(value.to_string())
    }
}

impl From<()> for Reply {
    fn from(_: ()) -> Self {
        Reply::Empty
    }
}
