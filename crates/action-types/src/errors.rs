use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

pub mod codes {
    pub const SCHEMA_VALIDATION: &str = "SCHEMA.VALIDATION_FAILED";
    pub const AUTH_FORBIDDEN: &str = "AUTH.FORBIDDEN";
    pub const HTTP_STATUS: &str = "HTTP.STATUS";
    pub const UNKNOWN_INTERNAL: &str = "UNKNOWN.INTERNAL";
    pub const RESPONSE_FINALIZED: &str = "RESPONSE.ALREADY_FINALIZED";
}

/// A single rule violation reported by a validation engine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub path: String,
    pub rule: String,
    pub message: String,
}

/// Structured description of a failed validation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationFailure {
    pub message: String,
    #[serde(default)]
    pub details: Vec<Violation>,
}

impl ValidationFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            details: Vec::new(),
        }
    }

    pub fn with_violation(
        mut self,
        path: impl Into<String>,
        rule: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        self.details.push(Violation {
            path: path.into(),
            rule: rule.into(),
            message: message.into(),
        });
        self
    }

    pub fn from_violations(details: Vec<Violation>) -> Self {
        let message = match details.as_slice() {
            [] => "validation failed".to_string(),
            [only] => only.message.clone(),
            [first, rest @ ..] => format!("{} (+{} more)", first.message, rest.len()),
        };
        Self { message, details }
    }
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Every failure that can travel down an action pipeline.
#[derive(Debug, Error, Clone)]
pub enum ActionError {
    #[error("validation failed: {0}")]
    Validation(ValidationFailure),

    #[error("{0}")]
    AccessDenied(String),

    #[error("{message}")]
    Status { status: u16, message: String },

    #[error("internal error: {0}")]
    Internal(String),

    #[error("{0:#}")]
    Other(Arc<anyhow::Error>),

    #[error("response already finalized")]
    AlreadyFinalized,
}

impl ActionError {
    pub fn access_denied(message: impl Into<String>) -> Self {
        ActionError::AccessDenied(message.into())
    }

    pub fn status(status: u16, message: impl Into<String>) -> Self {
        ActionError::Status {
            status,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ActionError::Internal(message.into())
    }

    pub fn code(&self) -> &'static str {
        match self {
            ActionError::Validation(_) => codes::SCHEMA_VALIDATION,
            ActionError::AccessDenied(_) => codes::AUTH_FORBIDDEN,
            ActionError::Status { .. } => codes::HTTP_STATUS,
            ActionError::Internal(_) | ActionError::Other(_) => codes::UNKNOWN_INTERNAL,
            ActionError::AlreadyFinalized => codes::RESPONSE_FINALIZED,
        }
    }

    pub fn http_status(&self) -> u16 {
        match self {
            ActionError::Validation(_) => 422,
            ActionError::AccessDenied(_) => 403,
            ActionError::Status { status, .. } => *status,
            ActionError::Internal(_) | ActionError::Other(_) | ActionError::AlreadyFinalized => {
                500
            }
        }
    }

    /// Message that is safe to show to API callers. Internal failures are masked.
    pub fn public_message(&self) -> String {
        match self {
            ActionError::Internal(_) | ActionError::Other(_) | ActionError::AlreadyFinalized => {
                "Internal error. Please retry later.".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl From<anyhow::Error> for ActionError {
    fn from(err: anyhow::Error) -> Self {
        ActionError::Other(Arc::new(err))
    }
}

impl From<ValidationFailure> for ActionError {
    fn from(failure: ValidationFailure) -> Self {
        ActionError::Validation(failure)
    }
}

impl From<serde_json::Error> for ActionError {
    fn from(err: serde_json::Error) -> Self {
        ActionError::Internal(format!("json: {err}"))
    }
}

/// Render an unrecovered error as `(status, body)`.
pub fn to_http_response(err: &ActionError, expose_details: bool) -> (u16, serde_json::Value) {
    let mut body = serde_json::json!({
        "code": err.code(),
        "message": err.public_message(),
    });
    if let ActionError::Validation(failure) = err {
        body["details"] = serde_json::to_value(&failure.details).unwrap_or_default();
    } else if expose_details {
        body["details"] = serde_json::Value::String(err.to_string());
    }
    (err.http_status(), body)
}
