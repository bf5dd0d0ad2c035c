use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Structured failure raised by a runnable operation or a rollback action.
///
/// Carries a human-readable message plus an optional machine-readable detail
/// payload supplied by the collaborator (validation errors, upstream response
/// bodies, etc.). The engine never inspects `detail`; it is recorded into the
/// context and surfaced in the failure envelope as-is.
#[derive(Debug, Clone, Error, Serialize)]
#[error("{message}")]
pub struct OperationError {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<Value>,
}

impl OperationError {
    pub fn new(message: impl Into<String>) -> Self {
        OperationError {
            message: message.into(),
            detail: None,
        }
    }

    pub fn with_detail(message: impl Into<String>, detail: Value) -> Self {
        OperationError {
            message: message.into(),
            detail: Some(detail),
        }
    }

    /// Context entry written under `<step>_error`.
    pub fn to_value(&self) -> Value {
        match &self.detail {
            Some(detail) => serde_json::json!({
                "message": self.message,
                "detail": detail,
            }),
            None => serde_json::json!({ "message": self.message }),
        }
    }
}

impl From<serde_json::Error> for OperationError {
    fn from(e: serde_json::Error) -> Self {
        OperationError::new(format!("serialization error: {e}"))
    }
}

/// Failure raised while evaluating a gating or branch predicate.
///
/// By default the engine absorbs these as "predicate is false"; under
/// [`EngineConfig::strict_predicates`](crate::core::executor::EngineConfig)
/// they abort the run instead.
#[derive(Debug, Clone, Error)]
#[error("predicate error: {0}")]
pub struct PredicateError(pub String);

impl From<String> for PredicateError {
    fn from(s: String) -> Self {
        PredicateError(s)
    }
}

impl From<&str> for PredicateError {
    fn from(s: &str) -> Self {
        PredicateError(s.to_string())
    }
}
