//! Error types for the orchestration engine.
//!
//! - [`OperationError`] — Structured failures raised by runnable operations.
//! - [`PredicateError`] — Failures raised while evaluating a gating predicate.
//! - [`WorkflowError`] — Top-level errors for workflow declaration and execution.

pub mod operation_error;
pub mod workflow_error;

pub use operation_error::{OperationError, PredicateError};
pub use workflow_error::WorkflowError;

/// Convenience alias for workflow-level results.
pub type WorkflowResult<T> = Result<T, WorkflowError>;
