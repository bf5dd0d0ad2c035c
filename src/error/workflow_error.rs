//! Workflow-level error types.

use thiserror::Error;

use crate::core::result::FailureReport;

/// Top-level errors returned by workflow declaration and execution.
///
/// The first two variants are declaration-time structural errors raised by the
/// builder. [`WorkflowError::ExecutionFailed`] is the invocation-failure
/// envelope: it carries the failed step, the resolved message, the step log up
/// to the failure, the rollback outcome, and a context snapshot.
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("branch group '{group}' declares no branches")]
    EmptyBranchGroup { group: String },
    #[error("duplicate step name '{name}' in workflow '{workflow}'")]
    DuplicateStepName { workflow: String, name: String },
    #[error("branch group '{group}' declares more than one default branch")]
    MultipleDefaultBranches { group: String },
    #[error("workflow '{}' failed: {}", .0.metadata.workflow, .0.message)]
    ExecutionFailed(Box<FailureReport>),
}

impl WorkflowError {
    /// The failure envelope, when this error represents a failed invocation.
    pub fn report(&self) -> Option<&FailureReport> {
        match self {
            WorkflowError::ExecutionFailed(report) => Some(report),
            _ => None,
        }
    }
}

impl From<FailureReport> for WorkflowError {
    fn from(report: FailureReport) -> Self {
        WorkflowError::ExecutionFailed(Box::new(report))
    }
}
