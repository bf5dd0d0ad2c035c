//! Result envelopes and the metadata builder.
//!
//! [`ResultBuilder`] assembles the success envelope ([`ExecutionResult`]) or
//! the failure envelope ([`FailureReport`]) from the execution record, the
//! context, and the injected clock. Durations are milliseconds rounded to two
//! decimal places.

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::core::clock::TimeProvider;
use crate::core::context::Context;
use crate::core::record::ExecutionRecord;

/// Fallback failure message when neither an explicit message nor a recorded
/// context error is available.
const GENERIC_FAILURE_MESSAGE: &str = "workflow execution failed";

/// Execution metadata attached to both envelopes.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionMetadata {
    pub workflow: String,
    pub execution_id: String,
    pub executed_steps: Vec<String>,
    pub skipped_steps: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub branch_decisions: Vec<String>,
    /// Wall-clock duration in milliseconds, rounded to 2 decimal places.
    pub duration_ms: f64,
    pub started_at: i64,
    pub ended_at: i64,
}

/// Success envelope returned by a completed invocation.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionResult {
    /// Always `true`; kept explicit so serialized envelopes are self-describing.
    pub success: bool,
    pub context: Context,
    pub metadata: ExecutionMetadata,
}

/// The fatal condition that aborted an invocation.
#[derive(Debug, Clone, Error, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureCause {
    #[error("step '{step}' failed: {message}")]
    Operation {
        step: String,
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        detail: Option<Value>,
    },
    #[error("no branch matched in group '{group}' ({branches_count} branches, default declared: {has_default})")]
    NoBranchMatched {
        group: String,
        branches_count: usize,
        has_default: bool,
    },
    #[error("predicate for {scope} failed: {message}")]
    Predicate { scope: String, message: String },
    #[error("before hook aborted the run: {message}")]
    HookAborted { message: String },
    #[error("transaction {phase} failed: {message}")]
    Transaction { phase: String, message: String },
}

impl FailureCause {
    /// The failed step name, for causes tied to a specific step.
    pub fn failed_step(&self) -> Option<&str> {
        match self {
            FailureCause::Operation { step, .. } => Some(step),
            _ => None,
        }
    }
}

/// A compensation that itself failed while rolling back a failed invocation.
///
/// Secondary to the triggering cause; signals possibly inconsistent external
/// state requiring manual intervention.
#[derive(Debug, Clone, Error, Serialize)]
#[error("rollback for step '{step}' failed: {message}")]
pub struct RollbackFailure {
    pub step: String,
    pub message: String,
}

/// Failure envelope carried by
/// [`WorkflowError::ExecutionFailed`](crate::error::WorkflowError).
#[derive(Debug, Clone, Serialize)]
pub struct FailureReport {
    /// Always `false`.
    pub success: bool,
    /// Resolved per precedence: explicit message, then the error recorded in
    /// the context for the failed step, then a generic fallback.
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_step: Option<String>,
    pub cause: FailureCause,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rollback_failures: Vec<RollbackFailure>,
    pub metadata: ExecutionMetadata,
    pub context: Context,
}

/// Assembles envelopes for one invocation. Captures the start instant on
/// construction; `success`/`failure` stamp the end instant.
pub struct ResultBuilder<'a> {
    workflow: &'a str,
    execution_id: String,
    started_at: i64,
    start_micros: i64,
    time: &'a dyn TimeProvider,
}

impl<'a> ResultBuilder<'a> {
    pub fn new(workflow: &'a str, execution_id: String, time: &'a dyn TimeProvider) -> Self {
        ResultBuilder {
            workflow,
            execution_id,
            started_at: time.now_timestamp(),
            start_micros: time.now_micros(),
            time,
        }
    }

    fn metadata(&self, record: &ExecutionRecord) -> ExecutionMetadata {
        let end_micros = self.time.now_micros();
        let elapsed_micros = (end_micros - self.start_micros).max(0);
        let duration_ms = (elapsed_micros as f64 / 1000.0 * 100.0).round() / 100.0;
        ExecutionMetadata {
            workflow: self.workflow.to_string(),
            execution_id: self.execution_id.clone(),
            executed_steps: record.executed().to_vec(),
            skipped_steps: record.skipped().to_vec(),
            branch_decisions: record.decisions().to_vec(),
            duration_ms,
            started_at: self.started_at,
            ended_at: self.time.now_timestamp(),
        }
    }

    pub fn success(&self, record: &ExecutionRecord, context: Context) -> ExecutionResult {
        ExecutionResult {
            success: true,
            context,
            metadata: self.metadata(record),
        }
    }

    pub fn failure(
        &self,
        record: &ExecutionRecord,
        context: Context,
        cause: FailureCause,
        rollback_failures: Vec<RollbackFailure>,
        explicit_message: Option<String>,
    ) -> FailureReport {
        let failed_step = cause.failed_step().map(|s| s.to_string());
        let message = explicit_message
            .or_else(|| {
                failed_step
                    .as_deref()
                    .and_then(|step| context.error_message_for(step))
            })
            .unwrap_or_else(|| match &cause {
                FailureCause::Operation { message, .. } => message.clone(),
                _ => GENERIC_FAILURE_MESSAGE.to_string(),
            });
        FailureReport {
            success: false,
            message,
            failed_step,
            cause,
            rollback_failures,
            metadata: self.metadata(record),
            context,
        }
    }
}
