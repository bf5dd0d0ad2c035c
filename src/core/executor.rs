//! The workflow engine: node walk, rollback cascade, hooks, transaction.
//!
//! Execution is a single-pass state machine over the declared node list with
//! no backtracking. A fatal condition anywhere in the walk triggers the
//! rollback cascade: every step that reached `Executed` or `OptionalFailure`
//! so far (including steps inside whichever branches were taken, at any
//! nesting depth) is compensated in strict reverse execution order.

use async_trait::async_trait;
use futures::future::BoxFuture;
use serde_json::Value;

use crate::core::branch::{BranchGroup, Node};
use crate::core::context::Context;
use crate::core::definition::WorkflowDefinition;
use crate::core::record::ExecutionRecord;
use crate::core::result::{
    ExecutionResult, FailureCause, ResultBuilder, RollbackFailure,
};
use crate::core::step::{Step, StepOutcome};
use crate::error::{OperationError, WorkflowError, WorkflowResult};

/// Synthetic name under which a failed transaction abort is reported.
const TRANSACTION_STEP_NAME: &str = "transaction";

/// Engine configuration, passed explicitly at definition time. No global
/// state.
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    /// When true, a predicate evaluation error aborts the run instead of
    /// counting as `false`. Off by default to preserve the legacy behavior.
    pub strict_predicates: bool,
}

/// External atomic-commit boundary wrapping the whole node walk.
///
/// The engine only demarcates the boundary; atomicity itself belongs to the
/// storage collaborator behind this trait.
#[async_trait]
pub trait TransactionManager: Send + Sync {
    async fn begin(&self) -> Result<(), OperationError>;
    async fn commit(&self) -> Result<(), OperationError>;
    async fn abort(&self) -> Result<(), OperationError>;
}

/// Before/after lifecycle hooks, run outside the step loop.
#[async_trait]
pub trait LifecycleHook: Send + Sync {
    /// Runs before any step and before the transactional envelope opens.
    /// An error aborts the run pre-emptively, with an empty step log.
    async fn before(&self, _ctx: &mut Context) -> Result<(), OperationError> {
        Ok(())
    }

    /// Runs once the outcome is determined. Cannot change the outcome;
    /// intended for side-effecting cleanup and observability only.
    async fn after(&self, _ctx: &Context, _success: bool) {}
}

/// Drive one invocation of `definition` to completion.
pub(crate) async fn execute(
    definition: &WorkflowDefinition,
    actor: Value,
    input: Value,
) -> WorkflowResult<ExecutionResult> {
    let execution_id = definition.id_generator().next_id();
    let builder = ResultBuilder::new(definition.name(), execution_id, definition.time_provider());

    let mut engine = Engine {
        definition,
        ctx: Context::new(actor, input),
        record: ExecutionRecord::new(),
        rollback_stack: Vec::new(),
    };

    if let Some(hook) = definition.hook() {
        if let Err(err) = hook.before(&mut engine.ctx).await {
            let cause = FailureCause::HookAborted {
                message: err.message,
            };
            return engine.fail(&builder, cause, Vec::new()).await;
        }
    }

    // Holds the transaction manager only once `begin` has succeeded, so the
    // later commit/abort paths cannot run against an unopened envelope.
    let mut open_tx = None;
    if let Some(tx) = definition.transaction() {
        match tx.begin().await {
            Ok(()) => open_tx = Some(tx),
            Err(err) => {
                let cause = FailureCause::Transaction {
                    phase: "begin".to_string(),
                    message: err.message,
                };
                return engine.fail(&builder, cause, Vec::new()).await;
            }
        }
    }

    match engine.run_nodes(definition.nodes()).await {
        Ok(()) => {
            if let Some(tx) = open_tx {
                if let Err(err) = tx.commit().await {
                    let mut rollback_failures = engine.run_rollbacks().await;
                    if let Err(abort_err) = tx.abort().await {
                        rollback_failures.push(RollbackFailure {
                            step: TRANSACTION_STEP_NAME.to_string(),
                            message: abort_err.message,
                        });
                    }
                    let cause = FailureCause::Transaction {
                        phase: "commit".to_string(),
                        message: err.message,
                    };
                    return engine.fail(&builder, cause, rollback_failures).await;
                }
            }
            if let Some(hook) = definition.hook() {
                hook.after(&engine.ctx, true).await;
            }
            Ok(builder.success(&engine.record, engine.ctx))
        }
        Err(cause) => {
            let mut rollback_failures = engine.run_rollbacks().await;
            if let Some(tx) = open_tx {
                if let Err(abort_err) = tx.abort().await {
                    rollback_failures.push(RollbackFailure {
                        step: TRANSACTION_STEP_NAME.to_string(),
                        message: abort_err.message,
                    });
                }
            }
            engine.fail(&builder, cause, rollback_failures).await
        }
    }
}

/// Per-invocation execution state. Borrows the (immutable, shared) definition
/// for the duration of one run.
struct Engine<'a> {
    definition: &'a WorkflowDefinition,
    ctx: Context,
    record: ExecutionRecord,
    /// Steps that reached Executed/OptionalFailure, in execution order.
    /// Popped LIFO by the rollback cascade.
    rollback_stack: Vec<&'a Step>,
}

impl<'a> Engine<'a> {
    fn strict_predicates(&self) -> bool {
        self.definition.config().strict_predicates
    }

    /// Walk a node list in order. Recursive for nested branch groups; boxed
    /// because async recursion needs an indirection.
    fn run_nodes<'b>(&'b mut self, nodes: &'a [Node]) -> BoxFuture<'b, Result<(), FailureCause>>
    where
        'a: 'b,
    {
        Box::pin(async move {
            for node in nodes {
                match node {
                    Node::Step(step) => self.run_step(step).await?,
                    Node::Group(group) => self.run_group(group).await?,
                }
            }
            Ok(())
        })
    }

    async fn run_step(&mut self, step: &'a Step) -> Result<(), FailureCause> {
        tracing::debug!("running step '{}'", step.name());
        let strict = self.strict_predicates();
        match step.call(&mut self.ctx, strict).await {
            StepOutcome::Executed(_) | StepOutcome::OptionalFailure(_) => {
                self.record.record_executed(step.name());
                self.rollback_stack.push(step);
                Ok(())
            }
            StepOutcome::Skipped => {
                tracing::debug!("step '{}' skipped", step.name());
                self.record.record_skipped(step.name());
                Ok(())
            }
            StepOutcome::Fatal(err) => Err(FailureCause::Operation {
                step: step.name().to_string(),
                message: err.message,
                detail: err.detail,
            }),
        }
    }

    async fn run_group(&mut self, group: &'a BranchGroup) -> Result<(), FailureCause> {
        let selected = group
            .select(&self.ctx, self.strict_predicates())
            .map_err(|e| FailureCause::Predicate {
                scope: format!("branch group '{}'", group.name()),
                message: e.0,
            })?;

        let Some(branch) = selected else {
            return Err(FailureCause::NoBranchMatched {
                group: group.name().to_string(),
                branches_count: group.branches_count(),
                has_default: group.has_default(),
            });
        };

        let label = group.decision_label(branch);
        tracing::debug!("branch group '{}' selected '{}'", group.name(), branch.name());
        self.record.record_decision(label);
        self.run_nodes(branch.nodes()).await
    }

    /// Compensate every completed step, strictly last-in-first-out. Rollback
    /// errors are collected as secondary failures, never swallowed and never
    /// retried.
    async fn run_rollbacks(&mut self) -> Vec<RollbackFailure> {
        let mut failures = Vec::new();
        while let Some(step) = self.rollback_stack.pop() {
            if !step.has_rollback() {
                continue;
            }
            tracing::debug!("rolling back step '{}'", step.name());
            if let Err(err) = step.rollback(&mut self.ctx).await {
                tracing::warn!("rollback for step '{}' failed: {}", step.name(), err);
                failures.push(RollbackFailure {
                    step: step.name().to_string(),
                    message: err.message,
                });
            }
        }
        failures
    }

    /// Finish a failing run: fire the after-hook, then build the envelope.
    async fn fail(
        self,
        builder: &ResultBuilder<'_>,
        cause: FailureCause,
        rollback_failures: Vec<RollbackFailure>,
    ) -> WorkflowResult<ExecutionResult> {
        if let Some(hook) = self.definition.hook() {
            hook.after(&self.ctx, false).await;
        }
        let report = builder.failure(&self.record, self.ctx, cause, rollback_failures, None);
        Err(WorkflowError::ExecutionFailed(Box::new(report)))
    }
}
