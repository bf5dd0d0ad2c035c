//! # stepchain — sequential step/branch orchestration with rollback
//!
//! `stepchain` executes an ordered sequence of externally supplied operations
//! ("steps"), with support for:
//!
//! - **Conditional branching**: named [`BranchGroup`]s select exactly one of
//!   several mutually exclusive [`Branch`]es per invocation, first-match-wins,
//!   with optional default branches and unlimited nesting.
//! - **Compensating rollback**: when a required step fails, every completed
//!   step is rolled back in strict reverse execution order.
//! - **Optional steps**: a step marked optional absorbs its own failure,
//!   records it into the context under `<step>_error`, and the run continues.
//! - **Transactional envelope**: an external [`TransactionManager`] can wrap
//!   the whole node walk in begin/commit/abort.
//! - **Execution metadata**: every result carries the ordered executed and
//!   skipped step logs, branch decision labels, and a 2-decimal millisecond
//!   duration.
//!
//! Execution is strictly single-threaded and sequential within one
//! invocation. A built [`WorkflowDefinition`] is immutable and safely shared
//! across concurrent invocations; each invocation owns its own [`Context`].
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use async_trait::async_trait;
//! use serde_json::{json, Value};
//! use stepchain::{Branch, BranchGroup, Operation, OperationError, Step, WorkflowDefinition};
//!
//! struct ChargeCard;
//!
//! #[async_trait]
//! impl Operation for ChargeCard {
//!     async fn invoke(&self, _actor: &Value, input: Value) -> Result<Value, OperationError> {
//!         Ok(json!({"charged": input["amount"]}))
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let workflow = WorkflowDefinition::builder("checkout")
//!         .group(
//!             BranchGroup::new("payment_method")
//!                 .branch(
//!                     Branch::when("credit_card", |ctx| {
//!                         ctx.get("payment_method") == Some(&json!("credit_card"))
//!                     })
//!                     .step(Step::new("charge_card", Arc::new(ChargeCard))),
//!                 )
//!                 .branch(Branch::otherwise()),
//!         )
//!         .build()
//!         .unwrap();
//!
//!     let result = workflow
//!         .run(json!({"user": 1}), json!({"payment_method": "credit_card", "amount": 50}))
//!         .await
//!         .unwrap();
//!     println!("{:?}", result.metadata.executed_steps);
//! }
//! ```

pub mod api;
pub mod core;
pub mod error;

pub use crate::api::WorkflowBuilder;
pub use crate::core::{
    Branch, BranchGroup, Context, EngineConfig, ExecutionMetadata, ExecutionRecord,
    ExecutionResult, FailureCause, FailureReport, FakeIdGenerator, FakeTimeProvider, IdGenerator,
    InputMapper, LifecycleHook, Node, Operation, Predicate, RealIdGenerator, RealTimeProvider,
    ResultBuilder, Rollback, RollbackFailure, Step, StepOutcome, TimeProvider,
    TransactionManager, WorkflowDefinition, DEFAULT_BRANCH_NAME,
};
pub use crate::error::{OperationError, PredicateError, WorkflowError, WorkflowResult};
