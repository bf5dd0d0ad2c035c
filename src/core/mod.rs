//! Core engine: context, steps, branches, executor, results.

pub mod branch;
pub mod clock;
pub mod context;
pub mod definition;
pub mod executor;
pub mod record;
pub mod result;
pub mod step;

pub use branch::{Branch, BranchGroup, Node, DEFAULT_BRANCH_NAME};
pub use clock::{
    FakeIdGenerator, FakeTimeProvider, IdGenerator, RealIdGenerator, RealTimeProvider,
    TimeProvider,
};
pub use context::Context;
pub use definition::WorkflowDefinition;
pub use executor::{EngineConfig, LifecycleHook, TransactionManager};
pub use record::ExecutionRecord;
pub use result::{
    ExecutionMetadata, ExecutionResult, FailureCause, FailureReport, ResultBuilder,
    RollbackFailure,
};
pub use step::{InputMapper, Operation, Predicate, Rollback, Step, StepOutcome};
