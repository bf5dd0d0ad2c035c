//! Immutable workflow definitions.

use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use crate::api::builder::WorkflowBuilder;
use crate::core::branch::Node;
use crate::core::clock::{IdGenerator, TimeProvider};
use crate::core::executor::{self, EngineConfig, LifecycleHook, TransactionManager};
use crate::core::result::ExecutionResult;
use crate::error::WorkflowResult;

/// An immutable, ordered sequence of steps and branch groups.
///
/// Built once via [`WorkflowBuilder`] when the workflow type is declared, then
/// shared read-only across any number of concurrent invocations — it is never
/// mutated after construction. Each [`run`](Self::run) owns its own context
/// and execution record.
pub struct WorkflowDefinition {
    name: String,
    nodes: Vec<Node>,
    config: EngineConfig,
    transaction: Option<Arc<dyn TransactionManager>>,
    hook: Option<Arc<dyn LifecycleHook>>,
    time: Arc<dyn TimeProvider>,
    ids: Arc<dyn IdGenerator>,
}

impl WorkflowDefinition {
    /// Start declaring a workflow.
    pub fn builder(name: impl Into<String>) -> WorkflowBuilder {
        WorkflowBuilder::new(name)
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn from_parts(
        name: String,
        nodes: Vec<Node>,
        config: EngineConfig,
        transaction: Option<Arc<dyn TransactionManager>>,
        hook: Option<Arc<dyn LifecycleHook>>,
        time: Arc<dyn TimeProvider>,
        ids: Arc<dyn IdGenerator>,
    ) -> Self {
        WorkflowDefinition {
            name,
            nodes,
            config,
            transaction,
            hook,
            time,
            ids,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub(crate) fn transaction(&self) -> Option<&Arc<dyn TransactionManager>> {
        self.transaction.as_ref()
    }

    pub(crate) fn hook(&self) -> Option<&Arc<dyn LifecycleHook>> {
        self.hook.as_ref()
    }

    pub(crate) fn time_provider(&self) -> &dyn TimeProvider {
        self.time.as_ref()
    }

    pub(crate) fn id_generator(&self) -> &dyn IdGenerator {
        self.ids.as_ref()
    }

    /// Execute the workflow for one invocation.
    ///
    /// Returns the success envelope, or
    /// [`WorkflowError::ExecutionFailed`](crate::error::WorkflowError) carrying
    /// the failure envelope: failed step, resolved message, step log up to the
    /// failure, rollback outcome, and a context snapshot.
    pub async fn run(&self, actor: Value, input: Value) -> WorkflowResult<ExecutionResult> {
        executor::execute(self, actor, input).await
    }
}

impl fmt::Debug for WorkflowDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkflowDefinition")
            .field("name", &self.name)
            .field("nodes", &self.nodes.len())
            .field("transactional", &self.transaction.is_some())
            .finish()
    }
}
