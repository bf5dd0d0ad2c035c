//! Declaration-time workflow construction.
//!
//! [`WorkflowBuilder`] accumulates the ordered node list plus the engine
//! configuration and collaborators, validates the structure, and produces one
//! immutable [`WorkflowDefinition`]. Declaration time is fully decoupled from
//! execution time: the built definition is trivially shareable.

use std::collections::HashSet;
use std::sync::Arc;

use crate::core::branch::{BranchGroup, Node};
use crate::core::clock::{IdGenerator, RealIdGenerator, RealTimeProvider, TimeProvider};
use crate::core::definition::WorkflowDefinition;
use crate::core::executor::{EngineConfig, LifecycleHook, TransactionManager};
use crate::core::step::Step;
use crate::error::{WorkflowError, WorkflowResult};

/// Builder for [`WorkflowDefinition`].
pub struct WorkflowBuilder {
    name: String,
    nodes: Vec<Node>,
    config: EngineConfig,
    transaction: Option<Arc<dyn TransactionManager>>,
    hook: Option<Arc<dyn LifecycleHook>>,
    time: Option<Arc<dyn TimeProvider>>,
    ids: Option<Arc<dyn IdGenerator>>,
}

impl WorkflowBuilder {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        WorkflowBuilder {
            name: name.into(),
            nodes: Vec::new(),
            config: EngineConfig::default(),
            transaction: None,
            hook: None,
            time: None,
            ids: None,
        }
    }

    /// Append a step at the top level.
    pub fn step(mut self, step: Step) -> Self {
        self.nodes.push(Node::Step(step));
        self
    }

    /// Append a branch group at the top level.
    pub fn group(mut self, group: BranchGroup) -> Self {
        self.nodes.push(Node::Group(group));
        self
    }

    /// Wrap the whole node walk in a transactional envelope owned by the
    /// given storage collaborator.
    pub fn with_transaction(mut self, transaction: Arc<dyn TransactionManager>) -> Self {
        self.transaction = Some(transaction);
        self
    }

    /// Attach before/after lifecycle hooks.
    pub fn with_hook(mut self, hook: Arc<dyn LifecycleHook>) -> Self {
        self.hook = Some(hook);
        self
    }

    /// Override the default engine configuration.
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Inject a time source (deterministic metadata in tests).
    pub fn with_time_provider(mut self, time: Arc<dyn TimeProvider>) -> Self {
        self.time = Some(time);
        self
    }

    /// Inject an id source for execution ids.
    pub fn with_id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = Some(ids);
        self
    }

    /// Validate the declared structure and freeze it into a definition.
    ///
    /// Rejects duplicate step names within a containing scope, branch groups
    /// with no branches, and groups with more than one default branch.
    pub fn build(self) -> WorkflowResult<WorkflowDefinition> {
        validate_scope(&self.name, &self.nodes)?;
        Ok(WorkflowDefinition::from_parts(
            self.name,
            self.nodes,
            self.config,
            self.transaction,
            self.hook,
            self.time.unwrap_or_else(|| Arc::new(RealTimeProvider)),
            self.ids.unwrap_or_else(|| Arc::new(RealIdGenerator)),
        ))
    }
}

/// Step names must be unique within their containing scope (a top-level node
/// list or a single branch body); mutually exclusive branches may reuse names.
fn validate_scope(workflow: &str, nodes: &[Node]) -> WorkflowResult<()> {
    let mut seen = HashSet::new();
    for node in nodes {
        match node {
            Node::Step(step) => {
                if !seen.insert(step.name().to_string()) {
                    return Err(WorkflowError::DuplicateStepName {
                        workflow: workflow.to_string(),
                        name: step.name().to_string(),
                    });
                }
            }
            Node::Group(group) => validate_group(workflow, group)?,
        }
    }
    Ok(())
}

fn validate_group(workflow: &str, group: &BranchGroup) -> WorkflowResult<()> {
    if group.branches().is_empty() {
        return Err(WorkflowError::EmptyBranchGroup {
            group: group.name().to_string(),
        });
    }
    let defaults = group.branches().iter().filter(|b| b.is_default()).count();
    if defaults > 1 {
        return Err(WorkflowError::MultipleDefaultBranches {
            group: group.name().to_string(),
        });
    }
    for branch in group.branches() {
        validate_scope(workflow, branch.nodes())?;
    }
    Ok(())
}
