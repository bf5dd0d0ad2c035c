//! Branches and branch groups — mutually exclusive conditional paths.
//!
//! A [`BranchGroup`] holds an ordered list of [`Branch`]es and selects exactly
//! one per invocation: the first whose predicate is true, else the declared
//! default. Selection is first-match-wins; later branches never execute, even
//! speculatively. Branch bodies are ordered [`Node`] lists, so groups nest
//! with no depth limit.

use std::fmt;

use crate::core::context::Context;
use crate::core::step::{eval_predicate, Predicate, Step};
use crate::error::PredicateError;

/// Reserved name for the default branch.
pub const DEFAULT_BRANCH_NAME: &str = "otherwise";

/// One entry in a workflow definition or branch body.
#[derive(Debug, Clone)]
pub enum Node {
    Step(Step),
    Group(BranchGroup),
}

/// A named, predicate-guarded (or default) ordered list of child nodes.
#[derive(Clone)]
pub struct Branch {
    name: String,
    predicate: Option<Predicate>,
    nodes: Vec<Node>,
}

impl Branch {
    /// A branch taken when `predicate` is true.
    pub fn when<F>(name: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&Context) -> bool + Send + Sync + 'static,
    {
        Branch {
            name: name.into(),
            predicate: Some(std::sync::Arc::new(move |ctx| Ok(predicate(ctx)))),
            nodes: Vec::new(),
        }
    }

    /// A branch guarded by a fallible predicate. Evaluation errors count as
    /// `false` unless strict predicate mode is enabled.
    pub fn try_when<F>(name: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&Context) -> Result<bool, PredicateError> + Send + Sync + 'static,
    {
        Branch {
            name: name.into(),
            predicate: Some(std::sync::Arc::new(predicate)),
            nodes: Vec::new(),
        }
    }

    /// The default branch, taken when no predicate branch matches.
    pub fn otherwise() -> Self {
        Branch {
            name: DEFAULT_BRANCH_NAME.to_string(),
            predicate: None,
            nodes: Vec::new(),
        }
    }

    /// Append a step to the branch body.
    pub fn step(mut self, step: Step) -> Self {
        self.nodes.push(Node::Step(step));
        self
    }

    /// Append a nested branch group to the branch body.
    pub fn group(mut self, group: BranchGroup) -> Self {
        self.nodes.push(Node::Group(group));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_default(&self) -> bool {
        self.predicate.is_none()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub(crate) fn predicate(&self) -> Option<&Predicate> {
        self.predicate.as_ref()
    }
}

impl fmt::Debug for Branch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Branch")
            .field("name", &self.name)
            .field("default", &self.is_default())
            .field("nodes", &self.nodes.len())
            .finish()
    }
}

/// An ordered set of mutually exclusive branches plus at most one default.
#[derive(Debug, Clone)]
pub struct BranchGroup {
    name: String,
    branches: Vec<Branch>,
}

impl BranchGroup {
    pub fn new(name: impl Into<String>) -> Self {
        BranchGroup {
            name: name.into(),
            branches: Vec::new(),
        }
    }

    /// Append a branch in declaration order. At most one default branch is
    /// allowed per group; the builder rejects violations at declaration time.
    pub fn branch(mut self, branch: Branch) -> Self {
        self.branches.push(branch);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn branches(&self) -> &[Branch] {
        &self.branches
    }

    pub fn branches_count(&self) -> usize {
        self.branches.len()
    }

    pub fn has_default(&self) -> bool {
        self.branches.iter().any(|b| b.is_default())
    }

    /// The decision label recorded when `branch` is taken.
    pub fn decision_label(&self, branch: &Branch) -> String {
        format!("{}:{}", self.name, branch.name())
    }

    /// Select the branch to execute: the first (in declared order) whose
    /// predicate is true, else the default branch if one was declared.
    ///
    /// In strict predicate mode an evaluation error aborts selection; the
    /// default mode treats it as a non-match and moves on.
    pub fn select(
        &self,
        ctx: &Context,
        strict_predicates: bool,
    ) -> Result<Option<&Branch>, PredicateError> {
        for branch in &self.branches {
            let Some(predicate) = branch.predicate() else {
                continue;
            };
            let scope = format!("branch '{}:{}'", self.name, branch.name());
            if eval_predicate(predicate, ctx, strict_predicates, &scope)? {
                return Ok(Some(branch));
            }
        }
        Ok(self.branches.iter().find(|b| b.is_default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn ctx(input: Value) -> Context {
        Context::new(Value::Null, input)
    }

    fn group() -> BranchGroup {
        BranchGroup::new("payment_method")
            .branch(Branch::when("credit_card", |ctx| {
                ctx.get("payment_method") == Some(&json!("credit_card"))
            }))
            .branch(Branch::when("paypal", |ctx| {
                ctx.get("payment_method") == Some(&json!("paypal"))
            }))
    }

    #[test]
    fn test_select_first_matching_branch() {
        let g = group();
        let ctx = ctx(json!({"payment_method": "paypal"}));
        let selected = g.select(&ctx, false).unwrap().unwrap();
        assert_eq!(selected.name(), "paypal");
    }

    #[test]
    fn test_first_match_wins_over_later_true_predicates() {
        let g = BranchGroup::new("g")
            .branch(Branch::when("first", |_| true))
            .branch(Branch::when("second", |_| true));
        let selected = g.select(&ctx(json!({})), false).unwrap().unwrap();
        assert_eq!(selected.name(), "first");
    }

    #[test]
    fn test_select_falls_back_to_default() {
        let g = group().branch(Branch::otherwise());
        let ctx = ctx(json!({"payment_method": "wire"}));
        let selected = g.select(&ctx, false).unwrap().unwrap();
        assert_eq!(selected.name(), DEFAULT_BRANCH_NAME);
        assert!(selected.is_default());
    }

    #[test]
    fn test_select_none_without_default() {
        let g = group();
        let ctx = ctx(json!({"payment_method": "wire"}));
        assert!(g.select(&ctx, false).unwrap().is_none());
    }

    #[test]
    fn test_predicate_error_skips_branch_by_default() {
        let g = BranchGroup::new("g")
            .branch(Branch::try_when("broken", |_| {
                Err(PredicateError::from("boom"))
            }))
            .branch(Branch::when("next", |_| true));
        let selected = g.select(&ctx(json!({})), false).unwrap().unwrap();
        assert_eq!(selected.name(), "next");
    }

    #[test]
    fn test_predicate_error_aborts_selection_in_strict_mode() {
        let g = BranchGroup::new("g").branch(Branch::try_when("broken", |_| {
            Err(PredicateError::from("boom"))
        }));
        assert!(g.select(&ctx(json!({})), true).is_err());
    }

    #[test]
    fn test_decision_label_format() {
        let g = group().branch(Branch::otherwise());
        let default = g.branches().last().unwrap();
        assert_eq!(g.decision_label(default), "payment_method:otherwise");
    }

    #[test]
    fn test_counts_and_default_detection() {
        let g = group();
        assert_eq!(g.branches_count(), 2);
        assert!(!g.has_default());
        let g = g.branch(Branch::otherwise());
        assert_eq!(g.branches_count(), 3);
        assert!(g.has_default());
    }
}
