//! Steps and the pluggable seams they are built from.
//!
//! A [`Step`] wraps one [`Operation`] with an optional gating predicate, an
//! optional input mapper, an optional [`Rollback`] action, and an
//! optional/required flag. Calling a step yields a [`StepOutcome`] — the four
//! possible outcomes are an exhaustive enum, not exception-style control flow.

use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use crate::core::context::Context;
use crate::error::{OperationError, PredicateError};

/// Gating predicate evaluated against the context. Must be pure.
pub type Predicate = Arc<dyn Fn(&Context) -> Result<bool, PredicateError> + Send + Sync>;

/// Maps the context to the input parameters handed to an [`Operation`].
pub type InputMapper = Arc<dyn Fn(&Context) -> Value + Send + Sync>;

/// The external business operation a step invokes.
///
/// The engine is agnostic to how the operation validates, authorizes, or
/// persists; it only consumes this single call contract.
#[async_trait]
pub trait Operation: Send + Sync {
    async fn invoke(&self, actor: &Value, input: Value) -> Result<Value, OperationError>;
}

/// A compensating action run in reverse execution order after a fatal failure.
///
/// Errors raised here are surfaced as secondary rollback failures, never
/// swallowed: a failed compensation means external state may be inconsistent
/// and needs manual intervention.
#[async_trait]
pub trait Rollback: Send + Sync {
    async fn rollback(&self, ctx: &mut Context) -> Result<(), OperationError>;
}

/// Outcome of calling a single step.
#[derive(Debug)]
pub enum StepOutcome {
    /// The operation ran and its output was written into the context.
    Executed(Value),
    /// The gating predicate was false; nothing ran, nothing was written.
    Skipped,
    /// An optional step failed; the error was recorded into the context and
    /// the workflow continues. The step still counts as executed.
    OptionalFailure(OperationError),
    /// A required step failed; the workflow transitions to rollback.
    Fatal(OperationError),
}

/// Evaluate a predicate under the configured error policy.
///
/// Non-strict mode preserves the observed legacy behavior: a failing predicate
/// counts as `false` (logged, not propagated). Strict mode propagates.
pub(crate) fn eval_predicate(
    predicate: &Predicate,
    ctx: &Context,
    strict: bool,
    scope: &str,
) -> Result<bool, PredicateError> {
    match predicate(ctx) {
        Ok(matched) => Ok(matched),
        Err(e) if strict => Err(e),
        Err(e) => {
            tracing::warn!("predicate for {scope} failed, treating as false: {e}");
            Ok(false)
        }
    }
}

/// A named unit wrapping one operation.
#[derive(Clone)]
pub struct Step {
    name: String,
    operation: Arc<dyn Operation>,
    predicate: Option<Predicate>,
    input_mapper: Option<InputMapper>,
    rollback: Option<Arc<dyn Rollback>>,
    optional: bool,
}

impl Step {
    pub fn new(name: impl Into<String>, operation: Arc<dyn Operation>) -> Self {
        Step {
            name: name.into(),
            operation,
            predicate: None,
            input_mapper: None,
            rollback: None,
            optional: false,
        }
    }

    /// Gate the step on a predicate. The step is skipped when it is false.
    pub fn only_if<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&Context) -> bool + Send + Sync + 'static,
    {
        self.predicate = Some(Arc::new(move |ctx| Ok(predicate(ctx))));
        self
    }

    /// Gate the step on a fallible predicate. Evaluation errors count as
    /// `false` unless strict predicate mode is enabled.
    pub fn try_only_if<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&Context) -> Result<bool, PredicateError> + Send + Sync + 'static,
    {
        self.predicate = Some(Arc::new(predicate));
        self
    }

    /// Compute the operation's input from the context. Default: empty object.
    pub fn with_input<F>(mut self, mapper: F) -> Self
    where
        F: Fn(&Context) -> Value + Send + Sync + 'static,
    {
        self.input_mapper = Some(Arc::new(mapper));
        self
    }

    /// Attach a compensating action.
    pub fn with_rollback(mut self, rollback: Arc<dyn Rollback>) -> Self {
        self.rollback = Some(rollback);
        self
    }

    /// Mark the step optional: its failure is absorbed and recorded instead of
    /// aborting the workflow.
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    pub fn has_rollback(&self) -> bool {
        self.rollback.is_some()
    }

    /// Execute the step against the context.
    pub async fn call(&self, ctx: &mut Context, strict_predicates: bool) -> StepOutcome {
        if let Some(predicate) = &self.predicate {
            let scope = format!("step '{}'", self.name);
            match eval_predicate(predicate, ctx, strict_predicates, &scope) {
                Ok(true) => {}
                Ok(false) => return StepOutcome::Skipped,
                Err(e) => {
                    return StepOutcome::Fatal(OperationError::new(format!(
                        "predicate for step '{}' failed: {}",
                        self.name, e.0
                    )))
                }
            }
        }

        let input = match &self.input_mapper {
            Some(mapper) => mapper(ctx),
            None => Value::Object(serde_json::Map::new()),
        };

        match self.operation.invoke(ctx.actor(), input).await {
            Ok(output) => {
                ctx.set(self.name.clone(), output.clone());
                StepOutcome::Executed(output)
            }
            Err(err) if self.optional => {
                tracing::warn!("optional step '{}' failed, continuing: {}", self.name, err);
                ctx.record_error(&self.name, &err);
                StepOutcome::OptionalFailure(err)
            }
            Err(err) => StepOutcome::Fatal(err),
        }
    }

    /// Run the declared compensating action, if any.
    pub async fn rollback(&self, ctx: &mut Context) -> Result<(), OperationError> {
        match &self.rollback {
            Some(action) => action.rollback(ctx).await,
            None => Ok(()),
        }
    }
}

impl fmt::Debug for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Step")
            .field("name", &self.name)
            .field("optional", &self.optional)
            .field("gated", &self.predicate.is_some())
            .field("has_rollback", &self.rollback.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct EchoOperation;

    #[async_trait]
    impl Operation for EchoOperation {
        async fn invoke(&self, _actor: &Value, input: Value) -> Result<Value, OperationError> {
            Ok(input)
        }
    }

    struct FailingOperation(&'static str);

    #[async_trait]
    impl Operation for FailingOperation {
        async fn invoke(&self, _actor: &Value, _input: Value) -> Result<Value, OperationError> {
            Err(OperationError::new(self.0))
        }
    }

    fn ctx() -> Context {
        Context::new(json!({"id": 1}), json!({"amount": 50}))
    }

    #[tokio::test]
    async fn test_executed_writes_output_under_step_name() {
        let step = Step::new("echo", Arc::new(EchoOperation))
            .with_input(|ctx| json!({"amount": ctx.get("amount").cloned()}));
        let mut ctx = ctx();
        let outcome = step.call(&mut ctx, false).await;
        assert!(matches!(outcome, StepOutcome::Executed(_)));
        assert_eq!(ctx.get("echo"), Some(&json!({"amount": 50})));
    }

    #[tokio::test]
    async fn test_default_input_is_empty_object() {
        let step = Step::new("echo", Arc::new(EchoOperation));
        let mut ctx = ctx();
        match step.call(&mut ctx, false).await {
            StepOutcome::Executed(output) => assert_eq!(output, json!({})),
            other => panic!("expected Executed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_false_predicate_skips_without_context_write() {
        let step = Step::new("echo", Arc::new(EchoOperation)).only_if(|_| false);
        let mut ctx = ctx();
        let outcome = step.call(&mut ctx, false).await;
        assert!(matches!(outcome, StepOutcome::Skipped));
        assert!(!ctx.has("echo"));
    }

    #[tokio::test]
    async fn test_predicate_error_treated_as_false() {
        let step = Step::new("echo", Arc::new(EchoOperation))
            .try_only_if(|_| Err(PredicateError::from("boom")));
        let mut ctx = ctx();
        assert!(matches!(step.call(&mut ctx, false).await, StepOutcome::Skipped));
    }

    #[tokio::test]
    async fn test_predicate_error_fatal_in_strict_mode() {
        let step = Step::new("echo", Arc::new(EchoOperation))
            .try_only_if(|_| Err(PredicateError::from("boom")));
        let mut ctx = ctx();
        match step.call(&mut ctx, true).await {
            StepOutcome::Fatal(err) => assert!(err.message.contains("boom")),
            other => panic!("expected Fatal, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_required_failure_is_fatal() {
        let step = Step::new("charge", Arc::new(FailingOperation("declined")));
        let mut ctx = ctx();
        match step.call(&mut ctx, false).await {
            StepOutcome::Fatal(err) => assert_eq!(err.message, "declined"),
            other => panic!("expected Fatal, got {other:?}"),
        }
        assert!(!ctx.has("charge_error"));
    }

    #[tokio::test]
    async fn test_optional_failure_is_absorbed_and_recorded() {
        let step = Step::new("notify", Arc::new(FailingOperation("smtp down"))).optional();
        let mut ctx = ctx();
        match step.call(&mut ctx, false).await {
            StepOutcome::OptionalFailure(err) => assert_eq!(err.message, "smtp down"),
            other => panic!("expected OptionalFailure, got {other:?}"),
        }
        assert_eq!(
            ctx.error_message_for("notify"),
            Some("smtp down".to_string())
        );
    }

    #[tokio::test]
    async fn test_rollback_without_action_is_noop() {
        let step = Step::new("echo", Arc::new(EchoOperation));
        let mut ctx = ctx();
        assert!(!step.has_rollback());
        assert!(step.rollback(&mut ctx).await.is_ok());
    }
}
