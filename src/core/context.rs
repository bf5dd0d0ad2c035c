//! Per-invocation execution context.
//!
//! A [`Context`] is created once per workflow invocation, mutated in place by
//! every executed step, and returned (as a snapshot) inside the result
//! envelope. It is never shared across invocations.

use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

use crate::error::OperationError;

/// Suffix for synthetic error entries recorded by optional-step failures.
const ERROR_KEY_SUFFIX: &str = "_error";

/// Mutable key/value store shared by all steps of one invocation.
#[derive(Debug, Clone, Serialize)]
pub struct Context {
    actor: Value,
    values: HashMap<String, Value>,
}

impl Context {
    /// Create a context seeded with the actor and the invocation's input
    /// parameters. A JSON object input is flattened: each top-level key
    /// becomes a context key. A non-object, non-null input is stored whole
    /// under `input`.
    pub fn new(actor: Value, input: Value) -> Self {
        let mut values = HashMap::new();
        match input {
            Value::Object(map) => {
                for (k, v) in map {
                    values.insert(k, v);
                }
            }
            Value::Null => {}
            other => {
                values.insert("input".to_string(), other);
            }
        }
        Context { actor, values }
    }

    /// The actor on whose behalf the workflow runs.
    pub fn actor(&self) -> &Value {
        &self.actor
    }

    /// Read a value. Missing keys are `None`, never an error.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Write a value, replacing any previous entry.
    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.values.insert(key.into(), value);
    }

    /// Whether a key is present.
    pub fn has(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Record an absorbed step failure under `<step>_error` without raising.
    pub fn record_error(&mut self, step: &str, error: &OperationError) {
        let key = format!("{step}{ERROR_KEY_SUFFIX}");
        self.values.insert(key, error.to_value());
    }

    /// The error entry recorded for a step, if any.
    pub fn error_for(&self, step: &str) -> Option<&Value> {
        self.values.get(&format!("{step}{ERROR_KEY_SUFFIX}"))
    }

    /// The `message` of the error entry recorded for a step, if any.
    /// Used by result building to resolve failure messages.
    pub fn error_message_for(&self, step: &str) -> Option<String> {
        self.error_for(step)
            .and_then(|v| v.get("message"))
            .and_then(|m| m.as_str())
            .map(|m| m.to_string())
    }

    /// Snapshot the whole store as a JSON object.
    pub fn snapshot(&self) -> Value {
        let map: serde_json::Map<String, Value> = self
            .values
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Value::Object(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_flattens_object_input() {
        let ctx = Context::new(json!({"id": 7}), json!({"order_id": 123, "qty": 2}));
        assert_eq!(ctx.get("order_id"), Some(&json!(123)));
        assert_eq!(ctx.get("qty"), Some(&json!(2)));
        assert_eq!(ctx.actor(), &json!({"id": 7}));
    }

    #[test]
    fn test_new_null_input_seeds_nothing() {
        let ctx = Context::new(Value::Null, Value::Null);
        assert!(ctx.is_empty());
    }

    #[test]
    fn test_new_scalar_input_stored_whole() {
        let ctx = Context::new(Value::Null, json!([1, 2, 3]));
        assert_eq!(ctx.get("input"), Some(&json!([1, 2, 3])));
    }

    #[test]
    fn test_missing_key_is_none() {
        let ctx = Context::new(Value::Null, json!({}));
        assert_eq!(ctx.get("nope"), None);
        assert!(!ctx.has("nope"));
    }

    #[test]
    fn test_set_overwrites() {
        let mut ctx = Context::new(Value::Null, json!({}));
        ctx.set("k", json!(1));
        ctx.set("k", json!(2));
        assert_eq!(ctx.get("k"), Some(&json!(2)));
        assert_eq!(ctx.len(), 1);
    }

    #[test]
    fn test_record_error_writes_synthetic_key() {
        let mut ctx = Context::new(Value::Null, json!({}));
        let err = OperationError::with_detail("declined", json!({"code": "E42"}));
        ctx.record_error("charge_card", &err);

        assert!(ctx.has("charge_card_error"));
        assert_eq!(
            ctx.error_for("charge_card"),
            Some(&json!({"message": "declined", "detail": {"code": "E42"}}))
        );
        assert_eq!(
            ctx.error_message_for("charge_card"),
            Some("declined".to_string())
        );
    }

    #[test]
    fn test_error_message_for_missing_step() {
        let ctx = Context::new(Value::Null, json!({}));
        assert_eq!(ctx.error_message_for("nope"), None);
    }

    #[test]
    fn test_snapshot_round_trips_as_object() {
        let mut ctx = Context::new(Value::Null, json!({"a": 1}));
        ctx.set("b", json!("two"));
        let snap = ctx.snapshot();
        assert_eq!(snap.get("a"), Some(&json!(1)));
        assert_eq!(snap.get("b"), Some(&json!("two")));
    }
}
