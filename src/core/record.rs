//! Transient per-invocation execution log.

/// Ordered record of what one invocation did: executed and skipped step names
/// plus branch decision labels, in the order they happened. Feeds result
/// metadata; discarded when the invocation returns.
#[derive(Debug, Default, Clone)]
pub struct ExecutionRecord {
    executed: Vec<String>,
    skipped: Vec<String>,
    decisions: Vec<String>,
}

impl ExecutionRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_executed(&mut self, step: impl Into<String>) {
        self.executed.push(step.into());
    }

    pub fn record_skipped(&mut self, step: impl Into<String>) {
        self.skipped.push(step.into());
    }

    pub fn record_decision(&mut self, label: impl Into<String>) {
        self.decisions.push(label.into());
    }

    pub fn executed(&self) -> &[String] {
        &self.executed
    }

    pub fn skipped(&self) -> &[String] {
        &self.skipped
    }

    pub fn decisions(&self) -> &[String] {
        &self.decisions
    }
}
