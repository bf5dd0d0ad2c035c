//! Shared fakes for integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::Value;
use std::sync::{Arc, Mutex};

use stepchain::{
    Context, LifecycleHook, Operation, OperationError, Rollback, TransactionManager,
};

/// Append-only log shared between fakes and assertions.
pub type CallLog = Arc<Mutex<Vec<String>>>;

pub fn call_log() -> CallLog {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn entries(log: &CallLog) -> Vec<String> {
    log.lock().unwrap().clone()
}

/// Returns a fixed output.
pub struct StaticOperation(pub Value);

#[async_trait]
impl Operation for StaticOperation {
    async fn invoke(&self, _actor: &Value, _input: Value) -> Result<Value, OperationError> {
        Ok(self.0.clone())
    }
}

/// Echoes its mapped input back as output.
pub struct EchoOperation;

#[async_trait]
impl Operation for EchoOperation {
    async fn invoke(&self, _actor: &Value, input: Value) -> Result<Value, OperationError> {
        Ok(input)
    }
}

/// Logs its name on invocation, then returns a fixed output.
pub struct LoggingOperation {
    pub name: &'static str,
    pub log: CallLog,
}

#[async_trait]
impl Operation for LoggingOperation {
    async fn invoke(&self, _actor: &Value, _input: Value) -> Result<Value, OperationError> {
        self.log.lock().unwrap().push(self.name.to_string());
        Ok(Value::Bool(true))
    }
}

/// Always fails with the given message.
pub struct FailingOperation(pub &'static str);

#[async_trait]
impl Operation for FailingOperation {
    async fn invoke(&self, _actor: &Value, _input: Value) -> Result<Value, OperationError> {
        Err(OperationError::new(self.0))
    }
}

/// Logs `rollback:<name>` when invoked.
pub struct LoggingRollback {
    pub name: &'static str,
    pub log: CallLog,
}

#[async_trait]
impl Rollback for LoggingRollback {
    async fn rollback(&self, _ctx: &mut Context) -> Result<(), OperationError> {
        self.log.lock().unwrap().push(format!("rollback:{}", self.name));
        Ok(())
    }
}

/// Logs the attempt, then fails.
pub struct FailingRollback {
    pub name: &'static str,
    pub log: CallLog,
}

#[async_trait]
impl Rollback for FailingRollback {
    async fn rollback(&self, _ctx: &mut Context) -> Result<(), OperationError> {
        self.log.lock().unwrap().push(format!("rollback:{}", self.name));
        Err(OperationError::new("compensation failed"))
    }
}

/// Transaction manager that logs begin/commit/abort and can be told to fail
/// specific phases.
pub struct FakeTransaction {
    pub log: CallLog,
    pub fail_begin: bool,
    pub fail_commit: bool,
    pub fail_abort: bool,
}

impl FakeTransaction {
    pub fn new(log: CallLog) -> Self {
        FakeTransaction {
            log,
            fail_begin: false,
            fail_commit: false,
            fail_abort: false,
        }
    }
}

#[async_trait]
impl TransactionManager for FakeTransaction {
    async fn begin(&self) -> Result<(), OperationError> {
        self.log.lock().unwrap().push("tx:begin".to_string());
        if self.fail_begin {
            return Err(OperationError::new("begin failed"));
        }
        Ok(())
    }

    async fn commit(&self) -> Result<(), OperationError> {
        self.log.lock().unwrap().push("tx:commit".to_string());
        if self.fail_commit {
            return Err(OperationError::new("commit failed"));
        }
        Ok(())
    }

    async fn abort(&self) -> Result<(), OperationError> {
        self.log.lock().unwrap().push("tx:abort".to_string());
        if self.fail_abort {
            return Err(OperationError::new("abort failed"));
        }
        Ok(())
    }
}

/// Lifecycle hook that logs both phases and can abort the run up front.
pub struct FakeHook {
    pub log: CallLog,
    pub fail_before: bool,
}

#[async_trait]
impl LifecycleHook for FakeHook {
    async fn before(&self, ctx: &mut Context) -> Result<(), OperationError> {
        self.log.lock().unwrap().push("hook:before".to_string());
        if self.fail_before {
            return Err(OperationError::new("not allowed"));
        }
        ctx.set("prepared", Value::Bool(true));
        Ok(())
    }

    async fn after(&self, _ctx: &Context, success: bool) {
        self.log
            .lock()
            .unwrap()
            .push(format!("hook:after:{success}"));
    }
}
