//! Time and id providers injected into workflow definitions.
//!
//! Durations in result metadata are reported in milliseconds with two decimal
//! places, so the clock works in microseconds. The `Fake*` implementations give
//! deterministic metadata in tests.

use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Provides the current wall-clock time for the engine.
pub trait TimeProvider: Send + Sync {
    /// Current Unix timestamp in seconds.
    fn now_timestamp(&self) -> i64;
    /// Current Unix timestamp in microseconds.
    fn now_micros(&self) -> i64;
}

/// Generates unique identifiers for invocation metadata.
pub trait IdGenerator: Send + Sync {
    /// Return the next unique ID string.
    fn next_id(&self) -> String;
}

// --- Real implementations ---

/// Production [`TimeProvider`] using `SystemTime`.
#[derive(Default)]
pub struct RealTimeProvider;

impl TimeProvider for RealTimeProvider {
    fn now_timestamp(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs() as i64
    }

    fn now_micros(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_micros() as i64
    }
}

/// Production [`IdGenerator`] using UUID v4.
#[derive(Default)]
pub struct RealIdGenerator;

impl IdGenerator for RealIdGenerator {
    fn next_id(&self) -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

// --- Fake implementations ---

/// Deterministic [`TimeProvider`] for testing. Starts at a fixed microsecond
/// timestamp and advances by a fixed amount on every `now_micros` call.
pub struct FakeTimeProvider {
    current_micros: AtomicI64,
    tick_micros: i64,
}

impl FakeTimeProvider {
    /// Create a provider starting at `start_micros`, advancing `tick_micros`
    /// per `now_micros` call.
    pub fn new(start_micros: i64, tick_micros: i64) -> Self {
        Self {
            current_micros: AtomicI64::new(start_micros),
            tick_micros,
        }
    }

    /// A frozen clock that never advances.
    pub fn frozen(at_micros: i64) -> Self {
        Self::new(at_micros, 0)
    }
}

impl TimeProvider for FakeTimeProvider {
    fn now_timestamp(&self) -> i64 {
        self.current_micros.load(Ordering::SeqCst) / 1_000_000
    }

    fn now_micros(&self) -> i64 {
        self.current_micros
            .fetch_add(self.tick_micros, Ordering::SeqCst)
    }
}

/// Deterministic [`IdGenerator`] for testing. Produces sequential IDs with a prefix.
pub struct FakeIdGenerator {
    prefix: String,
    counter: AtomicU64,
}

impl FakeIdGenerator {
    /// Create a new `FakeIdGenerator` with the given prefix.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            counter: AtomicU64::new(0),
        }
    }
}

impl IdGenerator for FakeIdGenerator {
    fn next_id(&self) -> String {
        let id = self.counter.fetch_add(1, Ordering::SeqCst);
        format!("{}-{}", self.prefix, id)
    }
}
