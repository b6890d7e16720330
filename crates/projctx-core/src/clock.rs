//! Clock abstraction for testability.
//!
//! Context timestamps (`lastAccessed`) are read through a `Clock` so that
//! production code uses wall-clock time while tests drive a controllable
//! clock and get deterministic records.

use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

/// Source of wall-clock time.
pub trait Clock: Send + Sync + std::fmt::Debug {
    /// Current UTC time.
    fn now(&self) -> DateTime<Utc>;
}

/// Type alias for shared clock.
pub type SharedClock = Arc<dyn Clock>;

/// Production implementation using the system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct RealClock;

impl RealClock {
    pub fn new() -> Self {
        Self
    }

    /// Create a shared RealClock.
    pub fn shared() -> SharedClock {
        Arc::new(Self)
    }
}

impl Clock for RealClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Test implementation with controllable time.
///
/// Time only moves when `advance()` or `set()` is called.
///
/// # Example
///
/// ```
/// use projctx_core::clock::{Clock, TestClock};
/// use chrono::Duration;
///
/// let clock = TestClock::new();
/// let start = clock.now();
/// clock.advance(Duration::seconds(5));
/// assert_eq!(clock.now() - start, Duration::seconds(5));
/// ```
#[derive(Debug)]
pub struct TestClock {
    /// Logical time in milliseconds since the Unix epoch.
    millis: AtomicI64,
}

impl Default for TestClock {
    fn default() -> Self {
        Self::new()
    }
}

impl TestClock {
    /// 2024-01-01T00:00:00Z
    const BASE_MILLIS: i64 = 1_704_067_200_000;

    pub fn new() -> Self {
        Self {
            millis: AtomicI64::new(Self::BASE_MILLIS),
        }
    }

    /// Create a shared TestClock.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Move logical time forward.
    pub fn advance(&self, by: Duration) {
        self.millis.fetch_add(by.num_milliseconds(), Ordering::SeqCst);
    }

    /// Jump to an absolute time.
    pub fn set(&self, at: DateTime<Utc>) {
        self.millis.store(at.timestamp_millis(), Ordering::SeqCst);
    }
}

impl Clock for TestClock {
    fn now(&self) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(self.millis.load(Ordering::SeqCst))
            .single()
            .unwrap_or_default()
    }
}
