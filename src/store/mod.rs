//! Shared counter store abstraction.
//!
//! The traffic controller keeps all of its mutable state (rate window
//! counters and penalty flags) behind the [`CounterStore`] trait. A host
//! that runs multiple processes points this at a shared atomic cache
//! (counters with TTLs); a single process uses the bundled
//! [`MemoryCounterStore`] fallback, which preserves the same external
//! contract with per-process accuracy.

mod keys;
mod memory;

pub use keys::{Granularity, PenaltyKey, WindowKey, DEFAULT_ALIAS};
pub use memory::MemoryCounterStore;

use std::time::Duration;

use async_trait::async_trait;

use crate::errors::StoreError;

/// Atomic counter/flag substrate for rate windows and penalty records.
///
/// Implementations must make [`try_increment`](Self::try_increment)
/// linearizable per key: under any interleaving of concurrent callers, at
/// most `ceiling` events may be recorded within one trailing window. Remote
/// implementations should map a window to a TTL counter (TTL = window
/// length) and a penalty to a TTL flag (TTL = cool-down), and must bound
/// their round-trips with short timeouts.
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Atomic check-and-increment for one rate window.
    ///
    /// Returns `Ok(true)` and records the event if the count of events in
    /// the trailing `window` is strictly below `ceiling`; returns
    /// `Ok(false)` without recording anything when the window is saturated.
    /// Saturation is a normal outcome, not an error.
    async fn try_increment(
        &self,
        key: &WindowKey,
        window: Duration,
        ceiling: u32,
    ) -> Result<bool, StoreError>;

    /// Non-consuming variant of [`try_increment`](Self::try_increment):
    /// reports whether the window currently has headroom, without
    /// recording an event. Used to survey candidates; the consuming check
    /// is reserved for the provider actually attempted.
    async fn has_headroom(
        &self,
        key: &WindowKey,
        window: Duration,
        ceiling: u32,
    ) -> Result<bool, StoreError>;

    /// Activate (or refresh) a penalty record that expires after
    /// `cooldown`. At most one record exists per key; re-activation
    /// replaces the expiry.
    async fn activate_penalty(
        &self,
        key: &PenaltyKey,
        cooldown: Duration,
    ) -> Result<(), StoreError>;

    /// Whether a live (unexpired) penalty record exists for `key`.
    async fn penalty_active(&self, key: &PenaltyKey) -> Result<bool, StoreError>;
}
