//! Provider Quota Governance & Failover Routing Engine
//!
//! This crate decides, for every outbound call to a pool of quota-limited
//! external providers, whether the call is currently permitted, which
//! provider should serve it, and what to do when the chosen provider is
//! unavailable or over quota, without ever fabricating a result when none
//! can be obtained honestly.
//!
//! # Overview
//!
//! The engine supports:
//! - Per-provider, per-credential rate ceilings across second/minute/day
//!   windows, enforced with atomic check-and-increment
//! - A penalty box (circuit-breaker-style cool-down) for providers that
//!   reject calls our local accounting had allowed
//! - Cost/scarcity-aware provider ranking with capability-tier overrides
//! - Primary-plus-one-alternate failover with an explicit, auditable
//!   "blindness" signal on total exhaustion
//!
//! # Architecture
//!
//! ```text
//! +------------------+
//! |      Caller      |
//! +------------------+
//!          |
//!          v
//! +------------------+     +--------------------+
//! |  FailoverRouter  | --> | ResourceEconomist  |  (scarcity ranking)
//! +------------------+     +--------------------+
//!          |                         |
//!          v                         v
//! +--------------------+    +--------------------+
//! | TrafficController  |    |  UsageAccountant   |  (external)
//! +--------------------+    +--------------------+
//!          |
//!          v
//! +------------------+
//! |   CounterStore   |  (shared cache or in-process fallback)
//! +------------------+
//! ```
//!
//! The router consults the traffic controller before each provider-specific
//! attempt, invokes the chosen [`ProviderClient`] driver with a bounded
//! timeout, and falls back to exactly one alternate. When nothing is
//! eligible or both attempts fail, it returns
//! [`RoutingOutcome::Blind`], a terminal marker downstream consumers must
//! treat as "stop, do not act".
//!
//! # Core Types
//!
//! - [`TrafficController`] - multi-window quota enforcement and penalty box
//! - [`ResourceEconomist`] - scarcity-ranked provider selection
//! - [`FailoverRouter`] - routing state machine with one failover hop
//! - [`RoutingOutcome`] - verified result or explicit blindness
//! - [`CounterStore`] - atomic counter/flag substrate (shared or in-process)
//!
//! All collaborators (counter store, usage accountant, audit sink, provider
//! drivers) are injected at construction time through traits; nothing is
//! resolved through globals.

pub mod audit;
pub mod config;
pub mod economy;
pub mod errors;
pub mod provider;
pub mod routing;
pub mod store;
pub mod traffic;

// Re-export configuration types
pub use config::{
    CapabilityTiers, GovernorConfig, ProviderId, ProviderSpec, RateCeilings, RouterConfig,
    ScarcityEntry, ScarcityTable, TaskComplexity, TaskKind,
};

// Re-export the counter store surface
pub use store::{CounterStore, Granularity, MemoryCounterStore, PenaltyKey, WindowKey};

// Re-export traffic control types
pub use traffic::{EligibilityVerdict, TrafficController, VerdictReason};

// Re-export economy types
pub use economy::{
    QuotaState, QuotaStatus, ResourceEconomist, UnconstrainedAccountant, UsageAccountant,
};

// Re-export routing types
pub use routing::{BlindnessCause, FailoverRouter, RouteTrace, RoutingOutcome, SkipReason};

// Re-export collaborator contracts
pub use audit::{AuditSink, LogAuditSink, NullAuditSink};
pub use errors::{ProviderCallError, StoreError};
pub use provider::ProviderClient;
