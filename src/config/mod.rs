//! Startup configuration for the governance engine.
//!
//! Everything here is loaded once by the host (all types derive serde) and
//! is read-only afterwards (no hot reload, no runtime mutation), so none of
//! it needs locking. Operational policy that the original hard-coded
//! (penalty cool-down, burst window length) is surfaced as configuration
//! with the same defaults.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::store::Granularity;

/// Provider identifier. Configuration-supplied, so owned strings rather
/// than static constants.
pub type ProviderId = String;

/// Scarcity score assigned when a provider matches no table entry.
/// Sorts last, keeping the ranking a total order.
pub const DEFAULT_SCARCITY_SCORE: u32 = u32::MAX / 2;

fn default_namespace() -> String {
    "govern".to_string()
}

fn default_cooldown_secs() -> u64 {
    60
}

fn default_burst_window_ms() -> u64 {
    1_000
}

fn default_attempt_timeout_secs() -> u64 {
    8
}

fn default_oversize_payload_bytes() -> usize {
    64 * 1024
}

/// Per-granularity request ceilings for one provider.
///
/// A value of zero means unbounded at that granularity.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize)]
pub struct RateCeilings {
    #[serde(default)]
    pub per_second: u32,
    #[serde(default)]
    pub per_minute: u32,
    #[serde(default)]
    pub per_day: u32,
}

impl RateCeilings {
    /// Ceiling for the given granularity (zero = unbounded).
    pub fn limit(&self, granularity: Granularity) -> u32 {
        match granularity {
            Granularity::Second => self.per_second,
            Granularity::Minute => self.per_minute,
            Granularity::Day => self.per_day,
        }
    }
}

/// Static record for one external provider. Immutable after startup.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ProviderSpec {
    /// Unique provider identifier, e.g. `"tickfeed-pro"`.
    pub id: ProviderId,

    /// Relative cost/rarity score; lower is preferred. When absent, the
    /// scarcity table (matched by id) decides instead.
    #[serde(default)]
    pub scarcity: Option<u32>,

    /// Tiered request ceilings.
    #[serde(default)]
    pub ceilings: RateCeilings,

    /// Credential alias for multi-key rotation. Windows and penalties are
    /// scoped to (provider, alias).
    #[serde(default)]
    pub credential_alias: Option<String>,

    /// Relative context-capacity hint. The router forces oversized
    /// payloads to the provider with the largest value.
    #[serde(default)]
    pub context_capacity: u32,
}

impl ProviderSpec {
    pub fn new(id: impl Into<ProviderId>) -> Self {
        Self {
            id: id.into(),
            scarcity: None,
            ceilings: RateCeilings::default(),
            credential_alias: None,
            context_capacity: 0,
        }
    }

    /// Effective credential alias for counter keys.
    pub fn alias(&self) -> &str {
        self.credential_alias
            .as_deref()
            .unwrap_or(crate::store::DEFAULT_ALIAS)
    }
}

/// One scarcity table entry: a base identity and its cost score.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ScarcityEntry {
    /// Base identity matched against provider ids (prefix first, then
    /// substring), so a model-variant id maps to its provider family.
    pub base_id: String,
    /// Cost score; lower = cheaper/more available.
    pub score: u32,
}

/// Static scarcity table mapping provider families to cost scores.
///
/// Entry order matters: the first matching entry wins, so more specific
/// base identities should come first.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct ScarcityTable {
    entries: Vec<ScarcityEntry>,
}

impl ScarcityTable {
    pub fn new(entries: Vec<ScarcityEntry>) -> Self {
        Self { entries }
    }

    /// Score for a provider id. Prefix matches take precedence over
    /// substring matches; unknown ids get [`DEFAULT_SCARCITY_SCORE`].
    pub fn score_for(&self, provider: &str) -> u32 {
        if let Some(entry) = self
            .entries
            .iter()
            .find(|e| provider.starts_with(e.base_id.as_str()))
        {
            return entry.score;
        }
        if let Some(entry) = self
            .entries
            .iter()
            .find(|e| provider.contains(e.base_id.as_str()))
        {
            return entry.score;
        }
        DEFAULT_SCARCITY_SCORE
    }
}

/// Capability-tier allow-lists, matched with the same substring rule as
/// the scarcity table.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct CapabilityTiers {
    /// Providers trusted for HIGH/CRITICAL tasks.
    #[serde(default)]
    pub high_intelligence: Vec<String>,
    /// Most expensive tier; never handed LOW-complexity work.
    #[serde(default)]
    pub premium: Vec<String>,
}

impl CapabilityTiers {
    pub fn is_high_intelligence(&self, provider: &str) -> bool {
        Self::matches(&self.high_intelligence, provider)
    }

    pub fn is_premium(&self, provider: &str) -> bool {
        Self::matches(&self.premium, provider)
    }

    fn matches(tiers: &[String], provider: &str) -> bool {
        tiers.iter().any(|t| provider.contains(t.as_str()))
    }
}

/// How demanding a task is; drives provider selection.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskComplexity {
    Low,
    Medium,
    High,
    Critical,
}

impl TaskComplexity {
    /// HIGH/CRITICAL tasks prefer capability over cost.
    pub fn is_elevated(&self) -> bool {
        matches!(self, Self::High | Self::Critical)
    }
}

/// Kind of work a routed query represents.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    /// Small, latency-sensitive extraction; eligible for the fast path.
    QuickExtract,
    Classification,
    Summarization,
    Analysis,
    Generation,
}

impl TaskKind {
    /// Complexity assumed when the router config has no override.
    pub fn default_complexity(&self) -> TaskComplexity {
        match self {
            Self::QuickExtract | Self::Classification => TaskComplexity::Low,
            Self::Summarization | Self::Generation => TaskComplexity::Medium,
            Self::Analysis => TaskComplexity::High,
        }
    }
}

/// Traffic controller policy.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct GovernorConfig {
    /// Namespace prefix for all counter-store keys.
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Penalty-box cool-down after a reported violation.
    #[serde(default = "default_cooldown_secs")]
    pub penalty_cooldown_secs: u64,

    /// Length of the sub-second burst window.
    #[serde(default = "default_burst_window_ms")]
    pub burst_window_ms: u64,
}

impl Default for GovernorConfig {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            penalty_cooldown_secs: default_cooldown_secs(),
            burst_window_ms: default_burst_window_ms(),
        }
    }
}

impl GovernorConfig {
    pub fn penalty_cooldown(&self) -> Duration {
        Duration::from_secs(self.penalty_cooldown_secs)
    }

    pub fn burst_window(&self) -> Duration {
        Duration::from_millis(self.burst_window_ms)
    }
}

/// Failover router policy.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct RouterConfig {
    /// Payloads above this size are forced to the long-context provider,
    /// bypassing cost ranking.
    #[serde(default = "default_oversize_payload_bytes")]
    pub oversize_payload_bytes: usize,

    /// Explicit long-context provider. When unset, the provider with the
    /// largest `context_capacity` is used.
    #[serde(default)]
    pub long_context_provider: Option<ProviderId>,

    /// Provider used for fast-path task kinds.
    #[serde(default)]
    pub fast_path_provider: Option<ProviderId>,

    /// Task kinds routed to the fast-path provider.
    #[serde(default = "RouterConfig::default_fast_path_kinds")]
    pub fast_path_kinds: Vec<TaskKind>,

    /// Configured failover counterpart per provider. Providers without an
    /// entry fail over to the next eligible ranked candidate.
    #[serde(default)]
    pub alternates: HashMap<ProviderId, ProviderId>,

    /// Upper bound on a single provider attempt. A stalled attempt counts
    /// as a failure for failover purposes.
    #[serde(default = "default_attempt_timeout_secs")]
    pub attempt_timeout_secs: u64,

    /// Per-task-kind complexity overrides.
    #[serde(default)]
    pub task_complexity: HashMap<TaskKind, TaskComplexity>,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            oversize_payload_bytes: default_oversize_payload_bytes(),
            long_context_provider: None,
            fast_path_provider: None,
            fast_path_kinds: Self::default_fast_path_kinds(),
            alternates: HashMap::new(),
            attempt_timeout_secs: default_attempt_timeout_secs(),
            task_complexity: HashMap::new(),
        }
    }
}

impl RouterConfig {
    fn default_fast_path_kinds() -> Vec<TaskKind> {
        vec![TaskKind::QuickExtract]
    }

    pub fn attempt_timeout(&self) -> Duration {
        Duration::from_secs(self.attempt_timeout_secs)
    }

    /// Effective complexity for a task kind.
    pub fn complexity_for(&self, kind: TaskKind) -> TaskComplexity {
        self.task_complexity
            .get(&kind)
            .copied()
            .unwrap_or_else(|| kind.default_complexity())
    }
}
