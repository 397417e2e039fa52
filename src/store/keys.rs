//! Tagged key spaces for the counter store.
//!
//! Rate windows and penalty records share one backing store but live in
//! distinct key types so they can never collide. The rendered forms match
//! what a remote shared cache would be keyed with:
//!
//! - windows:   `<namespace>:<provider>:<alias>:<granularity>`
//! - penalties: `<namespace>:<provider>:<alias>`

use std::fmt;
use std::time::Duration;

/// Credential alias used when a provider has no configured alias.
pub const DEFAULT_ALIAS: &str = "default";

/// Time granularity of a rate window.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Granularity {
    /// Sub-second burst window. Length is configurable
    /// ([`crate::config::GovernorConfig::burst_window`]).
    Second,
    /// Trailing 60 seconds.
    Minute,
    /// Trailing 24 hours.
    Day,
}

impl Granularity {
    /// Key suffix for this granularity.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Second => "second",
            Self::Minute => "minute",
            Self::Day => "day",
        }
    }

    /// Window length, given the configured burst window for `Second`.
    pub fn window(&self, burst_window: Duration) -> Duration {
        match self {
            Self::Second => burst_window,
            Self::Minute => Duration::from_secs(60),
            Self::Day => Duration::from_secs(86_400),
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Key for a rate window counter.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct WindowKey {
    pub namespace: String,
    pub provider: String,
    pub alias: String,
    pub granularity: Granularity,
}

impl WindowKey {
    pub fn new(
        namespace: impl Into<String>,
        provider: impl Into<String>,
        alias: impl Into<String>,
        granularity: Granularity,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            provider: provider.into(),
            alias: alias.into(),
            granularity,
        }
    }
}

impl fmt::Display for WindowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}",
            self.namespace, self.provider, self.alias, self.granularity
        )
    }
}

/// Key for a penalty record.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct PenaltyKey {
    pub namespace: String,
    pub provider: String,
    pub alias: String,
}

impl PenaltyKey {
    pub fn new(
        namespace: impl Into<String>,
        provider: impl Into<String>,
        alias: impl Into<String>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            provider: provider.into(),
            alias: alias.into(),
        }
    }
}

impl fmt::Display for PenaltyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.namespace, self.provider, self.alias)
    }
}
