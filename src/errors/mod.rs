//! Error types for the governance engine.
//!
//! Quota denials are deliberately *not* errors; they are verdicts (see
//! [`crate::traffic::EligibilityVerdict`]). The enums here cover the two
//! things that can actually fail: a provider call and the counter store
//! backend.

use thiserror::Error;

/// Errors returned by a provider driver through [`crate::provider::ProviderClient`].
///
/// The router never surfaces these to its caller directly; they drive the
/// single failover hop, and [`is_quota_violation`](Self::is_quota_violation)
/// decides whether the traffic controller should be told to open a penalty
/// window for the provider.
#[derive(Error, Debug)]
pub enum ProviderCallError {
    /// The provider answered with a 429-equivalent despite a local
    /// "allowed" verdict (clock or accounting drift between local and
    /// remote state).
    #[error("rate limited by provider: {provider}")]
    RateLimited {
        /// The provider that rate limited the call
        provider: String,
    },

    /// The call exceeded the provider driver's own deadline.
    #[error("provider call timed out: {provider}")]
    Timeout {
        /// The provider that timed out
        provider: String,
    },

    /// The provider returned an error response or unusable payload.
    #[error("upstream error from {provider}: {message}")]
    Upstream {
        /// The provider that failed
        provider: String,
        /// The error message from the provider
        message: String,
    },

    /// The provider could not be reached at all.
    #[error("provider unavailable: {provider}")]
    Unavailable {
        /// The unreachable provider
        provider: String,
    },
}

impl ProviderCallError {
    /// Whether this failure means the provider disagreed with our local
    /// quota accounting. A `true` here is what triggers
    /// `report_violation` and a penalty window.
    pub fn is_quota_violation(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }

    /// Stable machine-readable code for audit events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::RateLimited { .. } => "RATE_LIMITED",
            Self::Timeout { .. } => "TIMEOUT",
            Self::Upstream { .. } => "UPSTREAM_ERROR",
            Self::Unavailable { .. } => "UNAVAILABLE",
        }
    }

    /// The provider the failure came from.
    pub fn provider(&self) -> &str {
        match self {
            Self::RateLimited { provider }
            | Self::Timeout { provider }
            | Self::Upstream { provider, .. }
            | Self::Unavailable { provider } => provider,
        }
    }
}

/// Errors from a [`crate::store::CounterStore`] backend.
///
/// Only remote implementations produce these; the bundled in-memory
/// fallback is infallible. The traffic controller treats a store error as
/// fail-open (logged), matching the availability-over-enforcement policy
/// for configuration gaps.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The backend could not be reached within its deadline.
    #[error("counter store unreachable: {0}")]
    Unreachable(String),

    /// The backend rejected or failed the operation.
    #[error("counter store backend error: {0}")]
    Backend(String),
}
