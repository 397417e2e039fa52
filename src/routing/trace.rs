//! Per-route attempt diagnostics.
//!
//! Records why each provider was skipped, failed, or succeeded during one
//! routing decision, so operators can reconstruct a blindness declaration
//! from the logs.

use crate::config::ProviderId;
use crate::traffic::VerdictReason;

/// Why a provider was skipped during routing.
#[derive(Clone, Debug)]
pub enum SkipReason {
    /// The traffic controller denied it.
    Ineligible(VerdictReason),
    /// No driver is registered for this provider id.
    NoClient,
}

/// One provider's part in a routing decision.
#[derive(Clone, Debug)]
pub struct RouteAttempt {
    pub provider: ProviderId,
    pub skipped: Option<SkipReason>,
    pub error: Option<String>,
    pub success: bool,
}

/// Ordered record of a routing decision.
#[derive(Clone, Debug, Default)]
pub struct RouteTrace {
    pub attempts: Vec<RouteAttempt>,
}

impl RouteTrace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_skip(&mut self, provider: impl Into<ProviderId>, reason: SkipReason) {
        self.attempts.push(RouteAttempt {
            provider: provider.into(),
            skipped: Some(reason),
            error: None,
            success: false,
        });
    }

    pub fn record_error(&mut self, provider: impl Into<ProviderId>, error: impl Into<String>) {
        self.attempts.push(RouteAttempt {
            provider: provider.into(),
            skipped: None,
            error: Some(error.into()),
            success: false,
        });
    }

    pub fn record_success(&mut self, provider: impl Into<ProviderId>) {
        self.attempts.push(RouteAttempt {
            provider: provider.into(),
            skipped: None,
            error: None,
            success: true,
        });
    }

    /// One-line summary for logging and blindness details.
    pub fn summary(&self) -> String {
        if self.attempts.is_empty() {
            return "no providers considered".to_string();
        }
        self.attempts
            .iter()
            .map(|a| {
                if a.success {
                    format!("{}: SUCCESS", a.provider)
                } else if let Some(skip) = &a.skipped {
                    format!("{}: SKIPPED ({:?})", a.provider, skip)
                } else if let Some(err) = &a.error {
                    format!("{}: ERROR ({})", a.provider, err)
                } else {
                    format!("{}: UNKNOWN", a.provider)
                }
            })
            .collect::<Vec<_>>()
            .join(" -> ")
    }
}
