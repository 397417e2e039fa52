//! Terminal routing outcomes.

use std::fmt;

use crate::config::ProviderId;

/// Why the router declared blindness.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BlindnessCause {
    /// Nothing was eligible: every configured provider was denied by the
    /// traffic controller or filtered out by the economist.
    AllProvidersExhausted,
    /// Eligible providers existed, were tried, and all failed.
    TotalIntelligenceFailure,
}

impl BlindnessCause {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::AllProvidersExhausted => "ALL_PROVIDERS_EXHAUSTED",
            Self::TotalIntelligenceFailure => "TOTAL_INTELLIGENCE_FAILURE",
        }
    }
}

impl fmt::Display for BlindnessCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Result of one routed query.
///
/// Either a verified upstream result with the provider that produced it,
/// or an explicit blindness marker. There is no default/empty success:
/// downstream consumers must treat `Blind` as "stop, do not act", never as
/// "empty but safe".
#[derive(Clone, Debug, PartialEq)]
pub enum RoutingOutcome {
    Success {
        /// Verbatim provider response.
        content: String,
        /// Provider that produced the response.
        provider: ProviderId,
        /// Whether the response came from the failover hop.
        failed_over: bool,
    },
    Blind {
        cause: BlindnessCause,
        /// Human-readable attempt trail, for operators.
        details: String,
    },
}

impl RoutingOutcome {
    pub fn is_blind(&self) -> bool {
        matches!(self, Self::Blind { .. })
    }

    /// The response content, when one exists.
    pub fn content(&self) -> Option<&str> {
        match self {
            Self::Success { content, .. } => Some(content),
            Self::Blind { .. } => None,
        }
    }
}
