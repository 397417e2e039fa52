//! Eligibility verdicts.

use std::fmt;

/// Why a verdict came out the way it did.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum VerdictReason {
    /// All configured ceilings had headroom.
    WithinLimits,
    /// No configuration exists for the provider; allowed fail-open.
    ConfigMissing,
    /// A live penalty record blocks the provider regardless of quota.
    InPenaltyBox,
    /// Sub-second burst ceiling reached.
    RpsLimitExceeded,
    /// Per-minute ceiling reached.
    RpmLimitExceeded,
    /// Per-day ceiling reached.
    DailyQuotaExceeded,
}

impl VerdictReason {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::WithinLimits => "WITHIN_LIMITS",
            Self::ConfigMissing => "CONFIG_MISSING",
            Self::InPenaltyBox => "IN_PENALTY_BOX",
            Self::RpsLimitExceeded => "RPS_LIMIT_EXCEEDED",
            Self::RpmLimitExceeded => "RPM_LIMIT_EXCEEDED",
            Self::DailyQuotaExceeded => "DAILY_QUOTA_EXCEEDED",
        }
    }
}

impl fmt::Display for VerdictReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Outcome of one eligibility check. Denial is a normal outcome carried in
/// the reason code, never an error.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct EligibilityVerdict {
    pub allowed: bool,
    pub reason: VerdictReason,
}

impl EligibilityVerdict {
    pub fn allowed(reason: VerdictReason) -> Self {
        Self {
            allowed: true,
            reason,
        }
    }

    pub fn denied(reason: VerdictReason) -> Self {
        Self {
            allowed: false,
            reason,
        }
    }
}
