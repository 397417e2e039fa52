//! Usage accounting collaborator contract.

use async_trait::async_trait;

/// Coarse quota state reported by the usage accountant.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum QuotaState {
    /// Plenty of headroom.
    Ok,
    /// Usage is elevated; still eligible.
    Warning,
    /// Nearly exhausted; still eligible, reserved for emergencies.
    Critical,
    /// Fully exhausted; must not be selected.
    Blocked,
}

/// Point-in-time quota report for one provider.
#[derive(Clone, Debug)]
pub struct QuotaStatus {
    pub state: QuotaState,
    /// Fraction of the period budget consumed, 0.0..=1.0.
    pub usage_fraction: f64,
    pub message: String,
}

impl QuotaStatus {
    pub fn ok() -> Self {
        Self {
            state: QuotaState::Ok,
            usage_fraction: 0.0,
            message: String::new(),
        }
    }

    pub fn blocked(message: impl Into<String>) -> Self {
        Self {
            state: QuotaState::Blocked,
            usage_fraction: 1.0,
            message: message.into(),
        }
    }
}

/// External usage accountant, queried during candidate filtering.
///
/// The contract is infallible: implementations that cannot reach their
/// backing data should report the most recent known state (or `Ok`) rather
/// than fail the selection path.
#[async_trait]
pub trait UsageAccountant: Send + Sync {
    async fn check_quota_status(&self, provider: &str) -> QuotaStatus;
}

/// Accountant that reports every provider as unconstrained. Suitable for
/// hosts that rely on the traffic controller alone.
#[derive(Debug, Default)]
pub struct UnconstrainedAccountant;

#[async_trait]
impl UsageAccountant for UnconstrainedAccountant {
    async fn check_quota_status(&self, _provider: &str) -> QuotaStatus {
        QuotaStatus::ok()
    }
}
