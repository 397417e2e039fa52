//! Resource economics: scarcity-ranked provider selection.

mod accountant;
mod economist;

pub use accountant::{QuotaState, QuotaStatus, UnconstrainedAccountant, UsageAccountant};
pub use economist::ResourceEconomist;
