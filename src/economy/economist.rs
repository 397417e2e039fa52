//! Cost/scarcity-aware provider selection.

use std::collections::HashMap;
use std::sync::Arc;

use log::debug;

use super::{QuotaState, UsageAccountant};
use crate::config::{CapabilityTiers, ProviderId, ProviderSpec, ScarcityTable, TaskComplexity};

/// Ranks candidate providers by scarcity and picks the best eligible one
/// for a given task complexity.
///
/// Selection is deterministic: a fixed scarcity table and unchanged
/// accountant state always yield the same candidate. Ties in score keep
/// the input (configuration) order, since the sort is stable.
pub struct ResourceEconomist {
    table: ScarcityTable,
    tiers: CapabilityTiers,
    /// Per-provider score overrides from the provider specs.
    overrides: HashMap<String, u32>,
    accountant: Arc<dyn UsageAccountant>,
}

impl ResourceEconomist {
    pub fn new(
        specs: &[ProviderSpec],
        table: ScarcityTable,
        tiers: CapabilityTiers,
        accountant: Arc<dyn UsageAccountant>,
    ) -> Self {
        let overrides = specs
            .iter()
            .filter_map(|s| s.scarcity.map(|score| (s.id.clone(), score)))
            .collect();
        Self {
            table,
            tiers,
            overrides,
            accountant,
        }
    }

    /// Select the cheapest viable candidate for the given complexity.
    ///
    /// - Candidates whose accountant state is `Blocked` are discarded;
    ///   `Warning`/`Critical` remain eligible since they may be needed in
    ///   emergencies.
    /// - HIGH/CRITICAL tasks prefer the first high-intelligence candidate
    ///   in scarcity order, even over cheaper options.
    /// - LOW tasks never get a premium-tier candidate; the cheapest
    ///   non-premium one is substituted, or `None` when only premium
    ///   candidates remain.
    ///
    /// Returns `None` only when every candidate was filtered out, a
    /// legitimate outcome the router turns into an explicit exhaustion
    /// signal.
    pub async fn select_best_provider(
        &self,
        candidates: &[ProviderId],
        complexity: TaskComplexity,
    ) -> Option<ProviderId> {
        let mut viable: Vec<(&str, u32)> = Vec::with_capacity(candidates.len());

        for id in candidates {
            let status = self.accountant.check_quota_status(id).await;
            if status.state == QuotaState::Blocked {
                debug!(
                    "Discarding '{}' from selection: quota blocked ({})",
                    id, status.message
                );
                continue;
            }
            viable.push((id.as_str(), self.score_for(id)));
        }

        if viable.is_empty() {
            return None;
        }

        // Stable sort: equal scores keep input order.
        viable.sort_by_key(|(_, score)| *score);

        if complexity.is_elevated() {
            if let Some((id, score)) = viable
                .iter()
                .find(|(id, _)| self.tiers.is_high_intelligence(id))
            {
                debug!(
                    "Elevated task: preferring high-intelligence '{}' (score {})",
                    id, score
                );
                return Some((*id).to_string());
            }
        }

        if complexity == TaskComplexity::Low {
            return viable
                .iter()
                .find(|(id, _)| !self.tiers.is_premium(id))
                .map(|(id, _)| (*id).to_string());
        }

        viable.first().map(|(id, _)| (*id).to_string())
    }

    /// Effective scarcity score: per-provider override first, then the
    /// table's prefix/substring match.
    fn score_for(&self, provider: &str) -> u32 {
        self.overrides
            .get(provider)
            .copied()
            .unwrap_or_else(|| self.table.score_for(provider))
    }
}
