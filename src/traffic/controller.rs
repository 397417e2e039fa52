//! Traffic controller: multi-window rate enforcement plus the penalty box.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use log::{debug, warn};
use serde_json::json;

use super::{EligibilityVerdict, VerdictReason};
use crate::audit::AuditSink;
use crate::config::{GovernorConfig, ProviderSpec};
use crate::store::{CounterStore, Granularity, PenaltyKey, WindowKey, DEFAULT_ALIAS};

/// Ceiling evaluation order; short-circuits on the first denial.
const CEILING_ORDER: [(Granularity, VerdictReason); 3] = [
    (Granularity::Second, VerdictReason::RpsLimitExceeded),
    (Granularity::Minute, VerdictReason::RpmLimitExceeded),
    (Granularity::Day, VerdictReason::DailyQuotaExceeded),
];

/// Enforces per-provider, per-credential rate ceilings and maintains the
/// penalty box.
///
/// All mutable state lives in the injected [`CounterStore`]; the controller
/// itself is immutable after construction and freely shared across tasks.
pub struct TrafficController {
    specs: HashMap<String, ProviderSpec>,
    config: GovernorConfig,
    store: Arc<dyn CounterStore>,
    audit: Arc<dyn AuditSink>,
}

impl TrafficController {
    pub fn new(
        specs: Vec<ProviderSpec>,
        config: GovernorConfig,
        store: Arc<dyn CounterStore>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        let specs = specs.into_iter().map(|s| (s.id.clone(), s)).collect();
        Self {
            specs,
            config,
            store,
            audit,
        }
    }

    /// Decide whether a call against `provider` may proceed right now.
    ///
    /// Evaluation order: penalty box, then burst, minute, and day ceilings,
    /// short-circuiting on the first failure. Each passing ceiling check
    /// records the event atomically (check-and-increment), so N concurrent
    /// callers can never jointly exceed a ceiling.
    ///
    /// `alias` overrides the provider's configured credential alias. An
    /// unknown provider is allowed fail-open with `ConfigMissing`; blocking
    /// new integrations on missing limits would be the worse failure mode.
    pub async fn check_eligibility(
        &self,
        provider: &str,
        alias: Option<&str>,
    ) -> EligibilityVerdict {
        self.evaluate(provider, alias, true).await
    }

    /// Non-consuming survey of the same ceilings: reports what
    /// [`check_eligibility`](Self::check_eligibility) would say without
    /// recording an event against any window. Used to assemble candidate
    /// lists; the consuming check is reserved for the provider actually
    /// attempted.
    pub async fn peek_eligibility(
        &self,
        provider: &str,
        alias: Option<&str>,
    ) -> EligibilityVerdict {
        self.evaluate(provider, alias, false).await
    }

    async fn evaluate(
        &self,
        provider: &str,
        alias: Option<&str>,
        consume: bool,
    ) -> EligibilityVerdict {
        let spec = self.specs.get(provider);
        let alias = self.resolve_alias(spec, alias);

        let penalty_key = PenaltyKey::new(&self.config.namespace, provider, alias);
        match self.store.penalty_active(&penalty_key).await {
            Ok(true) => {
                debug!("'{}' is in the penalty box, denying", provider);
                return EligibilityVerdict::denied(VerdictReason::InPenaltyBox);
            }
            Ok(false) => {}
            Err(e) => {
                warn!(
                    "Counter store failed on penalty check for '{}': {}, failing open",
                    provider, e
                );
            }
        }

        let Some(spec) = spec else {
            warn!(
                "No limit configuration for provider '{}', allowing fail-open",
                provider
            );
            return EligibilityVerdict::allowed(VerdictReason::ConfigMissing);
        };

        for (granularity, denial) in CEILING_ORDER {
            let ceiling = spec.ceilings.limit(granularity);
            if ceiling == 0 {
                continue;
            }

            let key = WindowKey::new(&self.config.namespace, provider, alias, granularity);
            let window = granularity.window(self.config.burst_window());
            let outcome = if consume {
                self.store.try_increment(&key, window, ceiling).await
            } else {
                self.store.has_headroom(&key, window, ceiling).await
            };

            match outcome {
                Ok(true) => {}
                Ok(false) => {
                    debug!(
                        "Ceiling reached for '{}' ({} per {}), denying",
                        provider, ceiling, granularity
                    );
                    return EligibilityVerdict::denied(denial);
                }
                Err(e) => {
                    warn!(
                        "Counter store failed on {} window for '{}': {}, failing open",
                        granularity, provider, e
                    );
                }
            }
        }

        EligibilityVerdict::allowed(VerdictReason::WithinLimits)
    }

    /// Report that a provider rejected a call we had locally allowed
    /// (429-equivalent). Opens a penalty window for the (provider, alias)
    /// pair: until the cool-down elapses, every eligibility check for that
    /// pair is denied unconditionally.
    pub async fn report_violation(&self, provider: &str, alias: Option<&str>, code: &str) {
        let spec = self.specs.get(provider);
        let alias = self.resolve_alias(spec, alias);
        let key = PenaltyKey::new(&self.config.namespace, provider, alias);
        let cooldown = self.config.penalty_cooldown();

        match self.store.activate_penalty(&key, cooldown).await {
            Ok(()) => {
                warn!(
                    "Penalty box opened for '{}' (alias '{}') after {}, cooling down {}s",
                    provider, alias, code, cooldown.as_secs()
                );
                self.audit.log_event(
                    "traffic",
                    "PENALTY_ACTIVATED",
                    json!({
                        "provider": provider,
                        "alias": alias,
                        "violation": code,
                        "cooldown_secs": cooldown.as_secs(),
                        "at": Utc::now().to_rfc3339(),
                    }),
                );
            }
            Err(e) => {
                warn!(
                    "Failed to activate penalty for '{}' (alias '{}'): {}",
                    provider, alias, e
                );
            }
        }
    }

    fn resolve_alias<'a>(&self, spec: Option<&'a ProviderSpec>, alias: Option<&'a str>) -> &'a str {
        alias
            .or_else(|| spec.map(|s| s.alias()))
            .unwrap_or(DEFAULT_ALIAS)
    }
}
