//! Failover router: candidate selection, a primary attempt, one failover
//! hop, and explicit blindness on total exhaustion.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use log::{debug, error, warn};
use serde_json::json;
use tokio::time::timeout;

use super::{BlindnessCause, RouteTrace, RoutingOutcome, SkipReason};
use crate::audit::AuditSink;
use crate::config::{ProviderId, ProviderSpec, RouterConfig, TaskKind};
use crate::economy::ResourceEconomist;
use crate::provider::ProviderClient;
use crate::traffic::TrafficController;

/// Routes queries across the provider pool.
///
/// Immutable after construction; collaborators are injected and shared.
/// The routing state machine is linear: classify, consult, one primary
/// attempt, at most one failover hop, then either a verified result or an
/// explicit blindness declaration. No outcome is ever fabricated.
pub struct FailoverRouter {
    clients: HashMap<ProviderId, Arc<dyn ProviderClient>>,
    specs: Vec<ProviderSpec>,
    traffic: Arc<TrafficController>,
    economist: Arc<ResourceEconomist>,
    config: RouterConfig,
    audit: Arc<dyn AuditSink>,
}

impl FailoverRouter {
    pub fn new(
        clients: Vec<Arc<dyn ProviderClient>>,
        specs: Vec<ProviderSpec>,
        traffic: Arc<TrafficController>,
        economist: Arc<ResourceEconomist>,
        config: RouterConfig,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        let clients = clients
            .into_iter()
            .map(|c| (c.id().to_string(), c))
            .collect();
        Self {
            clients,
            specs,
            traffic,
            economist,
            config,
            audit,
        }
    }

    /// Route one query to the best currently-available provider.
    ///
    /// Oversized payloads are forced to the long-context provider and
    /// fast-path task kinds to the fast-path provider, both still subject
    /// to eligibility. Everything else goes through the economist's
    /// scarcity ranking. A stalled attempt counts as a failure; a
    /// rate-limit rejection additionally opens a penalty window.
    pub async fn route_query(
        &self,
        instructions: &str,
        payload: &str,
        task_kind: TaskKind,
    ) -> RoutingOutcome {
        let mut trace = RouteTrace::new();

        // Candidate survey, in configuration order. The survey is
        // non-consuming; the window slot is claimed by the consuming check
        // inside `attempt`, so only providers actually attempted spend
        // quota.
        let mut eligible: Vec<ProviderId> = Vec::new();
        for spec in &self.specs {
            let verdict = self.traffic.peek_eligibility(&spec.id, None).await;
            if verdict.allowed {
                eligible.push(spec.id.clone());
            } else {
                trace.record_skip(spec.id.clone(), SkipReason::Ineligible(verdict.reason));
            }
        }

        let complexity = self.config.complexity_for(task_kind);

        let primary = match self.forced_route(payload, task_kind) {
            Some(forced) if eligible.iter().any(|e| *e == forced) => forced,
            forced => {
                if let Some(forced) = forced {
                    warn!(
                        "Forced route '{}' is not currently eligible, using ranked selection",
                        forced
                    );
                }
                match self
                    .economist
                    .select_best_provider(&eligible, complexity)
                    .await
                {
                    Some(id) => id,
                    None => {
                        return self
                            .declare_blindness(BlindnessCause::AllProvidersExhausted, trace)
                    }
                }
            }
        };

        debug!(
            "Routing {:?} query ({} bytes) to primary '{}'",
            task_kind,
            payload.len(),
            primary
        );

        if let Some(content) = self.attempt(&primary, instructions, payload, &mut trace).await {
            return RoutingOutcome::Success {
                content,
                provider: primary,
                failed_over: false,
            };
        }

        // Exactly one failover hop.
        let Some(alternate) = self.alternate_for(&primary, &eligible) else {
            return self.declare_blindness(BlindnessCause::TotalIntelligenceFailure, trace);
        };

        debug!("Failing over from '{}' to '{}'", primary, alternate);

        if let Some(content) = self
            .attempt(&alternate, instructions, payload, &mut trace)
            .await
        {
            return RoutingOutcome::Success {
                content,
                provider: alternate,
                failed_over: true,
            };
        }

        self.declare_blindness(BlindnessCause::TotalIntelligenceFailure, trace)
    }

    /// Forced route for payloads and task kinds that bypass cost ranking.
    fn forced_route(&self, payload: &str, kind: TaskKind) -> Option<ProviderId> {
        if payload.len() > self.config.oversize_payload_bytes {
            let forced = self.config.long_context_provider.clone().or_else(|| {
                self.specs
                    .iter()
                    .filter(|s| s.context_capacity > 0)
                    .max_by_key(|s| s.context_capacity)
                    .map(|s| s.id.clone())
            });
            if let Some(id) = &forced {
                debug!(
                    "Oversized payload ({} bytes), forcing long-context provider '{}'",
                    payload.len(),
                    id
                );
            }
            return forced;
        }

        if self.config.fast_path_kinds.contains(&kind) {
            if let Some(id) = &self.config.fast_path_provider {
                debug!("Fast-path task {:?}, forcing provider '{}'", kind, id);
                return Some(id.clone());
            }
        }

        None
    }

    /// The single failover counterpart for a failed primary.
    ///
    /// A configured counterpart is used only if it is currently eligible
    /// (an ineligible one was already recorded in the trace with its
    /// denial reason). Without a configured counterpart, the next eligible
    /// candidate in configuration order stands in.
    fn alternate_for(&self, primary: &str, eligible: &[ProviderId]) -> Option<ProviderId> {
        if let Some(alt) = self.config.alternates.get(primary) {
            if alt != primary && eligible.iter().any(|e| e == alt) {
                return Some(alt.clone());
            }
            return None;
        }

        eligible.iter().find(|e| *e != primary).cloned()
    }

    /// One bounded attempt against one provider. Returns the content on
    /// success; on any failure (including a stall past the attempt
    /// timeout) records the attempt and returns `None`.
    ///
    /// The traffic controller is re-consulted here, immediately before the
    /// call: the survey verdict may have gone stale (a concurrent caller
    /// can saturate a window or open a penalty in the meantime, not least
    /// during a stalled primary attempt). This consuming check is the one
    /// that claims the window slot.
    async fn attempt(
        &self,
        provider: &str,
        instructions: &str,
        payload: &str,
        trace: &mut RouteTrace,
    ) -> Option<String> {
        let Some(client) = self.clients.get(provider) else {
            warn!("No driver registered for provider '{}'", provider);
            trace.record_skip(provider.to_string(), SkipReason::NoClient);
            return None;
        };

        let verdict = self.traffic.check_eligibility(provider, None).await;
        if !verdict.allowed {
            warn!(
                "Provider '{}' became ineligible before the attempt ({}), skipping",
                provider, verdict.reason
            );
            trace.record_skip(provider.to_string(), SkipReason::Ineligible(verdict.reason));
            return None;
        }

        match timeout(
            self.config.attempt_timeout(),
            client.invoke(instructions, payload),
        )
        .await
        {
            Ok(Ok(content)) => {
                debug!("Provider '{}' answered ({} bytes)", provider, content.len());
                trace.record_success(provider.to_string());
                Some(content)
            }
            Ok(Err(e)) => {
                warn!("Provider '{}' failed: {}", provider, e);
                if e.is_quota_violation() {
                    // Local accounting said go, the provider said 429:
                    // open the penalty window.
                    self.traffic
                        .report_violation(provider, None, e.code())
                        .await;
                }
                trace.record_error(provider.to_string(), e.to_string());
                None
            }
            Err(_) => {
                warn!(
                    "Provider '{}' stalled past {:?}, treating as failure",
                    provider,
                    self.config.attempt_timeout()
                );
                trace.record_error(provider.to_string(), "attempt timed out");
                None
            }
        }
    }

    /// Terminal, side-effecting refusal: log at the highest severity,
    /// forward a structured failure event, and return a marker no consumer
    /// can mistake for a valid payload.
    fn declare_blindness(&self, cause: BlindnessCause, trace: RouteTrace) -> RoutingOutcome {
        let details = trace.summary();
        error!("Declaring blindness ({}): {}", cause.code(), details);
        self.audit.log_event(
            "routing",
            cause.code(),
            json!({
                "cause": cause.code(),
                "attempts": details,
                "at": Utc::now().to_rfc3339(),
            }),
        );
        RoutingOutcome::Blind { cause, details }
    }
}
