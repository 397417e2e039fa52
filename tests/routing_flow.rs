//! End-to-end routing flow: traffic controller, economist, and router
//! wired together the way a host process would wire them.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use provider_governor::{
    AuditSink, BlindnessCause, CapabilityTiers, FailoverRouter, GovernorConfig, MemoryCounterStore,
    ProviderCallError, ProviderClient, ProviderSpec, QuotaStatus, RateCeilings,
    ResourceEconomist, RouterConfig, RoutingOutcome, ScarcityEntry, ScarcityTable, TaskComplexity,
    TaskKind, TrafficController, UsageAccountant, VerdictReason,
};

/// Driver stub that always answers with a fixed payload.
struct EchoClient {
    id: String,
}

#[async_trait]
impl ProviderClient for EchoClient {
    fn id(&self) -> &str {
        &self.id
    }

    async fn invoke(&self, _instructions: &str, _payload: &str) -> Result<String, ProviderCallError> {
        Ok(format!("answer from {}", self.id))
    }
}

/// Driver stub that always rejects with a 429-equivalent.
struct ThrottledClient {
    id: String,
}

#[async_trait]
impl ProviderClient for ThrottledClient {
    fn id(&self) -> &str {
        &self.id
    }

    async fn invoke(&self, _instructions: &str, _payload: &str) -> Result<String, ProviderCallError> {
        Err(ProviderCallError::RateLimited {
            provider: self.id.clone(),
        })
    }
}

/// Accountant with a fixed set of blocked providers.
struct BlocklistAccountant {
    blocked: Vec<String>,
}

#[async_trait]
impl UsageAccountant for BlocklistAccountant {
    async fn check_quota_status(&self, provider: &str) -> QuotaStatus {
        if self.blocked.iter().any(|b| b == provider) {
            QuotaStatus::blocked("period budget spent")
        } else {
            QuotaStatus::ok()
        }
    }
}

struct CountingSink {
    codes: Mutex<Vec<String>>,
}

impl AuditSink for CountingSink {
    fn log_event(&self, _category: &str, code: &str, _details: serde_json::Value) {
        self.codes.lock().unwrap().push(code.to_string());
    }
}

/// Driver stub that gets the counterpart penalized while its own call is
/// in flight (a sibling process sharing the credential hits a 429), then
/// fails upstream.
struct CounterpartPoisoningClient {
    id: String,
    traffic: Arc<TrafficController>,
    counterpart: String,
}

#[async_trait]
impl ProviderClient for CounterpartPoisoningClient {
    fn id(&self) -> &str {
        &self.id
    }

    async fn invoke(&self, _instructions: &str, _payload: &str) -> Result<String, ProviderCallError> {
        self.traffic
            .report_violation(&self.counterpart, None, "RATE_LIMITED")
            .await;
        Err(ProviderCallError::Upstream {
            provider: self.id.clone(),
            message: "internal server error".to_string(),
        })
    }
}

fn p1_spec(daily_limit: u32) -> ProviderSpec {
    let mut spec = ProviderSpec::new("p1-feed");
    spec.ceilings = RateCeilings {
        per_second: 0,
        per_minute: 0,
        per_day: daily_limit,
    };
    spec
}

fn p2_spec() -> ProviderSpec {
    ProviderSpec::new("p2-feed")
}

fn scarcity_table() -> ScarcityTable {
    ScarcityTable::new(vec![
        ScarcityEntry {
            base_id: "p1-feed".to_string(),
            score: 10,
        },
        ScarcityEntry {
            base_id: "p2-feed".to_string(),
            score: 20,
        },
    ])
}

/// The worked governance scenario: a cheap provider with a small daily
/// budget next to a blocked one. Selection prefers the cheap provider
/// while budget remains, the budget boundary is enforced exactly, and
/// exhaustion surfaces as an explicit blind outcome rather than a result.
#[tokio::test]
async fn daily_budget_exhaustion_ends_in_explicit_blindness() {
    let daily_limit = 5u32;
    let specs = vec![p1_spec(daily_limit), p2_spec()];

    let audit = Arc::new(CountingSink {
        codes: Mutex::new(Vec::new()),
    });
    let traffic = Arc::new(TrafficController::new(
        specs.clone(),
        GovernorConfig::default(),
        Arc::new(MemoryCounterStore::new()),
        audit.clone(),
    ));
    let economist = Arc::new(ResourceEconomist::new(
        &specs,
        scarcity_table(),
        CapabilityTiers::default(),
        Arc::new(BlocklistAccountant {
            blocked: vec!["p2-feed".to_string()],
        }),
    ));

    // While budget remains, the cheaper provider wins selection.
    let candidates = vec!["p1-feed".to_string(), "p2-feed".to_string()];
    let picked = economist
        .select_best_provider(&candidates, TaskComplexity::Low)
        .await;
    assert_eq!(picked.as_deref(), Some("p1-feed"));

    // Spend the entire daily budget through eligibility checks.
    for _ in 0..daily_limit {
        let verdict = traffic.check_eligibility("p1-feed", None).await;
        assert!(verdict.allowed);
    }

    // The next check is denied with the daily-quota reason.
    let verdict = traffic.check_eligibility("p1-feed", None).await;
    assert!(!verdict.allowed);
    assert_eq!(verdict.reason, VerdictReason::DailyQuotaExceeded);

    // Routing now finds nothing: p1 over quota, p2 blocked by accounting.
    let router = FailoverRouter::new(
        vec![
            Arc::new(EchoClient {
                id: "p1-feed".to_string(),
            }),
            Arc::new(EchoClient {
                id: "p2-feed".to_string(),
            }),
        ],
        specs,
        traffic,
        economist,
        RouterConfig::default(),
        audit.clone(),
    );

    let outcome = router
        .route_query("fetch latest", "payload", TaskKind::Classification)
        .await;

    match outcome {
        RoutingOutcome::Blind { cause, .. } => {
            assert_eq!(cause, BlindnessCause::AllProvidersExhausted);
        }
        other => panic!("expected blindness, got {:?}", other),
    }

    let codes = audit.codes.lock().unwrap();
    assert!(codes.iter().any(|c| c == "ALL_PROVIDERS_EXHAUSTED"));
}

/// A provider that rejects with a 429 despite local headroom lands in the
/// penalty box, and the router both fails over and keeps it excluded for
/// subsequent queries.
#[tokio::test]
async fn upstream_rate_limit_penalizes_and_fails_over() {
    let specs = vec![p1_spec(0), p2_spec()];

    let audit = Arc::new(CountingSink {
        codes: Mutex::new(Vec::new()),
    });
    let traffic = Arc::new(TrafficController::new(
        specs.clone(),
        GovernorConfig::default(),
        Arc::new(MemoryCounterStore::new()),
        audit.clone(),
    ));
    let economist = Arc::new(ResourceEconomist::new(
        &specs,
        scarcity_table(),
        CapabilityTiers::default(),
        Arc::new(BlocklistAccountant { blocked: vec![] }),
    ));

    let router = FailoverRouter::new(
        vec![
            Arc::new(ThrottledClient {
                id: "p1-feed".to_string(),
            }),
            Arc::new(EchoClient {
                id: "p2-feed".to_string(),
            }),
        ],
        specs,
        traffic.clone(),
        economist,
        RouterConfig::default(),
        audit.clone(),
    );

    let outcome = router
        .route_query("fetch latest", "payload", TaskKind::Summarization)
        .await;

    assert_eq!(
        outcome,
        RoutingOutcome::Success {
            content: "answer from p2-feed".to_string(),
            provider: "p2-feed".to_string(),
            failed_over: true,
        }
    );

    // The 429 was reported: p1 sits in the penalty box.
    let verdict = traffic.check_eligibility("p1-feed", None).await;
    assert!(!verdict.allowed);
    assert_eq!(verdict.reason, VerdictReason::InPenaltyBox);

    let codes = audit.codes.lock().unwrap();
    assert!(codes.iter().any(|c| c == "PENALTY_ACTIVATED"));

    // Subsequent queries route straight to the healthy provider.
    let outcome = router
        .route_query("fetch latest", "payload", TaskKind::Summarization)
        .await;
    assert_eq!(
        outcome,
        RoutingOutcome::Success {
            content: "answer from p2-feed".to_string(),
            provider: "p2-feed".to_string(),
            failed_over: false,
        }
    );
}

/// A penalty that opens while the primary attempt is in flight makes the
/// alternate ineligible for the failover hop. The eligibility snapshot
/// taken before the primary attempt must not authorize a call into a live
/// penalty window.
#[tokio::test]
async fn penalty_opened_mid_route_blocks_the_failover_hop() {
    let specs = vec![p1_spec(0), p2_spec()];

    let audit = Arc::new(CountingSink {
        codes: Mutex::new(Vec::new()),
    });
    let traffic = Arc::new(TrafficController::new(
        specs.clone(),
        GovernorConfig::default(),
        Arc::new(MemoryCounterStore::new()),
        audit.clone(),
    ));
    let economist = Arc::new(ResourceEconomist::new(
        &specs,
        scarcity_table(),
        CapabilityTiers::default(),
        Arc::new(BlocklistAccountant { blocked: vec![] }),
    ));

    let router = FailoverRouter::new(
        vec![
            Arc::new(CounterpartPoisoningClient {
                id: "p1-feed".to_string(),
                traffic: traffic.clone(),
                counterpart: "p2-feed".to_string(),
            }),
            Arc::new(EchoClient {
                id: "p2-feed".to_string(),
            }),
        ],
        specs,
        traffic.clone(),
        economist,
        RouterConfig::default(),
        audit.clone(),
    );

    let outcome = router
        .route_query("fetch latest", "payload", TaskKind::Summarization)
        .await;

    // p2 sits in the penalty box by the time the failover hop runs, so the
    // route ends blind instead of succeeding against a penalized provider.
    match outcome {
        RoutingOutcome::Blind { cause, details } => {
            assert_eq!(cause, BlindnessCause::TotalIntelligenceFailure);
            assert!(details.contains("p2-feed: SKIPPED"), "details: {}", details);
        }
        other => panic!("expected blindness, got {:?}", other),
    }

    let verdict = traffic.check_eligibility("p2-feed", None).await;
    assert!(!verdict.allowed);
    assert_eq!(verdict.reason, VerdictReason::InPenaltyBox);
}

/// Routing decisions served by the cheapest provider must not spend quota
/// on the standby providers that were merely surveyed as candidates.
#[tokio::test]
async fn candidate_survey_spends_no_standby_quota() {
    let mut standby = p2_spec();
    standby.ceilings = RateCeilings {
        per_second: 0,
        per_minute: 0,
        per_day: 1,
    };
    let specs = vec![p1_spec(0), standby];

    let audit = Arc::new(CountingSink {
        codes: Mutex::new(Vec::new()),
    });
    let traffic = Arc::new(TrafficController::new(
        specs.clone(),
        GovernorConfig::default(),
        Arc::new(MemoryCounterStore::new()),
        audit.clone(),
    ));
    let economist = Arc::new(ResourceEconomist::new(
        &specs,
        scarcity_table(),
        CapabilityTiers::default(),
        Arc::new(BlocklistAccountant { blocked: vec![] }),
    ));

    let router = FailoverRouter::new(
        vec![
            Arc::new(EchoClient {
                id: "p1-feed".to_string(),
            }),
            Arc::new(EchoClient {
                id: "p2-feed".to_string(),
            }),
        ],
        specs,
        traffic.clone(),
        economist,
        RouterConfig::default(),
        audit,
    );

    // Every route is served by the cheaper p1; p2 is only surveyed.
    for _ in 0..4 {
        let outcome = router
            .route_query("fetch latest", "payload", TaskKind::Summarization)
            .await;
        assert_eq!(
            outcome,
            RoutingOutcome::Success {
                content: "answer from p1-feed".to_string(),
                provider: "p1-feed".to_string(),
                failed_over: false,
            }
        );
    }

    // The standby's single daily slot is still unspent.
    let verdict = traffic.check_eligibility("p2-feed", None).await;
    assert!(verdict.allowed);

    // And it was exactly one slot: the consuming check above took it.
    let verdict = traffic.check_eligibility("p2-feed", None).await;
    assert!(!verdict.allowed);
    assert_eq!(verdict.reason, VerdictReason::DailyQuotaExceeded);
}
