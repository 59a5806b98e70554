use prometheus_client::{metrics::counter::Counter, registry::Registry};

#[derive(Clone)]
pub struct Metrics {
    pub submissions_created: Counter,
    pub submissions_reviewed: Counter,
    pub withdrawals_requested: Counter,
    pub withdrawals_reviewed: Counter,
    pub payments_initiated: Counter,
    pub payments_reconciled: Counter,
    pub duplicate_gateway_events: Counter,
}

impl Metrics {
    pub fn new(registry: &mut Registry) -> Self {
        let submissions_created = Counter::default();
        let submissions_reviewed = Counter::default();
        let withdrawals_requested = Counter::default();
        let withdrawals_reviewed = Counter::default();
        let payments_initiated = Counter::default();
        let payments_reconciled = Counter::default();
        let duplicate_gateway_events = Counter::default();

        registry.register(
            "submissions_created",
            "Work submissions filed",
            submissions_created.clone(),
        );
        registry.register(
            "submissions_reviewed",
            "Admin submission decisions",
            submissions_reviewed.clone(),
        );
        registry.register(
            "withdrawals_requested",
            "Withdrawal requests filed",
            withdrawals_requested.clone(),
        );
        registry.register(
            "withdrawals_reviewed",
            "Admin withdrawal decisions",
            withdrawals_reviewed.clone(),
        );
        registry.register(
            "payments_initiated",
            "Membership payments started",
            payments_initiated.clone(),
        );
        registry.register(
            "payments_reconciled",
            "Gateway events reconciled into internal state",
            payments_reconciled.clone(),
        );
        registry.register(
            "duplicate_gateway_events",
            "Gateway deliveries absorbed as duplicates",
            duplicate_gateway_events.clone(),
        );

        Self {
            submissions_created,
            submissions_reviewed,
            withdrawals_requested,
            withdrawals_reviewed,
            payments_initiated,
            payments_reconciled,
            duplicate_gateway_events,
        }
    }
}
