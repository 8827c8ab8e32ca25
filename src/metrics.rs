//! Prometheus metrics

use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

pub struct CasinoMetrics {
    registry: Registry,
    pub coins_credited: IntCounterVec,
    pub coins_debited: IntCounterVec,
    pub games_played: IntCounterVec,
    pub rounds_settled: IntCounter,
    pub settlement_runs: IntCounter,
    pub withdrawals: IntCounterVec,
}

impl CasinoMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new_custom(Some("tgcasino".to_string()), None)?;

        let coins_credited = IntCounterVec::new(
            Opts::new("coins_credited_total", "Coins credited to players"),
            &["source"],
        )?;
        let coins_debited = IntCounterVec::new(
            Opts::new("coins_debited_total", "Coins taken from players"),
            &["source"],
        )?;
        let games_played = IntCounterVec::new(
            Opts::new("games_played_total", "Finished games"),
            &["game"],
        )?;
        let rounds_settled = IntCounter::new("battle_rounds_settled_total", "Battle rounds settled")?;
        let settlement_runs = IntCounter::new("settlement_runs_total", "Settlement job invocations")?;
        let withdrawals = IntCounterVec::new(
            Opts::new("withdrawals_total", "Withdrawal state changes"),
            &["status"],
        )?;

        registry.register(Box::new(coins_credited.clone()))?;
        registry.register(Box::new(coins_debited.clone()))?;
        registry.register(Box::new(games_played.clone()))?;
        registry.register(Box::new(rounds_settled.clone()))?;
        registry.register(Box::new(settlement_runs.clone()))?;
        registry.register(Box::new(withdrawals.clone()))?;

        Ok(Self {
            registry,
            coins_credited,
            coins_debited,
            games_played,
            rounds_settled,
            settlement_runs,
            withdrawals,
        })
    }

    /// Record a balance change by its signed amount
    pub fn record_coins(&self, source: &str, applied: i64) {
        if applied > 0 {
            self.coins_credited.with_label_values(&[source]).inc_by(applied as u64);
        } else if applied < 0 {
            self.coins_debited
                .with_label_values(&[source])
                .inc_by(applied.unsigned_abs());
        }
    }

    pub fn record_game(&self, game: &str) {
        self.games_played.with_label_values(&[game]).inc();
    }

    /// Text exposition format
    pub fn render(&self) -> String {
        let mut buffer = Vec::new();
        if let Err(e) = TextEncoder::new().encode(&self.registry.gather(), &mut buffer) {
            tracing::warn!("Failed to encode metrics: {}", e);
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}
