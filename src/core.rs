//! The assembled trading core
//!
//! `Core` owns the parameter store, the per-market integrator, and the
//! optional audit sink behind a single constructor; there are no globals.
//! One tick in, one decision out.

use crate::audit::{AuditConfig, AuditLog, AuditStats};
use crate::config::CoreConfig;
use crate::integrator::Integrator;
use crate::market::MarketKey;
use crate::params::{ParamStore, PollHandle};
use crate::policy::{Decision, DecisionReason, Side};
use crate::tape::TapeState;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;

/// Watch-trader replication core
pub struct Core {
    store: Arc<ParamStore>,
    integrator: Integrator,
    audit: Option<AuditLog>,
}

impl Core {
    /// Build the core from configuration. Performs the initial parameter
    /// load and, when auditing is enabled, spawns the audit writer; call
    /// inside a tokio runtime.
    pub fn new(config: CoreConfig) -> Self {
        let store = ParamStore::new(
            &config.params_path,
            Duration::from_millis(config.params_poll_ms.max(1)),
        );
        let audit = config
            .audit_enabled
            .then(|| AuditLog::new(AuditConfig::new(&config.audit_path)));

        Self {
            store,
            integrator: Integrator::new(config.history_capacity, config.recent_trades_capacity),
            audit,
        }
    }

    /// The parameter store, for subscriptions and inspection
    pub fn store(&self) -> &Arc<ParamStore> {
        &self.store
    }

    /// Start parameter hot-reload polling
    pub fn start_polling(&self) -> PollHandle {
        self.store.start_polling()
    }

    /// Audit counters, when auditing is enabled
    pub fn audit_stats(&self) -> Option<AuditStats> {
        self.audit.as_ref().map(|log| log.stats())
    }

    /// Consume one tape tick and produce a decision.
    ///
    /// The raw market identifier is normalized first; unknown keys and
    /// markets without parameters yield a `no_entry_params` no-trade.
    pub fn on_tick(
        &mut self,
        raw_market: &str,
        timestamp_ms: i64,
        up_price: Decimal,
        down_price: Decimal,
    ) -> Decision {
        let Some(market) = MarketKey::normalize(raw_market) else {
            tracing::debug!(market = raw_market, "tick for unknown market key");
            return Decision::no_trade(raw_market, timestamp_ms, DecisionReason::NoEntryParams);
        };

        let Some(params) = self.store.market_params(market) else {
            return Decision::no_trade(market.as_str(), timestamp_ms, DecisionReason::NoEntryParams);
        };

        let tape = TapeState {
            market,
            ts_ms: timestamp_ms,
            up_price,
            down_price,
        };
        let evaluation = self.integrator.should_trade(tape, &params);

        if let Some(audit) = &self.audit {
            audit.record(evaluation.audit);
        }
        if evaluation.decision.should_trade {
            tracing::info!(
                market = %market,
                side = ?evaluation.decision.side,
                shares = %evaluation.decision.shares,
                fill = ?evaluation.decision.fill_price,
                reason = %evaluation.decision.reason,
                "trade decision"
            );
        }
        evaluation.decision
    }

    /// Record a completed execution reported by the external executor
    pub fn record_trade_execution(
        &mut self,
        raw_market: &str,
        now_ms: i64,
        side: Side,
        shares: Decimal,
        cost: Decimal,
    ) {
        let Some(market) = MarketKey::normalize(raw_market) else {
            tracing::warn!(market = raw_market, "execution for unknown market key ignored");
            return;
        };
        self.integrator
            .record_trade_execution(market, now_ms, side, shares, cost);
    }

    /// Drop per-market state after the host closes a market
    pub fn close_market(&mut self, key: MarketKey) {
        self.integrator.close_market(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::io::Write;

    fn config_with_params(dir: &tempfile::TempDir, body: &str) -> CoreConfig {
        let params_path = dir.path().join("params.json");
        let mut file = std::fs::File::create(&params_path).unwrap();
        file.write_all(body.as_bytes()).unwrap();
        CoreConfig {
            params_path,
            ..Default::default()
        }
    }

    const PARAMS: &str = r#"{
        "BTC_15m": {
            "entry_params": {"up_price_min": 0.4, "up_price_max": 0.6, "mode": "none"},
            "size_params": {
                "bin_edges": [0.0, 0.5, 1.0],
                "size_table_1d": {"(0, 0.5]": 5.0, "(0.5, 1]": 10.0}
            }
        }
    }"#;

    #[tokio::test]
    async fn test_tick_to_decision() {
        let dir = tempfile::tempdir().unwrap();
        let mut core = Core::new(config_with_params(&dir, PARAMS));

        let decision = core.on_tick("BTC-UpDown-15", 1_000, dec!(0.5), dec!(0.5));
        assert!(decision.should_trade);
        assert_eq!(decision.market, "BTC_15m");
        assert_eq!(decision.side, Some(Side::Up));
        assert_eq!(decision.shares, dec!(5));
    }

    #[tokio::test]
    async fn test_unknown_market_no_trade() {
        let dir = tempfile::tempdir().unwrap();
        let mut core = Core::new(config_with_params(&dir, PARAMS));

        let decision = core.on_tick("SOL-UpDown-15", 1_000, dec!(0.5), dec!(0.5));
        assert!(!decision.should_trade);
        assert_eq!(decision.market, "SOL-UpDown-15");
        assert_eq!(decision.reason, DecisionReason::NoEntryParams);
    }

    #[tokio::test]
    async fn test_market_without_params_no_trade() {
        let dir = tempfile::tempdir().unwrap();
        let mut core = Core::new(config_with_params(&dir, PARAMS));

        let decision = core.on_tick("ETH_1h", 1_000, dec!(0.5), dec!(0.5));
        assert!(!decision.should_trade);
        assert_eq!(decision.reason, DecisionReason::NoEntryParams);
    }

    #[tokio::test]
    async fn test_execution_feedback_loop() {
        let dir = tempfile::tempdir().unwrap();
        let mut core = Core::new(config_with_params(&dir, PARAMS));

        let decision = core.on_tick("BTC_15m", 1_000, dec!(0.5), dec!(0.5));
        assert!(decision.should_trade);
        core.record_trade_execution("BTC_15m", 1_000, Side::Up, decision.shares, dec!(2.5));

        // Executions for unknown markets are ignored without panicking
        core.record_trade_execution("SOL_15m", 1_000, Side::Up, dec!(1), dec!(0.5));
    }
}
