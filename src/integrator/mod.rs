//! Policy integrator
//!
//! Owns all per-market mutable state and runs the fixed decision pipeline:
//! reset, history, quality, features, cooldown, cadence, entry, side
//! selection, risk, sizing, inventory gate, fill model. Expected failures
//! never raise; every tick yields a `Decision` carrying the first blocking
//! reason, plus an audit record of everything the pipeline saw.
//!
//! The integrator takes `&mut self`, so ownership enforces the
//! single-writer-per-market contract; independent markets may live in
//! independent integrators.

mod state;

pub use state::MarketState;

use crate::audit::AuditRecord;
use crate::features::{compute_features, PricePoint};
use crate::market::MarketKey;
use crate::params::MarketParams;
use crate::policy::{
    cadence_ok, cooldown_blocked, entry_signal, inventory_ok_and_rebalance, quality_ok,
    risk_blocked, select_side, should_reset_inventory, simulate_fill_price, size_for_trade,
    Decision, DecisionReason, Side,
};
use crate::tape::TapeState;
use rust_decimal::Decimal;
use std::collections::HashMap;
use uuid::Uuid;

/// A decision together with its audit record
#[derive(Debug)]
pub struct TickEvaluation {
    pub decision: Decision,
    pub audit: AuditRecord,
}

/// Per-market stateful decision coordinator
pub struct Integrator {
    states: HashMap<MarketKey, MarketState>,
    history_capacity: usize,
    recent_trades_capacity: usize,
}

impl Integrator {
    pub fn new(history_capacity: usize, recent_trades_capacity: usize) -> Self {
        Self {
            states: HashMap::new(),
            history_capacity,
            recent_trades_capacity,
        }
    }

    /// Read-only view of a market's state, if it has seen ticks
    pub fn state(&self, key: MarketKey) -> Option<&MarketState> {
        self.states.get(&key)
    }

    /// Drop a market's state entirely (market closed by the host)
    pub fn close_market(&mut self, key: MarketKey) {
        self.states.remove(&key);
    }

    /// Run one decision tick for a market
    pub fn should_trade(&mut self, tape: TapeState, params: &MarketParams) -> TickEvaluation {
        let decision_id = Uuid::new_v4();
        let mut audit = AuditRecord::for_tick(
            decision_id,
            tape.market,
            tape.ts_ms,
            tape.up_price,
            tape.down_price,
        );

        let state = self
            .states
            .entry(tape.market)
            .or_insert_with(|| MarketState::new(self.history_capacity, self.recent_trades_capacity));

        let decision = run_pipeline(state, &tape, params, decision_id, &mut audit);

        audit.inventory = state.inventory.clone();
        audit.side = decision.side;
        audit.reason = Some(decision.reason);
        audit.should_trade = decision.should_trade;
        audit.fill_price = decision.fill_price;

        TickEvaluation { decision, audit }
    }

    /// Record a completed execution reported by the external executor.
    /// `cost` is the total paid and may differ from `shares * fill_price`.
    pub fn record_trade_execution(
        &mut self,
        market: MarketKey,
        now_ms: i64,
        side: Side,
        shares: Decimal,
        cost: Decimal,
    ) {
        let state = self
            .states
            .entry(market)
            .or_insert_with(|| MarketState::new(self.history_capacity, self.recent_trades_capacity));

        state.inventory.record_fill(side, shares, cost);
        state.push_trade_ts(now_ms);
        state.last_trade_ts = Some(now_ms);
        state.trades_this_session += 1;
        // An execution counts as activity for the reset conditions
        state.last_activity_ts = Some(now_ms);

        tracing::debug!(
            market = %market,
            side = %side,
            %shares,
            %cost,
            session_trades = state.trades_this_session,
            "trade execution recorded"
        );
    }
}

fn run_pipeline(
    state: &mut MarketState,
    tape: &TapeState,
    params: &MarketParams,
    decision_id: Uuid,
    audit: &mut AuditRecord,
) -> Decision {
    let market = tape.market.as_str();
    let now = tape.ts_ms;
    let no_trade = |reason: DecisionReason| {
        let mut d = Decision::no_trade(market, now, reason);
        d.decision_id = decision_id;
        d
    };

    // 1. Reset conditions
    if should_reset_inventory(state.last_activity_ts, now, &params.reset_params) {
        tracing::debug!(market, "inventory reset");
        state.reset_session();
    }
    state.last_activity_ts = Some(now);

    // 2. History
    state.history.push(PricePoint {
        ts_ms: now,
        up: tape.up_price,
        down: tape.down_price,
    });

    // 3. Quality filter; the snapshot advances whether or not it passes
    let quality = quality_ok(tape, state.last_snapshot.as_ref(), &params.quality_filter_params);
    state.last_snapshot = Some(tape.clone());
    if !quality {
        return no_trade(DecisionReason::DataQualityFilterFailed);
    }

    // 4. Features
    let features = compute_features(tape, &state.history);

    // 5. Cooldown
    if cooldown_blocked(
        state.last_trade_ts,
        &state.inventory,
        &features,
        &params.cooldown_params,
        now,
    ) {
        return no_trade(DecisionReason::CooldownBlocked);
    }

    // 6. Cadence
    if !cadence_ok(
        state.last_trade_ts,
        &state.recent_trades,
        &params.cadence_params,
        now,
    ) {
        return no_trade(DecisionReason::CadenceBlocked);
    }

    // 7. Per-side entry signals
    let signal = entry_signal(tape, &features, params.entry_params.as_ref());
    if signal.reason == DecisionReason::NoEntryParams {
        return no_trade(DecisionReason::NoEntryParams);
    }
    audit.entry_up = Some(signal.up);
    audit.entry_down = Some(signal.down);

    // 8. Side selection
    let Some(side) = select_side(
        tape,
        &features,
        &state.inventory,
        &params.side_selection_params,
        &signal.up,
        &signal.down,
    ) else {
        return no_trade(signal.reason);
    };

    // 9. Risk limits
    if risk_blocked(
        &state.inventory,
        state.trades_this_session,
        side,
        &params.risk_params,
    ) {
        return no_trade(DecisionReason::RiskLimitExceeded);
    }

    // 10. Sizing
    let lookup = size_for_trade(tape, &params.size_params, side, &state.inventory);
    audit.price_bucket = lookup.bucket_index;
    audit.price_bucket_label = lookup.bucket_label.clone();
    audit.inventory_bucket = lookup.inventory_bucket.clone();
    audit.inventory_ratio = lookup.inventory_ratio;
    audit.size_table_key = lookup.table_key.clone();
    audit.raw_size = lookup.raw;
    audit.capped_size = Some(lookup.shares);

    // 11. Inventory gate
    if inventory_ok_and_rebalance(&state.inventory, &params.inventory_params, side).is_none() {
        return no_trade(DecisionReason::InventoryLimitExceeded);
    }

    // 12. Fill model
    let snapshot_price = tape.side_price(side);
    let fill = simulate_fill_price(side, snapshot_price, &params.execution_params);
    audit.fill_model = Some(fill.model);
    audit.snapshot_side_price = Some(snapshot_price);
    audit.fill_bias = fill.bias;
    audit.slippage_offset = fill.slippage_offset;

    // 13. Emit
    let reason = if side == Side::Up {
        signal.up.reason
    } else {
        signal.down.reason
    };
    let mut decision = Decision::trade(market, now, side, lookup.shares, fill.fill_price, reason);
    decision.decision_id = decision_id;
    decision
}
