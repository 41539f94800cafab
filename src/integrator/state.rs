//! Per-market mutable state
//!
//! One `MarketState` per canonical key, created lazily on the first tick
//! and mutated only by the integrator.

use crate::features::PriceHistory;
use crate::policy::Inventory;
use crate::tape::TapeState;
use std::collections::VecDeque;

/// All mutable state the integrator keeps for one market
#[derive(Debug)]
pub struct MarketState {
    /// Bounded price history ring
    pub history: PriceHistory,
    /// Current holdings and cost basis
    pub inventory: Inventory,
    /// Time of the most recent recorded execution
    pub last_trade_ts: Option<i64>,
    /// Recent execution timestamps, oldest-evicted
    pub recent_trades: VecDeque<i64>,
    /// Executions recorded this session
    pub trades_this_session: u32,
    /// Time of the most recent tick seen for this market
    pub last_activity_ts: Option<i64>,
    /// Previous tape state, for the quality filter
    pub last_snapshot: Option<TapeState>,
    recent_capacity: usize,
}

impl MarketState {
    pub fn new(history_capacity: usize, recent_capacity: usize) -> Self {
        Self {
            history: PriceHistory::new(history_capacity),
            inventory: Inventory::default(),
            last_trade_ts: None,
            recent_trades: VecDeque::with_capacity(recent_capacity),
            trades_this_session: 0,
            last_activity_ts: None,
            last_snapshot: None,
            recent_capacity,
        }
    }

    /// Append an execution timestamp, evicting the oldest when full
    pub fn push_trade_ts(&mut self, ts_ms: i64) {
        if self.recent_trades.len() == self.recent_capacity {
            self.recent_trades.pop_front();
        }
        self.recent_trades.push_back(ts_ms);
    }

    /// Clear inventory and the session counter (reset conditions)
    pub fn reset_session(&mut self) {
        self.inventory.clear();
        self.trades_this_session = 0;
    }
}
