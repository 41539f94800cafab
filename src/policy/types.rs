//! Policy engine types

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Denominator floor for inventory imbalance ratios
pub const RATIO_EPSILON: Decimal = dec!(0.0001);

/// Trading side of a binary up/down market
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    /// Buy UP outcome shares
    Up,
    /// Buy DOWN outcome shares
    Down,
}

impl Side {
    /// Wire form (`UP` / `DOWN`)
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Up => "UP",
            Side::Down => "DOWN",
        }
    }

    /// The other side
    pub fn opposite(&self) -> Side {
        match self {
            Side::Up => Side::Down,
            Side::Down => Side::Up,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stable reason attached to every decision, positive or blocking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionReason {
    DataQualityFilterFailed,
    CooldownBlocked,
    CadenceBlocked,
    NoEntryParams,
    NoBandMatch,
    UpPriceNotInBand,
    DownPriceNotInBand,
    MomentumNotMet,
    ReversionNotMet,
    InventoryLimitExceeded,
    RiskLimitExceeded,
    UpPriceBand,
    DownPriceBand,
    MomentumMet,
    ReversionMet,
}

impl DecisionReason {
    /// Wire form, identical to the serde representation
    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionReason::DataQualityFilterFailed => "data_quality_filter_failed",
            DecisionReason::CooldownBlocked => "cooldown_blocked",
            DecisionReason::CadenceBlocked => "cadence_blocked",
            DecisionReason::NoEntryParams => "no_entry_params",
            DecisionReason::NoBandMatch => "no_band_match",
            DecisionReason::UpPriceNotInBand => "up_price_not_in_band",
            DecisionReason::DownPriceNotInBand => "down_price_not_in_band",
            DecisionReason::MomentumNotMet => "momentum_not_met",
            DecisionReason::ReversionNotMet => "reversion_not_met",
            DecisionReason::InventoryLimitExceeded => "inventory_limit_exceeded",
            DecisionReason::RiskLimitExceeded => "risk_limit_exceeded",
            DecisionReason::UpPriceBand => "up_price_band",
            DecisionReason::DownPriceBand => "down_price_band",
            DecisionReason::MomentumMet => "momentum_met",
            DecisionReason::ReversionMet => "reversion_met",
        }
    }

    /// True for reasons that accompany an emitted trade
    pub fn is_positive(&self) -> bool {
        matches!(
            self,
            DecisionReason::UpPriceBand
                | DecisionReason::DownPriceBand
                | DecisionReason::MomentumMet
                | DecisionReason::ReversionMet
        )
    }
}

impl fmt::Display for DecisionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-side inventory with share-weighted average cost
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Inventory {
    pub up_shares: Decimal,
    pub down_shares: Decimal,
    pub avg_cost_up: Decimal,
    pub avg_cost_down: Decimal,
}

impl Inventory {
    /// Total shares held across both sides
    pub fn total(&self) -> Decimal {
        self.up_shares + self.down_shares
    }

    /// Shares held on one side
    pub fn shares(&self, side: Side) -> Decimal {
        match side {
            Side::Up => self.up_shares,
            Side::Down => self.down_shares,
        }
    }

    /// `inv_up / max(inv_down, epsilon)`
    pub fn imbalance_ratio(&self) -> Decimal {
        self.up_shares / self.down_shares.max(RATIO_EPSILON)
    }

    /// Larger-side share of total, zero when flat
    pub fn larger_side_fraction(&self) -> Decimal {
        let total = self.total();
        if total.is_zero() {
            return Decimal::ZERO;
        }
        self.up_shares.max(self.down_shares) / total
    }

    /// Apply a fill: add shares, fold cost into the share-weighted average
    pub fn record_fill(&mut self, side: Side, shares: Decimal, cost: Decimal) {
        let (held, avg) = match side {
            Side::Up => (&mut self.up_shares, &mut self.avg_cost_up),
            Side::Down => (&mut self.down_shares, &mut self.avg_cost_down),
        };
        let prev = *held;
        *held += shares;
        if *held > Decimal::ZERO {
            *avg = (*avg * prev + cost) / *held;
        }
    }

    /// Drop all holdings and cost basis
    pub fn clear(&mut self) {
        *self = Inventory::default();
    }
}

/// The output of one decision tick
#[derive(Debug, Clone, Serialize)]
pub struct Decision {
    /// Unique id for audit correlation
    pub decision_id: Uuid,
    /// Market the tick belonged to (canonical, or verbatim when unknown)
    pub market: String,
    /// Tick time, Unix milliseconds
    pub ts_ms: i64,
    /// Whether a BUY should be emitted
    pub should_trade: bool,
    /// Chosen side when trading
    pub side: Option<Side>,
    /// Share size when trading, zero otherwise
    pub shares: Decimal,
    /// Modeled fill price when trading
    pub fill_price: Option<Decimal>,
    /// Positive reason, or the first gate that blocked
    pub reason: DecisionReason,
}

impl Decision {
    /// A blocked tick
    pub fn no_trade(market: impl Into<String>, ts_ms: i64, reason: DecisionReason) -> Self {
        Self {
            decision_id: Uuid::new_v4(),
            market: market.into(),
            ts_ms,
            should_trade: false,
            side: None,
            shares: Decimal::ZERO,
            fill_price: None,
            reason,
        }
    }

    /// An emitted BUY
    pub fn trade(
        market: impl Into<String>,
        ts_ms: i64,
        side: Side,
        shares: Decimal,
        fill_price: Decimal,
        reason: DecisionReason,
    ) -> Self {
        Self {
            decision_id: Uuid::new_v4(),
            market: market.into(),
            ts_ms,
            should_trade: true,
            side: Some(side),
            shares,
            fill_price: Some(fill_price),
            reason,
        }
    }
}
