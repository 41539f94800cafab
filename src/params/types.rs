//! Typed parameter document
//!
//! The on-disk document is a loosely shaped JSON blob produced by the
//! analytics pipeline. Everything is decoded into the strongly typed
//! structures below at load time; sections a market does not carry fall
//! back to permissive defaults.

use crate::market::MarketKey;
use crate::policy::Side;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Entry mode: how deltas gate the price bands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryMode {
    Momentum,
    Reversion,
    #[default]
    None,
}

/// Side selection mode when both sides qualify
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SideSelectionMode {
    #[default]
    InventoryDriven,
    EdgeDriven,
    MomentumDriven,
    Alternating,
    FixedPreference,
    Mixed,
}

/// Fill price model
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionModelType {
    #[default]
    SnapshotPrice,
    FixedSlippage,
    MidPrice,
    WorstCase,
}

/// Variable the size table is conditioned on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditioningVar {
    InventoryImbalanceRatio,
}

/// Entry price bands and momentum/reversion gating
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntryParams {
    pub up_price_min: Option<Decimal>,
    pub up_price_max: Option<Decimal>,
    pub down_price_min: Option<Decimal>,
    pub down_price_max: Option<Decimal>,
    pub mode: EntryMode,
    pub momentum_window_s: f64,
    pub momentum_threshold: Decimal,
}

impl Default for EntryParams {
    fn default() -> Self {
        Self {
            up_price_min: None,
            up_price_max: None,
            down_price_min: None,
            down_price_max: None,
            mode: EntryMode::None,
            momentum_window_s: 5.0,
            momentum_threshold: Decimal::ZERO,
        }
    }
}

/// Share sizing tables keyed by price bucket, optionally conditioned on
/// the inventory imbalance ratio
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SizeParams {
    /// Strictly increasing bucket edges over the side price
    pub bin_edges: Vec<Decimal>,
    /// 1D table keyed by price-bucket label `"(L, R]"`
    pub size_table_1d: BTreeMap<String, Decimal>,
    /// 2D table keyed `"price_label|inv_label"` (or legacy 1D, see loader)
    pub size_table: BTreeMap<String, Decimal>,
    pub conditioning_var: Option<ConditioningVar>,
    /// `len(inventory_buckets) + 1` thresholds over the imbalance ratio
    pub inventory_bucket_thresholds: Vec<Decimal>,
    pub inventory_buckets: Vec<String>,
}

impl SizeParams {
    /// Whether `bin_edges` form a usable bucket grid
    pub fn has_valid_bins(&self) -> bool {
        self.bin_edges.len() >= 2 && self.bin_edges.windows(2).all(|w| w[0] < w[1])
    }
}

/// Per-side and total inventory caps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InventoryParams {
    pub max_up_shares: Option<Decimal>,
    pub max_down_shares: Option<Decimal>,
    pub max_total_shares: Option<Decimal>,
    #[serde(rename = "rebalance_ratio_R", alias = "rebalance_ratio_r")]
    pub rebalance_ratio_r: Decimal,
}

impl Default for InventoryParams {
    fn default() -> Self {
        Self {
            max_up_shares: None,
            max_down_shares: None,
            max_total_shares: None,
            rebalance_ratio_r: dec!(0.75),
        }
    }
}

/// Trade-rate throttles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CadenceParams {
    /// Minimum milliseconds between trades; zero never blocks
    pub min_inter_trade_ms: f64,
    pub max_trades_per_sec: Option<u32>,
    pub max_trades_per_min: Option<u32>,
}

impl Default for CadenceParams {
    fn default() -> Self {
        Self {
            min_inter_trade_ms: 0.0,
            max_trades_per_sec: None,
            max_trades_per_min: None,
        }
    }
}

/// Side selection configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SideSelectionParams {
    pub mode: SideSelectionMode,
    pub preferred_side: Option<Side>,
    /// Informational: observed confidence gap between the two sides
    pub confidence_gap: Decimal,
}

impl Default for SideSelectionParams {
    fn default() -> Self {
        Self {
            mode: SideSelectionMode::InventoryDriven,
            preferred_side: None,
            confidence_gap: Decimal::ZERO,
        }
    }
}

/// Fill model configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionParams {
    pub model_type: ExecutionModelType,
    pub slippage_offset: Decimal,
    pub fill_bias_median: Option<Decimal>,
    pub fill_bias_p75: Option<Decimal>,
}

impl Default for ExecutionParams {
    fn default() -> Self {
        Self {
            model_type: ExecutionModelType::SnapshotPrice,
            slippage_offset: Decimal::ZERO,
            fill_bias_median: None,
            fill_bias_p75: None,
        }
    }
}

/// Post-trade cooldowns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CooldownParams {
    pub has_time_cooldown: bool,
    pub time_cooldown_seconds: f64,
    /// Minimum |5s side delta| required within 5s of the last trade
    pub price_move_threshold: Option<Decimal>,
    pub has_inventory_lockout: bool,
    /// Larger-side share of total above which the lockout engages
    pub inventory_lockout_threshold: Decimal,
}

impl Default for CooldownParams {
    fn default() -> Self {
        Self {
            has_time_cooldown: false,
            time_cooldown_seconds: 0.0,
            price_move_threshold: None,
            has_inventory_lockout: false,
            inventory_lockout_threshold: Decimal::ONE,
        }
    }
}

/// Session and exposure limits
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskParams {
    pub max_trades_per_session: Option<u32>,
    pub max_imbalance_ratio: Option<Decimal>,
    pub max_exposure_up_shares: Option<Decimal>,
    pub max_exposure_down_shares: Option<Decimal>,
}

/// Pre-decision data-quality thresholds; absent fields disable the check
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityFilterParams {
    pub max_price_sum_deviation: Option<Decimal>,
    pub timestamp_jump_threshold_seconds: Option<f64>,
    pub price_gap_threshold: Option<Decimal>,
}

/// Inventory/session reset conditions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResetParams {
    pub resets_on_market_switch: bool,
    pub resets_on_inactivity: bool,
    pub inactivity_threshold_hours: f64,
}

impl Default for ResetParams {
    fn default() -> Self {
        Self {
            resets_on_market_switch: true,
            resets_on_inactivity: false,
            inactivity_threshold_hours: 24.0,
        }
    }
}

/// Per-market confidence block produced by the analytics pipeline.
/// Read-only metadata; never consulted by the engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfidenceStats {
    pub n_watch_trades: Option<u32>,
    pub entry_rule_precision: Option<f64>,
    pub entry_rule_recall: Option<f64>,
    pub size_table_bucket_variance: Option<f64>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// The full parameter set for one market
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketParams {
    /// Absent entry params mean the market never trades
    pub entry_params: Option<EntryParams>,
    pub size_params: SizeParams,
    pub inventory_params: InventoryParams,
    pub cadence_params: CadenceParams,
    pub side_selection_params: SideSelectionParams,
    pub execution_params: ExecutionParams,
    pub cooldown_params: CooldownParams,
    pub risk_params: RiskParams,
    pub quality_filter_params: QualityFilterParams,
    pub reset_params: ResetParams,
    pub confidence: ConfidenceStats,
}

/// An immutable, validated view of the whole document.
/// Published behind `Arc` so a decision tick holds one consistent snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamsSnapshot {
    pub markets: HashMap<MarketKey, Arc<MarketParams>>,
}

impl ParamsSnapshot {
    /// Parameters for one market, if present
    pub fn market(&self, key: MarketKey) -> Option<Arc<MarketParams>> {
        self.markets.get(&key).cloned()
    }

    pub fn is_empty(&self) -> bool {
        self.markets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_mode_wire_form() {
        assert_eq!(
            serde_json::from_str::<EntryMode>("\"momentum\"").unwrap(),
            EntryMode::Momentum
        );
        assert_eq!(
            serde_json::from_str::<EntryMode>("\"none\"").unwrap(),
            EntryMode::None
        );
    }

    #[test]
    fn test_side_selection_mode_wire_form() {
        assert_eq!(
            serde_json::from_str::<SideSelectionMode>("\"inventory_driven\"").unwrap(),
            SideSelectionMode::InventoryDriven
        );
        assert_eq!(
            serde_json::from_str::<SideSelectionMode>("\"fixed_preference\"").unwrap(),
            SideSelectionMode::FixedPreference
        );
    }

    #[test]
    fn test_invalid_mode_rejected_on_load() {
        assert!(serde_json::from_str::<ExecutionModelType>("\"guess\"").is_err());
    }

    #[test]
    fn test_size_params_bin_validation() {
        let mut p = SizeParams {
            bin_edges: vec![dec!(0), dec!(0.5), dec!(1)],
            ..Default::default()
        };
        assert!(p.has_valid_bins());

        p.bin_edges = vec![dec!(0)];
        assert!(!p.has_valid_bins());

        p.bin_edges = vec![dec!(0), dec!(0.5), dec!(0.5)];
        assert!(!p.has_valid_bins());

        p.bin_edges = vec![dec!(0.5), dec!(0.2)];
        assert!(!p.has_valid_bins());
    }

    #[test]
    fn test_market_params_tolerates_sparse_document() {
        let params: MarketParams = serde_json::from_str(
            r#"{"entry_params": {"up_price_min": 0.4, "up_price_max": 0.6}}"#,
        )
        .unwrap();
        let entry = params.entry_params.unwrap();
        assert_eq!(entry.up_price_min, Some(dec!(0.4)));
        assert_eq!(entry.mode, EntryMode::None);
        assert_eq!(params.cadence_params.min_inter_trade_ms, 0.0);
        assert!(params.risk_params.max_trades_per_session.is_none());
        assert!(params.reset_params.resets_on_market_switch);
    }

    #[test]
    fn test_rebalance_ratio_field_casing() {
        let p: InventoryParams =
            serde_json::from_str(r#"{"rebalance_ratio_R": 0.8}"#).unwrap();
        assert_eq!(p.rebalance_ratio_r, dec!(0.8));
    }

    #[test]
    fn test_confidence_keeps_unknown_fields() {
        let c: ConfidenceStats = serde_json::from_str(
            r#"{"n_watch_trades": 120, "size_mape": 12.5}"#,
        )
        .unwrap();
        assert_eq!(c.n_watch_trades, Some(120));
        assert!(c.extra.contains_key("size_mape"));
    }
}
