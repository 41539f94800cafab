//! Share sizing
//!
//! Sizes come from per-price-bucket tables, optionally conditioned on the
//! inventory imbalance ratio. Buckets are right-closed intervals over the
//! side price; labels use the `"(L, R]"` spelling of the analytics
//! pipeline, whose first bucket may appear on disk with a `-0.001` lower
//! edge, so lookups try both spellings for bucket 0.

use super::types::{Inventory, Side};
use crate::params::{ConditioningVar, SizeParams};
use crate::tape::TapeState;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::BTreeMap;

/// Share size used when no table applies
pub const DEFAULT_SIZE: Decimal = dec!(1);

/// Decimal places sizes are rounded to
const SIZE_DECIMALS: u32 = 4;

/// Everything learned during a size lookup, kept for the audit record
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SizeLookup {
    /// Final share size (positive, rounded)
    pub shares: Decimal,
    /// Table value before rounding, when one was found
    pub raw: Option<Decimal>,
    pub bucket_index: Option<usize>,
    pub bucket_label: Option<String>,
    pub inventory_ratio: Option<Decimal>,
    pub inventory_bucket: Option<String>,
    /// The table key that produced the size
    pub table_key: Option<String>,
}

impl SizeLookup {
    fn defaulted() -> Self {
        Self {
            shares: DEFAULT_SIZE,
            ..Default::default()
        }
    }

    fn resolve(&mut self, key: String, value: Decimal) {
        self.raw = Some(value);
        self.shares = value.round_dp(SIZE_DECIMALS);
        self.table_key = Some(key);
    }
}

/// Price bucket index for a side price: the `i` with
/// `price in (edges[i], edges[i+1]]`, clamped to the outer buckets.
pub fn price_bucket_index(edges: &[Decimal], price: Decimal) -> usize {
    if price <= edges[0] {
        return 0;
    }
    for i in 0..edges.len() - 1 {
        if price <= edges[i + 1] {
            return i;
        }
    }
    edges.len() - 2
}

/// Canonical `"(L, R]"` label for a bucket
pub fn bucket_label(edges: &[Decimal], index: usize) -> String {
    format!(
        "({}, {}]",
        format_edge(edges[index]),
        format_edge(edges[index + 1])
    )
}

/// The `include_lowest` spelling the analytics pipeline emits for bucket 0
fn pandas_first_label(edges: &[Decimal]) -> String {
    format!("(-0.001, {}]", format_edge(edges[1]))
}

fn format_edge(edge: Decimal) -> String {
    edge.normalize().to_string()
}

/// Inventory bucket index: the first `i` with `thresholds[i+1] >= ratio`,
/// else the last bucket
pub fn inventory_bucket_index(
    thresholds: &[Decimal],
    buckets: &[String],
    ratio: Decimal,
) -> Option<usize> {
    if buckets.is_empty() {
        return None;
    }
    for i in 0..buckets.len() {
        if let Some(upper) = thresholds.get(i + 1) {
            if *upper >= ratio {
                return Some(i);
            }
        }
    }
    Some(buckets.len() - 1)
}

/// Look up the share size for a proposed trade.
///
/// Fallback order when the conditioned key misses: other inventory buckets
/// for the same price label, the 1D table, the median of the conditioned
/// table, then the constant default. Non-positive table entries are
/// treated as missing.
pub fn size_for_trade(
    state: &TapeState,
    size: &SizeParams,
    side: Side,
    inventory: &Inventory,
) -> SizeLookup {
    if !size.has_valid_bins() {
        return SizeLookup::defaulted();
    }

    let price = state.side_price(side);
    let index = price_bucket_index(&size.bin_edges, price);
    let label = bucket_label(&size.bin_edges, index);

    let mut lookup = SizeLookup {
        shares: DEFAULT_SIZE,
        bucket_index: Some(index),
        bucket_label: Some(label.clone()),
        ..Default::default()
    };

    let price_labels = price_label_variants(&size.bin_edges, index, &label);

    if size.conditioning_var == Some(ConditioningVar::InventoryImbalanceRatio)
        && !size.inventory_buckets.is_empty()
    {
        let ratio = inventory.imbalance_ratio();
        lookup.inventory_ratio = Some(ratio);

        if let Some(inv_index) = inventory_bucket_index(
            &size.inventory_bucket_thresholds,
            &size.inventory_buckets,
            ratio,
        ) {
            let inv_label = &size.inventory_buckets[inv_index];
            lookup.inventory_bucket = Some(inv_label.clone());

            if let Some((key, value)) =
                joined_lookup(&size.size_table, &price_labels, inv_label)
            {
                lookup.resolve(key, value);
                return lookup;
            }

            // Other inventory buckets for the same price label
            for other in &size.inventory_buckets {
                if other == inv_label {
                    continue;
                }
                if let Some((key, value)) =
                    joined_lookup(&size.size_table, &price_labels, other)
                {
                    lookup.resolve(key, value);
                    return lookup;
                }
            }
        }
    }

    // 1D table
    for price_label in &price_labels {
        if let Some(value) = positive_entry(&size.size_table_1d, price_label) {
            lookup.resolve(price_label.clone(), value);
            return lookup;
        }
    }

    // Median of whichever table carries sizes
    if let Some(value) = median(&size.size_table).or_else(|| median(&size.size_table_1d)) {
        lookup.raw = Some(value);
        lookup.shares = value.round_dp(SIZE_DECIMALS);
        return lookup;
    }

    lookup
}

/// The label spellings to try for a price bucket, canonical first
fn price_label_variants(edges: &[Decimal], index: usize, label: &str) -> Vec<String> {
    if index == 0 {
        vec![label.to_string(), pandas_first_label(edges)]
    } else {
        vec![label.to_string()]
    }
}

fn joined_lookup(
    table: &BTreeMap<String, Decimal>,
    price_labels: &[String],
    inv_label: &str,
) -> Option<(String, Decimal)> {
    for price_label in price_labels {
        let key = format!("{price_label}|{inv_label}");
        if let Some(value) = positive_entry(table, &key) {
            return Some((key, value));
        }
    }
    None
}

fn positive_entry(table: &BTreeMap<String, Decimal>, key: &str) -> Option<Decimal> {
    table
        .get(key)
        .copied()
        .filter(|value| *value > Decimal::ZERO)
}

fn median(table: &BTreeMap<String, Decimal>) -> Option<Decimal> {
    let mut values: Vec<Decimal> = table
        .values()
        .copied()
        .filter(|v| *v > Decimal::ZERO)
        .collect();
    if values.is_empty() {
        return None;
    }
    values.sort();
    let mid = values.len() / 2;
    if values.len() % 2 == 1 {
        Some(values[mid])
    } else {
        Some((values[mid - 1] + values[mid]) / dec!(2))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::MarketKey;

    fn state(up: Decimal) -> TapeState {
        TapeState {
            market: MarketKey::Btc15m,
            ts_ms: 0,
            up_price: up,
            down_price: Decimal::ONE - up,
        }
    }

    fn five_buckets() -> Vec<Decimal> {
        vec![dec!(0), dec!(0.2), dec!(0.4), dec!(0.6), dec!(0.8), dec!(1.0)]
    }

    fn table_1d() -> BTreeMap<String, Decimal> {
        [
            ("(0, 0.2]", dec!(5)),
            ("(0.2, 0.4]", dec!(10)),
            ("(0.4, 0.6]", dec!(15)),
            ("(0.6, 0.8]", dec!(20)),
            ("(0.8, 1]", dec!(25)),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
    }

    #[test]
    fn test_1d_lookup() {
        // bin_edges=[0,0.2,0.4,0.6,0.8,1.0], up=0.35, empty inventory => 10
        let size = SizeParams {
            bin_edges: five_buckets(),
            size_table_1d: table_1d(),
            ..Default::default()
        };
        let lookup = size_for_trade(&state(dec!(0.35)), &size, Side::Up, &Inventory::default());
        assert_eq!(lookup.shares, dec!(10));
        assert_eq!(lookup.bucket_label.as_deref(), Some("(0.2, 0.4]"));
        assert_eq!(lookup.bucket_index, Some(1));
    }

    #[test]
    fn test_bucket_boundaries_right_closed() {
        let edges = five_buckets();
        // Price exactly at an inner edge belongs to the bucket below it
        assert_eq!(price_bucket_index(&edges, dec!(0.4)), 1);
        assert_eq!(price_bucket_index(&edges, dec!(0.41)), 2);
        // Clamp behavior at the extremes
        assert_eq!(price_bucket_index(&edges, dec!(0)), 0);
        assert_eq!(price_bucket_index(&edges, dec!(-0.5)), 0);
        assert_eq!(price_bucket_index(&edges, dec!(1)), 4);
        assert_eq!(price_bucket_index(&edges, dec!(1.5)), 4);
    }

    #[test]
    fn test_label_formatting() {
        let edges = five_buckets();
        assert_eq!(bucket_label(&edges, 0), "(0, 0.2]");
        assert_eq!(bucket_label(&edges, 4), "(0.8, 1]");
        assert_eq!(pandas_first_label(&edges), "(-0.001, 0.2]");
    }

    #[test]
    fn test_pandas_first_bucket_fallback() {
        let mut table = BTreeMap::new();
        table.insert("(-0.001, 0.2]".to_string(), dec!(7));
        let size = SizeParams {
            bin_edges: five_buckets(),
            size_table_1d: table,
            ..Default::default()
        };
        let lookup = size_for_trade(&state(dec!(0.1)), &size, Side::Up, &Inventory::default());
        assert_eq!(lookup.shares, dec!(7));
        assert_eq!(lookup.table_key.as_deref(), Some("(-0.001, 0.2]"));
    }

    fn conditioned_params() -> SizeParams {
        let table: BTreeMap<String, Decimal> = [
            ("(0, 0.5]|bucket_0", dec!(5)),
            ("(0, 0.5]|bucket_1", dec!(15)),
            ("(0.5, 1]|bucket_0", dec!(10)),
            ("(0.5, 1]|bucket_1", dec!(20)),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        SizeParams {
            bin_edges: vec![dec!(0), dec!(0.5), dec!(1.0)],
            size_table: table,
            conditioning_var: Some(ConditioningVar::InventoryImbalanceRatio),
            inventory_bucket_thresholds: vec![dec!(0), dec!(1), dec!(2)],
            inventory_buckets: vec!["bucket_0".to_string(), "bucket_1".to_string()],
            ..Default::default()
        }
    }

    #[test]
    fn test_inventory_conditioned_lookup() {
        let size = conditioned_params();

        // inv_up=50, inv_down=100 => ratio 0.5 => bucket_0 => 5
        let light_up = Inventory {
            up_shares: dec!(50),
            down_shares: dec!(100),
            ..Default::default()
        };
        let lookup = size_for_trade(&state(dec!(0.3)), &size, Side::Up, &light_up);
        assert_eq!(lookup.shares, dec!(5));
        assert_eq!(lookup.inventory_bucket.as_deref(), Some("bucket_0"));
        assert_eq!(lookup.table_key.as_deref(), Some("(0, 0.5]|bucket_0"));

        // inv_up=100, inv_down=50 => ratio 2.0 => bucket_1 => 15
        let heavy_up = Inventory {
            up_shares: dec!(100),
            down_shares: dec!(50),
            ..Default::default()
        };
        let lookup = size_for_trade(&state(dec!(0.3)), &size, Side::Up, &heavy_up);
        assert_eq!(lookup.shares, dec!(15));
        assert_eq!(lookup.inventory_bucket.as_deref(), Some("bucket_1"));
    }

    #[test]
    fn test_inventory_bucket_beyond_last_threshold() {
        let thresholds = vec![dec!(0), dec!(1), dec!(2)];
        let buckets = vec!["bucket_0".to_string(), "bucket_1".to_string()];
        // Ratio above every threshold lands in the last bucket
        assert_eq!(
            inventory_bucket_index(&thresholds, &buckets, dec!(9.5)),
            Some(1)
        );
    }

    #[test]
    fn test_fallback_to_sibling_inventory_bucket() {
        let mut size = conditioned_params();
        size.size_table.remove("(0, 0.5]|bucket_0");

        let light_up = Inventory {
            up_shares: dec!(50),
            down_shares: dec!(100),
            ..Default::default()
        };
        let lookup = size_for_trade(&state(dec!(0.3)), &size, Side::Up, &light_up);
        // bucket_0 key is gone; bucket_1 for the same price label fills in
        assert_eq!(lookup.shares, dec!(15));
        assert_eq!(lookup.table_key.as_deref(), Some("(0, 0.5]|bucket_1"));
    }

    #[test]
    fn test_fallback_to_1d_then_median() {
        let mut size = conditioned_params();
        size.size_table.retain(|k, _| !k.starts_with("(0, 0.5]"));
        size.size_table_1d
            .insert("(0, 0.5]".to_string(), dec!(8));

        let lookup = size_for_trade(&state(dec!(0.3)), &size, Side::Up, &Inventory::default());
        assert_eq!(lookup.shares, dec!(8));

        // Without the 1D entry, the median of the remaining 2D sizes wins
        size.size_table_1d.clear();
        let lookup = size_for_trade(&state(dec!(0.3)), &size, Side::Up, &Inventory::default());
        assert_eq!(lookup.shares, dec!(15)); // median of [10, 20]
    }

    #[test]
    fn test_default_size_when_tables_empty() {
        let size = SizeParams {
            bin_edges: five_buckets(),
            ..Default::default()
        };
        let lookup = size_for_trade(&state(dec!(0.5)), &size, Side::Up, &Inventory::default());
        assert_eq!(lookup.shares, DEFAULT_SIZE);
        assert!(lookup.table_key.is_none());
    }

    #[test]
    fn test_invalid_bins_default_size() {
        let size = SizeParams {
            bin_edges: vec![dec!(0.5)],
            size_table_1d: table_1d(),
            ..Default::default()
        };
        let lookup = size_for_trade(&state(dec!(0.5)), &size, Side::Up, &Inventory::default());
        assert_eq!(lookup.shares, DEFAULT_SIZE);
        assert!(lookup.bucket_index.is_none());
    }

    #[test]
    fn test_non_positive_entries_skipped() {
        let mut table = table_1d();
        table.insert("(0.2, 0.4]".to_string(), dec!(0));
        let size = SizeParams {
            bin_edges: five_buckets(),
            size_table_1d: table,
            ..Default::default()
        };
        let lookup = size_for_trade(&state(dec!(0.35)), &size, Side::Up, &Inventory::default());
        // Zero entry is treated as missing; the 1D median fills in
        assert_eq!(lookup.shares, dec!(15));
    }

    #[test]
    fn test_rounding_to_four_decimals() {
        let mut table = BTreeMap::new();
        table.insert("(0, 0.5]".to_string(), dec!(3.141592));
        let size = SizeParams {
            bin_edges: vec![dec!(0), dec!(0.5), dec!(1)],
            size_table_1d: table,
            ..Default::default()
        };
        let lookup = size_for_trade(&state(dec!(0.3)), &size, Side::Up, &Inventory::default());
        assert_eq!(lookup.shares, dec!(3.1416));
        assert_eq!(lookup.raw, Some(dec!(3.141592)));
    }

    #[test]
    fn test_down_side_uses_down_price() {
        let size = SizeParams {
            bin_edges: five_buckets(),
            size_table_1d: table_1d(),
            ..Default::default()
        };
        // up=0.9 so down=0.1 lands in the first bucket
        let lookup = size_for_trade(&state(dec!(0.9)), &size, Side::Down, &Inventory::default());
        assert_eq!(lookup.shares, dec!(5));
    }
}
