//! Inventory gate
//!
//! Total and per-side share caps. The gate never flips sides; rebalance
//! intent lives in side selection.

use super::types::{Inventory, Side};
use crate::params::InventoryParams;

/// Returns the side to trade, or `None` when a cap is reached
pub fn inventory_ok_and_rebalance(
    inventory: &Inventory,
    params: &InventoryParams,
    proposed: Side,
) -> Option<Side> {
    if let Some(max_total) = params.max_total_shares {
        if inventory.total() >= max_total {
            return None;
        }
    }
    let cap = match proposed {
        Side::Up => params.max_up_shares,
        Side::Down => params.max_down_shares,
    };
    if let Some(cap) = cap {
        if inventory.shares(proposed) >= cap {
            return None;
        }
    }
    Some(proposed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn inventory(up: i64, down: i64) -> Inventory {
        Inventory {
            up_shares: Decimal::from(up),
            down_shares: Decimal::from(down),
            ..Default::default()
        }
    }

    #[test]
    fn test_total_cap() {
        // max_total_shares=50, inv 30+25 => blocked for either side
        let params = InventoryParams {
            max_total_shares: Some(dec!(50)),
            ..Default::default()
        };
        let inv = inventory(30, 25);
        assert_eq!(inventory_ok_and_rebalance(&inv, &params, Side::Up), None);
        assert_eq!(inventory_ok_and_rebalance(&inv, &params, Side::Down), None);
    }

    #[test]
    fn test_side_cap_no_flip() {
        let params = InventoryParams {
            max_up_shares: Some(dec!(40)),
            ..Default::default()
        };
        let inv = inventory(40, 0);
        // UP is capped; the gate nulls rather than flipping to DOWN
        assert_eq!(inventory_ok_and_rebalance(&inv, &params, Side::Up), None);
        assert_eq!(
            inventory_ok_and_rebalance(&inv, &params, Side::Down),
            Some(Side::Down)
        );
    }

    #[test]
    fn test_uncapped_passes_through() {
        let inv = inventory(500, 500);
        assert_eq!(
            inventory_ok_and_rebalance(&inv, &InventoryParams::default(), Side::Up),
            Some(Side::Up)
        );
    }
}
