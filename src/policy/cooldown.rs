//! Cooldown gate
//!
//! Post-trade suppression: time cooldown, minimum price movement inside
//! the 5s window after a trade, and the inventory lockout.

use super::types::Inventory;
use crate::features::Features;
use crate::params::CooldownParams;
use rust_decimal::Decimal;

/// Window the price-move check applies within, milliseconds
const PRICE_MOVE_WINDOW_MS: i64 = 5_000;

/// Whether a cooldown suppresses trading at `now`
pub fn cooldown_blocked(
    last_trade_ts: Option<i64>,
    inventory: &Inventory,
    features: &Features,
    params: &CooldownParams,
    now: i64,
) -> bool {
    if let Some(last) = last_trade_ts {
        if params.has_time_cooldown
            && ((now - last) as f64) / 1_000.0 < params.time_cooldown_seconds
        {
            return true;
        }
        if let Some(threshold) = params.price_move_threshold {
            if now - last <= PRICE_MOVE_WINDOW_MS {
                let moved = features.delta_5s_side().unwrap_or(Decimal::ZERO).abs();
                if moved < threshold {
                    return true;
                }
            }
        }
    }
    if params.has_inventory_lockout
        && inventory.larger_side_fraction() > params.inventory_lockout_threshold
    {
        return true;
    }
    false
}
