//! Risk gate
//!
//! Session trade caps, inventory imbalance limits, and per-side exposure
//! caps, evaluated against the side chosen by side selection.

use super::types::{Inventory, Side};
use crate::params::RiskParams;

/// Whether risk limits block a trade on `side`
pub fn risk_blocked(
    inventory: &Inventory,
    trades_this_session: u32,
    side: Side,
    params: &RiskParams,
) -> bool {
    if let Some(cap) = params.max_trades_per_session {
        if trades_this_session >= cap {
            return true;
        }
    }
    if let Some(max_ratio) = params.max_imbalance_ratio {
        if inventory.larger_side_fraction() > max_ratio {
            return true;
        }
    }
    let cap = match side {
        Side::Up => params.max_exposure_up_shares,
        Side::Down => params.max_exposure_down_shares,
    };
    if let Some(cap) = cap {
        if inventory.shares(side) > cap {
            return true;
        }
    }
    false
}
