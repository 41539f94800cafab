//! Side selection
//!
//! Resolves which side to buy when both sides qualify independently.
//! Inventory-driven selection buys whichever side pulls the imbalance
//! ratio back toward 1.0.

use super::entry::SideEntry;
use super::types::{Inventory, Side};
use crate::features::Features;
use crate::params::{SideSelectionMode, SideSelectionParams};
use crate::tape::TapeState;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Momentum-driven selection ignores deltas smaller than this
const MOMENTUM_TIE_BAND: Decimal = dec!(0.001);

/// Pick a side given both per-side entry outcomes. Returns `None` when
/// neither side qualifies.
pub fn select_side(
    state: &TapeState,
    features: &Features,
    inventory: &Inventory,
    params: &SideSelectionParams,
    entry_up: &SideEntry,
    entry_down: &SideEntry,
) -> Option<Side> {
    match (entry_up.qualifies, entry_down.qualifies) {
        (false, false) => None,
        (true, false) => Some(Side::Up),
        (false, true) => Some(Side::Down),
        (true, true) => Some(resolve_both(state, features, inventory, params)),
    }
}

fn resolve_both(
    state: &TapeState,
    features: &Features,
    inventory: &Inventory,
    params: &SideSelectionParams,
) -> Side {
    match params.mode {
        SideSelectionMode::EdgeDriven => edge_preference(state),
        SideSelectionMode::MomentumDriven => match features.delta_5s_side() {
            Some(delta) if delta > MOMENTUM_TIE_BAND => Side::Up,
            Some(delta) if delta < -MOMENTUM_TIE_BAND => Side::Down,
            _ => inventory_preference(state, inventory),
        },
        SideSelectionMode::FixedPreference => params
            .preferred_side
            .unwrap_or_else(|| inventory_preference(state, inventory)),
        // Alternating keeps no history of its own here and falls back,
        // as do the inventory-first modes
        SideSelectionMode::InventoryDriven
        | SideSelectionMode::Mixed
        | SideSelectionMode::Alternating => inventory_preference(state, inventory),
    }
}

/// Buy the side that brings `inv_up / max(inv_down, eps)` closer to 1.0;
/// when balanced, prefer the side further from the 50/50 line.
fn inventory_preference(state: &TapeState, inventory: &Inventory) -> Side {
    if inventory.up_shares == inventory.down_shares {
        return edge_preference(state);
    }
    if inventory.imbalance_ratio() > Decimal::ONE {
        Side::Down
    } else {
        Side::Up
    }
}

/// The side with greater |price - 0.5|, UP on ties
fn edge_preference(state: &TapeState) -> Side {
    let up_edge = (state.up_price - dec!(0.5)).abs();
    let down_edge = (state.down_price - dec!(0.5)).abs();
    if down_edge > up_edge {
        Side::Down
    } else {
        Side::Up
    }
}
