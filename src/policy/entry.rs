//! Entry signal
//!
//! A side qualifies when its configured price band contains the side price
//! inclusively and, in momentum/reversion mode, the 5s delta clears the
//! threshold. A side with no configured band never qualifies.

use super::types::{DecisionReason, Side};
use crate::features::Features;
use crate::params::{EntryMode, EntryParams};
use crate::tape::TapeState;

/// Per-side entry outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct SideEntry {
    pub qualifies: bool,
    pub reason: DecisionReason,
}

impl SideEntry {
    fn pass(reason: DecisionReason) -> Self {
        Self {
            qualifies: true,
            reason,
        }
    }

    fn fail(reason: DecisionReason) -> Self {
        Self {
            qualifies: false,
            reason,
        }
    }
}

/// Combined entry outcome across both sides
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntrySignal {
    pub should_trade: bool,
    /// Set when exactly one side qualifies; side selection resolves ties
    pub side: Option<Side>,
    pub reason: DecisionReason,
    /// Per-side results, for side selection and the audit record
    pub up: SideEntry,
    pub down: SideEntry,
}

/// Evaluate one side against the entry parameters
pub fn check_side_entry(
    state: &TapeState,
    features: &Features,
    entry: &EntryParams,
    side: Side,
) -> SideEntry {
    let (min, max, band_fail) = match side {
        Side::Up => (
            entry.up_price_min,
            entry.up_price_max,
            DecisionReason::UpPriceNotInBand,
        ),
        Side::Down => (
            entry.down_price_min,
            entry.down_price_max,
            DecisionReason::DownPriceNotInBand,
        ),
    };

    let (Some(lo), Some(hi)) = (min, max) else {
        return SideEntry::fail(DecisionReason::NoBandMatch);
    };

    let price = state.side_price(side);
    if price < lo || price > hi {
        return SideEntry::fail(band_fail);
    }

    match entry.mode {
        EntryMode::None => SideEntry::pass(match side {
            Side::Up => DecisionReason::UpPriceBand,
            Side::Down => DecisionReason::DownPriceBand,
        }),
        EntryMode::Momentum => match features.delta_5s_for(side) {
            Some(delta) if delta >= entry.momentum_threshold => {
                SideEntry::pass(DecisionReason::MomentumMet)
            }
            _ => SideEntry::fail(DecisionReason::MomentumNotMet),
        },
        EntryMode::Reversion => match features.delta_5s_for(side) {
            Some(delta) if delta <= -entry.momentum_threshold => {
                SideEntry::pass(DecisionReason::ReversionMet)
            }
            _ => SideEntry::fail(DecisionReason::ReversionNotMet),
        },
    }
}

/// Evaluate both sides and combine into one signal
pub fn entry_signal(
    state: &TapeState,
    features: &Features,
    entry: Option<&EntryParams>,
) -> EntrySignal {
    let Some(entry) = entry else {
        let missing = SideEntry::fail(DecisionReason::NoEntryParams);
        return EntrySignal {
            should_trade: false,
            side: None,
            reason: DecisionReason::NoEntryParams,
            up: missing,
            down: missing,
        };
    };

    let up = check_side_entry(state, features, entry, Side::Up);
    let down = check_side_entry(state, features, entry, Side::Down);

    match (up.qualifies, down.qualifies) {
        (true, false) => EntrySignal {
            should_trade: true,
            side: Some(Side::Up),
            reason: up.reason,
            up,
            down,
        },
        (false, true) => EntrySignal {
            should_trade: true,
            side: Some(Side::Down),
            reason: down.reason,
            up,
            down,
        },
        (true, true) => EntrySignal {
            should_trade: true,
            side: None,
            reason: up.reason,
            up,
            down,
        },
        (false, false) => EntrySignal {
            should_trade: false,
            side: None,
            reason: no_trade_reason(&up, &down),
            up,
            down,
        },
    }
}

/// The blocking reason when neither side qualifies. A delta-mode miss on a
/// configured band outranks a plain band miss; a single configured band
/// reports its own failure; otherwise no band matched at all.
fn no_trade_reason(up: &SideEntry, down: &SideEntry) -> DecisionReason {
    for entry in [up, down] {
        if matches!(
            entry.reason,
            DecisionReason::MomentumNotMet | DecisionReason::ReversionNotMet
        ) {
            return entry.reason;
        }
    }
    match (up.reason, down.reason) {
        (DecisionReason::UpPriceNotInBand, DecisionReason::NoBandMatch) => {
            DecisionReason::UpPriceNotInBand
        }
        (DecisionReason::NoBandMatch, DecisionReason::DownPriceNotInBand) => {
            DecisionReason::DownPriceNotInBand
        }
        _ => DecisionReason::NoBandMatch,
    }
}
