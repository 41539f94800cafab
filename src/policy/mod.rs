//! Policy engine
//!
//! Stateless decision functions, one file per gate: entry signal, side
//! selection, sizing, cadence, cooldown, risk, quality, inventory caps,
//! fill simulation, and reset conditions. All state lives in the
//! integrator; everything here is a pure function of its inputs.

mod cadence;
mod cooldown;
mod entry;
mod execution;
mod inventory;
mod quality;
mod reset;
mod risk;
mod side;
mod sizing;
mod types;

pub use cadence::cadence_ok;
pub use cooldown::cooldown_blocked;
pub use entry::{check_side_entry, entry_signal, EntrySignal, SideEntry};
pub use execution::{simulate_fill_price, SimulatedFill};
pub use inventory::inventory_ok_and_rebalance;
pub use quality::quality_ok;
pub use reset::should_reset_inventory;
pub use risk::risk_blocked;
pub use side::select_side;
pub use sizing::{
    bucket_label, inventory_bucket_index, price_bucket_index, size_for_trade, SizeLookup,
    DEFAULT_SIZE,
};
pub use types::{Decision, DecisionReason, Inventory, Side, RATIO_EPSILON};
