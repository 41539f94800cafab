//! Parameter store module
//!
//! Typed parameter document, layout-tolerant loader, and hot-reload store

mod loader;
mod store;
mod types;

pub use loader::{load_params_file, parse_params_json, ParamsError};
pub use store::{ParamStore, PollHandle};
pub use types::{
    CadenceParams, ConditioningVar, ConfidenceStats, CooldownParams, EntryMode, EntryParams,
    ExecutionModelType, ExecutionParams, InventoryParams, MarketParams, ParamsSnapshot,
    QualityFilterParams, ResetParams, RiskParams, SideSelectionMode, SideSelectionParams,
    SizeParams,
};
