//! Parameter document loading
//!
//! The document arrives in one of two layouts:
//!
//! - *market-first*: top-level keys are canonical market keys, each mapping
//!   to `{entry_params, size_params, ...}`
//! - *param-type-first*: top-level keys are section names, each containing
//!   `{"per_market": {market_key: ...}}`
//!
//! Both are normalized into one [`ParamsSnapshot`] here. The whole document
//! is parsed and validated before anything is published; a failed load
//! leaves the previous snapshot untouched.

use super::types::{MarketParams, ParamsSnapshot};
use crate::market::MarketKey;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// Section names recognized in the param-type-first layout
const SECTION_NAMES: [&str; 11] = [
    "entry_params",
    "size_params",
    "inventory_params",
    "cadence_params",
    "side_selection_params",
    "execution_params",
    "cooldown_params",
    "risk_params",
    "quality_filter_params",
    "reset_params",
    "confidence",
];

/// `rebalance_ratio_R` is kept strictly inside (0.5, 1)
const REBALANCE_RATIO_MIN: Decimal = dec!(0.5001);
const REBALANCE_RATIO_MAX: Decimal = dec!(0.9999);

/// Parameter loading errors
#[derive(Debug, Error)]
pub enum ParamsError {
    #[error("failed to read parameter file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse parameter document: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid parameter document: {0}")]
    Invalid(String),
}

/// Load and validate a parameter file from disk
pub fn load_params_file(path: &Path) -> Result<ParamsSnapshot, ParamsError> {
    let text = std::fs::read_to_string(path).map_err(|source| ParamsError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_params_json(&text)
}

/// Parse and validate a parameter document from a JSON string
pub fn parse_params_json(text: &str) -> Result<ParamsSnapshot, ParamsError> {
    let value: Value = serde_json::from_str(text)?;
    let root = match value {
        Value::Object(map) => map,
        other => {
            return Err(ParamsError::Invalid(format!(
                "expected a JSON object at top level, got {}",
                type_name(&other)
            )))
        }
    };

    let market_first = if is_market_first(&root) {
        root
    } else {
        pivot_param_type_first(&root)
    };

    let mut markets = HashMap::new();
    for (raw_key, sections) in market_first {
        let Some(key) = canonical_key(&raw_key) else {
            tracing::warn!(market = %raw_key, "ignoring unknown market key in parameter document");
            continue;
        };
        let mut params: MarketParams = serde_json::from_value(sections)?;
        normalize_market_params(key, &mut params);
        markets.insert(key, Arc::new(params));
    }

    Ok(ParamsSnapshot { markets })
}

/// Detection rule: at least one canonical market key at top level and no
/// section name at top level
fn is_market_first(root: &Map<String, Value>) -> bool {
    let has_market_key = root.keys().any(|k| canonical_key(k).is_some());
    let has_section = root.contains_key("entry_params") || root.contains_key("size_params");
    has_market_key && !has_section
}

fn canonical_key(raw: &str) -> Option<MarketKey> {
    MarketKey::ALL.into_iter().find(|k| k.as_str() == raw)
}

/// Pivot `{section: {per_market: {market: v}}}` into `{market: {section: v}}`
fn pivot_param_type_first(root: &Map<String, Value>) -> Map<String, Value> {
    let mut out: Map<String, Value> = Map::new();
    for section in SECTION_NAMES {
        let Some(per_market) = root
            .get(section)
            .and_then(|s| s.get("per_market"))
            .and_then(Value::as_object)
        else {
            continue;
        };
        for (market, value) in per_market {
            if let Some(sections) = out
                .entry(market.clone())
                .or_insert_with(|| Value::Object(Map::new()))
                .as_object_mut()
            {
                sections.insert(section.to_string(), value.clone());
            }
        }
    }
    out
}

/// Post-decode validation and normalization for one market
fn normalize_market_params(key: MarketKey, params: &mut MarketParams) {
    let r = params.inventory_params.rebalance_ratio_r;
    let clamped = r.clamp(REBALANCE_RATIO_MIN, REBALANCE_RATIO_MAX);
    if clamped != r {
        tracing::warn!(market = %key, ratio = %r, "rebalance_ratio_R outside (0.5, 1), clamping");
        params.inventory_params.rebalance_ratio_r = clamped;
    }

    let size = &mut params.size_params;
    if !size.bin_edges.is_empty() && !size.has_valid_bins() {
        tracing::warn!(
            market = %key,
            "bin_edges not strictly increasing with length >= 2; sizing falls back to 1.0"
        );
    }

    // Older documents wrote the 1D table under `size_table`. When no
    // conditioning is configured and the keys carry no inventory label,
    // treat it as the 1D table.
    if size.conditioning_var.is_none()
        && size.size_table_1d.is_empty()
        && !size.size_table.is_empty()
        && size.size_table.keys().all(|k| !k.contains('|'))
    {
        size.size_table_1d = std::mem::take(&mut size.size_table);
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
