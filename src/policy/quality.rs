//! Quality gate
//!
//! Pre-decision data-quality checks: price-sum deviation, timestamp
//! jumps, and price gaps against the previous snapshot. Thresholds the
//! document does not carry are not enforced.

use crate::params::QualityFilterParams;
use crate::tape::TapeState;

/// Whether the tick passes the data-quality filter
pub fn quality_ok(
    state: &TapeState,
    previous: Option<&TapeState>,
    params: &QualityFilterParams,
) -> bool {
    if let Some(max_deviation) = params.max_price_sum_deviation {
        if state.price_sum_deviation() > max_deviation {
            return false;
        }
    }
    if let Some(prev) = previous {
        if let Some(jump) = params.timestamp_jump_threshold_seconds {
            if ((state.ts_ms - prev.ts_ms) as f64) / 1_000.0 > jump {
                return false;
            }
        }
        if let Some(gap) = params.price_gap_threshold {
            let up_move = (state.up_price - prev.up_price).abs();
            let down_move = (state.down_price - prev.down_price).abs();
            if up_move.max(down_move) > gap {
                return false;
            }
        }
    }
    true
}
