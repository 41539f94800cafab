//! Cadence gate
//!
//! Trade-rate throttles: minimum inter-trade gap and rolling per-second /
//! per-minute windows over the recent-trade ring.

use crate::params::CadenceParams;
use std::collections::VecDeque;

/// Whether a trade is allowed at `now` given the recent execution history
pub fn cadence_ok(
    last_trade_ts: Option<i64>,
    recent_trades: &VecDeque<i64>,
    params: &CadenceParams,
    now: i64,
) -> bool {
    if params.min_inter_trade_ms > 0.0 {
        if let Some(last) = last_trade_ts {
            if ((now - last) as f64) < params.min_inter_trade_ms {
                return false;
            }
        }
    }
    if let Some(cap) = params.max_trades_per_sec {
        if trades_in_window(recent_trades, now - 1_000, now) >= cap as usize {
            return false;
        }
    }
    if let Some(cap) = params.max_trades_per_min {
        if trades_in_window(recent_trades, now - 60_000, now) >= cap as usize {
            return false;
        }
    }
    true
}

fn trades_in_window(recent_trades: &VecDeque<i64>, lo: i64, hi: i64) -> usize {
    recent_trades.iter().filter(|ts| **ts >= lo && **ts <= hi).count()
}
