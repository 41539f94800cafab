//! Rolling price history and feature computation
//!
//! Features are pure functions of the current tape state and the bounded
//! history ring: price deltas over 1s/5s/30s lookbacks, short-window
//! volatility of the UP price, and distance from the 50/50 line.

use crate::policy::Side;
use crate::tape::TapeState;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::VecDeque;

/// Delta lookback windows in seconds
const DELTA_WINDOWS_S: [i64; 3] = [1, 5, 30];

/// A single history entry
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricePoint {
    pub ts_ms: i64,
    pub up: Decimal,
    pub down: Decimal,
}

/// Bounded per-market price history, oldest-evicted
#[derive(Debug, Clone)]
pub struct PriceHistory {
    points: VecDeque<PricePoint>,
    capacity: usize,
}

impl PriceHistory {
    /// Create a history ring with the given capacity
    pub fn new(capacity: usize) -> Self {
        Self {
            points: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a point, evicting the oldest when full
    pub fn push(&mut self, point: PricePoint) {
        if self.points.len() == self.capacity {
            self.points.pop_front();
        }
        self.points.push_back(point);
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PricePoint> {
        self.points.iter()
    }

    /// The entry whose timestamp is closest to `target_ms`
    fn closest_to(&self, target_ms: i64) -> Option<&PricePoint> {
        self.points
            .iter()
            .min_by_key(|p| (p.ts_ms - target_ms).abs())
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }
}

/// Computed features for one decision tick
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Features {
    pub delta_1s_up: Option<Decimal>,
    pub delta_1s_down: Option<Decimal>,
    pub delta_5s_up: Option<Decimal>,
    pub delta_5s_down: Option<Decimal>,
    pub delta_30s_up: Option<Decimal>,
    pub delta_30s_down: Option<Decimal>,
    pub volatility_5s: Option<Decimal>,
    pub volatility_30s: Option<Decimal>,
    pub distance_from_50: Decimal,
}

impl Features {
    /// The default side delta over 5s (the UP delta, by convention)
    pub fn delta_5s_side(&self) -> Option<Decimal> {
        self.delta_5s_up
    }

    /// Side-specific 5s delta. The DOWN side prefers its own delta and
    /// falls back to the side default when absent.
    pub fn delta_5s_for(&self, side: Side) -> Option<Decimal> {
        match side {
            Side::Up => self.delta_5s_up,
            Side::Down => self.delta_5s_down.or_else(|| self.delta_5s_side()),
        }
    }
}

/// Compute all features for the given tick over the history ring.
/// Pure: identical inputs produce identical outputs.
pub fn compute_features(state: &TapeState, history: &PriceHistory) -> Features {
    let now = state.ts_ms;
    let mut features = Features {
        distance_from_50: (state.up_price - dec!(0.5)).abs(),
        ..Default::default()
    };

    for window_s in DELTA_WINDOWS_S {
        let target = now - window_s * 1_000;
        let Some(reference) = history.closest_to(target) else {
            continue;
        };
        // The match must land within 2x the window of the target
        if (reference.ts_ms - target).abs() >= 2_000 * window_s {
            continue;
        }
        let delta_up = state.up_price - reference.up;
        let delta_down = state.down_price - reference.down;
        match window_s {
            1 => {
                features.delta_1s_up = Some(delta_up);
                features.delta_1s_down = Some(delta_down);
            }
            5 => {
                features.delta_5s_up = Some(delta_up);
                features.delta_5s_down = Some(delta_down);
            }
            _ => {
                features.delta_30s_up = Some(delta_up);
                features.delta_30s_down = Some(delta_down);
            }
        }
    }

    features.volatility_5s = volatility(history, now, 5);
    features.volatility_30s = volatility(history, now, 30);
    features
}

/// Population standard deviation of the UP price over `[now - w, now]`,
/// present with at least two samples
fn volatility(history: &PriceHistory, now: i64, window_s: i64) -> Option<Decimal> {
    let lo = now - window_s * 1_000;
    let samples: Vec<f64> = history
        .iter()
        .filter(|p| p.ts_ms >= lo && p.ts_ms <= now)
        .map(|p| p.up.try_into().unwrap_or(0.0))
        .collect();
    if samples.len() < 2 {
        return None;
    }

    let n = samples.len() as f64;
    let mean = samples.iter().sum::<f64>() / n;
    let variance = samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
    Decimal::try_from(variance.sqrt()).ok()
}
