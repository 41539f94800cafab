//! Reset conditions
//!
//! Per-market inventory and session state clears on market switch or
//! after prolonged inactivity.

use crate::params::ResetParams;

/// Whether inventory and the session counter should be cleared
pub fn should_reset_inventory(
    last_activity_ts: Option<i64>,
    now: i64,
    params: &ResetParams,
) -> bool {
    match last_activity_ts {
        None => params.resets_on_market_switch,
        Some(last) => {
            params.resets_on_inactivity
                && ((now - last) as f64) / 3_600_000.0 > params.inactivity_threshold_hours
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_on_market_switch() {
        let params = ResetParams::default();
        assert!(should_reset_inventory(None, 1_000, &params));

        let no_switch = ResetParams {
            resets_on_market_switch: false,
            ..Default::default()
        };
        assert!(!should_reset_inventory(None, 1_000, &no_switch));
    }

    #[test]
    fn test_reset_on_inactivity() {
        let params = ResetParams {
            resets_on_inactivity: true,
            inactivity_threshold_hours: 2.0,
            ..Default::default()
        };
        let two_hours_ms = 2 * 3_600_000;
        assert!(!should_reset_inventory(Some(0), two_hours_ms, &params));
        assert!(should_reset_inventory(Some(0), two_hours_ms + 1, &params));

        let disabled = ResetParams::default();
        assert!(!should_reset_inventory(Some(0), 100 * 3_600_000, &disabled));
    }
}
