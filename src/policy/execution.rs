//! Fill price simulation
//!
//! Deterministic fill model: the snapshot side price plus a configured
//! bias, used for audit and accounting. The external executor reports the
//! real cost back through `record_trade_execution`.

use super::types::Side;
use crate::params::{ExecutionModelType, ExecutionParams};
use rust_decimal::Decimal;

/// A modeled fill with the inputs that produced it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulatedFill {
    pub side: Side,
    pub fill_price: Decimal,
    pub model: ExecutionModelType,
    /// Bias added to the snapshot price, when the model uses one
    pub bias: Option<Decimal>,
    /// Slippage offset, for the fixed-slippage model
    pub slippage_offset: Option<Decimal>,
}

/// Impute a fill price for buying `side` at its snapshot price
pub fn simulate_fill_price(
    side: Side,
    snapshot_side_price: Decimal,
    params: &ExecutionParams,
) -> SimulatedFill {
    match params.model_type {
        ExecutionModelType::SnapshotPrice => SimulatedFill {
            side,
            fill_price: snapshot_side_price,
            model: params.model_type,
            bias: None,
            slippage_offset: None,
        },
        ExecutionModelType::FixedSlippage => SimulatedFill {
            side,
            fill_price: snapshot_side_price + params.slippage_offset,
            model: params.model_type,
            bias: None,
            slippage_offset: Some(params.slippage_offset),
        },
        ExecutionModelType::MidPrice => {
            let bias = params.fill_bias_median.unwrap_or(Decimal::ZERO);
            SimulatedFill {
                side,
                fill_price: snapshot_side_price + bias,
                model: params.model_type,
                bias: Some(bias),
                slippage_offset: None,
            }
        }
        ExecutionModelType::WorstCase => {
            let bias = params
                .fill_bias_p75
                .or(params.fill_bias_median)
                .unwrap_or(Decimal::ZERO);
            SimulatedFill {
                side,
                fill_price: snapshot_side_price + bias,
                model: params.model_type,
                bias: Some(bias),
                slippage_offset: None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_snapshot_price() {
        let fill = simulate_fill_price(Side::Up, dec!(0.55), &ExecutionParams::default());
        assert_eq!(fill.fill_price, dec!(0.55));
        assert_eq!(fill.side, Side::Up);
        assert!(fill.bias.is_none());
    }

    #[test]
    fn test_fixed_slippage() {
        let params = ExecutionParams {
            model_type: ExecutionModelType::FixedSlippage,
            slippage_offset: dec!(0.002),
            ..Default::default()
        };
        let fill = simulate_fill_price(Side::Down, dec!(0.55), &params);
        assert_eq!(fill.fill_price, dec!(0.552));
        assert_eq!(fill.side, Side::Down);
        assert_eq!(fill.slippage_offset, Some(dec!(0.002)));
    }

    #[test]
    fn test_mid_price_bias() {
        let params = ExecutionParams {
            model_type: ExecutionModelType::MidPrice,
            fill_bias_median: Some(dec!(0.001)),
            ..Default::default()
        };
        let fill = simulate_fill_price(Side::Up, dec!(0.55), &params);
        assert_eq!(fill.fill_price, dec!(0.551));
        assert_eq!(fill.bias, Some(dec!(0.001)));
    }

    #[test]
    fn test_worst_case_falls_back_to_median() {
        let params = ExecutionParams {
            model_type: ExecutionModelType::WorstCase,
            fill_bias_p75: Some(dec!(0.004)),
            fill_bias_median: Some(dec!(0.001)),
            ..Default::default()
        };
        assert_eq!(
            simulate_fill_price(Side::Up, dec!(0.5), &params).fill_price,
            dec!(0.504)
        );

        let no_p75 = ExecutionParams {
            model_type: ExecutionModelType::WorstCase,
            fill_bias_median: Some(dec!(0.001)),
            ..Default::default()
        };
        assert_eq!(
            simulate_fill_price(Side::Up, dec!(0.5), &no_p75).fill_price,
            dec!(0.501)
        );

        let bare = ExecutionParams {
            model_type: ExecutionModelType::WorstCase,
            ..Default::default()
        };
        assert_eq!(
            simulate_fill_price(Side::Down, dec!(0.5), &bare).fill_price,
            dec!(0.5)
        );
    }
}
