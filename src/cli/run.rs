//! Run command: offline tape replay
//!
//! Drives the full decision pipeline over a recorded tape. Emitted trades
//! are fed back through `record_trade_execution` at the modeled fill
//! price, so inventory, cadence, and session gates behave as they would
//! live.

use crate::config::CoreConfig;
use crate::core::Core;
use crate::tape::TapeReader;
use anyhow::Result;
use clap::Args;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// JSONL tape file to replay
    #[arg(long)]
    pub tape: PathBuf,

    /// Stop after this many ticks
    #[arg(long)]
    pub max_ticks: Option<u64>,

    /// Do not apply simulated fills back into inventory
    #[arg(long)]
    pub no_fills: bool,
}

impl RunArgs {
    pub async fn execute(&self, config: CoreConfig) -> Result<()> {
        let mut core = Core::new(config);
        let polling = core.start_polling();

        let mut ticks: u64 = 0;
        let mut trades: u64 = 0;
        let mut total_shares = Decimal::ZERO;
        let mut reasons: BTreeMap<&'static str, u64> = BTreeMap::new();

        for event in TapeReader::open(&self.tape)? {
            let event = event?;
            let decision = core.on_tick(
                &event.market,
                event.timestamp_ms,
                event.up_price,
                event.down_price,
            );

            *reasons.entry(decision.reason.as_str()).or_insert(0) += 1;

            if decision.should_trade {
                trades += 1;
                total_shares += decision.shares;
                if !self.no_fills {
                    if let (Some(side), Some(fill)) = (decision.side, decision.fill_price) {
                        let cost = decision.shares * fill;
                        core.record_trade_execution(
                            &decision.market,
                            decision.ts_ms,
                            side,
                            decision.shares,
                            cost,
                        );
                    }
                }
            }

            ticks += 1;
            if self.max_ticks.is_some_and(|max| ticks >= max) {
                break;
            }
        }

        polling.stop().await;

        tracing::info!(ticks, trades, total_shares = %total_shares, "replay complete");
        println!("Replayed {ticks} ticks: {trades} trades, {total_shares} shares");
        println!("Decisions by reason:");
        for (reason, count) in &reasons {
            println!("  {reason}: {count}");
        }
        if let Some(stats) = core.audit_stats() {
            println!(
                "Audit: {} written, {} dropped, {} errors",
                stats.records_written, stats.records_dropped, stats.write_errors
            );
        }

        Ok(())
    }
}
