//! Params command: inspect the parameter document

use crate::config::CoreConfig;
use crate::params::load_params_file;
use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct ParamsArgs {
    /// Parameter file to inspect (defaults to the configured path)
    #[arg(long)]
    pub path: Option<PathBuf>,
}

impl ParamsArgs {
    pub fn execute(&self, config: CoreConfig) -> Result<()> {
        let path = self.path.as_ref().unwrap_or(&config.params_path);
        let snapshot = load_params_file(path)?;

        println!("Parameter document: {}", path.display());
        if snapshot.is_empty() {
            println!("  (no markets)");
            return Ok(());
        }

        let mut keys: Vec<_> = snapshot.markets.keys().copied().collect();
        keys.sort();
        for key in keys {
            let Some(params) = snapshot.market(key) else {
                continue;
            };
            println!("\n{key}:");
            match &params.entry_params {
                Some(entry) => println!(
                    "  entry: mode={:?} up=[{:?}, {:?}] down=[{:?}, {:?}]",
                    entry.mode,
                    entry.up_price_min,
                    entry.up_price_max,
                    entry.down_price_min,
                    entry.down_price_max
                ),
                None => println!("  entry: none (market will not trade)"),
            }
            let size = &params.size_params;
            println!(
                "  sizing: {} price buckets ({} 1d, {} conditioned entries), bins_valid={}",
                size.bin_edges.len().saturating_sub(1),
                size.size_table_1d.len(),
                size.size_table.len(),
                size.has_valid_bins()
            );
            println!(
                "  cadence: min_inter_trade_ms={} per_sec={:?} per_min={:?}",
                params.cadence_params.min_inter_trade_ms,
                params.cadence_params.max_trades_per_sec,
                params.cadence_params.max_trades_per_min
            );
            let confidence = &params.confidence;
            if let Some(n) = confidence.n_watch_trades {
                println!(
                    "  confidence: n_watch_trades={} precision={:?} recall={:?}",
                    n, confidence.entry_rule_precision, confidence.entry_rule_recall
                );
            }
        }
        Ok(())
    }
}
