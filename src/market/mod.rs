//! Canonical market keys
//!
//! All per-market state and parameters are partitioned by one of four
//! canonical keys. Venue slugs are normalized by case-insensitive substring
//! matching; anything that does not resolve carries no parameters and
//! therefore never trades.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical market identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MarketKey {
    /// Bitcoin 15-minute up/down market
    #[serde(rename = "BTC_15m")]
    Btc15m,
    /// Ethereum 15-minute up/down market
    #[serde(rename = "ETH_15m")]
    Eth15m,
    /// Bitcoin 1-hour up/down market
    #[serde(rename = "BTC_1h")]
    Btc1h,
    /// Ethereum 1-hour up/down market
    #[serde(rename = "ETH_1h")]
    Eth1h,
}

impl MarketKey {
    /// All canonical keys
    pub const ALL: [MarketKey; 4] = [
        MarketKey::Btc15m,
        MarketKey::Eth15m,
        MarketKey::Btc1h,
        MarketKey::Eth1h,
    ];

    /// Canonical string form (`BTC_15m`, ...)
    pub fn as_str(&self) -> &'static str {
        match self {
            MarketKey::Btc15m => "BTC_15m",
            MarketKey::Eth15m => "ETH_15m",
            MarketKey::Btc1h => "BTC_1h",
            MarketKey::Eth1h => "ETH_1h",
        }
    }

    /// Normalize a venue-specific identifier or slug to a canonical key.
    ///
    /// Inputs already in canonical form are returned unchanged. Otherwise
    /// the asset is matched on `btc`/`bitcoin` or `eth`/`ethereum` and the
    /// timeframe on `15` or `1h`/`1 hour`, case-insensitively. Unmatched
    /// inputs yield `None`.
    pub fn normalize(raw: &str) -> Option<MarketKey> {
        for key in Self::ALL {
            if raw == key.as_str() {
                return Some(key);
            }
        }

        let lower = raw.to_ascii_lowercase();
        let is_btc = lower.contains("btc") || lower.contains("bitcoin");
        let is_eth = lower.contains("eth") || lower.contains("ethereum");

        let fifteen = lower.contains("15");
        let hourly = lower.contains("1h") || lower.contains("1 hour");

        match (is_btc, is_eth) {
            (true, false) if fifteen => Some(MarketKey::Btc15m),
            (true, false) if hourly => Some(MarketKey::Btc1h),
            (false, true) if fifteen => Some(MarketKey::Eth15m),
            (false, true) if hourly => Some(MarketKey::Eth1h),
            _ => None,
        }
    }
}

impl fmt::Display for MarketKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
