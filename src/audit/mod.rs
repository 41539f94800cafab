//! Decision audit log
//!
//! Append-only JSONL record of every decision tick, used for parity
//! debugging against the reference trader. Records flow through a bounded
//! channel into a writer task; the decision path never blocks on I/O and
//! never observes write failures.

use crate::market::MarketKey;
use crate::policy::{DecisionReason, Inventory, Side, SideEntry};
use crate::params::ExecutionModelType;
use rust_decimal::Decimal;
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

/// One line of the audit file. New fields must be additive.
#[derive(Debug, Clone, Serialize)]
pub struct AuditRecord {
    pub decision_id: Uuid,
    pub ts_ms: i64,
    /// ISO-8601 rendering of `ts_ms` for human scanning
    pub time_iso: String,
    pub market: MarketKey,
    pub up_price: Decimal,
    pub down_price: Decimal,
    pub price_source: &'static str,
    pub price_bucket: Option<usize>,
    pub price_bucket_label: Option<String>,
    pub inventory_bucket: Option<String>,
    pub inventory_ratio: Option<Decimal>,
    pub entry_up: Option<SideEntry>,
    pub entry_down: Option<SideEntry>,
    pub side: Option<Side>,
    pub reason: Option<DecisionReason>,
    pub should_trade: bool,
    pub raw_size: Option<Decimal>,
    pub capped_size: Option<Decimal>,
    pub size_table_key: Option<String>,
    pub inventory: Inventory,
    pub fill_model: Option<ExecutionModelType>,
    pub snapshot_side_price: Option<Decimal>,
    pub fill_price: Option<Decimal>,
    pub fill_bias: Option<Decimal>,
    pub slippage_offset: Option<Decimal>,
}

impl AuditRecord {
    /// Start a record for one tick; the pipeline fills the rest in
    pub fn for_tick(
        decision_id: Uuid,
        market: MarketKey,
        ts_ms: i64,
        up_price: Decimal,
        down_price: Decimal,
    ) -> Self {
        let time_iso = chrono::DateTime::from_timestamp_millis(ts_ms)
            .map(|t| t.to_rfc3339())
            .unwrap_or_default();
        Self {
            decision_id,
            ts_ms,
            time_iso,
            market,
            up_price,
            down_price,
            price_source: "tape",
            price_bucket: None,
            price_bucket_label: None,
            inventory_bucket: None,
            inventory_ratio: None,
            entry_up: None,
            entry_down: None,
            side: None,
            reason: None,
            should_trade: false,
            raw_size: None,
            capped_size: None,
            size_table_key: None,
            inventory: Inventory::default(),
            fill_model: None,
            snapshot_side_price: None,
            fill_price: None,
            fill_bias: None,
            slippage_offset: None,
        }
    }
}

/// Lock-free audit counters
#[derive(Debug, Default)]
pub struct AtomicAuditStats {
    pub records_received: AtomicU64,
    pub records_written: AtomicU64,
    pub records_dropped: AtomicU64,
    pub write_errors: AtomicU64,
}

impl AtomicAuditStats {
    /// Snapshot of current counters
    pub fn snapshot(&self) -> AuditStats {
        AuditStats {
            records_received: self.records_received.load(Ordering::Relaxed),
            records_written: self.records_written.load(Ordering::Relaxed),
            records_dropped: self.records_dropped.load(Ordering::Relaxed),
            write_errors: self.write_errors.load(Ordering::Relaxed),
        }
    }
}

/// Audit counter snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AuditStats {
    pub records_received: u64,
    pub records_written: u64,
    pub records_dropped: u64,
    pub write_errors: u64,
}

/// Audit log configuration
#[derive(Debug, Clone)]
pub struct AuditConfig {
    pub path: PathBuf,
    pub channel_capacity: usize,
    pub flush_interval_secs: u64,
}

impl AuditConfig {
    /// Defaults around a target file path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            channel_capacity: 10_000,
            flush_interval_secs: 5,
        }
    }
}

/// Append-only decision audit sink
pub struct AuditLog {
    tx: mpsc::Sender<AuditRecord>,
    stats: Arc<AtomicAuditStats>,
}

impl AuditLog {
    /// Create the sink and spawn its writer task
    pub fn new(config: AuditConfig) -> Self {
        let (tx, rx) = mpsc::channel(config.channel_capacity);
        let stats = Arc::new(AtomicAuditStats::default());

        let writer_stats = stats.clone();
        tokio::spawn(async move {
            run_writer(rx, config, writer_stats).await;
        });

        Self { tx, stats }
    }

    /// Queue a record without blocking. A full channel drops the record
    /// and counts the drop; decisions are never delayed by the sink.
    pub fn record(&self, record: AuditRecord) {
        self.stats.records_received.fetch_add(1, Ordering::Relaxed);
        match self.tx.try_send(record) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                self.stats.records_dropped.fetch_add(1, Ordering::Relaxed);
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                self.stats.records_dropped.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// Current counter snapshot
    pub fn stats(&self) -> AuditStats {
        self.stats.snapshot()
    }
}

/// Writer task: serialize records to one JSON object per line, flushing
/// periodically. Write failures are counted and logged, never propagated.
async fn run_writer(
    mut rx: mpsc::Receiver<AuditRecord>,
    config: AuditConfig,
    stats: Arc<AtomicAuditStats>,
) {
    if let Some(parent) = config.path.parent() {
        if !parent.as_os_str().is_empty() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                tracing::error!(error = %e, path = %config.path.display(), "cannot create audit directory");
            }
        }
    }

    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.path)
        .map(std::io::BufWriter::new)
        .map_err(|e| {
            tracing::error!(error = %e, path = %config.path.display(), "cannot open audit file, discarding records");
            stats.write_errors.fetch_add(1, Ordering::Relaxed);
        })
        .ok();

    let flush_interval = tokio::time::Duration::from_secs(config.flush_interval_secs.max(1));
    let mut dirty = false;

    loop {
        tokio::select! {
            received = rx.recv() => {
                match received {
                    Some(record) => {
                        let Some(out) = file.as_mut() else {
                            stats.records_dropped.fetch_add(1, Ordering::Relaxed);
                            continue;
                        };
                        match serde_json::to_string(&record) {
                            Ok(line) => {
                                if let Err(e) = writeln!(out, "{line}") {
                                    stats.write_errors.fetch_add(1, Ordering::Relaxed);
                                    tracing::error!(error = %e, "audit write failed");
                                } else {
                                    stats.records_written.fetch_add(1, Ordering::Relaxed);
                                    dirty = true;
                                }
                            }
                            Err(e) => {
                                stats.write_errors.fetch_add(1, Ordering::Relaxed);
                                tracing::error!(error = %e, "audit record serialization failed");
                            }
                        }
                    }
                    None => {
                        if let Some(out) = file.as_mut() {
                            let _ = out.flush();
                        }
                        tracing::debug!("audit writer shutting down");
                        break;
                    }
                }
            }
            _ = tokio::time::sleep(flush_interval) => {
                if dirty {
                    if let Some(out) = file.as_mut() {
                        if let Err(e) = out.flush() {
                            stats.write_errors.fetch_add(1, Ordering::Relaxed);
                            tracing::error!(error = %e, "audit flush failed");
                        }
                    }
                    dirty = false;
                }
            }
        }
    }
}
