//! Tape ingress types and offline replay
//!
//! A tape event is a single two-sided price observation pushed by the feed.
//! `TapeReader` replays a JSONL tape file for offline runs, yielding events
//! in file order.

use crate::market::MarketKey;
use crate::policy::Side;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// A raw tape record as pushed by the feed (market key not yet normalized)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TapeEvent {
    /// Venue-specific market identifier or slug
    pub market: String,
    /// Observation time, Unix milliseconds
    pub timestamp_ms: i64,
    /// UP side price in [0, 1]
    pub up_price: Decimal,
    /// DOWN side price in [0, 1]
    pub down_price: Decimal,
}

/// A normalized point-in-time observation of both side prices
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TapeState {
    /// Canonical market key
    pub market: MarketKey,
    /// Observation time, Unix milliseconds
    pub ts_ms: i64,
    /// UP side price
    pub up_price: Decimal,
    /// DOWN side price
    pub down_price: Decimal,
}

impl TapeState {
    /// Price of the given side at this observation
    pub fn side_price(&self, side: Side) -> Decimal {
        match side {
            Side::Up => self.up_price,
            Side::Down => self.down_price,
        }
    }

    /// Absolute deviation of `up + down` from 1
    pub fn price_sum_deviation(&self) -> Decimal {
        (self.up_price + self.down_price - Decimal::ONE).abs()
    }
}

/// Tape replay errors
#[derive(Debug, Error)]
pub enum TapeError {
    /// Failed to open or read the tape file
    #[error("failed to read tape {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// A line failed to decode
    #[error("bad tape record at line {line}: {source}")]
    Decode {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// Streams `TapeEvent`s out of a JSONL file, one object per line
#[derive(Debug)]
pub struct TapeReader<R> {
    lines: Lines<R>,
    path: PathBuf,
    line_no: usize,
}

impl TapeReader<BufReader<File>> {
    /// Open a tape file for replay
    pub fn open(path: impl AsRef<Path>) -> Result<Self, TapeError> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).map_err(|source| TapeError::Io {
            path: path.clone(),
            source,
        })?;
        Ok(Self {
            lines: BufReader::new(file).lines(),
            path,
            line_no: 0,
        })
    }
}

impl<R: BufRead> Iterator for TapeReader<R> {
    type Item = Result<TapeEvent, TapeError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.line_no += 1;
            match self.lines.next()? {
                Ok(line) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    return Some(serde_json::from_str(&line).map_err(|source| {
                        TapeError::Decode {
                            line: self.line_no,
                            source,
                        }
                    }));
                }
                Err(source) => {
                    return Some(Err(TapeError::Io {
                        path: self.path.clone(),
                        source,
                    }))
                }
            }
        }
    }
}
