//! Hot-reloading parameter store
//!
//! Polls the parameter file's modification time and, when it advances,
//! parses and validates the whole document before atomically swapping the
//! in-memory snapshot. A failed reload keeps the previous snapshot and
//! logs once per distinct error. Readers hold an `Arc` snapshot that stays
//! consistent for the duration of a decision tick.

use super::loader::{load_params_file, ParamsError};
use super::types::{MarketParams, ParamsSnapshot};
use crate::market::MarketKey;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock};
use std::time::{Duration, SystemTime};
use tokio::sync::watch;
use tokio::task::JoinHandle;

type Subscriber = Box<dyn Fn(&Arc<ParamsSnapshot>) + Send + Sync>;

/// Parameter store with mtime-based hot reload
pub struct ParamStore {
    path: PathBuf,
    poll_interval: Duration,
    snapshot: RwLock<Arc<ParamsSnapshot>>,
    last_modified: Mutex<Option<SystemTime>>,
    last_error: Mutex<Option<String>>,
    subscribers: Mutex<Vec<Subscriber>>,
}

impl ParamStore {
    /// Create a store and perform the initial load. A missing or invalid
    /// file serves empty defaults (no parameters, no trades).
    pub fn new(path: impl AsRef<Path>, poll_interval: Duration) -> Arc<Self> {
        let store = Arc::new(Self {
            path: path.as_ref().to_path_buf(),
            poll_interval,
            snapshot: RwLock::new(Arc::new(ParamsSnapshot::default())),
            last_modified: Mutex::new(None),
            last_error: Mutex::new(None),
            subscribers: Mutex::new(Vec::new()),
        });

        if store.path.exists() {
            if let Err(e) = store.reload() {
                store.note_error(&e);
            }
        } else {
            tracing::warn!(
                path = %store.path.display(),
                "parameter file missing, serving empty defaults"
            );
        }
        store
    }

    /// Current immutable snapshot
    pub fn get_params(&self) -> Arc<ParamsSnapshot> {
        match self.snapshot.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Parameters for one market from the current snapshot
    pub fn market_params(&self, key: MarketKey) -> Option<Arc<MarketParams>> {
        self.get_params().market(key)
    }

    /// Register a callback invoked after each successful swap.
    /// A panicking subscriber is isolated and does not stop later swaps.
    pub fn subscribe(&self, callback: impl Fn(&Arc<ParamsSnapshot>) + Send + Sync + 'static) {
        if let Ok(mut subs) = self.subscribers.lock() {
            subs.push(Box::new(callback));
        }
    }

    /// One poll step: reload when the file's mtime advanced past the last
    /// observed value. Returns whether a new snapshot was published.
    pub fn poll_once(&self) -> bool {
        let modified = match std::fs::metadata(&self.path).and_then(|m| m.modified()) {
            Ok(ts) => ts,
            Err(e) => {
                self.note_error_msg(&format!(
                    "cannot stat parameter file {}: {e}",
                    self.path.display()
                ));
                return false;
            }
        };

        let is_newer = {
            let last = self.last_modified.lock().ok().and_then(|g| *g);
            last.map_or(true, |last| modified > last)
        };
        if !is_newer {
            return false;
        }

        match self.reload() {
            Ok(()) => true,
            Err(e) => {
                self.note_error(&e);
                false
            }
        }
    }

    /// Parse, validate, and atomically swap. The previous snapshot stays
    /// active on any failure.
    fn reload(&self) -> Result<(), ParamsError> {
        let modified = std::fs::metadata(&self.path)
            .and_then(|m| m.modified())
            .ok();
        let next = Arc::new(load_params_file(&self.path)?);

        if let Ok(mut guard) = self.snapshot.write() {
            *guard = next.clone();
        }
        if let Ok(mut last) = self.last_modified.lock() {
            *last = modified;
        }
        if let Ok(mut err) = self.last_error.lock() {
            *err = None;
        }

        tracing::info!(
            path = %self.path.display(),
            markets = next.markets.len(),
            "parameter snapshot reloaded"
        );
        self.notify(&next);
        Ok(())
    }

    fn notify(&self, snapshot: &Arc<ParamsSnapshot>) {
        let subs = match self.subscribers.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        for sub in subs.iter() {
            if catch_unwind(AssertUnwindSafe(|| sub(snapshot))).is_err() {
                tracing::error!("parameter subscriber panicked");
            }
        }
    }

    fn note_error(&self, error: &ParamsError) {
        self.note_error_msg(&error.to_string());
    }

    /// Log once per distinct error message
    fn note_error_msg(&self, message: &str) {
        let mut last = match self.last_error.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if last.as_deref() != Some(message) {
            tracing::error!(path = %self.path.display(), error = %message, "parameter reload failed, keeping previous snapshot");
            *last = Some(message.to_string());
        }
    }

    /// Spawn the polling task. The returned handle stops it.
    pub fn start_polling(self: &Arc<Self>) -> PollHandle {
        let store = self.clone();
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(store.poll_interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        store.poll_once();
                    }
                    _ = shutdown_rx.changed() => {
                        tracing::debug!("parameter polling stopped");
                        break;
                    }
                }
            }
        });
        PollHandle {
            shutdown: shutdown_tx,
            task,
        }
    }
}

/// Handle to a running poll task
pub struct PollHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl PollHandle {
    /// Signal the poll task to stop and wait for it to exit
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        let _ = self.task.await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn write_params(path: &Path, body: &str) {
        let mut file = std::fs::File::create(path).unwrap();
        file.write_all(body.as_bytes()).unwrap();
    }

    #[test]
    fn test_missing_file_serves_empty_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = ParamStore::new(dir.path().join("absent.json"), Duration::from_secs(3));
        assert!(store.get_params().is_empty());
        assert!(store.market_params(MarketKey::Btc15m).is_none());
    }

    #[test]
    fn test_initial_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("params.json");
        write_params(
            &path,
            r#"{"BTC_15m": {"entry_params": {"up_price_min": 0.4, "up_price_max": 0.6}}}"#,
        );

        let store = ParamStore::new(&path, Duration::from_secs(3));
        assert!(store.market_params(MarketKey::Btc15m).is_some());
        assert!(store.market_params(MarketKey::Eth1h).is_none());
    }

    #[test]
    fn test_bad_reload_keeps_previous_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("params.json");
        write_params(&path, r#"{"BTC_15m": {"entry_params": {}}}"#);

        let store = ParamStore::new(&path, Duration::from_secs(3));
        let before = store.get_params();
        assert_eq!(before.markets.len(), 1);

        write_params(&path, "{broken");
        // Force the mtime check to consider the file new
        *store.last_modified.lock().unwrap() = None;
        assert!(!store.poll_once());
        assert_eq!(store.get_params(), before);
    }

    #[test]
    fn test_poll_swaps_on_new_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("params.json");
        write_params(&path, "{}");

        let store = ParamStore::new(&path, Duration::from_secs(3));
        assert!(store.get_params().is_empty());

        write_params(&path, r#"{"ETH_15m": {"entry_params": {}}}"#);
        *store.last_modified.lock().unwrap() = None;
        assert!(store.poll_once());
        assert!(store.market_params(MarketKey::Eth15m).is_some());
    }

    #[test]
    fn test_unchanged_mtime_does_not_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("params.json");
        write_params(&path, "{}");

        let store = ParamStore::new(&path, Duration::from_secs(3));
        // mtime recorded at initial load; second poll sees nothing newer
        assert!(!store.poll_once());
    }

    #[test]
    fn test_subscribers_notified_and_panics_isolated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("params.json");
        write_params(&path, "{}");

        let store = ParamStore::new(&path, Duration::from_secs(3));
        let calls = Arc::new(AtomicUsize::new(0));

        store.subscribe(|_| panic!("bad subscriber"));
        let counter = calls.clone();
        store.subscribe(move |snap| {
            counter.fetch_add(snap.markets.len(), Ordering::SeqCst);
        });

        write_params(&path, r#"{"BTC_1h": {"entry_params": {}}}"#);
        *store.last_modified.lock().unwrap() = None;
        assert!(store.poll_once());
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // A second swap still works after the panicking subscriber
        write_params(
            &path,
            r#"{"BTC_1h": {"entry_params": {}}, "ETH_1h": {"entry_params": {}}}"#,
        );
        *store.last_modified.lock().unwrap() = None;
        assert!(store.poll_once());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_polling_task_stops() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("params.json");
        write_params(&path, "{}");

        let store = ParamStore::new(&path, Duration::from_millis(10));
        let handle = store.start_polling();
        tokio::time::sleep(Duration::from_millis(30)).await;
        handle.stop().await;
    }
}
