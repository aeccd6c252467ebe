//! Usage tracking for ranking boosts.
//!
//! Every executed result with a stable id gets a use count and a last-used
//! timestamp. The tracker turns those into an additive boost:
//!
//! ```text
//! score = base + log10(use_count + 1) × 0.5 + recency_bonus
//! ```
//!
//! where the recency bonus is 1.0 inside a day, 0.5 inside a week, 0.2
//! inside thirty days and 0 after that.
//!
//! The tracker is the only owner of usage data. Persistence goes through a
//! [`UsageStore`]; the store is only touched on load and flush, never while a
//! query is being ranked.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::NovaResult;

const DAY_SECS: u64 = 86_400;

/// Source of "now" as unix seconds.
pub trait Clock: Send + Sync {
    fn now(&self) -> u64;
}

/// Wall-clock time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
    }
}

/// Usage data for one result id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageRecord {
    /// Number of times the result was executed.
    pub use_count: u32,

    /// Unix timestamp of the last execution.
    pub last_used_at: u64,
}

/// Persistence collaborator for usage records.
pub trait UsageStore: Send + Sync {
    fn load(&self) -> NovaResult<HashMap<String, UsageRecord>>;
    fn save(&self, records: &HashMap<String, UsageRecord>) -> NovaResult<()>;
}

/// Usage records stored as a JSON object keyed by result id.
pub struct JsonUsageStore {
    path: PathBuf,
}

impl JsonUsageStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl UsageStore for JsonUsageStore {
    fn load(&self) -> NovaResult<HashMap<String, UsageRecord>> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }
        let contents = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    fn save(&self, records: &HashMap<String, UsageRecord>) -> NovaResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(records)?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}

#[derive(Default)]
struct TrackerState {
    records: HashMap<String, UsageRecord>,
    dirty: bool,
}

/// Thread-safe usage tracker shared by every query cycle.
pub struct UsageTracker {
    state: Mutex<TrackerState>,
    clock: Arc<dyn Clock>,
}

impl UsageTracker {
    /// Create an empty tracker on the system clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Mutex::new(TrackerState::default()),
            clock,
        }
    }

    /// Record that a result was used: bump the count and stamp the time.
    pub fn record_use(&self, id: &str) {
        let now = self.clock.now();
        let mut state = self.state.lock();
        let record = state.records.entry(id.to_string()).or_insert(UsageRecord {
            use_count: 0,
            last_used_at: now,
        });
        record.use_count = record.use_count.saturating_add(1);
        record.last_used_at = now;
        state.dirty = true;
    }

    /// Number of recorded uses; unseen ids report 0.
    pub fn use_count(&self, id: &str) -> u32 {
        self.state
            .lock()
            .records
            .get(id)
            .map(|r| r.use_count)
            .unwrap_or(0)
    }

    /// Unix timestamp of the last use, if the id was ever used.
    pub fn last_used_at(&self, id: &str) -> Option<u64> {
        self.state.lock().records.get(id).map(|r| r.last_used_at)
    }

    /// Apply the frequency and recency boost to `base_score`.
    pub fn compute_score(&self, id: &str, base_score: f64) -> f64 {
        let Some(record) = self.state.lock().records.get(id).copied() else {
            return base_score;
        };

        let frequency = (record.use_count as f64 + 1.0).log10() * 0.5;
        let age = self.clock.now().saturating_sub(record.last_used_at);
        let recency = if age < DAY_SECS {
            1.0
        } else if age < 7 * DAY_SECS {
            0.5
        } else if age < 30 * DAY_SECS {
            0.2
        } else {
            0.0
        };

        base_score + frequency + recency
    }

    /// Ids ordered by last use, most recent first.
    pub fn recent_ids(&self, max: usize) -> Vec<String> {
        let state = self.state.lock();
        let mut entries: Vec<(&String, &UsageRecord)> = state
            .records
            .iter()
            .filter(|(_, r)| r.use_count > 0)
            .collect();
        entries.sort_by(|a, b| b.1.last_used_at.cmp(&a.1.last_used_at).then(a.0.cmp(b.0)));
        entries
            .into_iter()
            .take(max)
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Replace in-memory data with what the store holds.
    ///
    /// A store that cannot be read leaves the tracker empty.
    pub fn load_from(&self, store: &dyn UsageStore) {
        let records = match store.load() {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(error = %e, "failed to load usage data, starting empty");
                HashMap::new()
            }
        };
        tracing::debug!(entries = records.len(), "loaded usage data");

        let mut state = self.state.lock();
        state.records = records;
        state.dirty = false;
    }

    /// Write pending changes to the store.
    ///
    /// The lock is only held to take a snapshot. Returns `Ok(false)` when
    /// there was nothing to write.
    pub fn flush_to(&self, store: &dyn UsageStore) -> NovaResult<bool> {
        let snapshot = {
            let mut state = self.state.lock();
            if !state.dirty {
                return Ok(false);
            }
            state.dirty = false;
            state.records.clone()
        };

        if let Err(e) = store.save(&snapshot) {
            self.state.lock().dirty = true;
            return Err(e);
        }
        Ok(true)
    }

    /// Get the number of tracked ids.
    pub fn len(&self) -> usize {
        self.state.lock().records.len()
    }

    /// Check if nothing has been tracked.
    pub fn is_empty(&self) -> bool {
        self.state.lock().records.is_empty()
    }
}

impl Default for UsageTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Flush usage data every `interval`, and once more when `shutdown` fires.
pub fn spawn_periodic_flush(
    tracker: Arc<UsageTracker>,
    store: Arc<dyn UsageStore>,
    interval: Duration,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // The first tick completes immediately
        ticker.tick().await;

        loop {
            let stopping = tokio::select! {
                _ = ticker.tick() => false,
                _ = shutdown.cancelled() => true,
            };

            let tracker = Arc::clone(&tracker);
            let store = Arc::clone(&store);
            let flushed =
                tokio::task::spawn_blocking(move || tracker.flush_to(store.as_ref())).await;

            match flushed {
                Ok(Ok(true)) => tracing::debug!("flushed usage data"),
                Ok(Ok(false)) => {}
                Ok(Err(e)) => tracing::warn!(error = %e, "failed to flush usage data"),
                Err(e) => tracing::warn!(error = %e, "usage flush task failed"),
            }

            if stopping {
                break;
            }
        }
    })
}
