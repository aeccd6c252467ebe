//! Search provider trait for the concurrent fan-out.
//!
//! Providers are independent result sources (applications, files, windows).
//! Each one tags its own group and icon, honors the cancellation token at
//! iteration boundaries, and writes into a shared [`ResultCollector`].

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use crate::core::result::SearchResult;
use crate::error::NovaResult;

/// A source that contributes results for a query
pub trait SearchProvider: Send + Sync {
    /// Unique name of this provider (e.g., "apps", "files", "windows")
    fn name(&self) -> &str;

    /// Group order stamped on every result this provider returns
    fn group_order(&self) -> i32;

    /// Search for `query`, stopping early once `cancel` fires.
    ///
    /// Runs on a blocking thread; implementations must bound their own work
    /// (item caps, process timeouts).
    fn search(&self, query: &str, cancel: &CancellationToken) -> NovaResult<Vec<SearchResult>>;
}

/// Mutex-guarded sink the fan-out tasks write into.
#[derive(Default)]
pub struct ResultCollector {
    results: Mutex<Vec<SearchResult>>,
}

impl ResultCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extend(&self, results: impl IntoIterator<Item = SearchResult>) {
        self.results.lock().extend(results);
    }

    pub fn len(&self) -> usize {
        self.results.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.lock().is_empty()
    }

    /// Take everything collected so far.
    pub fn drain(&self) -> Vec<SearchResult> {
        std::mem::take(&mut *self.results.lock())
    }
}
