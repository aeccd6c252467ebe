use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

use crate::core::fuzzy::fuzzy_score;
use crate::core::result::{Action, ResultKind, SearchResult, GROUP_APPS};
use crate::error::NovaResult;
use crate::platform::{self, AppEntry};
use crate::search::SearchProvider;
use crate::services::usage::UsageTracker;

/// Results returned per query
const MAX_APP_RESULTS: usize = 8;

type AppLoader = Box<dyn Fn() -> Vec<AppEntry> + Send + Sync>;

struct Snapshot {
    loaded_at: Instant,
    entries: Arc<Vec<AppEntry>>,
}

/// Installed applications, re-read once the snapshot is older than the TTL
pub struct AppIndex {
    loader: AppLoader,
    ttl: Duration,
    snapshot: Mutex<Option<Snapshot>>,
    matcher: SkimMatcherV2,
    usage: Arc<UsageTracker>,
}

impl AppIndex {
    /// Index backed by the platform's application discovery
    pub fn new(ttl: Duration, usage: Arc<UsageTracker>) -> Self {
        Self::with_loader(Box::new(platform::discover_apps), ttl, usage)
    }

    pub fn with_loader(loader: AppLoader, ttl: Duration, usage: Arc<UsageTracker>) -> Self {
        Self {
            loader,
            ttl,
            snapshot: Mutex::new(None),
            matcher: SkimMatcherV2::default(),
            usage,
        }
    }

    /// Current entries, reloading when missing or stale
    pub fn entries(&self) -> Arc<Vec<AppEntry>> {
        let mut snapshot = self.snapshot.lock();
        match snapshot.as_ref() {
            Some(current) if current.loaded_at.elapsed() < self.ttl => Arc::clone(&current.entries),
            _ => {
                let entries = Arc::new((self.loader)());
                tracing::info!(count = entries.len(), "indexed applications");
                *snapshot = Some(Snapshot {
                    loaded_at: Instant::now(),
                    entries: Arc::clone(&entries),
                });
                entries
            }
        }
    }

    /// Drop the snapshot so the next search reloads
    pub fn invalidate(&self) {
        *self.snapshot.lock() = None;
    }

    /// Whether the skim matcher accepts the entry at all
    fn is_candidate(&self, entry: &AppEntry, query_lower: &str) -> bool {
        self.matcher
            .fuzzy_match(&entry.name.to_lowercase(), query_lower)
            .is_some()
            || entry
                .keywords
                .iter()
                .any(|kw| self.matcher.fuzzy_match(&kw.to_lowercase(), query_lower).is_some())
            || entry
                .description
                .as_ref()
                .is_some_and(|d| self.matcher.fuzzy_match(&d.to_lowercase(), query_lower).is_some())
    }

    fn base_score(entry: &AppEntry, query: &str) -> f64 {
        // Keyword hits count for a bit less than name hits
        let keyword_score = entry
            .keywords
            .iter()
            .map(|kw| fuzzy_score(kw, query) * 0.8)
            .fold(0.0, f64::max);
        fuzzy_score(&entry.name, query).max(keyword_score)
    }
}

impl SearchProvider for AppIndex {
    fn name(&self) -> &str {
        "apps"
    }

    fn group_order(&self) -> i32 {
        GROUP_APPS
    }

    fn search(&self, query: &str, cancel: &CancellationToken) -> NovaResult<Vec<SearchResult>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        let query_lower = query.to_lowercase();
        let entries = self.entries();

        let mut results = Vec::new();
        for entry in entries.iter() {
            if cancel.is_cancelled() {
                break;
            }
            if !self.is_candidate(entry, &query_lower) {
                continue;
            }

            let id = format!("app:{}", entry.id);
            let score = self.usage.compute_score(&id, Self::base_score(entry, query));
            let subtitle = entry.description.clone().unwrap_or_else(|| entry.exec.clone());

            results.push(
                SearchResult::new(id, entry.name.clone(), ResultKind::Application)
                    .with_subtitle(subtitle)
                    .with_score(score)
                    .with_group(GROUP_APPS)
                    .with_icon("🚀")
                    .with_action(Action::LaunchApp {
                        exec: entry.exec.clone(),
                    }),
            );
        }

        results.sort_by(|a, b| b.match_score.total_cmp(&a.match_score));
        results.truncate(MAX_APP_RESULTS);
        Ok(results)
    }
}
