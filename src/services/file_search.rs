//! File provider: a top-level scan of the configured roots

use std::collections::HashSet;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use walkdir::WalkDir;

use crate::config::FilesConfig;
use crate::core::fuzzy::fuzzy_score;
use crate::core::result::{Action, ResultKind, SearchResult, GROUP_FILES};
use crate::error::NovaResult;
use crate::search::SearchProvider;

/// A file search result
#[derive(Debug, Clone)]
pub struct FileEntry {
    pub name: String,
    pub path: PathBuf,
    pub is_dir: bool,
}

impl FileEntry {
    /// Get full path as string
    pub fn path_string(&self) -> String {
        self.path.display().to_string()
    }

    /// Get path with ~ for home directory
    pub fn display_path(&self) -> String {
        if let Some(home) = dirs::home_dir() {
            if let Ok(suffix) = self.path.strip_prefix(&home) {
                return format!("~/{}", suffix.display());
            }
        }
        self.path_string()
    }

    fn into_result(self, score: f64) -> SearchResult {
        let icon = if self.is_dir { "📁" } else { "📄" };
        let path = self.path_string();
        SearchResult::new(path.clone(), self.name.clone(), ResultKind::File)
            .with_subtitle(self.display_path())
            .with_score(score)
            .with_group(GROUP_FILES)
            .with_icon(icon)
            .with_action(Action::OpenPath { path })
    }
}

/// Scans the direct children of each root; no index is kept between queries.
pub struct FileProvider {
    roots: Vec<PathBuf>,
    max_items: usize,
    max_results: usize,
    min_score: f64,
    show_hidden: bool,
}

impl FileProvider {
    pub fn new(config: &FilesConfig) -> Self {
        Self::with_roots(config.expanded_roots(), config)
    }

    pub fn with_roots(roots: Vec<PathBuf>, config: &FilesConfig) -> Self {
        Self {
            roots,
            max_items: config.max_items,
            max_results: config.max_results,
            min_score: config.min_score,
            show_hidden: config.show_hidden,
        }
    }

    fn scan(&self, query: &str, cancel: &CancellationToken) -> Vec<(f64, FileEntry)> {
        let mut seen: HashSet<PathBuf> = HashSet::new();
        let mut matches = Vec::new();
        let mut scanned = 0usize;

        'roots: for root in &self.roots {
            if !root.exists() {
                continue;
            }

            for entry in WalkDir::new(root)
                .min_depth(1)
                .max_depth(1)
                .follow_links(false)
                .into_iter()
                .filter_map(|e| e.ok())
            {
                if cancel.is_cancelled() {
                    tracing::trace!(scanned, "file scan cancelled");
                    break 'roots;
                }
                scanned += 1;
                if scanned > self.max_items {
                    tracing::debug!(max_items = self.max_items, "file scan cap reached");
                    break 'roots;
                }

                let name = entry.file_name().to_string_lossy().to_string();
                if !self.show_hidden && name.starts_with('.') {
                    continue;
                }

                let score = fuzzy_score(&name, query);
                if score < self.min_score || !seen.insert(entry.path().to_path_buf()) {
                    continue;
                }

                matches.push((
                    score,
                    FileEntry {
                        name,
                        path: entry.path().to_path_buf(),
                        is_dir: entry.file_type().is_dir(),
                    },
                ));
            }
        }

        matches
    }
}

impl SearchProvider for FileProvider {
    fn name(&self) -> &str {
        "files"
    }

    fn group_order(&self) -> i32 {
        GROUP_FILES
    }

    fn search(&self, query: &str, cancel: &CancellationToken) -> NovaResult<Vec<SearchResult>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let mut matches = self.scan(query, cancel);
        matches.sort_by(|a, b| b.0.total_cmp(&a.0).then_with(|| a.1.name.cmp(&b.1.name)));
        matches.truncate(self.max_results);

        Ok(matches
            .into_iter()
            .map(|(score, entry)| entry.into_result(score))
            .collect())
    }
}
