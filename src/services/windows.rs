//! Window provider: fuzzy-matches the titles of open top-level windows.

use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::core::fuzzy::fuzzy_score;
use crate::core::result::{Action, ResultKind, SearchResult, GROUP_WINDOWS};
use crate::error::NovaResult;
use crate::platform::WindowSource;
use crate::search::SearchProvider;

pub struct WindowProvider {
    source: Arc<dyn WindowSource>,
    min_score: f64,
}

impl WindowProvider {
    pub fn new(source: Arc<dyn WindowSource>, min_score: f64) -> Self {
        Self { source, min_score }
    }
}

impl SearchProvider for WindowProvider {
    fn name(&self) -> &str {
        "windows"
    }

    fn group_order(&self) -> i32 {
        GROUP_WINDOWS
    }

    fn search(&self, query: &str, cancel: &CancellationToken) -> NovaResult<Vec<SearchResult>> {
        let query = query.trim();
        let windows = self.source.list_windows()?;

        let mut results = Vec::new();
        for window in windows {
            if cancel.is_cancelled() {
                break;
            }

            let score = fuzzy_score(&window.title, query).max(fuzzy_score(&window.app_name, query));
            if score < self.min_score {
                continue;
            }

            results.push(
                SearchResult::new(format!("win:{}", window.id), window.title, ResultKind::Window)
                    .with_subtitle(window.app_name)
                    .with_score(score)
                    .with_group(GROUP_WINDOWS)
                    .with_icon("🪟")
                    .with_action(Action::FocusWindow {
                        window_id: window.id,
                    }),
            );
        }

        results.sort_by(|a, b| b.match_score.total_cmp(&a.match_score));
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NovaError;
    use crate::platform::WindowInfo;

    struct FixedWindows(Vec<WindowInfo>);

    impl WindowSource for FixedWindows {
        fn list_windows(&self) -> NovaResult<Vec<WindowInfo>> {
            Ok(self.0.clone())
        }
    }

    struct BrokenWindows;

    impl WindowSource for BrokenWindows {
        fn list_windows(&self) -> NovaResult<Vec<WindowInfo>> {
            Err(NovaError::Process("no display".to_string()))
        }
    }

    fn window(id: u64, title: &str) -> WindowInfo {
        WindowInfo {
            id,
            title: title.to_string(),
            app_name: "host".to_string(),
        }
    }

    #[test]
    fn test_matches_titles() {
        let provider = WindowProvider::new(
            Arc::new(FixedWindows(vec![
                window(1, "Inbox - Mail"),
                window(2, "Cargo.toml - editor"),
                window(3, "Terminal"),
            ])),
            0.4,
        );

        let results = provider.search("mail", &CancellationToken::new()).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "win:1");
        assert_eq!(results[0].group_order, GROUP_WINDOWS);
        assert_eq!(results[0].action, Action::FocusWindow { window_id: 1 });
    }

    #[test]
    fn test_source_errors_propagate() {
        let provider = WindowProvider::new(Arc::new(BrokenWindows), 0.4);
        assert!(provider.search("mail", &CancellationToken::new()).is_err());
    }

    #[test]
    fn test_cancelled_before_iteration() {
        let provider =
            WindowProvider::new(Arc::new(FixedWindows(vec![window(1, "Inbox - Mail")])), 0.4);
        let cancel = CancellationToken::new();
        cancel.cancel();
        assert!(provider.search("mail", &cancel).unwrap().is_empty());
    }
}
