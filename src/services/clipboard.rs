//! Clipboard history module for tracking recent clipboard items
//!
//! The host pushes entries as it observes them; the search engine serves
//! them for the clipboard prefix.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::time::Instant;

use crate::core::result::{Action, ResultKind, SearchResult};

/// Entry in clipboard history
#[derive(Debug, Clone)]
pub struct ClipboardEntry {
    pub content: String,
    pub timestamp: Instant,
}

impl ClipboardEntry {
    /// Get a preview of the content (first line, limited chars)
    pub fn preview(&self, max_chars: usize) -> String {
        let first_line = self.content.lines().next().unwrap_or(&self.content);
        if first_line.chars().count() > max_chars {
            let cut: String = first_line.chars().take(max_chars).collect();
            format!("{}...", cut)
        } else {
            first_line.to_string()
        }
    }

    /// Get relative time description
    pub fn time_ago(&self) -> String {
        let secs = self.timestamp.elapsed().as_secs();

        if secs < 60 {
            "just now".to_string()
        } else if secs < 3600 {
            format!("{}m ago", secs / 60)
        } else if secs < 86400 {
            format!("{}h ago", secs / 3600)
        } else {
            format!("{}d ago", secs / 86400)
        }
    }
}

/// Bounded, de-duplicated, most-recent-first history
pub struct ClipboardHistory {
    items: Mutex<VecDeque<ClipboardEntry>>,
    max_items: usize,
}

impl ClipboardHistory {
    /// Create a new clipboard history with max items limit
    pub fn new(max_items: usize) -> Self {
        Self {
            items: Mutex::new(VecDeque::with_capacity(max_items)),
            max_items,
        }
    }

    /// Add content to history; blank content is ignored
    pub fn add(&self, content: String) {
        if content.trim().is_empty() {
            return;
        }

        let mut items = self.items.lock();

        // Remove if already exists (move to front)
        items.retain(|item| item.content != content);

        items.push_front(ClipboardEntry {
            content,
            timestamp: Instant::now(),
        });

        while items.len() > self.max_items {
            items.pop_back();
        }
    }

    /// Items whose content contains `query` (case-insensitive), most recent first
    pub fn search(&self, query: &str) -> Vec<ClipboardEntry> {
        let query_lower = query.to_lowercase();
        self.items
            .lock()
            .iter()
            .filter(|item| item.content.to_lowercase().contains(&query_lower))
            .cloned()
            .collect()
    }

    /// Get all items (most recent first)
    pub fn all(&self) -> Vec<ClipboardEntry> {
        self.items.lock().iter().cloned().collect()
    }

    /// Number of items in history
    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    /// Check if history is empty
    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }

    /// Results for the clipboard prefix; an empty filter lists everything.
    pub fn results(&self, filter: &str, limit: usize) -> Vec<SearchResult> {
        let filter = filter.trim();
        let items = if filter.is_empty() {
            self.all()
        } else {
            self.search(filter)
        };

        items
            .into_iter()
            .take(limit)
            .map(|entry| {
                SearchResult::new("", entry.preview(60), ResultKind::TextTool)
                    .with_subtitle(entry.time_ago())
                    .with_score(1.0)
                    .with_icon("📋")
                    .with_action(Action::CopyText {
                        text: entry.content,
                    })
            })
            .collect()
    }
}

impl Default for ClipboardHistory {
    fn default() -> Self {
        Self::new(50)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clipboard_history() {
        let history = ClipboardHistory::new(5);

        history.add("first".to_string());
        history.add("second".to_string());
        history.add("third".to_string());

        assert_eq!(history.len(), 3);
        let contents: Vec<String> = history.all().into_iter().map(|e| e.content).collect();
        assert_eq!(contents, vec!["third", "second", "first"]); // Most recent first
    }

    #[test]
    fn test_deduplication() {
        let history = ClipboardHistory::new(5);

        history.add("first".to_string());
        history.add("second".to_string());
        history.add("first".to_string()); // Duplicate

        assert_eq!(history.len(), 2);
        assert_eq!(history.all()[0].content, "first"); // Moved to front
    }

    #[test]
    fn test_bounded() {
        let history = ClipboardHistory::new(2);
        for item in ["a", "b", "c", "   "] {
            history.add(item.to_string());
        }
        let contents: Vec<String> = history.all().into_iter().map(|e| e.content).collect();
        assert_eq!(contents, vec!["c", "b"]);
    }

    #[test]
    fn test_search() {
        let history = ClipboardHistory::new(10);

        history.add("hello world".to_string());
        history.add("goodbye world".to_string());
        history.add("Hello there".to_string());

        let results = history.search("hello");
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn test_results_copy_full_content() {
        let history = ClipboardHistory::new(10);
        history.add("line one\nline two".to_string());
        history.add("other".to_string());

        let results = history.results("line", 10);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].title, "line one");
        assert_eq!(
            results[0].action,
            Action::CopyText {
                text: "line one\nline two".to_string()
            }
        );
        assert_eq!(history.results("", 1).len(), 1);
    }

    #[test]
    fn test_preview() {
        let entry = ClipboardEntry {
            content: "This is a very long line of text that should be truncated".to_string(),
            timestamp: Instant::now(),
        };

        let preview = entry.preview(20);
        assert!(preview.len() <= 23); // 20 + "..."

        let wide = ClipboardEntry {
            content: "日本語のテキスト".to_string(),
            timestamp: Instant::now(),
        };
        assert_eq!(wide.preview(3), "日本語...");
    }
}
