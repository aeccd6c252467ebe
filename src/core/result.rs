//! The result model shared by handlers, providers and the search engine.

use serde::Serialize;

use crate::platform::SystemCommand;

/// Group for commands, handler hits and synthesized hints.
pub const GROUP_COMMANDS: i32 = 0;
pub const GROUP_APPS: i32 = 1;
pub const GROUP_FILES: i32 = 2;
pub const GROUP_WINDOWS: i32 = 3;

/// What kind of thing a result represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ResultKind {
    Application,
    File,
    RecentFile,
    Window,
    Command,
    Calculator,
    WebSearch,
    CustomCommand,
    SystemAction,
    QRCode,
    TextTool,
}

/// Data the executor needs to act on a result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Action {
    /// Nothing to do (hints, errors)
    None,

    /// Run a command definition by keyword
    #[serde(rename_all = "camelCase")]
    Command { keyword: String, param: String },

    /// Launch an installed application
    LaunchApp { exec: String },

    /// Open a file or directory with the default handler
    OpenPath { path: String },

    /// Open a URL in the default browser
    OpenUrl { url: String },

    #[serde(rename_all = "camelCase")]
    FocusWindow { window_id: u64 },

    /// Run a shell command and capture its output
    RunShell { command: String },

    /// Put text on the clipboard
    CopyText { text: String },

    /// A parsed color; executing copies the hex form
    Color { hex: String, rgb: String, hsl: String },

    /// Run a built-in system command
    System { command: SystemCommand },

    /// Show the text as a QR code (host-rendered)
    ShowQr { text: String },

    /// Start an audio recording (host-driven)
    StartRecording { label: String },
}

/// One entry of the ranked list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    /// Stable identity for usage tracking; empty for ephemeral hints
    pub id: String,
    pub title: String,
    pub subtitle: String,
    pub kind: ResultKind,
    pub match_score: f64,
    pub group_order: i32,
    pub action: Action,
    pub icon_text: String,
    /// Text the UI highlights in the title
    pub query_match: String,
    /// 1-based display position, assigned after ranking
    pub index: usize,
}

impl SearchResult {
    pub fn new(id: impl Into<String>, title: impl Into<String>, kind: ResultKind) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            subtitle: String::new(),
            kind,
            match_score: 0.0,
            group_order: GROUP_COMMANDS,
            action: Action::None,
            icon_text: String::new(),
            query_match: String::new(),
            index: 0,
        }
    }

    pub fn with_subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = subtitle.into();
        self
    }

    pub fn with_score(mut self, score: f64) -> Self {
        self.match_score = score;
        self
    }

    pub fn with_group(mut self, group_order: i32) -> Self {
        self.group_order = group_order;
        self
    }

    pub fn with_action(mut self, action: Action) -> Self {
        self.action = action;
        self
    }

    pub fn with_icon(mut self, icon_text: impl Into<String>) -> Self {
        self.icon_text = icon_text.into();
        self
    }

    pub fn with_query_match(mut self, query_match: impl Into<String>) -> Self {
        self.query_match = query_match.into();
        self
    }

    /// Whether executing this result should count as a use.
    pub fn is_tracked(&self) -> bool {
        !self.id.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let result = SearchResult::new("", "hint", ResultKind::Command);
        assert_eq!(result.group_order, GROUP_COMMANDS);
        assert_eq!(result.action, Action::None);
        assert!(!result.is_tracked());
    }

    #[test]
    fn test_serializes_camel_case() {
        let result = SearchResult::new("win:42", "Editor", ResultKind::Window)
            .with_group(GROUP_WINDOWS)
            .with_action(Action::FocusWindow { window_id: 42 });
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["groupOrder"], 3);
        assert_eq!(json["kind"], "Window");
        assert_eq!(json["action"]["type"], "focusWindow");
        assert_eq!(json["action"]["windowId"], 42);
    }
}
