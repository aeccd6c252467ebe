//! Result execution module - the process/launch collaborator and the
//! outcome reported back to the host.

use serde::Serialize;
use std::time::Duration;

use crate::error::NovaResult;
use crate::platform::SystemCommand;

/// An OS-level action with every template already resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchRequest {
    /// Open a URL in the default browser
    OpenUrl(String),

    /// Open a file or directory with the default handler
    OpenPath(String),

    /// Start a program with whitespace-separated arguments
    Program {
        path: String,
        args: String,
        elevated: bool,
        hidden: bool,
    },

    /// Run a shell command without waiting for it
    Shell {
        command: String,
        elevated: bool,
        hidden: bool,
    },

    /// Launch a desktop application by its exec line
    App { exec: String },

    /// Execute a system command (lock, sleep, logout, restart, shutdown)
    System(SystemCommand),

    /// Copy text to the clipboard
    CopyText(String),

    /// Raise a top-level window
    FocusWindow(u64),
}

/// Captured output of a finished process
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    /// `None` when the process was killed by a signal
    pub exit_code: Option<i32>,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Performs launches for the engine.
pub trait Launcher: Send + Sync {
    /// Start the requested action; does not wait for launched programs.
    fn launch(&self, request: &LaunchRequest) -> NovaResult<()>;

    /// Run `command` through the shell and capture its output, killing it
    /// after `timeout`.
    fn run_captured(&self, command: &str, timeout: Duration) -> NovaResult<CommandOutput>;
}

/// Work the engine hands back to the host UI instead of doing itself
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum HostAction {
    /// Render `text` as a QR code
    ShowQr { text: String },

    /// Begin an audio recording
    StartRecording { label: String },

    /// Open the calculator view with an expression
    OpenCalculator { expression: String },

    /// Open the settings window
    OpenSettings,
}

/// What happened when a result was executed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<CommandOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deferred: Option<HostAction>,
}

impl ExecutionOutcome {
    pub fn ok() -> Self {
        Self {
            success: true,
            ..Self::default()
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            ..Self::default()
        }
    }

    /// Successful hand-off of `action` to the host.
    pub fn deferred(action: HostAction) -> Self {
        Self {
            success: true,
            deferred: Some(action),
            ..Self::default()
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Outcome of a captured shell run; a non-zero exit is a failure.
    pub fn from_output(output: CommandOutput) -> Self {
        let message = match output.exit_code {
            Some(0) => None,
            Some(code) => Some(format!("exited with status {}", code)),
            None => Some("terminated by signal".to_string()),
        };
        Self {
            success: output.success(),
            message,
            output: Some(output),
            deferred: None,
        }
    }
}
