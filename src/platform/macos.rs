//! macOS platform implementation.
//!
//! - /Applications and ~/Applications scanning for app discovery
//! - `open` command for URLs, files and app bundles
//! - osascript for system commands and elevation, pmset for sleep
//! - pbcopy for clipboard writes
//!
//! Window enumeration is not supported; the window provider stays empty.

use std::path::{Path, PathBuf};
use std::process::Command;

use walkdir::WalkDir;

use super::{pipe_to_helper, run_helper, AppEntry, SystemCommand, WindowInfo, SYSTEM_TIMEOUT};
use crate::error::{NovaError, NovaResult};

pub(super) fn opener() -> (&'static str, Vec<&'static str>) {
    ("open", Vec::new())
}

pub(super) fn elevate(program: &str, args: Vec<String>) -> (String, Vec<String>) {
    let mut command_line = shell_quote(program);
    for arg in &args {
        command_line.push(' ');
        command_line.push_str(&shell_quote(arg));
    }
    let script = format!(
        "do shell script \"{}\" with administrator privileges",
        command_line.replace('\\', "\\\\").replace('"', "\\\"")
    );
    ("osascript".to_string(), vec!["-e".to_string(), script])
}

fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "'\\''"))
}

pub(super) fn launch_app(exec: &str) -> NovaResult<()> {
    let path = Path::new(exec);
    let mut command = Command::new("open");
    if path.extension().is_some_and(|ext| ext == "app") {
        command.arg(exec);
    } else {
        command.args(["-a", exec]);
    }
    command
        .spawn()
        .map_err(|e| NovaError::Launch(format!("Failed to launch {}: {}", exec, e)))?;
    Ok(())
}

pub(super) fn system_command(command: SystemCommand) -> NovaResult<()> {
    let (program, args): (&str, Vec<&str>) = match command {
        SystemCommand::Lock => (
            "osascript",
            vec![
                "-e",
                r#"tell application "System Events" to keystroke "q" using {control down, command down}"#,
            ],
        ),
        SystemCommand::Sleep => ("pmset", vec!["sleepnow"]),
        SystemCommand::Logout => (
            "osascript",
            vec!["-e", r#"tell application "System Events" to log out"#],
        ),
        SystemCommand::Restart => (
            "osascript",
            vec!["-e", r#"tell application "System Events" to restart"#],
        ),
        SystemCommand::Shutdown => (
            "osascript",
            vec!["-e", r#"tell application "System Events" to shut down"#],
        ),
    };

    let output = run_helper(program, &args, SYSTEM_TIMEOUT).map_err(|e| match e {
        NovaError::Process(e) => NovaError::Launch(format!("Failed to execute {}: {}", program, e)),
        other => other,
    })?;
    if output.success() {
        Ok(())
    } else {
        Err(NovaError::Launch(format!(
            "{} failed: {}",
            program,
            output.stderr.trim()
        )))
    }
}

pub(super) fn copy_to_clipboard(content: &str) -> NovaResult<()> {
    pipe_to_helper("pbcopy", &[], content)
}

pub(super) fn list_windows() -> NovaResult<Vec<WindowInfo>> {
    Ok(Vec::new())
}

pub(super) fn focus_window(id: u64) -> NovaResult<()> {
    Err(NovaError::NotFound(format!("window {}", id)))
}

pub(super) fn discover_apps() -> Vec<AppEntry> {
    let mut roots = vec![
        PathBuf::from("/Applications"),
        PathBuf::from("/System/Applications"),
    ];
    if let Some(home) = dirs::home_dir() {
        roots.push(home.join("Applications"));
    }

    let mut entries: Vec<AppEntry> = Vec::new();
    for root in roots.iter().filter(|r| r.exists()) {
        for entry in WalkDir::new(root)
            .min_depth(1)
            .max_depth(2)
            .into_iter()
            .filter_entry(|e| {
                // Do not descend into bundles
                e.depth() == 1 || e.path().parent().is_some_and(|p| p.extension().is_none())
            })
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if !path.extension().is_some_and(|ext| ext == "app") {
                continue;
            }
            let Some(name) = path.file_stem().map(|s| s.to_string_lossy().to_string()) else {
                continue;
            };
            let id = name.to_lowercase().replace(' ', "-");
            if entries.iter().any(|e| e.id == id) {
                continue;
            }
            entries.push(AppEntry {
                id,
                keywords: name.split_whitespace().map(|s| s.to_lowercase()).collect(),
                name,
                exec: path.to_string_lossy().to_string(),
                description: None,
            });
        }
    }

    entries.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
    entries
}
