//! Linux platform implementation.
//!
//! - XDG desktop files for application discovery
//! - xdg-open for opening URLs and files
//! - systemctl/loginctl for system commands, pkexec for elevation
//! - xclip for clipboard writes
//! - wmctrl for window listing and focusing

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use freedesktop_desktop_entry::DesktopEntry;
use walkdir::WalkDir;

use super::{
    pipe_to_helper, run_helper, AppEntry, SystemCommand, WindowInfo, HELPER_TIMEOUT, SYSTEM_TIMEOUT,
};
use crate::error::{NovaError, NovaResult};

pub(super) fn opener() -> (&'static str, Vec<&'static str>) {
    ("xdg-open", Vec::new())
}

pub(super) fn elevate(program: &str, args: Vec<String>) -> (String, Vec<String>) {
    let mut elevated = Vec::with_capacity(args.len() + 1);
    elevated.push(program.to_string());
    elevated.extend(args);
    ("pkexec".to_string(), elevated)
}

pub(super) fn launch_app(exec: &str) -> NovaResult<()> {
    let exec = strip_field_codes(exec);
    let mut parts = exec.split_whitespace();
    let program = parts
        .next()
        .ok_or_else(|| NovaError::Launch("Empty exec command".to_string()))?;

    Command::new(program)
        .args(parts)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| NovaError::Launch(format!("Failed to launch {}: {}", program, e)))?;
    Ok(())
}

/// Strip field codes from an exec line (%f, %u, %F, %U, etc.)
fn strip_field_codes(exec: &str) -> String {
    exec.replace("%f", "")
        .replace("%F", "")
        .replace("%u", "")
        .replace("%U", "")
        .replace("%i", "")
        .replace("%c", "")
        .replace("%k", "")
}

pub(super) fn system_command(command: SystemCommand) -> NovaResult<()> {
    let (cmd, args): (&str, Vec<&str>) = match command {
        SystemCommand::Lock => ("loginctl", vec!["lock-session"]),
        SystemCommand::Sleep => ("systemctl", vec!["suspend"]),
        SystemCommand::Logout => ("gnome-session-quit", vec!["--logout", "--no-prompt"]),
        SystemCommand::Restart => ("systemctl", vec!["reboot"]),
        SystemCommand::Shutdown => ("systemctl", vec!["poweroff"]),
    };

    match run_helper(cmd, &args, SYSTEM_TIMEOUT) {
        Ok(output) if output.success() => Ok(()),
        Ok(_) | Err(_) if command == SystemCommand::Logout => logout_fallback(),
        Ok(output) => Err(NovaError::Launch(format!(
            "{} failed: {}",
            cmd,
            output.stderr.trim()
        ))),
        Err(NovaError::Process(e)) => {
            Err(NovaError::Launch(format!("Failed to execute {}: {}", cmd, e)))
        }
        Err(e) => Err(e),
    }
}

fn logout_fallback() -> NovaResult<()> {
    let user = std::env::var("USER").unwrap_or_default();
    run_helper("loginctl", &["terminate-user", &user], SYSTEM_TIMEOUT)
        .map_err(|e| NovaError::Launch(format!("Logout fallback failed: {}", e)))?;
    Ok(())
}

pub(super) fn copy_to_clipboard(content: &str) -> NovaResult<()> {
    // xclip forks to serve the selection; the parent exits right away
    pipe_to_helper("xclip", &["-selection", "clipboard"], content)
}

pub(super) fn list_windows() -> NovaResult<Vec<WindowInfo>> {
    let output = run_helper("wmctrl", &["-l"], HELPER_TIMEOUT)?;
    if !output.success() {
        return Err(NovaError::Process(format!(
            "wmctrl -l failed: {}",
            output.stderr.trim()
        )));
    }
    Ok(parse_wmctrl(&output.stdout))
}

pub(super) fn focus_window(id: u64) -> NovaResult<()> {
    let target = format!("0x{:08x}", id);
    let output = run_helper("wmctrl", &["-i", "-a", &target], HELPER_TIMEOUT)?;
    if output.success() {
        Ok(())
    } else {
        Err(NovaError::NotFound(format!("window {}", target)))
    }
}

/// Parse `wmctrl -l` lines: `<id> <desktop> <host> <title...>`.
fn parse_wmctrl(output: &str) -> Vec<WindowInfo> {
    output
        .lines()
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let id = fields.next()?;
            let desktop = fields.next()?;
            let host = fields.next()?;
            let id = u64::from_str_radix(id.trim_start_matches("0x"), 16).ok()?;

            // Sticky windows (desktop -1) are panels and docks
            if desktop == "-1" {
                return None;
            }

            let title = fields.collect::<Vec<_>>().join(" ");
            if title.is_empty() {
                return None;
            }

            Some(WindowInfo {
                id,
                title,
                app_name: host.to_string(),
            })
        })
        .collect()
}

pub(super) fn discover_apps() -> Vec<AppEntry> {
    let mut entries = Vec::new();

    // Standard XDG application directories
    let mut dirs_to_scan: Vec<PathBuf> = vec![
        PathBuf::from("/usr/share/applications"),
        PathBuf::from("/usr/local/share/applications"),
    ];

    // User local applications
    if let Some(data_home) = dirs::data_local_dir() {
        dirs_to_scan.push(data_home.join("applications"));
    }

    // Flatpak applications
    if let Some(home) = dirs::home_dir() {
        dirs_to_scan.push(home.join(".local/share/flatpak/exports/share/applications"));
    }

    // Snap applications
    dirs_to_scan.push(PathBuf::from("/var/lib/snapd/desktop/applications"));

    for dir in dirs_to_scan {
        if dir.exists() {
            scan_directory(&dir, &mut entries);
        }
    }

    entries.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
    entries
}

/// Scan a directory for .desktop files, skipping ids already seen.
fn scan_directory(dir: &Path, entries: &mut Vec<AppEntry>) {
    for entry in WalkDir::new(dir)
        .max_depth(2)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "desktop") {
            if let Some(app_entry) = parse_desktop_file(path) {
                if !entries.iter().any(|e| e.id == app_entry.id) {
                    entries.push(app_entry);
                }
            }
        }
    }
}

fn parse_desktop_file(path: &Path) -> Option<AppEntry> {
    let content = std::fs::read_to_string(path).ok()?;
    let entry = DesktopEntry::from_str(path, &content, Some(&["en"])).ok()?;

    if entry.no_display() || entry.hidden() {
        return None;
    }

    // Empty locale list gives the untranslated values
    let locales: &[&str] = &[];

    let name = entry.name(locales)?.to_string();
    let exec = entry.exec()?.to_string();
    let id = path.file_stem()?.to_string_lossy().to_string();
    let description = entry.comment(locales).map(|s| s.to_string());

    let mut keywords: Vec<String> = entry
        .keywords(locales)
        .map(|kw| kw.iter().map(|s| s.to_string()).collect())
        .unwrap_or_default();
    keywords.extend(name.split_whitespace().map(|s| s.to_lowercase()));

    Some(AppEntry {
        id,
        name,
        exec,
        description,
        keywords,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_field_codes() {
        assert_eq!(strip_field_codes("firefox %u"), "firefox ");
        assert_eq!(strip_field_codes("code %F"), "code ");
        assert_eq!(strip_field_codes("gimp %f %i"), "gimp  ");
    }

    #[test]
    fn test_parse_wmctrl() {
        let output = "\
0x03a00007  0 laptop Inbox - Mail
0x01200003 -1 laptop Top Panel
0x04c0000a  1 laptop   ~/src : vim main.rs
garbage line
";
        let windows = parse_wmctrl(output);
        assert_eq!(windows.len(), 2);
        assert_eq!(windows[0].id, 0x03a00007);
        assert_eq!(windows[0].title, "Inbox - Mail");
        assert_eq!(windows[0].app_name, "laptop");
        assert_eq!(windows[1].title, "~/src : vim main.rs");
    }

    #[test]
    fn test_elevate_wraps_with_pkexec() {
        let (program, args) = elevate("apt", vec!["update".to_string()]);
        assert_eq!(program, "pkexec");
        assert_eq!(args, vec!["apt", "update"]);
    }

    #[test]
    fn test_scan_directory_reads_desktop_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("editor.desktop"),
            "[Desktop Entry]\nType=Application\nName=Text Editor\nExec=gedit %U\nComment=Edit text\nKeywords=text;notes;\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("hidden.desktop"),
            "[Desktop Entry]\nType=Application\nName=Hidden\nExec=hidden\nNoDisplay=true\n",
        )
        .unwrap();

        let mut entries = Vec::new();
        scan_directory(dir.path(), &mut entries);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, "editor");
        assert_eq!(entries[0].exec, "gedit %U");
        assert!(entries[0].keywords.contains(&"notes".to_string()));
        assert!(entries[0].keywords.contains(&"editor".to_string()));
    }
}
