//! Platform abstraction layer.
//!
//! OS-specific pieces (opening things, system commands, clipboard, window
//! enumeration, application discovery) live in one module per OS behind the
//! same set of free functions. [`SystemLauncher`] and [`SystemWindows`] wrap
//! them in the collaborator traits the engine consumes.

#[cfg(target_os = "linux")]
mod linux;
#[cfg(target_os = "linux")]
use linux as os;

#[cfg(target_os = "macos")]
mod macos;
#[cfg(target_os = "macos")]
use macos as os;

#[cfg(not(any(target_os = "linux", target_os = "macos")))]
compile_error!("Unsupported platform");

use std::future::Future;
use std::process::{Command, Stdio};
use std::str::FromStr;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};

use crate::error::{NovaError, NovaResult};
use crate::executor::{CommandOutput, LaunchRequest, Launcher};

/// Budget for short helper processes (window listing, focusing, clipboard).
const HELPER_TIMEOUT: Duration = Duration::from_secs(2);

/// Budget for system command helpers, which may wait on the session manager.
const SYSTEM_TIMEOUT: Duration = Duration::from_secs(10);

/// Represents an installed application discovered on the system.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct AppEntry {
    /// Unique identifier (e.g., filename without extension on Linux)
    pub id: String,
    /// Display name of the application
    pub name: String,
    /// Command to execute the application
    pub exec: String,
    /// Description or comment about the application
    pub description: Option<String>,
    /// Keywords for search matching
    pub keywords: Vec<String>,
}

/// System commands that can be executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SystemCommand {
    /// Lock the screen/session
    Lock,
    /// Put the computer to sleep/suspend
    Sleep,
    /// Log out of the current session
    Logout,
    /// Restart the computer
    Restart,
    /// Shut down the computer
    Shutdown,
}

impl FromStr for SystemCommand {
    type Err = NovaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lock" => Ok(SystemCommand::Lock),
            "sleep" | "suspend" => Ok(SystemCommand::Sleep),
            "logout" | "log-out" => Ok(SystemCommand::Logout),
            "restart" | "reboot" => Ok(SystemCommand::Restart),
            "shutdown" | "poweroff" => Ok(SystemCommand::Shutdown),
            _ => Err(NovaError::NotFound(format!("system command {}", s))),
        }
    }
}

/// A visible top-level window.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowInfo {
    /// Platform-specific window identifier
    pub id: u64,
    /// Window title
    pub title: String,
    /// Host or application the window belongs to
    pub app_name: String,
}

/// Enumerates windows for the window provider.
pub trait WindowSource: Send + Sync {
    fn list_windows(&self) -> NovaResult<Vec<WindowInfo>>;
}

/// Window enumeration through the OS helper (`wmctrl -l` on Linux).
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemWindows;

impl WindowSource for SystemWindows {
    fn list_windows(&self) -> NovaResult<Vec<WindowInfo>> {
        os::list_windows()
    }
}

/// Discover installed applications.
pub fn discover_apps() -> Vec<AppEntry> {
    os::discover_apps()
}

/// Launcher backed by the host OS.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemLauncher;

impl SystemLauncher {
    pub fn new() -> Self {
        Self
    }

    fn spawn(mut command: Command, hidden: bool, what: &str) -> NovaResult<()> {
        if hidden {
            command.stdout(Stdio::null()).stderr(Stdio::null());
        }
        command
            .stdin(Stdio::null())
            .spawn()
            .map_err(|e| NovaError::Launch(format!("Failed to launch {}: {}", what, e)))?;
        Ok(())
    }

    fn program_command(program: &str, args: Vec<String>, elevated: bool) -> Command {
        let (program, args) = if elevated {
            os::elevate(program, args)
        } else {
            (program.to_string(), args)
        };
        let mut command = Command::new(program);
        command.args(args);
        command
    }
}

impl Launcher for SystemLauncher {
    fn launch(&self, request: &LaunchRequest) -> NovaResult<()> {
        tracing::debug!(?request, "launching");
        match request {
            LaunchRequest::OpenUrl(target) | LaunchRequest::OpenPath(target) => {
                let (program, args) = os::opener();
                let mut command = Command::new(program);
                command.args(args).arg(target);
                Self::spawn(command, true, target)
            }
            LaunchRequest::Program {
                path,
                args,
                elevated,
                hidden,
            } => {
                let path = shellexpand::tilde(path).to_string();
                let args = args.split_whitespace().map(str::to_string).collect();
                Self::spawn(Self::program_command(&path, args, *elevated), *hidden, &path)
            }
            LaunchRequest::Shell {
                command,
                elevated,
                hidden,
            } => {
                let args = vec!["-c".to_string(), command.clone()];
                Self::spawn(Self::program_command("sh", args, *elevated), *hidden, command)
            }
            LaunchRequest::App { exec } => os::launch_app(exec),
            LaunchRequest::System(system) => os::system_command(*system),
            LaunchRequest::CopyText(text) => os::copy_to_clipboard(text),
            LaunchRequest::FocusWindow(id) => os::focus_window(*id),
        }
    }

    fn run_captured(&self, command: &str, timeout: Duration) -> NovaResult<CommandOutput> {
        let mut process = tokio::process::Command::new("sh");
        process.args(["-c", command]);
        block_on(run_with_timeout(process, timeout))?
    }
}

/// Drive `future` from synchronous launcher code.
///
/// Launcher and window calls run on blocking threads, so the ambient runtime
/// is reused when there is one. Must not be called from an async task.
fn block_on<F: Future>(future: F) -> NovaResult<F::Output> {
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => Ok(handle.block_on(future)),
        Err(_) => {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?;
            Ok(runtime.block_on(future))
        }
    }
}

/// Run a helper program to completion with captured output.
pub(super) fn run_helper(
    program: &str,
    args: &[&str],
    timeout: Duration,
) -> NovaResult<CommandOutput> {
    let mut command = tokio::process::Command::new(program);
    command.args(args);
    block_on(run_with_timeout(command, timeout))?
}

/// Feed `input` to a helper's stdin and wait for it to exit.
pub(super) fn pipe_to_helper(program: &str, args: &[&str], input: &str) -> NovaResult<()> {
    let mut command = tokio::process::Command::new(program);
    command.args(args);
    block_on(feed_stdin(command, program, input))?
}

async fn feed_stdin(
    mut command: tokio::process::Command,
    program: &str,
    input: &str,
) -> NovaResult<()> {
    let mut child = command
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| NovaError::Launch(format!("Failed to start {}: {}", program, e)))?;

    let mut stdin = child.stdin.take();
    let finished = tokio::time::timeout(HELPER_TIMEOUT, async {
        if let Some(pipe) = stdin.as_mut() {
            pipe.write_all(input.as_bytes()).await?;
        }
        // Close stdin so the helper sees end of input
        drop(stdin.take());
        child.wait().await
    })
    .await;

    match finished {
        Ok(status) => {
            if status?.success() {
                Ok(())
            } else {
                Err(NovaError::Launch(format!("{} failed", program)))
            }
        }
        Err(_) => Err(NovaError::Timeout(HELPER_TIMEOUT.as_millis() as u64)),
    }
}

/// Run a process to completion with captured output.
///
/// The deadline covers draining both pipes, so a background grandchild that
/// keeps them open cannot hold the caller past `timeout`. The direct child is
/// killed when the deadline passes.
async fn run_with_timeout(
    mut command: tokio::process::Command,
    timeout: Duration,
) -> NovaResult<CommandOutput> {
    let mut child = command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| NovaError::Process(format!("Failed to start process: {}", e)))?;

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();
    let collected = tokio::time::timeout(timeout, async {
        let (stdout, stderr, status) =
            tokio::join!(read_pipe(stdout), read_pipe(stderr), child.wait());
        status.map(|status| CommandOutput {
            stdout,
            stderr,
            exit_code: status.code(),
        })
    })
    .await;

    match collected {
        Ok(output) => Ok(output?),
        Err(_) => {
            let _ = child.start_kill();
            tracing::warn!(timeout_ms = timeout.as_millis() as u64, "process timed out");
            Err(NovaError::Timeout(timeout.as_millis() as u64))
        }
    }
}

async fn read_pipe(pipe: Option<impl AsyncRead + Unpin>) -> String {
    let mut buffer = Vec::new();
    if let Some(mut pipe) = pipe {
        let _ = pipe.read_to_end(&mut buffer).await;
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn test_system_command_from_str() {
        assert_eq!("Lock".parse::<SystemCommand>().unwrap(), SystemCommand::Lock);
        assert_eq!(
            "reboot".parse::<SystemCommand>().unwrap(),
            SystemCommand::Restart
        );
        assert!("hibernate".parse::<SystemCommand>().is_err());
    }

    #[test]
    fn test_run_captured_collects_output() {
        let output = SystemLauncher::new()
            .run_captured("echo hi; echo oops >&2; exit 3", Duration::from_secs(5))
            .unwrap();
        assert_eq!(output.stdout, "hi\n");
        assert_eq!(output.stderr, "oops\n");
        assert_eq!(output.exit_code, Some(3));
    }

    #[test]
    fn test_run_captured_times_out() {
        let started = Instant::now();
        let result = SystemLauncher::new().run_captured("sleep 5", Duration::from_millis(100));
        assert!(matches!(result, Err(NovaError::Timeout(100))));
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[test]
    fn test_run_captured_bounds_background_children() {
        // The shell exits at once but the backgrounded sleep holds the pipes
        let started = Instant::now();
        let result = SystemLauncher::new().run_captured("sleep 4 &", Duration::from_millis(200));
        assert!(matches!(result, Err(NovaError::Timeout(200))));
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_run_captured_on_blocking_thread_uses_runtime() {
        let output = tokio::task::spawn_blocking(|| {
            SystemLauncher::new().run_captured("echo ok", Duration::from_secs(5))
        })
        .await
        .unwrap()
        .unwrap();
        assert_eq!(output.stdout, "ok\n");
        assert!(output.success());
    }

    #[test]
    fn test_run_helper_reports_missing_program() {
        let result = run_helper("nova-resolve-no-such-helper", &[], HELPER_TIMEOUT);
        assert!(matches!(result, Err(NovaError::Process(_))));
    }

    #[test]
    #[cfg(target_os = "linux")]
    fn test_empty_exec_is_a_launch_error() {
        let result = SystemLauncher::new().launch(&LaunchRequest::App {
            exec: "%U".to_string(),
        });
        assert!(matches!(result, Err(NovaError::Launch(_))));
    }
}
