use super::CommandHandler;
use crate::core::result::{Action, ResultKind, SearchResult};

/// `> command` runs through the shell with captured output on execute.
pub struct ShellHandler;

impl CommandHandler for ShellHandler {
    fn name(&self) -> &str {
        "shell"
    }

    fn priority(&self) -> i32 {
        40
    }

    fn try_handle(&self, query: &str) -> Option<SearchResult> {
        let command = query.trim().strip_prefix('>')?.trim();
        if command.is_empty() {
            return None;
        }

        Some(
            SearchResult::new(format!("shell:{}", command), command, ResultKind::Command)
                .with_subtitle("Run in shell")
                .with_score(1.0)
                .with_icon(">_")
                .with_action(Action::RunShell {
                    command: command.to_string(),
                }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shell_escape() {
        let result = ShellHandler.try_handle(">  ls -la ").unwrap();
        assert_eq!(result.title, "ls -la");
        assert_eq!(result.id, "shell:ls -la");
        assert_eq!(
            result.action,
            Action::RunShell {
                command: "ls -la".to_string()
            }
        );
        assert!(ShellHandler.try_handle(">").is_none());
        assert!(ShellHandler.try_handle("ls").is_none());
    }
}
