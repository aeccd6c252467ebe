//! Command definition matching.
//!
//! User definitions come first and shadow built-ins with the same keyword.
//! The merged list is cached until [`CommandIndex::invalidate`] is called.

use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;

use crate::core::result::{Action, ResultKind, SearchResult, GROUP_COMMANDS};
use crate::platform::SystemCommand;
use crate::services::custom_commands::{builtin_commands, ActionType, CommandDefinition, CommandStore};

/// Tier scores, best first
const SCORE_EXACT: f64 = 1.0;
const SCORE_KEYWORD_PREFIX: f64 = 0.95;
const SCORE_KEYWORD_CONTAINS: f64 = 0.9;
const SCORE_NAME: f64 = 0.85;
const SCORE_DESCRIPTION: f64 = 0.8;

pub struct CommandIndex {
    store: Option<Arc<dyn CommandStore>>,
    cache: Mutex<Option<Arc<Vec<CommandDefinition>>>>,
}

impl CommandIndex {
    pub fn new(store: Option<Arc<dyn CommandStore>>) -> Self {
        Self {
            store,
            cache: Mutex::new(None),
        }
    }

    /// User definitions followed by the built-ins they don't shadow.
    pub fn definitions(&self) -> Arc<Vec<CommandDefinition>> {
        let mut cache = self.cache.lock();
        if let Some(definitions) = cache.as_ref() {
            return Arc::clone(definitions);
        }

        let user = match &self.store {
            Some(store) => store.load().unwrap_or_else(|e| {
                tracing::warn!(error = %e, "failed to load command definitions");
                Vec::new()
            }),
            None => Vec::new(),
        };

        let shadowed: HashSet<String> = user.iter().map(|c| c.keyword.to_lowercase()).collect();
        let mut definitions = user;
        definitions.extend(
            builtin_commands()
                .into_iter()
                .filter(|c| !shadowed.contains(&c.keyword.to_lowercase())),
        );

        let definitions = Arc::new(definitions);
        *cache = Some(Arc::clone(&definitions));
        definitions
    }

    /// Drop the cached list; the next lookup reloads from the store.
    pub fn invalidate(&self) {
        *self.cache.lock() = None;
        tracing::debug!("command definitions invalidated");
    }

    pub fn find(&self, keyword: &str) -> Option<CommandDefinition> {
        self.definitions()
            .iter()
            .find(|c| c.keyword.eq_ignore_ascii_case(keyword))
            .cloned()
    }

    /// Tiered match of `query` against every definition, best first.
    pub fn match_query(&self, query: &str) -> Vec<SearchResult> {
        let query = query.trim();
        if query.is_empty() {
            return Vec::new();
        }

        let query_lower = query.to_lowercase();
        let (head, rest) = match query.split_once(char::is_whitespace) {
            Some((head, rest)) => (head.to_lowercase(), rest.trim()),
            None => (query_lower.clone(), ""),
        };

        let mut results: Vec<SearchResult> = self
            .definitions()
            .iter()
            .filter_map(|command| {
                let keyword = command.keyword.to_lowercase();
                let (score, param) = if keyword == head {
                    (SCORE_EXACT, rest)
                } else if keyword.starts_with(&query_lower) {
                    (SCORE_KEYWORD_PREFIX, "")
                } else if keyword.contains(&query_lower) {
                    (SCORE_KEYWORD_CONTAINS, "")
                } else if command.display_name.to_lowercase().contains(&query_lower) {
                    (SCORE_NAME, "")
                } else if command.description.to_lowercase().contains(&query_lower) {
                    (SCORE_DESCRIPTION, "")
                } else {
                    return None;
                };
                Some(to_result(command, score, param))
            })
            .collect();

        results.sort_by(|a, b| b.match_score.total_cmp(&a.match_score));
        results
    }
}

impl Default for CommandIndex {
    fn default() -> Self {
        Self::new(None)
    }
}

/// Result for a definition; built-in system actions carry their command directly.
pub fn to_result(command: &CommandDefinition, score: f64, param: &str) -> SearchResult {
    let kind = if command.is_built_in {
        ResultKind::SystemAction
    } else {
        ResultKind::CustomCommand
    };

    let action = match command.path_template.parse::<SystemCommand>() {
        Ok(system) if command.is_built_in && command.action_type == ActionType::SystemAction => {
            Action::System { command: system }
        }
        _ => Action::Command {
            keyword: command.keyword.clone(),
            param: param.to_string(),
        },
    };

    let subtitle = match (command.enabled, command.description.is_empty()) {
        (true, _) => command.description.clone(),
        (false, true) => "disabled".to_string(),
        (false, false) => format!("{} · disabled", command.description),
    };

    SearchResult::new(command.result_id(), command.display_name.clone(), kind)
        .with_subtitle(subtitle)
        .with_score(score)
        .with_group(GROUP_COMMANDS)
        .with_icon(if command.is_built_in { "⚙" } else { "⚡" })
        .with_query_match(command.keyword.clone())
        .with_action(action)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{NovaError, NovaResult};

    struct MemoryStore(Vec<CommandDefinition>);

    impl CommandStore for MemoryStore {
        fn load(&self) -> NovaResult<Vec<CommandDefinition>> {
            Ok(self.0.clone())
        }

        fn save(&self, _commands: &[CommandDefinition]) -> NovaResult<()> {
            Ok(())
        }
    }

    struct BrokenStore;

    impl CommandStore for BrokenStore {
        fn load(&self) -> NovaResult<Vec<CommandDefinition>> {
            Err(NovaError::Config("corrupt".to_string()))
        }

        fn save(&self, _commands: &[CommandDefinition]) -> NovaResult<()> {
            Ok(())
        }
    }

    fn user(keyword: &str, name: &str, description: &str) -> CommandDefinition {
        let json = format!(
            r#"{{"keyword":"{}","displayName":"{}","description":"{}","actionType":"Url","pathTemplate":"https://example.com/?q={{param}}"}}"#,
            keyword, name, description
        );
        serde_json::from_str(&json).unwrap()
    }

    fn index(commands: Vec<CommandDefinition>) -> CommandIndex {
        CommandIndex::new(Some(Arc::new(MemoryStore(commands))))
    }

    #[test]
    fn test_tiers() {
        let index = index(vec![
            user("gh", "GitHub", "Code hosting"),
            user("docs", "Documentation", "Search the rust docs"),
            user("wiki", "Wikipedia", "Encyclopedia"),
        ]);

        let exact = index.match_query("gh rust");
        assert_eq!(exact[0].match_score, SCORE_EXACT);
        assert_eq!(
            exact[0].action,
            Action::Command {
                keyword: "gh".to_string(),
                param: "rust".to_string()
            }
        );

        assert_eq!(index.match_query("doc")[0].match_score, SCORE_KEYWORD_PREFIX);
        assert_eq!(index.match_query("ik")[0].match_score, SCORE_KEYWORD_CONTAINS);
        assert_eq!(index.match_query("github")[0].match_score, SCORE_NAME);
        assert_eq!(index.match_query("encyclo")[0].match_score, SCORE_DESCRIPTION);
        assert!(index.match_query("zzz").is_empty());
    }

    #[test]
    fn test_user_keyword_shadows_builtin() {
        let index = index(vec![user("lock", "My Lock", "")]);
        let definitions = index.definitions();

        let locks: Vec<_> = definitions.iter().filter(|c| c.keyword == "lock").collect();
        assert_eq!(locks.len(), 1);
        assert!(!locks[0].is_built_in);
        assert_eq!(definitions[0].keyword, "lock");
    }

    #[test]
    fn test_builtin_system_action() {
        let index = CommandIndex::default();
        let result = &index.match_query("shutdown")[0];
        assert_eq!(result.kind, ResultKind::SystemAction);
        assert_eq!(
            result.action,
            Action::System {
                command: SystemCommand::Shutdown
            }
        );
        assert_eq!(result.id, "cmd:shutdown");
    }

    #[test]
    fn test_disabled_is_listed() {
        let mut disabled = user("old", "Old Tool", "");
        disabled.enabled = false;
        let index = index(vec![disabled]);

        let results = index.match_query("old");
        assert_eq!(results[0].subtitle, "disabled");
    }

    #[test]
    fn test_store_failure_keeps_builtins() {
        let index = CommandIndex::new(Some(Arc::new(BrokenStore)));
        assert_eq!(index.definitions().len(), builtin_commands().len());
    }

    #[test]
    fn test_invalidate_reloads() {
        let index = index(vec![user("gh", "GitHub", "")]);
        let first = index.definitions();
        assert!(Arc::ptr_eq(&first, &index.definitions()));

        index.invalidate();
        assert!(!Arc::ptr_eq(&first, &index.definitions()));
    }
}
