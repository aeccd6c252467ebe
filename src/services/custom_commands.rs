//! Command definitions: user shortcuts loaded from `commands.json` plus the
//! compiled-in built-ins.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{NovaError, NovaResult};

pub const DEFAULT_PLACEHOLDER: &str = "{param}";

/// What executing a command definition does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ActionType {
    Url,
    Program,
    Directory,
    Shell,
    Calculator,
    SystemAction,
}

impl ActionType {
    pub fn as_str(self) -> &'static str {
        match self {
            ActionType::Url => "url",
            ActionType::Program => "program",
            ActionType::Directory => "directory",
            ActionType::Shell => "shell",
            ActionType::Calculator => "calculator",
            ActionType::SystemAction => "systemAction",
        }
    }
}

impl FromStr for ActionType {
    type Err = NovaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "url" => Ok(ActionType::Url),
            "program" => Ok(ActionType::Program),
            "directory" => Ok(ActionType::Directory),
            "shell" => Ok(ActionType::Shell),
            "calculator" => Ok(ActionType::Calculator),
            "systemaction" | "system_action" | "system" => Ok(ActionType::SystemAction),
            _ => Err(NovaError::InvalidActionType(s.to_string())),
        }
    }
}

impl TryFrom<String> for ActionType {
    type Error = NovaError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ActionType> for String {
    fn from(value: ActionType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_placeholder() -> String {
    DEFAULT_PLACEHOLDER.to_string()
}

fn default_enabled() -> bool {
    true
}

/// A keyword-triggered shortcut.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandDefinition {
    pub keyword: String,
    pub display_name: String,
    #[serde(default)]
    pub description: String,
    pub action_type: ActionType,
    #[serde(default)]
    pub path_template: String,
    #[serde(default)]
    pub argument_template: String,
    #[serde(default = "default_placeholder")]
    pub param_placeholder: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub run_elevated: bool,
    #[serde(default)]
    pub run_hidden: bool,
    #[serde(skip)]
    pub is_built_in: bool,
}

impl CommandDefinition {
    fn built_in(
        keyword: &str,
        display_name: &str,
        description: &str,
        action_type: ActionType,
        path_template: &str,
    ) -> Self {
        Self {
            keyword: keyword.to_string(),
            display_name: display_name.to_string(),
            description: description.to_string(),
            action_type,
            path_template: path_template.to_string(),
            argument_template: String::new(),
            param_placeholder: default_placeholder(),
            enabled: true,
            run_elevated: false,
            run_hidden: false,
            is_built_in: true,
        }
    }

    /// Usage-tracking id for results produced from this definition
    pub fn result_id(&self) -> String {
        format!("cmd:{}", self.keyword.to_lowercase())
    }

    /// Resolved path template; URL templates get an encoded parameter.
    pub fn resolve_path(&self, param: &str) -> String {
        if self.action_type == ActionType::Url {
            self.substitute(&self.path_template, &urlencoding::encode(param))
        } else {
            self.substitute(&self.path_template, param)
        }
    }

    pub fn resolve_arguments(&self, param: &str) -> String {
        self.substitute(&self.argument_template, param)
    }

    fn substitute(&self, template: &str, value: &str) -> String {
        let mut resolved = template.replace(&self.param_placeholder, value);
        if self.param_placeholder != DEFAULT_PLACEHOLDER {
            resolved = resolved.replace(DEFAULT_PLACEHOLDER, value);
        }
        resolved.replace("{query}", value)
    }
}

/// Compiled-in definitions, in display order.
pub fn builtin_commands() -> Vec<CommandDefinition> {
    use ActionType::{Calculator, SystemAction};

    vec![
        CommandDefinition::built_in("lock", "Lock Screen", "Lock the screen", SystemAction, "lock"),
        CommandDefinition::built_in(
            "sleep",
            "Sleep",
            "Put computer to sleep",
            SystemAction,
            "sleep",
        ),
        CommandDefinition::built_in(
            "logout",
            "Log Out",
            "Log out of current session",
            SystemAction,
            "logout",
        ),
        CommandDefinition::built_in(
            "restart",
            "Restart",
            "Restart the computer",
            SystemAction,
            "restart",
        ),
        CommandDefinition::built_in(
            "shutdown",
            "Shut Down",
            "Shut down the computer",
            SystemAction,
            "shutdown",
        ),
        CommandDefinition::built_in(
            "calc",
            "Calculator",
            "Evaluate a math expression",
            Calculator,
            "{param}",
        ),
        CommandDefinition::built_in(
            "settings",
            "Settings",
            "Open Nova settings",
            SystemAction,
            "settings",
        ),
        CommandDefinition::built_in(
            "reload",
            "Reload Commands",
            "Reload command definitions from disk",
            SystemAction,
            "reload",
        ),
    ]
}

/// Persistence collaborator for user command definitions.
pub trait CommandStore: Send + Sync {
    fn load(&self) -> NovaResult<Vec<CommandDefinition>>;
    fn save(&self, commands: &[CommandDefinition]) -> NovaResult<()>;
}

/// User definitions stored as a JSON array.
pub struct JsonCommandStore {
    path: PathBuf,
}

impl JsonCommandStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CommandStore for JsonCommandStore {
    /// Entries that fail to parse are skipped one by one.
    fn load(&self) -> NovaResult<Vec<CommandDefinition>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&self.path)?;
        let raw: Vec<serde_json::Value> = serde_json::from_str(&content)?;

        let mut commands = Vec::with_capacity(raw.len());
        for (index, value) in raw.into_iter().enumerate() {
            match serde_json::from_value::<CommandDefinition>(value) {
                Ok(command) if command.keyword.trim().is_empty() => {
                    tracing::warn!(index, "skipping command definition without keyword");
                }
                Ok(command) => commands.push(command),
                Err(e) => {
                    tracing::warn!(index, error = %e, "skipping invalid command definition");
                }
            }
        }

        tracing::debug!(count = commands.len(), "loaded command definitions");
        Ok(commands)
    }

    fn save(&self, commands: &[CommandDefinition]) -> NovaResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let user: Vec<&CommandDefinition> = commands.iter().filter(|c| !c.is_built_in).collect();
        fs::write(&self.path, serde_json::to_string_pretty(&user)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn definition(keyword: &str, action_type: ActionType, path: &str) -> CommandDefinition {
        CommandDefinition {
            keyword: keyword.to_string(),
            display_name: keyword.to_string(),
            description: String::new(),
            action_type,
            path_template: path.to_string(),
            argument_template: String::new(),
            param_placeholder: default_placeholder(),
            enabled: true,
            run_elevated: false,
            run_hidden: false,
            is_built_in: false,
        }
    }

    #[test]
    fn test_action_type_parsing() {
        assert_eq!("URL".parse::<ActionType>().unwrap(), ActionType::Url);
        assert_eq!(
            "systemAction".parse::<ActionType>().unwrap(),
            ActionType::SystemAction
        );
        assert!(matches!(
            "launch".parse::<ActionType>(),
            Err(NovaError::InvalidActionType(v)) if v == "launch"
        ));
    }

    #[test]
    fn test_url_template_encodes_param() {
        let def = definition("wiki", ActionType::Url, "https://en.wikipedia.org/wiki/{param}");
        assert_eq!(
            def.resolve_path("rust lang"),
            "https://en.wikipedia.org/wiki/rust%20lang"
        );
    }

    #[test]
    fn test_custom_placeholder() {
        let mut def = definition("ssh", ActionType::Shell, "ssh $host");
        def.param_placeholder = "$host".to_string();
        def.argument_template = "-v {query}".to_string();
        assert_eq!(def.resolve_path("box"), "ssh box");
        assert_eq!(def.resolve_arguments("box"), "-v box");
    }

    #[test]
    fn test_store_skips_bad_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("commands.json");
        fs::write(
            &path,
            r#"[
                {"keyword": "gh", "displayName": "GitHub", "actionType": "url",
                 "pathTemplate": "https://github.com/search?q={param}"},
                {"keyword": "old", "displayName": "Legacy", "actionType": "launch"},
                {"keyword": "dl", "displayName": "Downloads", "actionType": "Directory",
                 "pathTemplate": "~/Downloads", "enabled": false}
            ]"#,
        )
        .unwrap();

        let commands = JsonCommandStore::new(&path).load().unwrap();
        assert_eq!(commands.len(), 2);
        assert_eq!(commands[0].keyword, "gh");
        assert_eq!(commands[0].param_placeholder, "{param}");
        assert!(commands[0].enabled);
        assert!(!commands[1].enabled);
        assert!(!commands[1].is_built_in);
    }

    #[test]
    fn test_store_round_trip_excludes_built_ins() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonCommandStore::new(dir.path().join("commands.json"));

        let mut commands = builtin_commands();
        commands.push(definition("notes", ActionType::Directory, "~/notes"));
        store.save(&commands).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].keyword, "notes");
    }

    #[test]
    fn test_missing_store_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonCommandStore::new(dir.path().join("absent.json"));
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_builtins_are_flagged() {
        let builtins = builtin_commands();
        assert!(builtins.iter().all(|c| c.is_built_in && c.enabled));
        assert!(builtins.iter().any(|c| c.keyword == "calc"));
    }
}
