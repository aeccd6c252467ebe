//! Search engine for Nova - resolves one query into one ranked list.
//!
//! A query cycle goes through [`QueryPhase`]s:
//!
//! 1. prefix short-circuits (clipboard history, recording) return at once
//! 2. command definitions are matched synchronously
//! 3. the handler pipeline runs, then the QR threshold check
//! 4. providers (apps, files, windows) fan out on blocking threads
//! 5. everything is merged, ranked, truncated and indexed
//!
//! Failures inside a handler or provider never abort the cycle; they turn
//! into explanatory results or a log line.

use std::collections::HashSet;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::core::commands::{to_result, CommandIndex};
use crate::core::result::{Action, ResultKind, SearchResult, GROUP_COMMANDS};
use crate::error::NovaError;
use crate::executor::{ExecutionOutcome, HostAction, LaunchRequest, Launcher};
use crate::handlers::{split_head, HandlerPipeline};
use crate::platform::{SystemCommand, SystemLauncher, SystemWindows};
use crate::search::{ResultCollector, SearchProvider};
use crate::services::app_index::AppIndex;
use crate::services::clipboard::ClipboardHistory;
use crate::services::currency::{CurrencyService, OfflineFetcher, RateProvider};
use crate::services::custom_commands::{ActionType, CommandStore};
use crate::services::file_search::FileProvider;
use crate::services::text_tools::single_line_preview;
use crate::services::usage::UsageTracker;
use crate::services::windows::WindowProvider;

/// Where a query cycle is; logged at trace level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryPhase {
    Idle,
    Dispatched,
    Merging,
    Ranked,
}

/// Characters of the query shown in the QR result subtitle
const QR_PREVIEW_CHARS: usize = 60;

/// The query orchestrator.
pub struct SearchEngine {
    config: Config,
    commands: CommandIndex,
    pipeline: Arc<HandlerPipeline>,
    usage: Arc<UsageTracker>,
    clipboard: Arc<ClipboardHistory>,
    providers: Vec<Arc<dyn SearchProvider>>,
    launcher: Arc<dyn Launcher>,
}

/// Collaborators left unset fall back to the system implementations.
pub struct SearchEngineBuilder {
    config: Config,
    command_store: Option<Arc<dyn CommandStore>>,
    usage: Option<Arc<UsageTracker>>,
    rates: Option<Arc<dyn RateProvider>>,
    clipboard: Option<Arc<ClipboardHistory>>,
    providers: Option<Vec<Arc<dyn SearchProvider>>>,
    launcher: Option<Arc<dyn Launcher>>,
}

impl SearchEngineBuilder {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            command_store: None,
            usage: None,
            rates: None,
            clipboard: None,
            providers: None,
            launcher: None,
        }
    }

    /// Source of user command definitions; without one only built-ins exist.
    pub fn command_store(mut self, store: Arc<dyn CommandStore>) -> Self {
        self.command_store = Some(store);
        self
    }

    pub fn usage(mut self, usage: Arc<UsageTracker>) -> Self {
        self.usage = Some(usage);
        self
    }

    pub fn rates(mut self, rates: Arc<dyn RateProvider>) -> Self {
        self.rates = Some(rates);
        self
    }

    pub fn clipboard(mut self, clipboard: Arc<ClipboardHistory>) -> Self {
        self.clipboard = Some(clipboard);
        self
    }

    /// Replace the default application, file and window providers.
    pub fn providers(mut self, providers: Vec<Arc<dyn SearchProvider>>) -> Self {
        self.providers = Some(providers);
        self
    }

    pub fn launcher(mut self, launcher: Arc<dyn Launcher>) -> Self {
        self.launcher = Some(launcher);
        self
    }

    pub fn build(self) -> SearchEngine {
        let mut config = self.config;
        config.validate();

        let usage = self.usage.unwrap_or_default();
        let rates = self.rates.unwrap_or_else(|| {
            Arc::new(CurrencyService::new(
                Arc::new(OfflineFetcher),
                None,
                config.currency.clone(),
            ))
        });
        let providers = self
            .providers
            .unwrap_or_else(|| default_providers(&config, &usage));

        SearchEngine {
            commands: CommandIndex::new(self.command_store),
            pipeline: Arc::new(HandlerPipeline::standard(&config, rates)),
            clipboard: self.clipboard.unwrap_or_default(),
            launcher: self
                .launcher
                .unwrap_or_else(|| Arc::new(SystemLauncher::new())),
            usage,
            providers,
            config,
        }
    }
}

fn default_providers(config: &Config, usage: &Arc<UsageTracker>) -> Vec<Arc<dyn SearchProvider>> {
    vec![
        Arc::new(AppIndex::new(
            config.apps.refresh_interval(),
            Arc::clone(usage),
        )),
        Arc::new(FileProvider::new(&config.files)),
        Arc::new(WindowProvider::new(
            Arc::new(SystemWindows),
            config.files.min_score,
        )),
    ]
}

impl SearchEngine {
    pub fn builder(config: Config) -> SearchEngineBuilder {
        SearchEngineBuilder::new(config)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn usage(&self) -> &Arc<UsageTracker> {
        &self.usage
    }

    pub fn clipboard(&self) -> &Arc<ClipboardHistory> {
        &self.clipboard
    }

    /// Pipeline-only resolution for command-bar previews.
    ///
    /// May block on a rate fetch; async callers should use [`Self::search`].
    pub fn resolve_command(&self, query: &str) -> Option<SearchResult> {
        self.pipeline.resolve(query)
    }

    /// Forget cached command definitions after they were edited externally.
    pub fn reload_command_definitions(&self) {
        self.commands.invalidate();
    }

    /// Run one full query cycle.
    pub async fn search(&self, query: &str, cancel: &CancellationToken) -> Vec<SearchResult> {
        let query = query.trim();
        trace_phase(QueryPhase::Idle, query);

        if query.is_empty() {
            return self.finalize(self.recent_and_default_commands(), query);
        }
        if let Some(results) = self.short_circuit(query) {
            return self.finalize(results, query);
        }

        let mut results = self.commands.match_query(query);
        if let Some(handled) = self.run_pipeline(query).await {
            if duplicates_system_action(&results, &handled) {
                tracing::debug!(id = %handled.id, "dropping handler result shadowed by a system action");
            } else {
                results.push(handled);
            }
        }
        results.extend(self.qr_result(query));

        trace_phase(QueryPhase::Dispatched, query);
        if query.chars().count() >= self.config.search.provider_min_query_len {
            results.extend(self.fan_out(query, cancel).await);
        }

        trace_phase(QueryPhase::Merging, query);
        for result in &mut results {
            if result.kind == ResultKind::File && self.usage.use_count(&result.id) > 0 {
                result.kind = ResultKind::RecentFile;
            }
        }
        let results = self.rank(results);

        trace_phase(QueryPhase::Ranked, query);
        self.finalize(results, query)
    }

    /// Handlers may wait on the network (currency rates), so the pipeline
    /// runs off the async workers.
    async fn run_pipeline(&self, query: &str) -> Option<SearchResult> {
        let pipeline = Arc::clone(&self.pipeline);
        let query = query.to_string();
        match tokio::task::spawn_blocking(move || pipeline.resolve(&query)).await {
            Ok(handled) => handled,
            Err(e) => {
                tracing::warn!(error = %e, "handler pipeline panicked");
                None
            }
        }
    }

    /// Clipboard and recording prefixes bypass the general merge.
    fn short_circuit(&self, query: &str) -> Option<Vec<SearchResult>> {
        let (head, rest) = split_head(query);
        let search = &self.config.search;

        if head == search.clipboard_prefix.to_lowercase() {
            return Some(self.clipboard.results(rest, search.max_results));
        }

        if head == search.record_prefix.to_lowercase() {
            let subtitle = if rest.is_empty() { "Record audio" } else { rest };
            return Some(vec![SearchResult::new(
                "",
                "Start recording",
                ResultKind::Command,
            )
            .with_subtitle(subtitle)
            .with_score(1.0)
            .with_icon("🎙")
            .with_action(Action::StartRecording {
                label: rest.to_string(),
            })]);
        }

        None
    }

    fn qr_result(&self, query: &str) -> Option<SearchResult> {
        let length = query.chars().count();
        let search = &self.config.search;

        if length > search.qr_max_length {
            Some(
                SearchResult::new("", "Text too long for a QR code", ResultKind::QRCode)
                    .with_subtitle(format!(
                        "{} characters, limit is {}",
                        length, search.qr_max_length
                    ))
                    .with_score(0.5)
                    .with_icon("▦"),
            )
        } else if length > search.qr_threshold {
            Some(
                SearchResult::new("", "Show as QR code", ResultKind::QRCode)
                    .with_subtitle(single_line_preview(query, QR_PREVIEW_CHARS))
                    .with_score(0.5)
                    .with_icon("▦")
                    .with_action(Action::ShowQr {
                        text: query.to_string(),
                    }),
            )
        } else {
            None
        }
    }

    /// Run every provider on its own blocking task and wait for all of them.
    async fn fan_out(&self, query: &str, cancel: &CancellationToken) -> Vec<SearchResult> {
        let collector = Arc::new(ResultCollector::new());

        let tasks: Vec<_> = self
            .providers
            .iter()
            .map(|provider| {
                let provider = Arc::clone(provider);
                let collector = Arc::clone(&collector);
                let cancel = cancel.clone();
                let query = query.to_string();

                tokio::task::spawn_blocking(move || match provider.search(&query, &cancel) {
                    Ok(mut results) => {
                        let group = provider.group_order();
                        for result in &mut results {
                            result.group_order = group;
                        }
                        tracing::debug!(provider = provider.name(), count = results.len(), "provider finished");
                        collector.extend(results);
                    }
                    Err(e) => {
                        tracing::warn!(provider = provider.name(), error = %e, "provider failed");
                    }
                })
            })
            .collect();

        for task in tasks {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "provider task panicked");
            }
        }

        collector.drain()
    }

    /// Stable sort by group, then score, then use count.
    fn rank(&self, results: Vec<SearchResult>) -> Vec<SearchResult> {
        let mut keyed: Vec<(u32, SearchResult)> = results
            .into_iter()
            .map(|result| (self.usage.use_count(&result.id), result))
            .collect();

        keyed.sort_by(|(a_uses, a), (b_uses, b)| {
            a.group_order
                .cmp(&b.group_order)
                .then_with(|| b.match_score.total_cmp(&a.match_score))
                .then_with(|| b_uses.cmp(a_uses))
        });

        keyed.into_iter().map(|(_, result)| result).collect()
    }

    /// Truncate, number from 1, and fill in highlight text.
    fn finalize(&self, mut results: Vec<SearchResult>, query: &str) -> Vec<SearchResult> {
        results.truncate(self.config.search.max_results);
        for (i, result) in results.iter_mut().enumerate() {
            result.index = i + 1;
            if result.query_match.is_empty() {
                result.query_match = query.to_string();
            }
        }
        results
    }

    /// Most recently used commands, then the rest in declaration order.
    fn recent_and_default_commands(&self) -> Vec<SearchResult> {
        let max = self.config.search.max_results;
        let definitions = self.commands.definitions();
        let mut seen = HashSet::new();
        let mut results = Vec::new();

        for id in self.usage.recent_ids(self.usage.len()) {
            if results.len() >= max {
                break;
            }
            let Some(keyword) = id.strip_prefix("cmd:") else {
                continue;
            };
            if let Some(command) = definitions
                .iter()
                .find(|c| c.keyword.to_lowercase() == keyword)
            {
                if seen.insert(keyword.to_string()) {
                    results.push(to_result(command, 1.0, ""));
                }
            }
        }

        for command in definitions.iter() {
            if results.len() >= max {
                break;
            }
            if seen.insert(command.keyword.to_lowercase()) {
                results.push(to_result(command, 1.0, ""));
            }
        }

        results
    }

    /// Carry out a result's action. Successful runs count as a use.
    pub async fn execute(&self, result: &SearchResult, param: &str) -> ExecutionOutcome {
        let outcome = match &result.action {
            Action::None => ExecutionOutcome::failed("Nothing to execute"),
            Action::Command {
                keyword,
                param: matched,
            } => {
                let param = if param.is_empty() { matched.as_str() } else { param };
                self.execute_definition(keyword, param).await
            }
            Action::LaunchApp { exec } => {
                self.launch(LaunchRequest::App { exec: exec.clone() }).await
            }
            Action::OpenPath { path } => self.launch(LaunchRequest::OpenPath(path.clone())).await,
            Action::OpenUrl { url } => self.launch(LaunchRequest::OpenUrl(url.clone())).await,
            Action::FocusWindow { window_id } => {
                self.launch(LaunchRequest::FocusWindow(*window_id)).await
            }
            Action::RunShell { command } => self.run_shell(command).await,
            Action::CopyText { text } => self.launch(LaunchRequest::CopyText(text.clone())).await,
            Action::Color { hex, .. } => self.launch(LaunchRequest::CopyText(hex.clone())).await,
            Action::System { command } => self.launch(LaunchRequest::System(*command)).await,
            Action::ShowQr { text } => {
                ExecutionOutcome::deferred(HostAction::ShowQr { text: text.clone() })
            }
            Action::StartRecording { label } => {
                ExecutionOutcome::deferred(HostAction::StartRecording {
                    label: label.clone(),
                })
            }
        };

        if outcome.success && result.is_tracked() {
            self.usage.record_use(&result.id);
        }
        outcome
    }

    async fn execute_definition(&self, keyword: &str, param: &str) -> ExecutionOutcome {
        let Some(command) = self.commands.find(keyword) else {
            return ExecutionOutcome::failed(format!("Unknown command '{}'", keyword));
        };
        if !command.enabled {
            tracing::info!(keyword = %command.keyword, "refusing to run disabled command");
            return ExecutionOutcome::failed(format!("Command '{}' is disabled", command.keyword));
        }

        let path = command.resolve_path(param);
        match command.action_type {
            ActionType::Url => self.launch(LaunchRequest::OpenUrl(path)).await,
            ActionType::Directory => {
                let path = shellexpand::tilde(&path).into_owned();
                self.launch(LaunchRequest::OpenPath(path)).await
            }
            ActionType::Program => {
                self.launch(LaunchRequest::Program {
                    path,
                    args: command.resolve_arguments(param),
                    elevated: command.run_elevated,
                    hidden: command.run_hidden,
                })
                .await
            }
            ActionType::Shell => {
                let arguments = command.resolve_arguments(param);
                let line = if arguments.is_empty() {
                    path
                } else {
                    format!("{} {}", path, arguments)
                };
                self.launch(LaunchRequest::Shell {
                    command: line,
                    elevated: command.run_elevated,
                    hidden: command.run_hidden,
                })
                .await
            }
            ActionType::Calculator => ExecutionOutcome::deferred(HostAction::OpenCalculator {
                expression: param.to_string(),
            }),
            ActionType::SystemAction => match path.trim() {
                "settings" => ExecutionOutcome::deferred(HostAction::OpenSettings),
                "reload" => {
                    self.reload_command_definitions();
                    ExecutionOutcome::ok().with_message("Command definitions reloaded")
                }
                other => match other.parse::<SystemCommand>() {
                    Ok(system) => self.launch(LaunchRequest::System(system)).await,
                    Err(e) => ExecutionOutcome::failed(e.to_string()),
                },
            },
        }
    }

    async fn launch(&self, request: LaunchRequest) -> ExecutionOutcome {
        let launcher = Arc::clone(&self.launcher);
        let launched = tokio::task::spawn_blocking(move || launcher.launch(&request)).await;

        match launched {
            Ok(Ok(())) => ExecutionOutcome::ok(),
            Ok(Err(NovaError::NotFound(what))) => {
                tracing::debug!(target_item = %what, "launch target disappeared");
                ExecutionOutcome::ok().with_message(format!("{} is no longer available", what))
            }
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "launch failed");
                ExecutionOutcome::failed(e.to_string())
            }
            Err(e) => {
                tracing::warn!(error = %e, "launch task failed");
                ExecutionOutcome::failed(e.to_string())
            }
        }
    }

    async fn run_shell(&self, command: &str) -> ExecutionOutcome {
        let launcher = Arc::clone(&self.launcher);
        let command = command.to_string();
        let timeout = self.config.shell.timeout();
        let ran = tokio::task::spawn_blocking(move || launcher.run_captured(&command, timeout)).await;

        match ran {
            Ok(Ok(output)) => ExecutionOutcome::from_output(output),
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "shell command failed");
                ExecutionOutcome::failed(e.to_string())
            }
            Err(e) => {
                tracing::warn!(error = %e, "shell task failed");
                ExecutionOutcome::failed(e.to_string())
            }
        }
    }
}

fn trace_phase(phase: QueryPhase, query: &str) {
    tracing::trace!(?phase, query, "query phase");
}

/// A handler result repeating a system action already listed is dropped.
fn duplicates_system_action(commands: &[SearchResult], handled: &SearchResult) -> bool {
    commands.iter().any(|command| {
        command.kind == ResultKind::SystemAction
            && command.group_order == GROUP_COMMANDS
            && (command.action == handled.action
                || (!command.subtitle.is_empty() && command.subtitle == handled.subtitle))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::result::{GROUP_APPS, GROUP_FILES, GROUP_WINDOWS};
    use crate::error::NovaResult;
    use crate::executor::CommandOutput;
    use crate::services::currency::CurrencyQuote;
    use crate::services::custom_commands::CommandDefinition;
    use parking_lot::{Condvar, Mutex};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::{Duration, Instant};

    #[derive(Default)]
    struct FakeLauncher {
        launched: Mutex<Vec<LaunchRequest>>,
        shell_runs: Mutex<Vec<String>>,
    }

    impl Launcher for FakeLauncher {
        fn launch(&self, request: &LaunchRequest) -> NovaResult<()> {
            if let LaunchRequest::FocusWindow(id) = request {
                return Err(NovaError::NotFound(format!("window {}", id)));
            }
            self.launched.lock().push(request.clone());
            Ok(())
        }

        fn run_captured(&self, command: &str, _timeout: Duration) -> NovaResult<CommandOutput> {
            self.shell_runs.lock().push(command.to_string());
            Ok(CommandOutput {
                stdout: "done\n".to_string(),
                stderr: String::new(),
                exit_code: Some(0),
            })
        }
    }

    struct NoRates;

    impl RateProvider for NoRates {
        fn convert(&self, _amount: f64, _from: &str, _to: &str) -> NovaResult<CurrencyQuote> {
            Err(NovaError::Network("offline".to_string()))
        }
    }

    struct MemoryStore(Mutex<Vec<CommandDefinition>>);

    impl CommandStore for MemoryStore {
        fn load(&self) -> NovaResult<Vec<CommandDefinition>> {
            Ok(self.0.lock().clone())
        }

        fn save(&self, commands: &[CommandDefinition]) -> NovaResult<()> {
            *self.0.lock() = commands.to_vec();
            Ok(())
        }
    }

    /// Returns canned results for any query and counts calls
    struct StaticProvider {
        name: &'static str,
        group: i32,
        results: Vec<SearchResult>,
        calls: AtomicUsize,
    }

    impl StaticProvider {
        fn new(name: &'static str, group: i32, results: Vec<SearchResult>) -> Arc<Self> {
            Arc::new(Self {
                name,
                group,
                results,
                calls: AtomicUsize::new(0),
            })
        }
    }

    impl SearchProvider for StaticProvider {
        fn name(&self) -> &str {
            self.name
        }

        fn group_order(&self) -> i32 {
            self.group
        }

        fn search(&self, _query: &str, _cancel: &CancellationToken) -> NovaResult<Vec<SearchResult>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.results.clone())
        }
    }

    struct FailingProvider;

    impl SearchProvider for FailingProvider {
        fn name(&self) -> &str {
            "broken"
        }

        fn group_order(&self) -> i32 {
            GROUP_WINDOWS
        }

        fn search(&self, _query: &str, _cancel: &CancellationToken) -> NovaResult<Vec<SearchResult>> {
            Err(NovaError::Process("no display".to_string()))
        }
    }

    /// Answers after a delay, like a rate fetch on a slow network
    struct SlowRates(Duration);

    impl RateProvider for SlowRates {
        fn convert(&self, amount: f64, from: &str, to: &str) -> NovaResult<CurrencyQuote> {
            std::thread::sleep(self.0);
            Ok(CurrencyQuote {
                rate: 0.5,
                formatted: format!("{} {}", amount / 2.0, to.to_uppercase()),
                unit_rate_text: format!("1 {} = 0.5 {}", from.to_uppercase(), to.to_uppercase()),
                fetched_at: 0,
                from_cache: false,
            })
        }
    }

    /// Lets `parties` callers through only once all of them have arrived
    struct Rendezvous {
        arrived: Mutex<usize>,
        all_here: Condvar,
        parties: usize,
    }

    impl Rendezvous {
        fn new(parties: usize) -> Arc<Self> {
            Arc::new(Self {
                arrived: Mutex::new(0),
                all_here: Condvar::new(),
                parties,
            })
        }

        /// False if the others did not show up within `timeout`.
        fn meet(&self, timeout: Duration) -> bool {
            let deadline = Instant::now() + timeout;
            let mut arrived = self.arrived.lock();
            *arrived += 1;
            self.all_here.notify_all();
            while *arrived < self.parties {
                if self.all_here.wait_until(&mut arrived, deadline).timed_out() {
                    return *arrived >= self.parties;
                }
            }
            true
        }
    }

    /// Only answers while another provider is searching at the same time
    struct MeetingProvider {
        name: &'static str,
        rendezvous: Arc<Rendezvous>,
    }

    impl SearchProvider for MeetingProvider {
        fn name(&self) -> &str {
            self.name
        }

        fn group_order(&self) -> i32 {
            GROUP_FILES
        }

        fn search(&self, _query: &str, _cancel: &CancellationToken) -> NovaResult<Vec<SearchResult>> {
            if self.rendezvous.meet(Duration::from_secs(2)) {
                Ok(vec![file(&format!("/tmp/{}", self.name), 1.0)])
            } else {
                Err(NovaError::Timeout(2000))
            }
        }
    }

    fn definition(keyword: &str, action_type: &str, path: &str, enabled: bool) -> CommandDefinition {
        serde_json::from_value(serde_json::json!({
            "keyword": keyword,
            "displayName": keyword.to_uppercase(),
            "actionType": action_type,
            "pathTemplate": path,
            "enabled": enabled,
        }))
        .unwrap()
    }

    struct Fixture {
        engine: SearchEngine,
        launcher: Arc<FakeLauncher>,
        store: Arc<MemoryStore>,
    }

    fn fixture(providers: Vec<Arc<dyn SearchProvider>>) -> Fixture {
        let launcher = Arc::new(FakeLauncher::default());
        let store = Arc::new(MemoryStore(Mutex::new(vec![
            definition("gh", "url", "https://github.com/search?q={param}", true),
            definition("old", "program", "/usr/bin/old-tool", false),
        ])));

        let engine = SearchEngine::builder(Config::default())
            .command_store(store.clone())
            .rates(Arc::new(NoRates))
            .launcher(launcher.clone())
            .providers(providers)
            .build();

        Fixture {
            engine,
            launcher,
            store,
        }
    }

    fn file(path: &str, score: f64) -> SearchResult {
        SearchResult::new(path, path, ResultKind::File).with_score(score)
    }

    #[tokio::test]
    async fn test_calculator_query() {
        let fx = fixture(Vec::new());
        let results = fx.engine.search("1+1", &CancellationToken::new()).await;
        assert_eq!(results[0].title, "2");
        assert_eq!(results[0].kind, ResultKind::Calculator);
        assert_eq!(results[0].index, 1);
        assert_eq!(results[0].query_match, "1+1");
    }

    #[tokio::test]
    async fn test_unit_queries() {
        let fx = fixture(Vec::new());
        let cancel = CancellationToken::new();

        let miles = fx.engine.search("100 km to mile", &cancel).await;
        assert_eq!(miles[0].title, "62.14 mile");
        assert!(miles[0].subtitle.contains("1 mile = 1.61 km"));

        let fahrenheit = fx.engine.search("30 c to f", &cancel).await;
        assert_eq!(fahrenheit[0].title, "86 f");
        assert!(!fahrenheit[0].subtitle.contains('·'));
    }

    #[tokio::test]
    async fn test_color_query() {
        let fx = fixture(Vec::new());
        let results = fx.engine.search("#ff0000", &CancellationToken::new()).await;
        assert_eq!(
            results[0].action,
            Action::Color {
                hex: "#FF0000".to_string(),
                rgb: "rgb(255, 0, 0)".to_string(),
                hsl: "hsl(0, 100%, 50%)".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_currency_failure_is_visible() {
        let fx = fixture(Vec::new());
        let results = fx.engine.search("10 usd to eur", &CancellationToken::new()).await;
        assert_eq!(results[0].title, "Currency conversion failed");
    }

    #[tokio::test]
    async fn test_slow_rates_do_not_stall_the_runtime() {
        let engine = SearchEngine::builder(Config::default())
            .rates(Arc::new(SlowRates(Duration::from_millis(500))))
            .launcher(Arc::new(FakeLauncher::default()))
            .providers(Vec::new())
            .build();

        let started = Instant::now();
        let cancel = CancellationToken::new();
        let (results, ticked_at) = tokio::join!(engine.search("10 usd to eur", &cancel), async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            started.elapsed()
        });

        assert_eq!(results[0].title, "5 EUR");
        assert!(ticked_at < Duration::from_millis(400), "ticker waited {:?}", ticked_at);
    }

    #[tokio::test]
    async fn test_providers_search_concurrently() {
        let rendezvous = Rendezvous::new(2);
        let fx = fixture(vec![
            Arc::new(MeetingProvider {
                name: "left",
                rendezvous: Arc::clone(&rendezvous),
            }),
            Arc::new(MeetingProvider {
                name: "right",
                rendezvous,
            }),
        ]);

        let results = tokio::time::timeout(
            Duration::from_secs(5),
            fx.engine.search("tmp", &CancellationToken::new()),
        )
        .await
        .unwrap();

        let files: Vec<&str> = results
            .iter()
            .filter(|r| r.kind == ResultKind::File)
            .map(|r| r.id.as_str())
            .collect();
        assert_eq!(files.len(), 2, "providers did not overlap: {:?}", files);
    }

    #[tokio::test]
    async fn test_empty_query_lists_recent_then_defaults() {
        let provider = StaticProvider::new("files", GROUP_FILES, vec![file("/tmp/a", 1.0)]);
        let fx = fixture(vec![provider.clone()]);
        fx.engine.usage().record_use("cmd:sleep");
        fx.engine.usage().record_use("/tmp/a");

        let results = fx.engine.search("", &CancellationToken::new()).await;
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
        assert_eq!(results.len(), fx.engine.config().search.max_results);
        assert_eq!(results[0].id, "cmd:sleep");
        assert_eq!(results[1].id, "cmd:gh");
        assert_eq!(results[2].id, "cmd:old");
        assert_eq!(results.iter().filter(|r| r.id == "cmd:sleep").count(), 1);
        assert_eq!(results[9].index, 10);
    }

    #[tokio::test]
    async fn test_disabled_command_does_not_launch() {
        let fx = fixture(Vec::new());
        let results = fx.engine.search("old", &CancellationToken::new()).await;
        let old = results.iter().find(|r| r.id == "cmd:old").unwrap();
        assert!(old.subtitle.contains("disabled"));

        let outcome = fx.engine.execute(old, "").await;
        assert!(!outcome.success);
        assert!(fx.launcher.launched.lock().is_empty());
        assert_eq!(fx.engine.usage().use_count("cmd:old"), 0);
    }

    #[tokio::test]
    async fn test_execute_url_command_records_usage() {
        let fx = fixture(Vec::new());
        let results = fx.engine.search("gh tokio select", &CancellationToken::new()).await;
        assert_eq!(results[0].id, "cmd:gh");

        let outcome = fx.engine.execute(&results[0], "").await;
        assert!(outcome.success);
        assert_eq!(
            fx.launcher.launched.lock().as_slice(),
            &[LaunchRequest::OpenUrl(
                "https://github.com/search?q=tokio%20select".to_string()
            )]
        );
        assert_eq!(fx.engine.usage().use_count("cmd:gh"), 1);
    }

    #[tokio::test]
    async fn test_execute_shell_captures_output() {
        let fx = fixture(Vec::new());
        let result = fx.engine.resolve_command("> echo done").unwrap();

        let outcome = fx.engine.execute(&result, "").await;
        assert!(outcome.success);
        assert_eq!(outcome.output.unwrap().stdout, "done\n");
        assert_eq!(fx.launcher.shell_runs.lock().as_slice(), &["echo done".to_string()]);
        assert_eq!(fx.engine.usage().use_count("shell:echo done"), 1);
    }

    #[tokio::test]
    async fn test_vanished_window_is_a_no_op() {
        let fx = fixture(Vec::new());
        let window = SearchResult::new("win:7", "Gone", ResultKind::Window)
            .with_action(Action::FocusWindow { window_id: 7 });

        let outcome = fx.engine.execute(&window, "").await;
        assert!(outcome.success);
        assert!(outcome.message.is_some());
    }

    #[tokio::test]
    async fn test_builtin_host_actions_are_deferred() {
        let fx = fixture(Vec::new());
        let results = fx.engine.search("settings", &CancellationToken::new()).await;
        let settings = results.iter().find(|r| r.id == "cmd:settings").unwrap();

        let outcome = fx.engine.execute(settings, "").await;
        assert_eq!(outcome.deferred, Some(HostAction::OpenSettings));
    }

    #[tokio::test]
    async fn test_groups_rank_before_scores() {
        let apps = StaticProvider::new(
            "apps",
            GROUP_APPS,
            vec![SearchResult::new("app:term", "Terminal", ResultKind::Application).with_score(0.5)],
        );
        let files = StaticProvider::new(
            "files",
            GROUP_FILES,
            vec![file("/home/me/term.txt", 1.0), file("/home/me/terms.md", 1.0)],
        );
        let fx = fixture(vec![files, apps]);
        fx.engine.usage().record_use("/home/me/terms.md");

        let results = fx.engine.search("term", &CancellationToken::new()).await;
        let ids: Vec<&str> = results.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["app:term", "/home/me/terms.md", "/home/me/term.txt"]);
        assert_eq!(results[1].kind, ResultKind::RecentFile);
        assert_eq!(results[2].kind, ResultKind::File);
        assert_eq!(results[2].group_order, GROUP_FILES);
        assert_eq!(results[2].index, 3);
    }

    #[tokio::test]
    async fn test_failing_provider_contributes_nothing() {
        let files = StaticProvider::new("files", GROUP_FILES, vec![file("/tmp/notes", 1.0)]);
        let fx = fixture(vec![Arc::new(FailingProvider), files]);

        let results = fx.engine.search("notes", &CancellationToken::new()).await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "/tmp/notes");
    }

    #[tokio::test]
    async fn test_short_query_skips_providers() {
        let files = StaticProvider::new("files", GROUP_FILES, vec![file("/tmp/x", 1.0)]);
        let fx = fixture(vec![files.clone()]);

        fx.engine.search("x", &CancellationToken::new()).await;
        assert_eq!(files.calls.load(Ordering::SeqCst), 0);

        fx.engine.search("xy", &CancellationToken::new()).await;
        assert_eq!(files.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cancelled_cycle_still_merges() {
        let files = StaticProvider::new("files", GROUP_FILES, vec![file("/tmp/notes", 1.0)]);
        let fx = fixture(vec![files]);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let results = fx.engine.search("notes", &cancel).await;
        assert_eq!(results.len(), 1);
    }

    #[tokio::test]
    async fn test_results_are_truncated() {
        let many = (0..30).map(|i| file(&format!("/tmp/f{}", i), 1.0)).collect();
        let fx = fixture(vec![StaticProvider::new("files", GROUP_FILES, many)]);

        let results = fx.engine.search("tmp", &CancellationToken::new()).await;
        assert_eq!(results.len(), 10);
        assert_eq!(results.last().unwrap().index, 10);
    }

    #[tokio::test]
    async fn test_clipboard_prefix_short_circuits() {
        let files = StaticProvider::new("files", GROUP_FILES, vec![file("/tmp/x", 1.0)]);
        let fx = fixture(vec![files.clone()]);
        fx.engine.clipboard().add("first copy".to_string());
        fx.engine.clipboard().add("second copy".to_string());

        let results = fx.engine.search("cb first", &CancellationToken::new()).await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].title, "first copy");
        assert_eq!(files.calls.load(Ordering::SeqCst), 0);

        assert_eq!(fx.engine.search("cb", &CancellationToken::new()).await.len(), 2);
    }

    #[tokio::test]
    async fn test_record_prefix() {
        let fx = fixture(Vec::new());
        let results = fx.engine.search("rec standup", &CancellationToken::new()).await;
        assert_eq!(results.len(), 1);

        let outcome = fx.engine.execute(&results[0], "").await;
        assert_eq!(
            outcome.deferred,
            Some(HostAction::StartRecording {
                label: "standup".to_string()
            })
        );
    }

    #[tokio::test]
    async fn test_long_text_offers_qr() {
        let fx = fixture(Vec::new());
        let cancel = CancellationToken::new();

        let text = "https://example.com/a/very/long/path/that/keeps/going";
        let results = fx.engine.search(text, &cancel).await;
        assert!(results.iter().any(|r| r.action == Action::ShowQr { text: text.to_string() }));

        let huge = "word ".repeat(300);
        let results = fx.engine.search(&huge, &cancel).await;
        let hint = results.iter().find(|r| r.kind == ResultKind::QRCode).unwrap();
        assert_eq!(hint.action, Action::None);
    }

    #[tokio::test]
    async fn test_reload_picks_up_new_definitions() {
        let fx = fixture(Vec::new());
        let cancel = CancellationToken::new();
        assert!(fx.engine.search("wiki", &cancel).await.is_empty());

        fx.store
            .save(&[definition("wiki", "url", "https://wikipedia.org", true)])
            .unwrap();
        assert!(fx.engine.search("wiki", &cancel).await.is_empty());

        fx.engine.reload_command_definitions();
        let results = fx.engine.search("wiki", &cancel).await;
        assert_eq!(results[0].id, "cmd:wiki");
    }

    #[test]
    fn test_duplicate_system_action_dropped() {
        let lock = SearchResult::new("cmd:lock", "Lock Screen", ResultKind::SystemAction)
            .with_subtitle("Lock the screen")
            .with_action(Action::System {
                command: SystemCommand::Lock,
            });
        let same = SearchResult::new("", "Lock", ResultKind::Command).with_action(Action::System {
            command: SystemCommand::Lock,
        });
        let other = SearchResult::new("calc:1+1", "2", ResultKind::Calculator);

        assert!(duplicates_system_action(&[lock.clone()], &same));
        assert!(!duplicates_system_action(&[lock], &other));
    }
}
