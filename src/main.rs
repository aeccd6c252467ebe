//! `nova-resolve` - resolve a query from the command line.

use anyhow::{bail, Context};
use clap::Parser;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use nova_resolve::services::currency::{CurrencyService, OfflineFetcher};
use nova_resolve::services::custom_commands::JsonCommandStore;
use nova_resolve::services::usage::{
    spawn_periodic_flush, JsonUsageStore, UsageStore, UsageTracker,
};
use nova_resolve::{Config, SearchEngine, SearchResult};

#[derive(Parser)]
#[command(name = "nova-resolve")]
#[command(about = "Resolve launcher input into ranked results", long_about = None)]
struct Cli {
    /// Print results as JSON
    #[arg(long)]
    json: bool,

    /// Only run the command handler pipeline
    #[arg(long)]
    resolve_only: bool,

    /// Execute the result at this 1-based index
    #[arg(long, value_name = "N")]
    execute: Option<usize>,

    /// Parameter passed to the executed command
    #[arg(long, value_name = "P", requires = "execute")]
    param: Option<String>,

    /// Config file (default: ~/.config/nova/resolve.toml)
    #[arg(long, value_name = "PATH")]
    config: Option<std::path::PathBuf>,

    /// Query text
    query: Vec<String>,
}

fn print_results(results: &[SearchResult], json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(results)?);
        return Ok(());
    }

    for result in results {
        let icon = if result.icon_text.is_empty() {
            " "
        } else {
            result.icon_text.as_str()
        };
        if result.subtitle.is_empty() {
            println!("{:>2}. {} {}", result.index, icon, result.title);
        } else {
            println!(
                "{:>2}. {} {}  ({})",
                result.index, icon, result.title, result.subtitle
            );
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "nova_resolve=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    };

    let usage_store: Arc<dyn UsageStore> =
        Arc::new(JsonUsageStore::new(Config::data_path("usage.json")));
    let usage = Arc::new(UsageTracker::new());
    usage.load_from(usage_store.as_ref());

    // Flushes on its interval while we run and once more at shutdown
    let shutdown = CancellationToken::new();
    let flusher = spawn_periodic_flush(
        Arc::clone(&usage),
        Arc::clone(&usage_store),
        config.usage.flush_interval(),
        shutdown.clone(),
    );

    let rates = Arc::new(CurrencyService::new(
        Arc::new(OfflineFetcher),
        Some(Config::data_path("rates.json")),
        config.currency.clone(),
    ));

    let engine = SearchEngine::builder(config)
        .command_store(Arc::new(JsonCommandStore::new(Config::data_path(
            "commands.json",
        ))))
        .usage(Arc::clone(&usage))
        .rates(rates)
        .build();

    let query = cli.query.join(" ");
    let results = if cli.resolve_only {
        let mut resolved: Vec<SearchResult> = engine.resolve_command(&query).into_iter().collect();
        for (i, result) in resolved.iter_mut().enumerate() {
            result.index = i + 1;
        }
        resolved
    } else {
        engine.search(&query, &CancellationToken::new()).await
    };

    print_results(&results, cli.json)?;

    let mut failed = false;
    if let Some(index) = cli.execute {
        let Some(result) = results.iter().find(|r| r.index == index) else {
            bail!("no result at index {}", index);
        };

        let outcome = engine
            .execute(result, cli.param.as_deref().unwrap_or_default())
            .await;
        if cli.json {
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        } else {
            if let Some(output) = &outcome.output {
                print!("{}", output.stdout);
                eprint!("{}", output.stderr);
            }
            if let Some(message) = &outcome.message {
                eprintln!("{}", message);
            }
        }
        failed = !outcome.success;
    }

    shutdown.cancel();
    flusher.await.context("usage flush task failed")?;

    if failed {
        std::process::exit(1);
    }

    Ok(())
}
