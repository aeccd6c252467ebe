//! Nova resolver - turns one line of launcher input into one ranked list.
//!
//! A query is matched against command definitions, run through a
//! priority-ordered pipeline of syntax handlers (currency, color, unit,
//! shell, calculator, text tools, web search), and fanned out to the
//! application, file and window providers. The merged list is ranked by
//! group, score and usage.
//!
//! # Architecture
//!
//! - [`config`] - Configuration loading and management
//! - [`core`] - Result model, command matching and the search engine
//! - [`handlers`] - The command handler pipeline
//! - [`services`] - Evaluator, conversion tables, stores and providers
//! - [`executor`] - The launch collaborator and execution outcomes
//! - [`platform`] - OS-specific launching, windows and app discovery
//!
//! # Example
//!
//! ```ignore
//! use nova_resolve::{Config, SearchEngine};
//! use tokio_util::sync::CancellationToken;
//!
//! let engine = SearchEngine::builder(Config::load()).build();
//! let results = engine.search("100 km to mile", &CancellationToken::new()).await;
//! assert_eq!(results[0].title, "62.14 mile");
//! ```

pub mod config;
pub mod core;
pub mod executor;
pub mod handlers;
pub mod platform;
pub mod search;
pub mod services;

mod error;

pub use crate::core::{Action, ResultKind, SearchEngine, SearchEngineBuilder, SearchResult};
pub use config::Config;
pub use error::{NovaError, NovaResult};
pub use executor::{ExecutionOutcome, HostAction, LaunchRequest, Launcher};
pub use platform::{AppEntry, SystemCommand, SystemLauncher};
