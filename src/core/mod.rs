//! Core engine module - platform-agnostic resolution logic.
//!
//! - [`result`] - the result model shared by every source
//! - [`fuzzy`] - substring/subsequence scoring for providers
//! - [`commands`] - command definition matching
//! - [`search`] - the query orchestrator

pub mod commands;
pub mod fuzzy;
pub mod result;
pub mod search;

pub use result::{Action, ResultKind, SearchResult};
pub use search::{QueryPhase, SearchEngine, SearchEngineBuilder};
