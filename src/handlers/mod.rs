//! Command handler pipeline.
//!
//! Handlers recognize special query syntaxes (conversions, expressions, text
//! transforms, shell escapes, web searches). The pipeline runs them in
//! ascending priority and stops at the first one that matches. A handler
//! that declines must leave shared state untouched.

mod calculator;
mod color;
mod currency;
mod shell;
mod text_tools;
mod unit;
mod web_search;

pub use calculator::CalculatorHandler;
pub use color::ColorHandler;
pub use currency::CurrencyHandler;
pub use shell::ShellHandler;
pub use text_tools::TextToolHandler;
pub use unit::UnitHandler;
pub use web_search::WebSearchHandler;

use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;

use crate::config::Config;
use crate::core::result::{SearchResult, GROUP_COMMANDS};
use crate::services::currency::RateProvider;

/// A single-purpose recognizer in the pipeline
pub trait CommandHandler: Send + Sync {
    /// Name used in logs
    fn name(&self) -> &str;

    /// Lower runs first
    fn priority(&self) -> i32;

    /// Produce a result for `query`, or `None` to let the next handler try.
    fn try_handle(&self, query: &str) -> Option<SearchResult>;
}

/// Handlers sorted once by priority at construction
pub struct HandlerPipeline {
    handlers: Vec<Box<dyn CommandHandler>>,
}

impl HandlerPipeline {
    pub fn new(mut handlers: Vec<Box<dyn CommandHandler>>) -> Self {
        handlers.sort_by_key(|handler| handler.priority());
        Self { handlers }
    }

    /// The default handler set
    pub fn standard(config: &Config, rates: Arc<dyn RateProvider>) -> Self {
        Self::new(vec![
            Box::new(CurrencyHandler::new(rates)),
            Box::new(ColorHandler),
            Box::new(UnitHandler),
            Box::new(ShellHandler),
            Box::new(CalculatorHandler),
            Box::new(TextToolHandler),
            Box::new(WebSearchHandler::new(config.web.clone())),
        ])
    }

    /// First matching handler's result, tagged into the command group.
    pub fn resolve(&self, query: &str) -> Option<SearchResult> {
        let query = query.trim();
        if query.is_empty() {
            return None;
        }

        self.handlers.iter().find_map(|handler| {
            let mut result = handler.try_handle(query)?;
            tracing::trace!(handler = handler.name(), "handler matched");
            result.group_order = GROUP_COMMANDS;
            if result.match_score == 0.0 {
                result.match_score = 1.0;
            }
            Some(result)
        })
    }

    /// Handler names in run order
    pub fn names(&self) -> Vec<&str> {
        self.handlers.iter().map(|handler| handler.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

/// `<number>[ ]<unit> (to|in) <unit>` or `<number><unit>(转|换)<unit>`
static CONVERSION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(-?(?:\d+(?:\.\d*)?|\.\d+)(?:e[-+]?\d+)?)\s*([^\s\d]+?)(?:\s+(?:to|in)\s+|\s*[转换]\s*)(\S+)$",
    )
    .expect("valid regex")
});

/// A parsed `<value><from> to <to>` query
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ConversionQuery<'a> {
    pub value: f64,
    /// Value as typed, for subtitles
    pub value_text: &'a str,
    pub from: &'a str,
    pub to: &'a str,
}

pub(crate) fn parse_conversion(query: &str) -> Option<ConversionQuery<'_>> {
    let captures = CONVERSION_RE.captures(query.trim())?;
    let value_text = captures.get(1)?.as_str();
    Some(ConversionQuery {
        value: value_text.parse().ok()?,
        value_text,
        from: captures.get(2)?.as_str(),
        to: captures.get(3)?.as_str(),
    })
}

/// Split `query` at the first whitespace into a lowercased head and the rest.
pub(crate) fn split_head(query: &str) -> (String, &str) {
    let query = query.trim();
    match query.split_once(char::is_whitespace) {
        Some((head, rest)) => (head.to_lowercase(), rest.trim()),
        None => (query.to_lowercase(), ""),
    }
}
