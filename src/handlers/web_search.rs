use super::{split_head, CommandHandler};
use crate::config::WebConfig;
use crate::core::result::{Action, ResultKind, SearchResult};

/// `g <terms>` opens the configured search engine.
pub struct WebSearchHandler {
    config: WebConfig,
}

impl WebSearchHandler {
    pub fn new(config: WebConfig) -> Self {
        Self { config }
    }
}

impl CommandHandler for WebSearchHandler {
    fn name(&self) -> &str {
        "web"
    }

    fn priority(&self) -> i32 {
        80
    }

    fn try_handle(&self, query: &str) -> Option<SearchResult> {
        let (head, terms) = split_head(query);
        if head != self.config.keyword.to_lowercase() || terms.is_empty() {
            return None;
        }

        let url = self.config.resolve_url(terms);
        Some(
            SearchResult::new(
                format!("search:{}", terms),
                format!("Search the web for \"{}\"", terms),
                ResultKind::WebSearch,
            )
            .with_subtitle(url.clone())
            .with_score(1.0)
            .with_icon("🔍")
            .with_query_match(terms)
            .with_action(Action::OpenUrl { url }),
        )
    }
}
