use super::{split_head, CommandHandler};
use crate::core::result::{Action, ResultKind, SearchResult};
use crate::services::calculator::{evaluate, format_result, looks_like_math};

/// `calc <expr>`, or bare input that looks like math.
pub struct CalculatorHandler;

impl CommandHandler for CalculatorHandler {
    fn name(&self) -> &str {
        "calculator"
    }

    fn priority(&self) -> i32 {
        50
    }

    fn try_handle(&self, query: &str) -> Option<SearchResult> {
        let expression = match split_head(query) {
            (head, rest) if head == "calc" && !rest.is_empty() => rest,
            _ if looks_like_math(query) => query.trim(),
            _ => return None,
        };

        let result = match evaluate(expression) {
            Ok(value) => {
                let formatted = format_result(value);
                SearchResult::new(
                    format!("calc:{}", expression),
                    formatted.clone(),
                    ResultKind::Calculator,
                )
                .with_subtitle(format!("{} =", expression))
                .with_action(Action::CopyText { text: formatted })
            }
            Err(e) => SearchResult::new("", "Invalid expression", ResultKind::Calculator)
                .with_subtitle(e.to_string()),
        };

        Some(result.with_score(1.0).with_icon("🧮"))
    }
}
