use super::{split_head, CommandHandler};
use crate::core::result::{Action, ResultKind, SearchResult};
use crate::services::text_tools::{single_line_preview, TextTool, TextToolError, PREVIEW_CHARS};

/// `base64`, `base64d`, `md5`, `sha256`, `url` and `json` prefixes.
pub struct TextToolHandler;

impl CommandHandler for TextToolHandler {
    fn name(&self) -> &str {
        "text"
    }

    fn priority(&self) -> i32 {
        70
    }

    fn try_handle(&self, query: &str) -> Option<SearchResult> {
        let (head, input) = split_head(query);
        let tool = TextTool::from_keyword(&head)?;
        if input.is_empty() {
            return None;
        }

        let result = match tool.apply(input) {
            Ok(output) => SearchResult::new(
                format!("text:{}", tool.keyword()),
                single_line_preview(&output.text, PREVIEW_CHARS),
                ResultKind::TextTool,
            )
            .with_subtitle(output.label)
            .with_action(Action::CopyText { text: output.text }),
            Err(TextToolError::DecodeFailed(reason)) => {
                SearchResult::new("", "Decode failed", ResultKind::TextTool).with_subtitle(reason)
            }
            Err(TextToolError::InvalidJson(reason)) => {
                SearchResult::new("", "Invalid JSON", ResultKind::TextTool).with_subtitle(reason)
            }
        };

        Some(result.with_score(1.0).with_icon("🔤"))
    }
}
