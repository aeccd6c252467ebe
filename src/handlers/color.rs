use super::CommandHandler;
use crate::core::result::{Action, ResultKind, SearchResult};
use crate::services::color::Color;

/// Hex, `rgb()` and `hsl()` colors, shown in all three notations.
pub struct ColorHandler;

impl CommandHandler for ColorHandler {
    fn name(&self) -> &str {
        "color"
    }

    fn priority(&self) -> i32 {
        20
    }

    fn try_handle(&self, query: &str) -> Option<SearchResult> {
        let color = Color::parse(query)?;
        let (hex, rgb, hsl) = (color.hex(), color.rgb_string(), color.hsl_string());

        Some(
            SearchResult::new(format!("color:{}", hex), hex.clone(), ResultKind::TextTool)
                .with_subtitle(format!("{} · {}", rgb, hsl))
                .with_score(1.0)
                .with_icon("🎨")
                .with_action(Action::Color { hex, rgb, hsl }),
        )
    }
}
