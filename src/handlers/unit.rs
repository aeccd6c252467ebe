use super::{parse_conversion, CommandHandler};
use crate::core::result::{Action, ResultKind, SearchResult};
use crate::services::format::format_number;
use crate::services::units::{is_temperature_unit, try_convert};

/// `100 km to mile`, `30 c to f`, `5斤转kg`
pub struct UnitHandler;

impl CommandHandler for UnitHandler {
    fn name(&self) -> &str {
        "unit"
    }

    fn priority(&self) -> i32 {
        30
    }

    fn try_handle(&self, query: &str) -> Option<SearchResult> {
        let conversion = parse_conversion(query)?;
        let (from, to) = (conversion.from, conversion.to);
        let converted = try_convert(conversion.value, from, to)?;
        let formatted = format_number(converted);

        let mut subtitle = format!("{} {} = {} {}", conversion.value_text, from, formatted, to);
        if !is_temperature_unit(from) && !is_temperature_unit(to) {
            if let Some(reciprocal) = try_convert(1.0, to, from) {
                subtitle.push_str(&format!(" · 1 {} = {} {}", to, format_number(reciprocal), from));
            }
        }

        Some(
            SearchResult::new(
                format!("calc:{} {} to {}", conversion.value_text, from, to),
                format!("{} {}", formatted, to),
                ResultKind::Calculator,
            )
            .with_subtitle(subtitle)
            .with_score(1.0)
            .with_icon("📐")
            .with_action(Action::CopyText { text: formatted }),
        )
    }
}
