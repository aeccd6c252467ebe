use chrono::{Local, TimeZone};
use std::sync::Arc;

use super::{parse_conversion, CommandHandler};
use crate::core::result::{Action, ResultKind, SearchResult};
use crate::error::NovaError;
use crate::services::currency::{is_known_currency, RateProvider};

/// `100 usd to eur`, backed by the injected rate provider.
pub struct CurrencyHandler {
    rates: Arc<dyn RateProvider>,
}

impl CurrencyHandler {
    pub fn new(rates: Arc<dyn RateProvider>) -> Self {
        Self { rates }
    }
}

fn is_code_shaped(code: &str) -> bool {
    code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic())
}

fn fetched_label(fetched_at: u64, from_cache: bool) -> String {
    let when = i64::try_from(fetched_at)
        .ok()
        .and_then(|secs| Local.timestamp_opt(secs, 0).single())
        .map(|time| time.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "unknown time".to_string());
    if from_cache {
        format!("rates from {} (cached)", when)
    } else {
        format!("rates from {}", when)
    }
}

impl CommandHandler for CurrencyHandler {
    fn name(&self) -> &str {
        "currency"
    }

    fn priority(&self) -> i32 {
        10
    }

    fn try_handle(&self, query: &str) -> Option<SearchResult> {
        let conversion = parse_conversion(query)?;
        if !is_code_shaped(conversion.from) || !is_code_shaped(conversion.to) {
            return None;
        }

        let known = [conversion.from, conversion.to]
            .iter()
            .filter(|code| is_known_currency(code))
            .count();
        if known == 0 {
            // Probably a unit pair such as "mph to kph"
            return None;
        }

        let from = conversion.from.to_ascii_uppercase();
        let to = conversion.to.to_ascii_uppercase();
        let result = match self.rates.convert(conversion.value, &from, &to) {
            Ok(quote) => SearchResult::new(
                format!("calc:{} {} to {}", conversion.value_text, from, to),
                quote.formatted.clone(),
                ResultKind::Calculator,
            )
            .with_subtitle(format!(
                "{} · {}",
                quote.unit_rate_text,
                fetched_label(quote.fetched_at, quote.from_cache)
            ))
            .with_action(Action::CopyText {
                text: quote.formatted,
            }),
            Err(NovaError::UnsupportedConversion(message)) => {
                SearchResult::new("", "Unsupported currency", ResultKind::Calculator)
                    .with_subtitle(message)
            }
            Err(e) => {
                tracing::warn!(from = %from, to = %to, error = %e, "currency conversion failed");
                SearchResult::new("", "Currency conversion failed", ResultKind::Calculator)
                    .with_subtitle(e.to_string())
            }
        };

        Some(result.with_score(1.0).with_icon("💱"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NovaResult;
    use crate::services::currency::CurrencyQuote;
    use crate::services::format::format_number;

    struct FakeRates {
        online: bool,
    }

    impl RateProvider for FakeRates {
        fn convert(&self, amount: f64, from: &str, to: &str) -> NovaResult<CurrencyQuote> {
            if !is_known_currency(from) || !is_known_currency(to) {
                return Err(NovaError::UnsupportedConversion(format!(
                    "unsupported currency {}",
                    if is_known_currency(from) { to } else { from }
                )));
            }
            if !self.online {
                return Err(NovaError::Network("connection refused".to_string()));
            }
            Ok(CurrencyQuote {
                rate: 0.9,
                formatted: format!("{} {}", format_number(amount * 0.9), to),
                unit_rate_text: format!("1 {} = 0.9 {}", from, to),
                fetched_at: 1_700_000_000,
                from_cache: false,
            })
        }
    }

    fn handler(online: bool) -> CurrencyHandler {
        CurrencyHandler::new(Arc::new(FakeRates { online }))
    }

    #[test]
    fn test_converts_known_pair() {
        let result = handler(true).try_handle("100 usd to eur").unwrap();
        assert_eq!(result.title, "90 EUR");
        assert!(result.subtitle.starts_with("1 USD = 0.9 EUR · rates from "));
        assert_eq!(result.id, "calc:100 USD to EUR");
        assert_eq!(
            result.action,
            Action::CopyText {
                text: "90 EUR".to_string()
            }
        );
    }

    #[test]
    fn test_chinese_connector() {
        assert!(handler(true).try_handle("100usd换cny").is_some());
    }

    #[test]
    fn test_unknown_pair_declines() {
        assert!(handler(true).try_handle("100 mph to kph").is_none());
        assert!(handler(true).try_handle("100 km to mile").is_none());
    }

    #[test]
    fn test_one_unknown_code_is_explicit() {
        let result = handler(true).try_handle("5 usd to xyz").unwrap();
        assert_eq!(result.title, "Unsupported currency");
        assert_eq!(result.subtitle, "unsupported currency XYZ");
        assert!(result.id.is_empty());
    }

    #[test]
    fn test_network_failure_becomes_result() {
        let result = handler(false).try_handle("5 usd to eur").unwrap();
        assert_eq!(result.title, "Currency conversion failed");
        assert!(result.subtitle.contains("connection refused"));
        assert_eq!(result.action, Action::None);
    }
}
