//! Currency conversion with a tiered rate cache.
//!
//! Lookups walk four tiers and stop at the first that answers:
//!
//! 1. the in-memory table, while younger than `memory_ttl_secs`
//! 2. a fetch bounded by `fetch_timeout_ms`
//! 3. the on-disk `rates.json`, while younger than `disk_ttl_secs`
//! 4. a live fetch bounded by `live_timeout_ms`
//!
//! When every tier fails, fetching for that base is skipped for
//! `failure_backoff_secs` so repeated queries answer at once.
//!
//! The network client is injected through [`RateFetcher`].

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::config::CurrencyConfig;
use crate::error::{NovaError, NovaResult};
use crate::services::format::format_number;
use crate::services::usage::{Clock, SystemClock};

/// ISO 4217 codes the converter recognizes.
pub const KNOWN_CURRENCIES: &[&str] = &[
    "AED", "ARS", "AUD", "BGN", "BRL", "CAD", "CHF", "CLP", "CNY", "COP", "CZK", "DKK", "EGP",
    "EUR", "GBP", "HKD", "HUF", "IDR", "ILS", "INR", "ISK", "JPY", "KRW", "KZT", "MXN", "MYR",
    "NGN", "NOK", "NZD", "PEN", "PHP", "PKR", "PLN", "RON", "RUB", "SAR", "SEK", "SGD", "THB",
    "TRY", "TWD", "UAH", "USD", "VND", "ZAR",
];

/// Whether `code` is a known ISO currency code (case-insensitive).
pub fn is_known_currency(code: &str) -> bool {
    let upper = code.to_ascii_uppercase();
    KNOWN_CURRENCIES.contains(&upper.as_str())
}

/// One converted amount.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrencyQuote {
    pub rate: f64,
    /// Converted amount with its code, e.g. `"92.5 EUR"`
    pub formatted: String,
    /// e.g. `"1 USD = 0.925 EUR"`
    pub unit_rate_text: String,
    /// Unix timestamp of the rate table used
    pub fetched_at: u64,
    pub from_cache: bool,
}

/// Converts amounts between currencies.
pub trait RateProvider: Send + Sync {
    fn convert(&self, amount: f64, from: &str, to: &str) -> NovaResult<CurrencyQuote>;
}

/// Network source of exchange rates.
pub trait RateFetcher: Send + Sync {
    /// Rates for one unit of `base`, keyed by uppercase code.
    ///
    /// Implementations must give up after `timeout`.
    fn fetch(&self, base: &str, timeout: Duration) -> NovaResult<HashMap<String, f64>>;
}

/// Fetcher for hosts without network access; every fetch fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineFetcher;

impl RateFetcher for OfflineFetcher {
    fn fetch(&self, base: &str, _timeout: Duration) -> NovaResult<HashMap<String, f64>> {
        Err(NovaError::Network(format!("no rate source for {}", base)))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RateTable {
    fetched_at: u64,
    rates: HashMap<String, f64>,
}

/// Tiered converter owning its memory cache and disk cache file.
pub struct CurrencyService {
    fetcher: Arc<dyn RateFetcher>,
    cache_path: Option<PathBuf>,
    settings: CurrencyConfig,
    clock: Arc<dyn Clock>,
    memory: Mutex<HashMap<String, RateTable>>,
    /// When the last all-tier failure happened, per base
    failures: Mutex<HashMap<String, u64>>,
    disk: Mutex<()>,
}

impl CurrencyService {
    pub fn new(
        fetcher: Arc<dyn RateFetcher>,
        cache_path: Option<PathBuf>,
        settings: CurrencyConfig,
    ) -> Self {
        Self::with_clock(fetcher, cache_path, settings, Arc::new(SystemClock))
    }

    pub fn with_clock(
        fetcher: Arc<dyn RateFetcher>,
        cache_path: Option<PathBuf>,
        settings: CurrencyConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            fetcher,
            cache_path,
            settings,
            clock,
            memory: Mutex::new(HashMap::new()),
            failures: Mutex::new(HashMap::new()),
            disk: Mutex::new(()),
        }
    }

    fn rate_table(&self, base: &str) -> NovaResult<(RateTable, bool)> {
        let now = self.clock.now();

        if let Some(table) = self.memory.lock().get(base) {
            if now.saturating_sub(table.fetched_at) < self.settings.memory_ttl_secs {
                tracing::debug!(base, "currency rates from memory");
                return Ok((table.clone(), true));
            }
        }

        let backing_off = self.failures.lock().get(base).is_some_and(|failed_at| {
            now.saturating_sub(*failed_at) < self.settings.failure_backoff_secs
        });

        if !backing_off {
            match self.fetch_and_store(base, self.settings.fetch_timeout()) {
                Ok(table) => return Ok((table, false)),
                Err(e) => tracing::warn!(base, error = %e, "quick rate fetch failed"),
            }
        }

        if let Some(table) = self.read_disk(base) {
            if now.saturating_sub(table.fetched_at) < self.settings.disk_ttl_secs {
                tracing::debug!(base, "currency rates from disk cache");
                self.memory.lock().insert(base.to_string(), table.clone());
                return Ok((table, true));
            }
        }

        if backing_off {
            tracing::debug!(base, "skipping rate fetch after recent failure");
            return Err(NovaError::Network(format!(
                "rates for {} unavailable, retrying later",
                base
            )));
        }

        match self.fetch_and_store(base, self.settings.live_timeout()) {
            Ok(table) => Ok((table, false)),
            Err(e) => {
                self.failures.lock().insert(base.to_string(), now);
                Err(e)
            }
        }
    }

    fn fetch_and_store(&self, base: &str, timeout: Duration) -> NovaResult<RateTable> {
        let rates = self.fetcher.fetch(base, timeout)?;
        let table = RateTable {
            fetched_at: self.clock.now(),
            rates: rates
                .into_iter()
                .map(|(code, rate)| (code.to_ascii_uppercase(), rate))
                .collect(),
        };

        self.memory.lock().insert(base.to_string(), table.clone());
        self.failures.lock().remove(base);
        if let Err(e) = self.write_disk(base, &table) {
            tracing::warn!(base, error = %e, "failed to write rate cache");
        }
        Ok(table)
    }

    fn read_disk(&self, base: &str) -> Option<RateTable> {
        let path = self.cache_path.as_ref()?;
        let _guard = self.disk.lock();
        let mut tables = read_tables(path)?;
        tables.remove(base)
    }

    fn write_disk(&self, base: &str, table: &RateTable) -> NovaResult<()> {
        let Some(path) = self.cache_path.as_ref() else {
            return Ok(());
        };
        let _guard = self.disk.lock();

        let mut tables = read_tables(path).unwrap_or_default();
        tables.insert(base.to_string(), table.clone());

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(&tables)?)?;
        Ok(())
    }
}

fn read_tables(path: &Path) -> Option<HashMap<String, RateTable>> {
    let content = fs::read_to_string(path).ok()?;
    match serde_json::from_str(&content) {
        Ok(tables) => Some(tables),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring corrupt rate cache");
            None
        }
    }
}

/// Rates get four decimals so small cross rates stay readable.
fn format_rate(rate: f64) -> String {
    if rate.abs() >= 1.0 {
        return format_number(rate);
    }
    let formatted = format!("{:.4}", rate);
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    if trimmed == "0" || trimmed == "-0" {
        format_number(rate)
    } else {
        trimmed.to_string()
    }
}

impl RateProvider for CurrencyService {
    fn convert(&self, amount: f64, from: &str, to: &str) -> NovaResult<CurrencyQuote> {
        let from = from.to_ascii_uppercase();
        let to = to.to_ascii_uppercase();

        for code in [&from, &to] {
            if !is_known_currency(code) {
                return Err(NovaError::UnsupportedConversion(format!(
                    "unsupported currency {}",
                    code
                )));
            }
        }

        let (rate, fetched_at, from_cache) = if from == to {
            (1.0, self.clock.now(), true)
        } else {
            let (table, from_cache) = self.rate_table(&from)?;
            let rate = table.rates.get(&to).copied().ok_or_else(|| {
                NovaError::UnsupportedConversion(format!("no rate from {} to {}", from, to))
            })?;
            (rate, table.fetched_at, from_cache)
        };

        Ok(CurrencyQuote {
            rate,
            formatted: format!("{} {}", format_number(amount * rate), to),
            unit_rate_text: format!("1 {} = {} {}", from, format_rate(rate), to),
            fetched_at,
            from_cache,
        })
    }
}
