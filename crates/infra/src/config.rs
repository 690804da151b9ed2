//! Runtime settings read from `STOCKROOM_*` environment variables.
//!
//! A malformed value is logged and replaced by its default; startup never
//! fails on configuration.

use core::str::FromStr;

use serde::{Deserialize, Serialize};

use stockroom_observability::{LogFormat, LogSettings};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Parts with `0 < quantity <= threshold` count as low stock on the dashboard.
    pub low_stock_threshold: i64,
    /// Rows in the dashboard's recent-activity list.
    pub recent_transactions: usize,
    pub page_size: u32,
    pub max_page_size: u32,
    /// Length of the default report window, ending today.
    pub report_window_days: u32,
    /// Account promoted to super admin at startup.
    pub admin_email: String,
    pub log: LogSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            low_stock_threshold: 5,
            recent_transactions: 5,
            page_size: 20,
            max_page_size: 200,
            report_window_days: 30,
            admin_email: "admin@company.com".to_string(),
            log: LogSettings::default(),
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup (environment, test map).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let mut settings = Self {
            low_stock_threshold: parse_or(
                "STOCKROOM_LOW_STOCK_THRESHOLD",
                get("STOCKROOM_LOW_STOCK_THRESHOLD"),
                defaults.low_stock_threshold,
            ),
            recent_transactions: parse_or(
                "STOCKROOM_RECENT_TRANSACTIONS",
                get("STOCKROOM_RECENT_TRANSACTIONS"),
                defaults.recent_transactions,
            ),
            page_size: parse_or(
                "STOCKROOM_PAGE_SIZE",
                get("STOCKROOM_PAGE_SIZE"),
                defaults.page_size,
            ),
            max_page_size: parse_or(
                "STOCKROOM_MAX_PAGE_SIZE",
                get("STOCKROOM_MAX_PAGE_SIZE"),
                defaults.max_page_size,
            ),
            report_window_days: parse_or(
                "STOCKROOM_REPORT_WINDOW_DAYS",
                get("STOCKROOM_REPORT_WINDOW_DAYS"),
                defaults.report_window_days,
            ),
            admin_email: get("STOCKROOM_ADMIN_EMAIL")
                .map(|v| v.trim().to_string())
                .unwrap_or(defaults.admin_email),
            log: LogSettings {
                level: get("STOCKROOM_LOG_LEVEL")
                    .map(|v| v.trim().to_string())
                    .unwrap_or(defaults.log.level),
                format: parse_or::<LogFormat>(
                    "STOCKROOM_LOG_FORMAT",
                    get("STOCKROOM_LOG_FORMAT"),
                    defaults.log.format,
                ),
            },
        };

        if settings.low_stock_threshold < 0 {
            tracing::warn!(
                value = settings.low_stock_threshold,
                "STOCKROOM_LOW_STOCK_THRESHOLD is negative; using 0"
            );
            settings.low_stock_threshold = 0;
        }
        if settings.max_page_size == 0 {
            tracing::warn!("STOCKROOM_MAX_PAGE_SIZE is 0; using default");
            settings.max_page_size = defaults.max_page_size;
        }
        settings.page_size = settings.page_size.clamp(1, settings.max_page_size);
        if settings.report_window_days == 0 {
            tracing::warn!("STOCKROOM_REPORT_WINDOW_DAYS is 0; using default");
            settings.report_window_days = defaults.report_window_days;
        }
        settings
    }
}

fn parse_or<T>(key: &str, raw: Option<String>, default: T) -> T
where
    T: FromStr + core::fmt::Debug,
{
    match raw {
        None => default,
        Some(raw) => match raw.trim().parse() {
            Ok(v) => v,
            Err(_) => {
                tracing::warn!(key, value = %raw, default = ?default, "invalid setting; using default");
                default
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_yields_defaults() {
        assert_eq!(Settings::from_lookup(lookup(&[])), Settings::default());
    }

    #[test]
    fn reads_overrides() {
        let settings = Settings::from_lookup(lookup(&[
            ("STOCKROOM_LOW_STOCK_THRESHOLD", "10"),
            ("STOCKROOM_ADMIN_EMAIL", "boss@plant.example"),
            ("STOCKROOM_LOG_FORMAT", "pretty"),
        ]));
        assert_eq!(settings.low_stock_threshold, 10);
        assert_eq!(settings.admin_email, "boss@plant.example");
        assert_eq!(settings.log.format, LogFormat::Pretty);
    }

    #[test]
    fn malformed_values_fall_back() {
        let settings = Settings::from_lookup(lookup(&[
            ("STOCKROOM_PAGE_SIZE", "lots"),
            ("STOCKROOM_LOG_FORMAT", "xml"),
            ("STOCKROOM_REPORT_WINDOW_DAYS", "0"),
        ]));
        assert_eq!(settings.page_size, 20);
        assert_eq!(settings.log.format, LogFormat::Json);
        assert_eq!(settings.report_window_days, 30);
    }

    #[test]
    fn page_size_is_capped_by_max() {
        let settings = Settings::from_lookup(lookup(&[
            ("STOCKROOM_PAGE_SIZE", "500"),
            ("STOCKROOM_MAX_PAGE_SIZE", "100"),
        ]));
        assert_eq!(settings.page_size, 100);
    }
}
