//! Runtime configuration.

use chrono::Duration;
use thiserror::Error;

use libris_catalog::LOAN_PERIOD_DAYS;

pub const LOAN_PERIOD_ENV: &str = "LIBRIS_LOAN_PERIOD_DAYS";
pub const ACTIVITY_PAGE_SIZE_ENV: &str = "LIBRIS_ACTIVITY_PAGE_SIZE";

/// Default number of entries on the recent-activity page.
pub const DEFAULT_ACTIVITY_PAGE_SIZE: usize = 50;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be a positive integer, got '{value}'")]
    InvalidNumber { var: &'static str, value: String },
}

/// Lending desk settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LibraryConfig {
    pub loan_period_days: i64,
    pub activity_page_size: usize,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            loan_period_days: LOAN_PERIOD_DAYS,
            activity_page_size: DEFAULT_ACTIVITY_PAGE_SIZE,
        }
    }
}

impl LibraryConfig {
    /// Defaults overridden by `LIBRIS_LOAN_PERIOD_DAYS` and
    /// `LIBRIS_ACTIVITY_PAGE_SIZE` when set.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Same as [`LibraryConfig::from_env`] with an explicit variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(raw) = lookup(LOAN_PERIOD_ENV) {
            config.loan_period_days = parse_positive(LOAN_PERIOD_ENV, &raw)?;
        }
        if let Some(raw) = lookup(ACTIVITY_PAGE_SIZE_ENV) {
            config.activity_page_size = parse_positive(ACTIVITY_PAGE_SIZE_ENV, &raw)?;
        }
        Ok(config)
    }

    pub fn loan_period(&self) -> Duration {
        Duration::days(self.loan_period_days)
    }
}

fn parse_positive<T>(var: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr + PartialOrd + Default,
{
    match raw.trim().parse::<T>() {
        Ok(v) if v > T::default() => Ok(v),
        _ => Err(ConfigError::InvalidNumber {
            var,
            value: raw.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_overrides() {
        let config = LibraryConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, LibraryConfig::default());
        assert_eq!(config.loan_period(), Duration::days(14));
        assert_eq!(config.activity_page_size, 50);
    }

    #[test]
    fn overrides_are_parsed() {
        let config = LibraryConfig::from_lookup(|var| match var {
            LOAN_PERIOD_ENV => Some(" 21 ".to_string()),
            ACTIVITY_PAGE_SIZE_ENV => Some("10".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(config.loan_period_days, 21);
        assert_eq!(config.activity_page_size, 10);
    }

    #[test]
    fn rejects_non_positive_values() {
        let err = LibraryConfig::from_lookup(|var| {
            (var == LOAN_PERIOD_ENV).then(|| "0".to_string())
        })
        .unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidNumber {
                var: LOAN_PERIOD_ENV,
                value: "0".to_string()
            }
        );

        assert!(
            LibraryConfig::from_lookup(|var| (var == ACTIVITY_PAGE_SIZE_ENV).then(|| "lots".to_string()))
                .is_err()
        );
    }
}
