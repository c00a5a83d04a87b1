//! Expiry sweeper configuration
//!
//! The period comes from the unprefixed `TTL_CHECK_PERIOD` variable and uses
//! the same duration syntax as membership TTLs (`"30m"`, `"1h30m"`, `"2d"`).

use std::time::Duration;

use crate::domain::foundation::Ttl;

/// Environment variable holding the sweep period.
pub const TTL_CHECK_PERIOD_VAR: &str = "TTL_CHECK_PERIOD";

const DEFAULT_CHECK_PERIOD: Duration = Duration::from_secs(60 * 60);

/// Sweeper configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweeperConfig {
    /// Time between expiry sweeps
    pub check_period: Duration,
}

impl SweeperConfig {
    /// Read `TTL_CHECK_PERIOD` from the environment.
    pub fn from_env() -> Self {
        Self::from_raw(std::env::var(TTL_CHECK_PERIOD_VAR).ok().as_deref())
    }

    /// Build from a raw period string. Missing, unparsable or zero values
    /// fall back to one hour.
    pub fn from_raw(raw: Option<&str>) -> Self {
        let check_period = match raw.map(str::trim).filter(|s| !s.is_empty()) {
            None => DEFAULT_CHECK_PERIOD,
            Some(value) => match Ttl::parse(value) {
                Ok(ttl) if !ttl.as_duration().is_zero() => ttl.as_duration(),
                Ok(_) => {
                    tracing::warn!(value, "{} is zero; using 1h", TTL_CHECK_PERIOD_VAR);
                    DEFAULT_CHECK_PERIOD
                }
                Err(e) => {
                    tracing::warn!(value, error = %e, "Invalid {}; using 1h", TTL_CHECK_PERIOD_VAR);
                    DEFAULT_CHECK_PERIOD
                }
            },
        };
        Self { check_period }
    }
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self {
            check_period: DEFAULT_CHECK_PERIOD,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_period_defaults_to_one_hour() {
        assert_eq!(SweeperConfig::from_raw(None).check_period, Duration::from_secs(3600));
        assert_eq!(SweeperConfig::from_raw(Some("")).check_period, Duration::from_secs(3600));
    }

    #[test]
    fn valid_period_is_used() {
        assert_eq!(
            SweeperConfig::from_raw(Some("1m30s")).check_period,
            Duration::from_secs(90)
        );
        assert_eq!(
            SweeperConfig::from_raw(Some("250ms")).check_period,
            Duration::from_millis(250)
        );
    }

    #[test]
    fn invalid_or_zero_period_falls_back() {
        for raw in ["soon", "-5m", "0", "0s"] {
            assert_eq!(
                SweeperConfig::from_raw(Some(raw)).check_period,
                Duration::from_secs(3600),
                "{}",
                raw
            );
        }
    }
}
