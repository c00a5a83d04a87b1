//! Time-to-live value object parsed from duration strings.
//!
//! Accepts a sequence of decimal numbers each followed by a unit, such as
//! `"24h"`, `"1h30m"`, `"1.5d"` or `"2w"`. Supported units:
//!
//! | Unit | Meaning |
//! |------|---------|
//! | `ns` | nanoseconds |
//! | `us`, `µs` | microseconds |
//! | `ms` | milliseconds |
//! | `s` | seconds |
//! | `m` | minutes |
//! | `h` | hours |
//! | `d` | days (24h) |
//! | `w` | weeks (7d) |
//! | `y` | years (365d) |
//!
//! A bare `"0"` is accepted. Negative durations are rejected.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use super::{Timestamp, ValidationError};

const NANOS_PER_SEC: u128 = 1_000_000_000;

/// A non-negative membership lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Ttl(Duration);

impl Ttl {
    /// Wraps an already-known duration.
    pub fn from_duration(duration: Duration) -> Self {
        Self(duration)
    }

    /// Parses a duration string.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        parse_duration(input).map(Self)
    }

    /// Parses an optional duration string, treating `None` as "no expiry".
    pub fn parse_optional(input: Option<&str>) -> Result<Option<Self>, ValidationError> {
        input.map(Self::parse).transpose()
    }

    /// Returns the underlying duration.
    pub fn as_duration(&self) -> Duration {
        self.0
    }

    /// The instant at which a membership created at `from` expires.
    pub fn expires_at(&self, from: Timestamp) -> Timestamp {
        from.plus(self.0)
    }
}

impl FromStr for Ttl {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Ttl {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Ttl> for String {
    fn from(ttl: Ttl) -> Self {
        ttl.to_string()
    }
}

impl fmt::Display for Ttl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let secs = self.0.as_secs();
        let nanos = self.0.subsec_nanos();
        if nanos != 0 {
            return write!(f, "{}ns", self.0.as_nanos());
        }
        if secs == 0 {
            return write!(f, "0s");
        }
        let (h, rem) = (secs / 3600, secs % 3600);
        let (m, s) = (rem / 60, rem % 60);
        if h > 0 {
            write!(f, "{}h", h)?;
        }
        if m > 0 {
            write!(f, "{}m", m)?;
        }
        if s > 0 {
            write!(f, "{}s", s)?;
        }
        Ok(())
    }
}

fn invalid(reason: impl Into<String>) -> ValidationError {
    ValidationError::invalid_format("ttl", reason)
}

fn unit_nanos(unit: &str) -> Option<u128> {
    let nanos = match unit {
        "ns" => 1,
        "us" | "µs" | "μs" => 1_000,
        "ms" => 1_000_000,
        "s" => NANOS_PER_SEC,
        "m" => 60 * NANOS_PER_SEC,
        "h" => 3_600 * NANOS_PER_SEC,
        "d" => 86_400 * NANOS_PER_SEC,
        "w" => 7 * 86_400 * NANOS_PER_SEC,
        "y" => 365 * 86_400 * NANOS_PER_SEC,
        _ => return None,
    };
    Some(nanos)
}

fn parse_duration(input: &str) -> Result<Duration, ValidationError> {
    let s = input.trim();
    if s.is_empty() {
        return Err(ValidationError::empty_field("ttl"));
    }

    let s = match s.as_bytes()[0] {
        b'-' => return Err(invalid("duration must not be negative")),
        b'+' => &s[1..],
        _ => s,
    };
    if s == "0" {
        return Ok(Duration::ZERO);
    }
    if s.is_empty() {
        return Err(invalid(format!("'{}' has no value", input)));
    }

    let mut total: u128 = 0;
    let mut rest = s;
    while !rest.is_empty() {
        let int_len = rest.bytes().take_while(u8::is_ascii_digit).count();
        let int_part = &rest[..int_len];
        rest = &rest[int_len..];

        let mut frac_part = "";
        if let Some(after_dot) = rest.strip_prefix('.') {
            let frac_len = after_dot.bytes().take_while(u8::is_ascii_digit).count();
            frac_part = &after_dot[..frac_len];
            rest = &after_dot[frac_len..];
        }
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(invalid(format!("'{}' is missing a number", input)));
        }

        let unit_len = rest
            .char_indices()
            .find(|(_, c)| c.is_ascii_digit() || *c == '.')
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        let unit = &rest[..unit_len];
        rest = &rest[unit_len..];
        if unit.is_empty() {
            return Err(invalid(format!("'{}' is missing a unit", input)));
        }
        let scale = unit_nanos(unit).ok_or_else(|| invalid(format!("unknown unit '{}'", unit)))?;

        let whole: u128 = if int_part.is_empty() {
            0
        } else {
            int_part
                .parse()
                .map_err(|_| invalid(format!("'{}' is out of range", input)))?
        };
        let mut component = whole
            .checked_mul(scale)
            .ok_or_else(|| invalid(format!("'{}' is out of range", input)))?;

        // Fractional digits beyond nanosecond precision are dropped.
        let mut divisor: u128 = 1;
        let mut frac: u128 = 0;
        for digit in frac_part.bytes().take(9) {
            frac = frac * 10 + u128::from(digit - b'0');
            divisor *= 10;
        }
        if frac > 0 {
            component = component
                .checked_add(frac * scale / divisor)
                .ok_or_else(|| invalid(format!("'{}' is out of range", input)))?;
        }

        total = total
            .checked_add(component)
            .ok_or_else(|| invalid(format!("'{}' is out of range", input)))?;
    }

    let secs = u64::try_from(total / NANOS_PER_SEC)
        .map_err(|_| invalid(format!("'{}' is out of range", input)))?;
    Ok(Duration::new(secs, (total % NANOS_PER_SEC) as u32))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(input: &str) -> u64 {
        Ttl::parse(input).unwrap().as_duration().as_secs()
    }

    #[test]
    fn parses_common_units() {
        assert_eq!(secs("30s"), 30);
        assert_eq!(secs("30m"), 1_800);
        assert_eq!(secs("24h"), 86_400);
        assert_eq!(secs("2d"), 172_800);
        assert_eq!(secs("1w"), 604_800);
        assert_eq!(secs("1y"), 31_536_000);
    }

    #[test]
    fn parses_compound_and_fractional_values() {
        assert_eq!(secs("1h30m"), 5_400);
        assert_eq!(secs("1.5h"), 5_400);
        assert_eq!(secs(".5m"), 30);
        assert_eq!(
            Ttl::parse("1500ms").unwrap().as_duration(),
            Duration::from_millis(1_500)
        );
        assert_eq!(
            Ttl::parse("250us").unwrap().as_duration(),
            Duration::from_micros(250)
        );
    }

    #[test]
    fn accepts_zero_and_explicit_plus() {
        assert_eq!(Ttl::parse("0").unwrap().as_duration(), Duration::ZERO);
        assert_eq!(secs("+10s"), 10);
    }

    #[test]
    fn rejects_malformed_input() {
        for bad in ["", "   ", "h", "10", "10x", "abc", "1h-5m", "-1h", "+", "1..5h"] {
            assert!(Ttl::parse(bad).is_err(), "expected '{}' to be rejected", bad);
        }
    }

    #[test]
    fn rejects_overflowing_values() {
        assert!(Ttl::parse("99999999999999999999999999999999999999y").is_err());
    }

    #[test]
    fn parse_optional_passes_none_through() {
        assert_eq!(Ttl::parse_optional(None).unwrap(), None);
        assert!(Ttl::parse_optional(Some("1h")).unwrap().is_some());
        assert!(Ttl::parse_optional(Some("soon")).is_err());
    }

    #[test]
    fn expires_at_offsets_from_creation_time() {
        let created = Timestamp::from_unix_secs(10_000);
        let ttl = Ttl::parse("1h").unwrap();
        assert_eq!(ttl.expires_at(created).as_unix_secs(), 13_600);
    }

    #[test]
    fn displays_in_hours_minutes_seconds() {
        assert_eq!(Ttl::parse("90m").unwrap().to_string(), "1h30m");
        assert_eq!(Ttl::parse("0").unwrap().to_string(), "0s");
        assert_eq!(Ttl::parse("45s").unwrap().to_string(), "45s");
    }

    #[test]
    fn serde_uses_duration_strings() {
        let ttl: Ttl = serde_json::from_str("\"2h\"").unwrap();
        assert_eq!(ttl.as_duration().as_secs(), 7_200);
        assert_eq!(serde_json::to_string(&ttl).unwrap(), "\"2h\"");
        assert!(serde_json::from_str::<Ttl>("\"later\"").is_err());
    }
}
