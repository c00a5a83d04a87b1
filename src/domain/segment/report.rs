//! Monthly membership-change report types.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::SegmentSlug;
use crate::domain::foundation::{Timestamp, UserId, ValidationError};

/// Kind of membership change recorded in the audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MembershipOperation {
    Add,
    Delete,
}

impl MembershipOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            MembershipOperation::Add => "add",
            MembershipOperation::Delete => "delete",
        }
    }
}

impl FromStr for MembershipOperation {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "add" => Ok(MembershipOperation::Add),
            "delete" => Ok(MembershipOperation::Delete),
            other => Err(ValidationError::invalid_format(
                "operation",
                format!("unknown operation '{}'", other),
            )),
        }
    }
}

impl fmt::Display for MembershipOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the membership audit log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipEvent {
    pub user_id: UserId,
    pub segment_slug: SegmentSlug,
    pub operation: MembershipOperation,
    pub time: Timestamp,
}

/// A calendar month in `YYYY-MM` form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ReportMonth {
    year: i32,
    month: u32,
}

impl ReportMonth {
    pub fn new(year: i32, month: u32) -> Result<Self, ValidationError> {
        if !(1..=9999).contains(&year) {
            return Err(ValidationError::out_of_range("year", 1, 9999, i64::from(year)));
        }
        if !(1..=12).contains(&month) {
            return Err(ValidationError::out_of_range("month", 1, 12, i64::from(month)));
        }
        Ok(Self { year, month })
    }

    /// Parses strictly `YYYY-MM` (four-digit year, two-digit month).
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let malformed =
            || ValidationError::invalid_format("month", "wrong date format: please use YYYY-MM");

        let (year, month) = input.split_once('-').ok_or_else(malformed)?;
        if year.len() != 4
            || month.len() != 2
            || !year.bytes().all(|b| b.is_ascii_digit())
            || !month.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(malformed());
        }
        let year: i32 = year.parse().map_err(|_| malformed())?;
        let month: u32 = month.parse().map_err(|_| malformed())?;
        Self::new(year, month)
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// First instant of the month (inclusive).
    pub fn start(&self) -> Timestamp {
        Timestamp::from_datetime(first_instant(self.year, self.month))
    }

    /// First instant of the following month (exclusive).
    pub fn end(&self) -> Timestamp {
        let (year, month) = if self.month == 12 {
            (self.year + 1, 1)
        } else {
            (self.year, self.month + 1)
        };
        Timestamp::from_datetime(first_instant(year, month))
    }

    /// Whether `ts` falls inside this month.
    pub fn contains(&self, ts: &Timestamp) -> bool {
        let dt = ts.as_datetime();
        dt.year() == self.year && dt.month() == self.month
    }
}

fn first_instant(year: i32, month: u32) -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

impl FromStr for ReportMonth {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ReportMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_valid_months() {
        let month = ReportMonth::parse("2023-08").unwrap();
        assert_eq!(month.year(), 2023);
        assert_eq!(month.month(), 8);
        assert_eq!(month.to_string(), "2023-08");
    }

    #[test]
    fn rejects_malformed_months() {
        for bad in ["2023-8", "2023-13", "2023-00", "23-08", "2023/08", "2023-08-01", "abcd-ef", ""] {
            assert!(ReportMonth::parse(bad).is_err(), "expected '{}' to be rejected", bad);
        }
    }

    #[test]
    fn bounds_span_the_month() {
        let month = ReportMonth::parse("2023-12").unwrap();
        assert_eq!(month.start().to_string(), "2023-12-01T00:00:00+00:00");
        assert_eq!(month.end().to_string(), "2024-01-01T00:00:00+00:00");
    }

    #[test]
    fn contains_matches_truncated_month() {
        let month = ReportMonth::parse("2024-02").unwrap();
        assert!(month.contains(&month.start()));
        assert!(!month.contains(&month.end()));
        assert!(month.contains(&month.end().plus_secs(-1)));
    }

    #[test]
    fn operation_parses_case_insensitively() {
        assert_eq!("ADD".parse::<MembershipOperation>().unwrap(), MembershipOperation::Add);
        assert_eq!("delete".parse::<MembershipOperation>().unwrap(), MembershipOperation::Delete);
        assert!("update".parse::<MembershipOperation>().is_err());
    }
}
