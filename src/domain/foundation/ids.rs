//! Strongly-typed identifier value objects.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ValidationError;

/// Identifier of a user in the external user population.
///
/// User ids are unsigned on the wire but stored as `BIGINT`, so values above
/// `i64::MAX` are rejected at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct UserId(u64);

impl UserId {
    /// Largest user id that fits the storage column.
    pub const MAX: u64 = i64::MAX as u64;

    /// Creates a UserId, rejecting values the store cannot hold.
    pub fn new(value: u64) -> Result<Self, ValidationError> {
        if value > Self::MAX {
            return Err(ValidationError::invalid_format(
                "user_id",
                format!("must not exceed {}", Self::MAX),
            ));
        }
        Ok(Self(value))
    }

    /// Creates a UserId from a database column value.
    pub fn from_db(value: i64) -> Result<Self, ValidationError> {
        u64::try_from(value)
            .map_err(|_| ValidationError::invalid_format("user_id", "must not be negative"))
            .map(Self)
    }

    /// Returns the raw value.
    pub fn value(&self) -> u64 {
        self.0
    }

    /// Returns the value as stored in the database.
    pub fn as_db(&self) -> i64 {
        // Bounded by `UserId::MAX` at construction.
        self.0 as i64
    }
}

impl TryFrom<u64> for UserId {
    type Error = ValidationError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<UserId> for u64 {
    fn from(id: UserId) -> Self {
        id.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for UserId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s
            .trim()
            .parse::<u64>()
            .map_err(|e| ValidationError::invalid_format("user_id", e.to_string()))?;
        Self::new(value)
    }
}

/// Database-assigned identifier of a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SegmentId(i64);

impl SegmentId {
    /// Wraps an id assigned by the store.
    pub fn from_db(value: i64) -> Self {
        Self(value)
    }

    /// Returns the raw value.
    pub fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for SegmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
