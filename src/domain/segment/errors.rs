//! Segment-specific error types.
//!
//! # HTTP Status Mapping
//!
//! | Error | HTTP Status |
//! |-------|-------------|
//! | DuplicateSlug | 409 |
//! | SegmentNotFound | 404 |
//! | ReportNotFound | 404 |
//! | InvalidTtl | 400 |
//! | InvalidPercent | 400 |
//! | InvalidReportMonth | 400 |
//! | ValidationFailed | 400 |
//! | StoreUnavailable | 503 |
//! | StatementFailed | 500 |
//! | ReportStorage | 500 |

use thiserror::Error;

use crate::domain::foundation::{DomainError, ErrorCode, ValidationError};

/// Errors surfaced by segment and membership operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SegmentError {
    /// A segment with this slug already exists.
    #[error("Segment '{0}' already exists")]
    DuplicateSlug(String),

    /// No segment has this slug.
    #[error("Segment '{0}' does not exist")]
    SegmentNotFound(String),

    /// TTL string could not be parsed.
    #[error("Invalid TTL: {0}")]
    InvalidTtl(String),

    /// Sampling percentage outside the accepted range.
    #[error("Percent must be between 1 and 100, got {0}")]
    InvalidPercent(i64),

    /// Report month is not `YYYY-MM`.
    #[error("Invalid report month: {0}")]
    InvalidReportMonth(String),

    /// Requested report file does not exist.
    #[error("Report '{0}' not found")]
    ReportNotFound(String),

    /// Any other input validation failure.
    #[error("Validation failed for '{field}': {message}")]
    ValidationFailed { field: String, message: String },

    /// The store could not be reached.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// The store rejected or failed a statement.
    #[error("Statement failed: {0}")]
    StatementFailed(String),

    /// Report file could not be written or read.
    #[error("Report storage failed: {0}")]
    ReportStorage(String),
}

impl SegmentError {
    pub fn duplicate_slug(slug: impl Into<String>) -> Self {
        SegmentError::DuplicateSlug(slug.into())
    }

    pub fn segment_not_found(slug: impl Into<String>) -> Self {
        SegmentError::SegmentNotFound(slug.into())
    }

    pub fn invalid_ttl(reason: impl Into<String>) -> Self {
        SegmentError::InvalidTtl(reason.into())
    }

    pub fn invalid_percent(value: i64) -> Self {
        SegmentError::InvalidPercent(value)
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        SegmentError::ValidationFailed {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Returns the error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            SegmentError::DuplicateSlug(_) => ErrorCode::DuplicateSlug,
            SegmentError::SegmentNotFound(_) => ErrorCode::SegmentNotFound,
            SegmentError::InvalidTtl(_) => ErrorCode::InvalidTtl,
            SegmentError::InvalidPercent(_) => ErrorCode::InvalidPercent,
            SegmentError::InvalidReportMonth(_) => ErrorCode::InvalidReportMonth,
            SegmentError::ReportNotFound(_) => ErrorCode::ReportNotFound,
            SegmentError::ValidationFailed { .. } => ErrorCode::ValidationFailed,
            SegmentError::StoreUnavailable(_) => ErrorCode::StoreUnavailable,
            SegmentError::StatementFailed(_) => ErrorCode::DatabaseError,
            SegmentError::ReportStorage(_) => ErrorCode::ReportStorageError,
        }
    }
}

impl From<ValidationError> for SegmentError {
    fn from(err: ValidationError) -> Self {
        match err.field() {
            "ttl" => SegmentError::InvalidTtl(err.to_string()),
            "percent" => match err {
                ValidationError::OutOfRange { actual, .. } => SegmentError::InvalidPercent(actual),
                other => SegmentError::validation("percent", other.to_string()),
            },
            "month" | "year" => SegmentError::InvalidReportMonth(err.to_string()),
            field => SegmentError::validation(field, err.to_string()),
        }
    }
}

impl From<DomainError> for SegmentError {
    fn from(err: DomainError) -> Self {
        let subject = |key: &str| err.detail(key).unwrap_or(&err.message).to_string();
        match err.code {
            ErrorCode::DuplicateSlug => SegmentError::DuplicateSlug(subject("slug")),
            ErrorCode::SegmentNotFound => SegmentError::SegmentNotFound(subject("slug")),
            ErrorCode::ReportNotFound => SegmentError::ReportNotFound(subject("report")),
            ErrorCode::InvalidTtl => SegmentError::InvalidTtl(err.message.clone()),
            ErrorCode::InvalidReportMonth => SegmentError::InvalidReportMonth(err.message.clone()),
            ErrorCode::ValidationFailed | ErrorCode::InvalidPercent => SegmentError::ValidationFailed {
                field: subject("field"),
                message: err.message.clone(),
            },
            ErrorCode::StoreUnavailable => SegmentError::StoreUnavailable(err.message.clone()),
            ErrorCode::ReportStorageError => SegmentError::ReportStorage(err.message.clone()),
            ErrorCode::DatabaseError | ErrorCode::InternalError => {
                SegmentError::StatementFailed(err.message.clone())
            }
        }
    }
}

impl From<SegmentError> for DomainError {
    fn from(err: SegmentError) -> Self {
        DomainError::new(err.code(), err.to_string())
    }
}
