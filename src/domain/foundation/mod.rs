//! Foundation module - Shared domain primitives.
//!
//! Contains value objects, identifiers, and error types
//! that form the vocabulary of the segment service domain.

mod errors;
mod ids;
mod percentage;
mod timestamp;
mod ttl;

pub use errors::{DomainError, ErrorCode, ValidationError};
pub use ids::{SegmentId, UserId};
pub use percentage::Percentage;
pub use timestamp::Timestamp;
pub use ttl::Ttl;
