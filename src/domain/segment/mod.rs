//! Segment domain module.
//!
//! Segments are named cohorts of users. Membership may be permanent or
//! time-limited, and cohorts may be filled by random sampling.
//!
//! # Module Structure
//!
//! - `segment` - Segment entity
//! - `slug` - SegmentSlug value object
//! - `membership` - Membership rows, bulk windows and add/remove deltas
//! - `sampling` - Percentage-based random cohort selection
//! - `report` - Monthly audit report types
//! - `errors` - SegmentError

mod errors;
mod membership;
mod report;
mod sampling;
#[allow(clippy::module_inception)]
mod segment;
mod slug;

pub use errors::SegmentError;
pub use membership::{DeltaOutcome, Membership, MembershipDelta, MembershipWindow};
pub use report::{MembershipEvent, MembershipOperation, ReportMonth};
pub use sampling::{sample_size, CohortSampler};
pub use segment::Segment;
pub use slug::SegmentSlug;
