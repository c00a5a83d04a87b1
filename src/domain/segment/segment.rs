//! Segment entity.

use serde::{Deserialize, Serialize};

use super::SegmentSlug;
use crate::domain::foundation::SegmentId;

/// A named cohort of users.
///
/// Identity is the store-assigned id; the slug is unique and immutable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub id: SegmentId,
    pub slug: SegmentSlug,
}

impl Segment {
    pub fn new(id: SegmentId, slug: SegmentSlug) -> Self {
        Self { id, slug }
    }
}
