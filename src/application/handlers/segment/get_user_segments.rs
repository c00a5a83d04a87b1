//! GetUserSegmentsHandler - Query handler listing a user's segments.

use std::sync::Arc;

use crate::domain::foundation::UserId;
use crate::domain::segment::{SegmentError, SegmentSlug};
use crate::ports::SegmentRepository;

/// Query for the segments a user belongs to.
#[derive(Debug, Clone)]
pub struct GetUserSegmentsQuery {
    pub user_id: UserId,
}

/// Slugs the user currently belongs to, ordered by slug.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetUserSegmentsResult {
    pub user_id: UserId,
    pub segments: Vec<SegmentSlug>,
}

/// Handler for listing user segments.
pub struct GetUserSegmentsHandler {
    repository: Arc<dyn SegmentRepository>,
}

impl GetUserSegmentsHandler {
    pub fn new(repository: Arc<dyn SegmentRepository>) -> Self {
        Self { repository }
    }

    pub async fn handle(
        &self,
        query: GetUserSegmentsQuery,
    ) -> Result<GetUserSegmentsResult, SegmentError> {
        let segments = self
            .repository
            .list_segment_slugs_for_user(query.user_id)
            .await?;

        Ok(GetUserSegmentsResult {
            user_id: query.user_id,
            segments,
        })
    }
}
