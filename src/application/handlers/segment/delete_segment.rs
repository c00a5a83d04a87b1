//! DeleteSegmentHandler - Command handler for removing a segment and its memberships.

use std::sync::Arc;

use crate::domain::segment::{SegmentError, SegmentSlug};
use crate::ports::SegmentRepository;

/// Command to delete a segment.
#[derive(Debug, Clone)]
pub struct DeleteSegmentCommand {
    pub slug: String,
}

/// Result of a delete. Deleting an unknown slug succeeds with `deleted = false`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteSegmentResult {
    pub deleted: bool,
}

/// Handler for deleting segments.
pub struct DeleteSegmentHandler {
    repository: Arc<dyn SegmentRepository>,
}

impl DeleteSegmentHandler {
    pub fn new(repository: Arc<dyn SegmentRepository>) -> Self {
        Self { repository }
    }

    pub async fn handle(
        &self,
        cmd: DeleteSegmentCommand,
    ) -> Result<DeleteSegmentResult, SegmentError> {
        let slug = SegmentSlug::new(&cmd.slug)?;

        let deleted = self.repository.delete_segment(&slug).await?;
        if deleted {
            tracing::info!(segment = %slug, "Segment deleted");
        } else {
            tracing::debug!(segment = %slug, "Delete of unknown segment ignored");
        }

        Ok(DeleteSegmentResult { deleted })
    }
}
