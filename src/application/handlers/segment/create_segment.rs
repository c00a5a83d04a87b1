//! CreateSegmentHandler - Command handler for creating an empty segment.

use std::sync::Arc;

use crate::domain::segment::{Segment, SegmentError, SegmentSlug};
use crate::ports::SegmentRepository;

/// Command to create a segment.
#[derive(Debug, Clone)]
pub struct CreateSegmentCommand {
    pub slug: String,
}

/// Result of successful segment creation.
#[derive(Debug, Clone)]
pub struct CreateSegmentResult {
    pub segment: Segment,
}

/// Handler for creating segments.
pub struct CreateSegmentHandler {
    repository: Arc<dyn SegmentRepository>,
}

impl CreateSegmentHandler {
    pub fn new(repository: Arc<dyn SegmentRepository>) -> Self {
        Self { repository }
    }

    pub async fn handle(
        &self,
        cmd: CreateSegmentCommand,
    ) -> Result<CreateSegmentResult, SegmentError> {
        let slug = SegmentSlug::new(&cmd.slug)?;

        let segment = self.repository.create_segment(&slug).await?;
        tracing::info!(segment = %segment.slug, id = %segment.id, "Segment created");

        Ok(CreateSegmentResult { segment })
    }
}
