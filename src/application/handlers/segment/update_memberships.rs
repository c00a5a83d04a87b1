//! UpdateMembershipsHandler - Adds a user to some segments and removes them
//! from others in one step.
//!
//! Additions are applied before removals and both commit together, so a slug
//! named in both lists ends up absent.

use std::sync::Arc;

use crate::domain::foundation::UserId;
use crate::domain::segment::{
    DeltaOutcome, MembershipDelta, MembershipWindow, SegmentError, SegmentSlug,
};
use crate::ports::SegmentRepository;

use super::create_sampled_segment::parse_ttl;

/// Command to change one user's memberships.
#[derive(Debug, Clone)]
pub struct UpdateMembershipsCommand {
    pub user_id: UserId,
    pub add_segments: Vec<String>,
    pub delete_segments: Vec<String>,
    /// Optional lifetime for the added memberships.
    pub ttl: Option<String>,
}

/// Result of a membership update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateMembershipsResult {
    pub outcome: DeltaOutcome,
    /// Slugs listed in both sets, which end up removed.
    pub overlapping: Vec<SegmentSlug>,
}

/// Handler for membership updates.
pub struct UpdateMembershipsHandler {
    repository: Arc<dyn SegmentRepository>,
}

impl UpdateMembershipsHandler {
    pub fn new(repository: Arc<dyn SegmentRepository>) -> Self {
        Self { repository }
    }

    pub async fn handle(
        &self,
        cmd: UpdateMembershipsCommand,
    ) -> Result<UpdateMembershipsResult, SegmentError> {
        let additions = SegmentSlug::parse_all(&cmd.add_segments)?;
        let removals = SegmentSlug::parse_all(&cmd.delete_segments)?;
        let ttl = parse_ttl(cmd.ttl.as_deref())?;

        let delta = MembershipDelta::new(cmd.user_id, additions, removals);
        if delta.is_empty() {
            return Ok(UpdateMembershipsResult {
                outcome: DeltaOutcome::default(),
                overlapping: Vec::new(),
            });
        }

        let overlapping = delta.overlapping();
        if !overlapping.is_empty() {
            tracing::debug!(
                user_id = %cmd.user_id,
                overlapping = ?overlapping,
                "Slugs both added and removed; removal wins"
            );
        }

        let outcome = self
            .repository
            .apply_delta(&delta, &MembershipWindow::now(ttl))
            .await?;

        tracing::info!(
            user_id = %cmd.user_id,
            added = outcome.added,
            removed = outcome.removed,
            "Memberships updated"
        );

        Ok(UpdateMembershipsResult {
            outcome,
            overlapping,
        })
    }
}
