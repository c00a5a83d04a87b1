//! Segment repository port.
//!
//! Defines the contract for storing segments and user memberships.
//! Implementations wrap a relational store; every method is one logical
//! operation and either fully applies or fully fails.
//!
//! # Design
//!
//! - **Bulk writes**: membership inserts and deletes are single statements
//! - **One row per pair**: at most one membership per (user, segment); adding
//!   an existing pair refreshes its `created_at` and `expires_at`
//! - **Cascade**: deleting a segment deletes its memberships
//!
//! # Example
//!
//! ```ignore
//! async fn enrol(
//!     repo: &dyn SegmentRepository,
//!     user_id: UserId,
//!     slugs: &[SegmentSlug],
//! ) -> Result<u64, DomainError> {
//!     let window = MembershipWindow::now(Some(Ttl::parse("24h")?));
//!     repo.add_user_to_segments(user_id, slugs, &window).await
//! }
//! ```

use crate::domain::foundation::{DomainError, SegmentId, Timestamp, UserId};
use crate::domain::segment::{
    DeltaOutcome, MembershipDelta, MembershipEvent, MembershipWindow, ReportMonth, Segment,
    SegmentSlug,
};
use async_trait::async_trait;

/// Repository port for segments and memberships.
#[async_trait]
pub trait SegmentRepository: Send + Sync {
    /// Create a segment and return it with its assigned id.
    ///
    /// # Errors
    ///
    /// - `DuplicateSlug` if the slug is taken
    /// - `StoreUnavailable` / `DatabaseError` on persistence failure
    async fn create_segment(&self, slug: &SegmentSlug) -> Result<Segment, DomainError>;

    /// Delete a segment and its memberships.
    ///
    /// Idempotent: returns `Ok(false)` when no segment has this slug.
    async fn delete_segment(&self, slug: &SegmentSlug) -> Result<bool, DomainError>;

    /// Find a segment by slug.
    async fn find_segment(&self, slug: &SegmentSlug) -> Result<Option<Segment>, DomainError>;

    /// Add many users to one segment in a single statement.
    ///
    /// Every row shares the window's timestamps. Returns the number of rows
    /// written. An empty user list writes nothing.
    ///
    /// # Errors
    ///
    /// - `SegmentNotFound` if the segment no longer exists
    async fn add_users_to_segment(
        &self,
        segment_id: SegmentId,
        user_ids: &[UserId],
        window: &MembershipWindow,
    ) -> Result<u64, DomainError>;

    /// Add one user to many segments in a single statement.
    ///
    /// # Errors
    ///
    /// - `SegmentNotFound` if any slug is unknown; nothing is written
    async fn add_user_to_segments(
        &self,
        user_id: UserId,
        slugs: &[SegmentSlug],
        window: &MembershipWindow,
    ) -> Result<u64, DomainError>;

    /// Remove one user from every listed segment in a single statement.
    ///
    /// An empty slug list is a no-op returning 0. Unknown slugs are ignored.
    async fn remove_user_from_segments(
        &self,
        user_id: UserId,
        slugs: &[SegmentSlug],
    ) -> Result<u64, DomainError>;

    /// Apply additions then removals for one user in one transaction.
    ///
    /// # Errors
    ///
    /// - `SegmentNotFound` if an added slug is unknown; nothing is written
    async fn apply_delta(
        &self,
        delta: &MembershipDelta,
        window: &MembershipWindow,
    ) -> Result<DeltaOutcome, DomainError>;

    /// Delete every membership whose expiry is at or before `now`.
    ///
    /// Permanent memberships are never touched. Returns rows deleted.
    async fn sweep_expired(&self, now: Timestamp) -> Result<u64, DomainError>;

    /// Slugs of all segments the user belongs to, ordered by slug.
    async fn list_segment_slugs_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<SegmentSlug>, DomainError>;

    /// Every known user id, ordered by id.
    ///
    /// Full population scan; only the sampling path should call this.
    async fn list_all_user_ids(&self) -> Result<Vec<UserId>, DomainError>;

    /// Register users in the population. Already-known ids are skipped.
    async fn register_users(&self, user_ids: &[UserId]) -> Result<u64, DomainError>;

    /// Membership changes recorded during `month`, ordered by time.
    async fn monthly_report(&self, month: ReportMonth)
        -> Result<Vec<MembershipEvent>, DomainError>;
}
