//! In-Memory Segment Repository Adapter
//!
//! Keeps segments, memberships and the audit log in process memory.
//! Mirrors the PostgreSQL schema rules (unique slugs, one row per
//! (user, segment), cascade on segment delete, audit rows on insert and
//! delete) so handlers behave the same against either adapter.
//! Useful for testing and development.

use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, ErrorCode, SegmentId, Timestamp, UserId};
use crate::domain::segment::{
    DeltaOutcome, Membership, MembershipDelta, MembershipEvent, MembershipOperation,
    MembershipWindow, ReportMonth, Segment, SegmentSlug,
};
use crate::ports::SegmentRepository;

#[derive(Debug, Clone)]
struct AuditRow {
    user_id: UserId,
    segment_id: SegmentId,
    operation: MembershipOperation,
    time: Timestamp,
}

#[derive(Debug, Default)]
struct State {
    next_segment_id: i64,
    segments: BTreeMap<SegmentId, SegmentSlug>,
    users: BTreeSet<UserId>,
    memberships: HashMap<(UserId, SegmentId), Membership>,
    audit: Vec<AuditRow>,
}

impl State {
    fn segment_id(&self, slug: &SegmentSlug) -> Option<SegmentId> {
        self.segments
            .iter()
            .find(|(_, s)| *s == slug)
            .map(|(id, _)| *id)
    }

    fn slug(&self, id: SegmentId) -> Option<&SegmentSlug> {
        self.segments.get(&id)
    }

    fn upsert(&mut self, membership: Membership) {
        let key = (membership.user_id, membership.segment_id);
        if !self.memberships.contains_key(&key) {
            self.audit.push(AuditRow {
                user_id: membership.user_id,
                segment_id: membership.segment_id,
                operation: MembershipOperation::Add,
                time: membership.created_at,
            });
        }
        self.memberships.insert(key, membership);
    }

    fn remove(&mut self, key: (UserId, SegmentId), at: Timestamp) -> bool {
        if self.memberships.remove(&key).is_some() {
            self.audit.push(AuditRow {
                user_id: key.0,
                segment_id: key.1,
                operation: MembershipOperation::Delete,
                time: at,
            });
            true
        } else {
            false
        }
    }

    fn resolve_all(&self, slugs: &[SegmentSlug]) -> Result<Vec<SegmentId>, DomainError> {
        slugs
            .iter()
            .map(|slug| self.segment_id(slug).ok_or_else(|| segment_not_found(slug)))
            .collect()
    }

    fn add_to_segments(
        &mut self,
        user_id: UserId,
        slugs: &[SegmentSlug],
        window: &MembershipWindow,
    ) -> Result<u64, DomainError> {
        let mut ids = self.resolve_all(slugs)?;
        ids.sort();
        ids.dedup();
        for &segment_id in &ids {
            self.upsert(window.membership(user_id, segment_id));
        }
        Ok(ids.len() as u64)
    }

    fn remove_from_segments(&mut self, user_id: UserId, slugs: &[SegmentSlug]) -> u64 {
        let now = Timestamp::now();
        let ids: BTreeSet<SegmentId> = slugs.iter().filter_map(|s| self.segment_id(s)).collect();
        ids.into_iter()
            .filter(|&segment_id| self.remove((user_id, segment_id), now))
            .count() as u64
    }
}

fn segment_not_found(slug: &SegmentSlug) -> DomainError {
    DomainError::new(
        ErrorCode::SegmentNotFound,
        format!("Segment '{}' does not exist", slug),
    )
    .with_detail("slug", slug.as_str())
}

/// In-memory storage for segments and memberships.
#[derive(Debug, Clone, Default)]
pub struct InMemorySegmentRepository {
    state: Arc<RwLock<State>>,
    unavailable: Arc<AtomicBool>,
}

impl InMemorySegmentRepository {
    /// Create a new, empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a repository whose population holds the given users.
    pub async fn with_users(user_ids: impl IntoIterator<Item = UserId>) -> Self {
        let repo = Self::new();
        repo.state.write().await.users.extend(user_ids);
        repo
    }

    /// Simulate the store going away (every call fails with `StoreUnavailable`).
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Snapshot of all membership rows, ordered by (user, segment).
    pub async fn memberships(&self) -> Vec<Membership> {
        let state = self.state.read().await;
        let mut rows: Vec<Membership> = state.memberships.values().cloned().collect();
        rows.sort_by_key(|m| (m.user_id, m.segment_id));
        rows
    }

    /// Users currently in the segment with this slug.
    pub async fn members_of(&self, slug: &SegmentSlug) -> Vec<UserId> {
        let state = self.state.read().await;
        let Some(segment_id) = state.segment_id(slug) else {
            return Vec::new();
        };
        let mut users: Vec<UserId> = state
            .memberships
            .keys()
            .filter(|(_, s)| *s == segment_id)
            .map(|(u, _)| *u)
            .collect();
        users.sort();
        users
    }

    fn check_available(&self) -> Result<(), DomainError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(DomainError::new(
                ErrorCode::StoreUnavailable,
                "In-memory store marked unavailable",
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl SegmentRepository for InMemorySegmentRepository {
    async fn create_segment(&self, slug: &SegmentSlug) -> Result<Segment, DomainError> {
        self.check_available()?;
        let mut state = self.state.write().await;
        if state.segment_id(slug).is_some() {
            return Err(DomainError::new(
                ErrorCode::DuplicateSlug,
                format!("Segment '{}' already exists", slug),
            )
            .with_detail("slug", slug.as_str()));
        }
        state.next_segment_id += 1;
        let id = SegmentId::from_db(state.next_segment_id);
        state.segments.insert(id, slug.clone());
        Ok(Segment::new(id, slug.clone()))
    }

    async fn delete_segment(&self, slug: &SegmentSlug) -> Result<bool, DomainError> {
        self.check_available()?;
        let mut state = self.state.write().await;
        let Some(segment_id) = state.segment_id(slug) else {
            return Ok(false);
        };
        let now = Timestamp::now();
        let keys: Vec<(UserId, SegmentId)> = state
            .memberships
            .keys()
            .filter(|(_, s)| *s == segment_id)
            .copied()
            .collect();
        for key in keys {
            state.remove(key, now);
        }
        state.segments.remove(&segment_id);
        Ok(true)
    }

    async fn find_segment(&self, slug: &SegmentSlug) -> Result<Option<Segment>, DomainError> {
        self.check_available()?;
        let state = self.state.read().await;
        Ok(state
            .segment_id(slug)
            .map(|id| Segment::new(id, slug.clone())))
    }

    async fn add_users_to_segment(
        &self,
        segment_id: SegmentId,
        user_ids: &[UserId],
        window: &MembershipWindow,
    ) -> Result<u64, DomainError> {
        self.check_available()?;
        if user_ids.is_empty() {
            return Ok(0);
        }
        let mut state = self.state.write().await;
        if state.slug(segment_id).is_none() {
            return Err(DomainError::new(
                ErrorCode::SegmentNotFound,
                format!("Segment {} does not exist", segment_id),
            ));
        }
        let unique: BTreeSet<UserId> = user_ids.iter().copied().collect();
        for &user_id in &unique {
            state.upsert(window.membership(user_id, segment_id));
        }
        Ok(unique.len() as u64)
    }

    async fn add_user_to_segments(
        &self,
        user_id: UserId,
        slugs: &[SegmentSlug],
        window: &MembershipWindow,
    ) -> Result<u64, DomainError> {
        self.check_available()?;
        if slugs.is_empty() {
            return Ok(0);
        }
        self.state.write().await.add_to_segments(user_id, slugs, window)
    }

    async fn remove_user_from_segments(
        &self,
        user_id: UserId,
        slugs: &[SegmentSlug],
    ) -> Result<u64, DomainError> {
        self.check_available()?;
        if slugs.is_empty() {
            return Ok(0);
        }
        Ok(self.state.write().await.remove_from_segments(user_id, slugs))
    }

    async fn apply_delta(
        &self,
        delta: &MembershipDelta,
        window: &MembershipWindow,
    ) -> Result<DeltaOutcome, DomainError> {
        self.check_available()?;
        let mut state = self.state.write().await;

        // Resolve before writing so a bad slug leaves nothing behind.
        let additions = delta.additions();
        state.resolve_all(&additions)?;

        let added = state.add_to_segments(delta.user_id(), &additions, window)?;
        let removed = state.remove_from_segments(delta.user_id(), &delta.removals());
        Ok(DeltaOutcome { added, removed })
    }

    async fn sweep_expired(&self, now: Timestamp) -> Result<u64, DomainError> {
        self.check_available()?;
        let mut state = self.state.write().await;
        let expired: Vec<(UserId, SegmentId)> = state
            .memberships
            .iter()
            .filter(|(_, m)| m.is_expired_at(&now))
            .map(|(key, _)| *key)
            .collect();
        for key in &expired {
            state.remove(*key, now);
        }
        Ok(expired.len() as u64)
    }

    async fn list_segment_slugs_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<SegmentSlug>, DomainError> {
        self.check_available()?;
        let state = self.state.read().await;
        let mut slugs: Vec<SegmentSlug> = state
            .memberships
            .keys()
            .filter(|(u, _)| *u == user_id)
            .filter_map(|(_, s)| state.slug(*s).cloned())
            .collect();
        slugs.sort();
        Ok(slugs)
    }

    async fn list_all_user_ids(&self) -> Result<Vec<UserId>, DomainError> {
        self.check_available()?;
        Ok(self.state.read().await.users.iter().copied().collect())
    }

    async fn register_users(&self, user_ids: &[UserId]) -> Result<u64, DomainError> {
        self.check_available()?;
        let mut state = self.state.write().await;
        Ok(user_ids
            .iter()
            .filter(|&&id| state.users.insert(id))
            .count() as u64)
    }

    async fn monthly_report(
        &self,
        month: ReportMonth,
    ) -> Result<Vec<MembershipEvent>, DomainError> {
        self.check_available()?;
        let state = self.state.read().await;
        let mut events: Vec<MembershipEvent> = state
            .audit
            .iter()
            .filter(|row| month.contains(&row.time))
            .filter_map(|row| {
                state.slug(row.segment_id).map(|slug| MembershipEvent {
                    user_id: row.user_id,
                    segment_slug: slug.clone(),
                    operation: row.operation,
                    time: row.time,
                })
            })
            .collect();
        events.sort_by_key(|e| e.time);
        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::Ttl;

    fn slug(s: &str) -> SegmentSlug {
        SegmentSlug::new(s).unwrap()
    }

    fn user(id: u64) -> UserId {
        UserId::new(id).unwrap()
    }

    fn window_at(created: Timestamp, expires: Option<Timestamp>) -> MembershipWindow {
        MembershipWindow {
            created_at: created,
            expires_at: expires,
        }
    }

    #[tokio::test]
    async fn create_segment_assigns_increasing_ids() {
        let repo = InMemorySegmentRepository::new();
        let a = repo.create_segment(&slug("a")).await.unwrap();
        let b = repo.create_segment(&slug("b")).await.unwrap();
        assert!(a.id < b.id);
    }

    #[tokio::test]
    async fn create_segment_twice_fails_with_duplicate_slug() {
        let repo = InMemorySegmentRepository::new();
        let first = repo.create_segment(&slug("beta")).await.unwrap();

        let err = repo.create_segment(&slug("beta")).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::DuplicateSlug);

        let found = repo.find_segment(&slug("beta")).await.unwrap();
        assert_eq!(found, Some(first));
    }

    #[tokio::test]
    async fn delete_segment_is_idempotent_and_cascades() {
        let repo = InMemorySegmentRepository::new();
        let segment = repo.create_segment(&slug("beta")).await.unwrap();
        repo.add_users_to_segment(segment.id, &[user(1), user(2)], &MembershipWindow::permanent())
            .await
            .unwrap();

        assert!(repo.delete_segment(&slug("beta")).await.unwrap());
        assert!(!repo.delete_segment(&slug("beta")).await.unwrap());
        assert!(repo.memberships().await.is_empty());
    }

    #[tokio::test]
    async fn bulk_add_shares_timestamps_and_collapses_duplicates() {
        let repo = InMemorySegmentRepository::new();
        let segment = repo.create_segment(&slug("beta")).await.unwrap();
        let window = MembershipWindow::now(Some(Ttl::parse("1h").unwrap()));

        let written = repo
            .add_users_to_segment(segment.id, &[user(1), user(2), user(1)], &window)
            .await
            .unwrap();

        assert_eq!(written, 2);
        let rows = repo.memberships().await;
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|m| m.created_at == window.created_at));
        assert!(rows.iter().all(|m| m.expires_at == window.expires_at));
    }

    #[tokio::test]
    async fn re_adding_refreshes_expiry_instead_of_duplicating() {
        let repo = InMemorySegmentRepository::new();
        repo.create_segment(&slug("beta")).await.unwrap();
        let short = MembershipWindow::now(Some(Ttl::parse("1m").unwrap()));
        let permanent = MembershipWindow::permanent();

        repo.add_user_to_segments(user(1), &[slug("beta")], &short).await.unwrap();
        repo.add_user_to_segments(user(1), &[slug("beta")], &permanent).await.unwrap();

        let rows = repo.memberships().await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].expires_at, None);
    }

    #[tokio::test]
    async fn add_with_unknown_slug_writes_nothing() {
        let repo = InMemorySegmentRepository::new();
        repo.create_segment(&slug("known")).await.unwrap();

        let err = repo
            .add_user_to_segments(user(1), &[slug("known"), slug("missing")], &MembershipWindow::permanent())
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::SegmentNotFound);
        assert_eq!(err.detail("slug"), Some("missing"));
        assert!(repo.memberships().await.is_empty());
    }

    #[tokio::test]
    async fn remove_with_empty_slugs_is_noop() {
        let repo = InMemorySegmentRepository::new();
        repo.create_segment(&slug("beta")).await.unwrap();
        repo.add_user_to_segments(user(1), &[slug("beta")], &MembershipWindow::permanent())
            .await
            .unwrap();

        assert_eq!(repo.remove_user_from_segments(user(1), &[]).await.unwrap(), 0);
        assert_eq!(repo.memberships().await.len(), 1);
    }

    #[tokio::test]
    async fn apply_delta_with_overlap_removes_slug() {
        let repo = InMemorySegmentRepository::new();
        repo.create_segment(&slug("a")).await.unwrap();
        repo.create_segment(&slug("b")).await.unwrap();

        let delta = MembershipDelta::new(user(1), vec![slug("a"), slug("b")], vec![slug("b")]);
        let outcome = repo
            .apply_delta(&delta, &MembershipWindow::permanent())
            .await
            .unwrap();

        assert_eq!(outcome, DeltaOutcome { added: 2, removed: 1 });
        assert_eq!(
            repo.list_segment_slugs_for_user(user(1)).await.unwrap(),
            vec![slug("a")]
        );
    }

    #[tokio::test]
    async fn sweep_removes_only_past_expiries() {
        let repo = InMemorySegmentRepository::new();
        for s in ["s1", "s2", "s3"] {
            repo.create_segment(&slug(s)).await.unwrap();
        }
        let now = Timestamp::now();
        repo.add_user_to_segments(user(1), &[slug("s1")], &window_at(now, None))
            .await
            .unwrap();
        repo.add_user_to_segments(user(1), &[slug("s2")], &window_at(now, Some(now.plus_secs(-60))))
            .await
            .unwrap();
        repo.add_user_to_segments(user(1), &[slug("s3")], &window_at(now, Some(now.plus_secs(3_600))))
            .await
            .unwrap();

        assert_eq!(repo.sweep_expired(now).await.unwrap(), 1);
        assert_eq!(
            repo.list_segment_slugs_for_user(user(1)).await.unwrap(),
            vec![slug("s1"), slug("s3")]
        );
    }

    #[tokio::test]
    async fn register_users_skips_known_ids() {
        let repo = InMemorySegmentRepository::with_users([user(1)]).await;
        assert_eq!(repo.register_users(&[user(1), user(2)]).await.unwrap(), 1);
        assert_eq!(repo.list_all_user_ids().await.unwrap(), vec![user(1), user(2)]);
    }

    #[tokio::test]
    async fn monthly_report_lists_adds_and_deletes_in_month() {
        let repo = InMemorySegmentRepository::new();
        repo.create_segment(&slug("beta")).await.unwrap();
        let added_at = Timestamp::now();
        repo.add_user_to_segments(user(5), &[slug("beta")], &window_at(added_at, None))
            .await
            .unwrap();
        repo.remove_user_from_segments(user(5), &[slug("beta")])
            .await
            .unwrap();

        let dt = added_at.as_datetime();
        let month = ReportMonth::new(chrono::Datelike::year(dt), chrono::Datelike::month(dt)).unwrap();
        let events = repo.monthly_report(month).await.unwrap();

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].operation, MembershipOperation::Add);
        assert_eq!(events[0].segment_slug, slug("beta"));
        assert_eq!(events[1].operation, MembershipOperation::Delete);

        let other = ReportMonth::new(1999, 1).unwrap();
        assert!(repo.monthly_report(other).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unavailable_store_fails_every_call() {
        let repo = InMemorySegmentRepository::new();
        repo.set_unavailable(true);

        let err = repo.sweep_expired(Timestamp::now()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::StoreUnavailable);

        repo.set_unavailable(false);
        assert_eq!(repo.sweep_expired(Timestamp::now()).await.unwrap(), 0);
    }
}
