//! Membership rows and the shapes used to change them in bulk.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::SegmentSlug;
use crate::domain::foundation::{SegmentId, Timestamp, Ttl, UserId};

/// A user's presence in a segment.
///
/// `expires_at = None` means the membership is permanent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    pub user_id: UserId,
    pub segment_id: SegmentId,
    pub created_at: Timestamp,
    pub expires_at: Option<Timestamp>,
}

impl Membership {
    /// Whether a sweep running at `now` removes this row.
    pub fn is_expired_at(&self, now: &Timestamp) -> bool {
        self.expires_at.map_or(false, |expires| expires <= *now)
    }
}

/// Timestamps shared by every row written in one bulk call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MembershipWindow {
    pub created_at: Timestamp,
    pub expires_at: Option<Timestamp>,
}

impl MembershipWindow {
    /// Window starting at `created_at`, expiring after `ttl` if one is given.
    pub fn starting_at(created_at: Timestamp, ttl: Option<Ttl>) -> Self {
        Self {
            created_at,
            expires_at: ttl.map(|ttl| ttl.expires_at(created_at)),
        }
    }

    /// Window starting now.
    pub fn now(ttl: Option<Ttl>) -> Self {
        Self::starting_at(Timestamp::now(), ttl)
    }

    /// A permanent window starting now.
    pub fn permanent() -> Self {
        Self::now(None)
    }

    /// Builds the membership row for one (user, segment) pair.
    pub fn membership(&self, user_id: UserId, segment_id: SegmentId) -> Membership {
        Membership {
            user_id,
            segment_id,
            created_at: self.created_at,
            expires_at: self.expires_at,
        }
    }
}

/// Segments to add to and remove from one user.
///
/// Slugs are de-duplicated. Additions are applied before removals, so a slug
/// named in both sets ends up absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MembershipDelta {
    user_id: UserId,
    add: BTreeSet<SegmentSlug>,
    remove: BTreeSet<SegmentSlug>,
}

impl MembershipDelta {
    pub fn new(
        user_id: UserId,
        add: impl IntoIterator<Item = SegmentSlug>,
        remove: impl IntoIterator<Item = SegmentSlug>,
    ) -> Self {
        Self {
            user_id,
            add: add.into_iter().collect(),
            remove: remove.into_iter().collect(),
        }
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Slugs to add, in slug order.
    pub fn additions(&self) -> Vec<SegmentSlug> {
        self.add.iter().cloned().collect()
    }

    /// Slugs to remove, in slug order.
    pub fn removals(&self) -> Vec<SegmentSlug> {
        self.remove.iter().cloned().collect()
    }

    /// Slugs that end up absent because they appear in both sets.
    pub fn overlapping(&self) -> Vec<SegmentSlug> {
        self.add.intersection(&self.remove).cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.add.is_empty() && self.remove.is_empty()
    }
}

/// Row counts produced by applying a [`MembershipDelta`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DeltaOutcome {
    pub added: u64,
    pub removed: u64,
}
