//! PostgreSQL implementation of SegmentRepository.
//!
//! Bulk membership writes are single multi-row upserts built with
//! [`QueryBuilder`]. Audit rows in `operations` are written by triggers on
//! `users_segments` (see `migrations/`), so this adapter never touches them
//! directly.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};

use crate::domain::foundation::{DomainError, ErrorCode, SegmentId, Timestamp, UserId};
use crate::domain::segment::{
    DeltaOutcome, MembershipDelta, MembershipEvent, MembershipOperation, MembershipWindow,
    ReportMonth, Segment, SegmentSlug,
};
use crate::ports::SegmentRepository;

/// Postgres caps a statement at 65535 bind parameters; each membership row uses four.
const UPSERT_CHUNK_ROWS: usize = 10_000;

const SLUG_UNIQUE_CONSTRAINT: &str = "segments_slug_key";

/// PostgreSQL implementation of the SegmentRepository port.
pub struct PostgresSegmentRepository {
    pool: PgPool,
}

impl PostgresSegmentRepository {
    /// Creates a new PostgresSegmentRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SegmentRow {
    id: i64,
    slug: String,
}

impl TryFrom<SegmentRow> for Segment {
    type Error = DomainError;

    fn try_from(row: SegmentRow) -> Result<Self, Self::Error> {
        let slug = SegmentSlug::new(&row.slug).map_err(|e| {
            DomainError::new(ErrorCode::DatabaseError, format!("Invalid stored slug: {}", e))
        })?;
        Ok(Segment::new(SegmentId::from_db(row.id), slug))
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OperationRow {
    user_id: i64,
    slug: String,
    operation: String,
    time: DateTime<Utc>,
}

impl TryFrom<OperationRow> for MembershipEvent {
    type Error = DomainError;

    fn try_from(row: OperationRow) -> Result<Self, Self::Error> {
        let corrupt = |what: &str, e: &dyn std::fmt::Display| {
            DomainError::new(ErrorCode::DatabaseError, format!("Invalid {}: {}", what, e))
        };
        Ok(MembershipEvent {
            user_id: UserId::from_db(row.user_id).map_err(|e| corrupt("user_id", &e))?,
            segment_slug: SegmentSlug::new(&row.slug).map_err(|e| corrupt("slug", &e))?,
            operation: row
                .operation
                .parse::<MembershipOperation>()
                .map_err(|e| corrupt("operation", &e))?,
            time: Timestamp::from_datetime(row.time),
        })
    }
}

/// Maps a sqlx failure onto the store error vocabulary.
fn map_db_error(context: &str, e: sqlx::Error) -> DomainError {
    match &e {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            DomainError::new(
                ErrorCode::StoreUnavailable,
                format!("{}: database unavailable: {}", context, e),
            )
        }
        _ => DomainError::new(ErrorCode::DatabaseError, format!("{}: {}", context, e)),
    }
}

fn is_duplicate_slug(e: &sqlx::Error) -> bool {
    match e {
        sqlx::Error::Database(db_err) => db_err.constraint() == Some(SLUG_UNIQUE_CONSTRAINT),
        _ => false,
    }
}

fn slug_strings(slugs: &[SegmentSlug]) -> Vec<String> {
    slugs.iter().map(|s| s.as_str().to_string()).collect()
}

/// Resolves every slug to its segment, failing on the first unknown one.
async fn resolve_slugs(
    conn: &mut PgConnection,
    slugs: &[SegmentSlug],
) -> Result<Vec<SegmentId>, DomainError> {
    let rows: Vec<SegmentRow> =
        sqlx::query_as("SELECT id, slug FROM segments WHERE slug = ANY($1)")
            .bind(slug_strings(slugs))
            .fetch_all(&mut *conn)
            .await
            .map_err(|e| map_db_error("Failed to resolve segments", e))?;

    let mut ids = Vec::with_capacity(slugs.len());
    for slug in slugs {
        let row = rows.iter().find(|r| r.slug == slug.as_str()).ok_or_else(|| {
            DomainError::new(
                ErrorCode::SegmentNotFound,
                format!("Segment '{}' does not exist", slug),
            )
            .with_detail("slug", slug.as_str())
        })?;
        ids.push(SegmentId::from_db(row.id));
    }
    ids.sort();
    ids.dedup();
    Ok(ids)
}

async fn upsert_memberships(
    conn: &mut PgConnection,
    pairs: &[(UserId, SegmentId)],
    window: &MembershipWindow,
) -> Result<u64, DomainError> {
    let created_at = *window.created_at.as_datetime();
    let expires_at = window.expires_at.map(|ts| *ts.as_datetime());
    let mut written = 0;

    for chunk in pairs.chunks(UPSERT_CHUNK_ROWS) {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
            "INSERT INTO users_segments (user_id, segment_id, created_at, expires_at) ",
        );
        builder.push_values(chunk, |mut row, (user_id, segment_id)| {
            row.push_bind(user_id.as_db())
                .push_bind(segment_id.value())
                .push_bind(created_at)
                .push_bind(expires_at);
        });
        builder.push(
            " ON CONFLICT (user_id, segment_id) DO UPDATE \
             SET created_at = EXCLUDED.created_at, expires_at = EXCLUDED.expires_at",
        );

        let result = builder
            .build()
            .execute(&mut *conn)
            .await
            .map_err(|e| map_db_error("Failed to add memberships", e))?;
        written += result.rows_affected();
    }

    Ok(written)
}

async fn delete_memberships(
    conn: &mut PgConnection,
    user_id: UserId,
    slugs: &[SegmentSlug],
) -> Result<u64, DomainError> {
    let result = sqlx::query(
        r#"
        DELETE FROM users_segments
        WHERE user_id = $1
          AND segment_id IN (SELECT id FROM segments WHERE slug = ANY($2))
        "#,
    )
    .bind(user_id.as_db())
    .bind(slug_strings(slugs))
    .execute(&mut *conn)
    .await
    .map_err(|e| map_db_error("Failed to remove memberships", e))?;

    Ok(result.rows_affected())
}

fn dedup_users(user_ids: &[UserId]) -> Vec<UserId> {
    let mut unique = user_ids.to_vec();
    unique.sort();
    unique.dedup();
    unique
}

#[async_trait]
impl SegmentRepository for PostgresSegmentRepository {
    async fn create_segment(&self, slug: &SegmentSlug) -> Result<Segment, DomainError> {
        let row: SegmentRow =
            sqlx::query_as("INSERT INTO segments (slug) VALUES ($1) RETURNING id, slug")
                .bind(slug.as_str())
                .fetch_one(&self.pool)
                .await
                .map_err(|e| {
                    if is_duplicate_slug(&e) {
                        return DomainError::new(
                            ErrorCode::DuplicateSlug,
                            format!("Segment '{}' already exists", slug),
                        )
                        .with_detail("slug", slug.as_str());
                    }
                    map_db_error("Failed to create segment", e)
                })?;

        Segment::try_from(row)
    }

    async fn delete_segment(&self, slug: &SegmentSlug) -> Result<bool, DomainError> {
        let result = sqlx::query("DELETE FROM segments WHERE slug = $1")
            .bind(slug.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| map_db_error("Failed to delete segment", e))?;

        Ok(result.rows_affected() > 0)
    }

    async fn find_segment(&self, slug: &SegmentSlug) -> Result<Option<Segment>, DomainError> {
        let row: Option<SegmentRow> = sqlx::query_as("SELECT id, slug FROM segments WHERE slug = $1")
            .bind(slug.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_db_error("Failed to find segment", e))?;

        row.map(Segment::try_from).transpose()
    }

    async fn add_users_to_segment(
        &self,
        segment_id: SegmentId,
        user_ids: &[UserId],
        window: &MembershipWindow,
    ) -> Result<u64, DomainError> {
        if user_ids.is_empty() {
            return Ok(0);
        }
        let pairs: Vec<(UserId, SegmentId)> = dedup_users(user_ids)
            .into_iter()
            .map(|user_id| (user_id, segment_id))
            .collect();

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_db_error("Failed to start transaction", e))?;
        let written = upsert_memberships(&mut tx, &pairs, window).await?;
        tx.commit()
            .await
            .map_err(|e| map_db_error("Failed to commit transaction", e))?;

        Ok(written)
    }

    async fn add_user_to_segments(
        &self,
        user_id: UserId,
        slugs: &[SegmentSlug],
        window: &MembershipWindow,
    ) -> Result<u64, DomainError> {
        if slugs.is_empty() {
            return Ok(0);
        }
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| map_db_error("Failed to acquire connection", e))?;

        let segment_ids = resolve_slugs(&mut conn, slugs).await?;
        let pairs: Vec<(UserId, SegmentId)> =
            segment_ids.into_iter().map(|id| (user_id, id)).collect();
        upsert_memberships(&mut conn, &pairs, window).await
    }

    async fn remove_user_from_segments(
        &self,
        user_id: UserId,
        slugs: &[SegmentSlug],
    ) -> Result<u64, DomainError> {
        if slugs.is_empty() {
            return Ok(0);
        }
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| map_db_error("Failed to acquire connection", e))?;
        delete_memberships(&mut conn, user_id, slugs).await
    }

    async fn apply_delta(
        &self,
        delta: &MembershipDelta,
        window: &MembershipWindow,
    ) -> Result<DeltaOutcome, DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_db_error("Failed to start transaction", e))?;

        let additions = delta.additions();
        let added = if additions.is_empty() {
            0
        } else {
            let segment_ids = resolve_slugs(&mut tx, &additions).await?;
            let pairs: Vec<(UserId, SegmentId)> = segment_ids
                .into_iter()
                .map(|id| (delta.user_id(), id))
                .collect();
            upsert_memberships(&mut tx, &pairs, window).await?
        };

        let removals = delta.removals();
        let removed = if removals.is_empty() {
            0
        } else {
            delete_memberships(&mut tx, delta.user_id(), &removals).await?
        };

        tx.commit()
            .await
            .map_err(|e| map_db_error("Failed to commit transaction", e))?;

        Ok(DeltaOutcome { added, removed })
    }

    async fn sweep_expired(&self, now: Timestamp) -> Result<u64, DomainError> {
        let result = sqlx::query("DELETE FROM users_segments WHERE expires_at <= $1")
            .bind(now.as_datetime())
            .execute(&self.pool)
            .await
            .map_err(|e| map_db_error("Failed to sweep expired memberships", e))?;

        Ok(result.rows_affected())
    }

    async fn list_segment_slugs_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<SegmentSlug>, DomainError> {
        let slugs: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT s.slug
            FROM users_segments us
            JOIN segments s ON s.id = us.segment_id
            WHERE us.user_id = $1
            ORDER BY s.slug
            "#,
        )
        .bind(user_id.as_db())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_db_error("Failed to list user segments", e))?;

        slugs
            .iter()
            .map(|s| {
                SegmentSlug::new(s).map_err(|e| {
                    DomainError::new(ErrorCode::DatabaseError, format!("Invalid stored slug: {}", e))
                })
            })
            .collect()
    }

    async fn list_all_user_ids(&self) -> Result<Vec<UserId>, DomainError> {
        let ids: Vec<i64> = sqlx::query_scalar("SELECT id FROM users ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_db_error("Failed to list users", e))?;

        ids.into_iter()
            .map(|id| {
                UserId::from_db(id).map_err(|e| {
                    DomainError::new(ErrorCode::DatabaseError, format!("Invalid stored user id: {}", e))
                })
            })
            .collect()
    }

    async fn register_users(&self, user_ids: &[UserId]) -> Result<u64, DomainError> {
        if user_ids.is_empty() {
            return Ok(0);
        }
        let ids: Vec<i64> = dedup_users(user_ids).iter().map(UserId::as_db).collect();

        let result = sqlx::query(
            "INSERT INTO users (id) SELECT * FROM UNNEST($1::bigint[]) ON CONFLICT (id) DO NOTHING",
        )
        .bind(ids)
        .execute(&self.pool)
        .await
        .map_err(|e| map_db_error("Failed to register users", e))?;

        Ok(result.rows_affected())
    }

    async fn monthly_report(
        &self,
        month: ReportMonth,
    ) -> Result<Vec<MembershipEvent>, DomainError> {
        let rows: Vec<OperationRow> = sqlx::query_as(
            r#"
            SELECT o.user_id, s.slug, o.operation, o.time
            FROM operations o
            JOIN segments s ON s.id = o.segment_id
            WHERE o.time >= $1 AND o.time < $2
            ORDER BY o.time, o.id
            "#,
        )
        .bind(month.start().as_datetime())
        .bind(month.end().as_datetime())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_db_error("Failed to build monthly report", e))?;

        rows.into_iter().map(MembershipEvent::try_from).collect()
    }
}
