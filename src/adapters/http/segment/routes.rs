//! Route configuration for segment endpoints.

use axum::routing::{get, post};
use axum::Router;

use super::handlers::{
    create_sampled_segment, create_segment, delete_segment, download_report, export_report,
    get_user_segments, update_memberships, SegmentAppState,
};

/// Creates the segment router with all endpoints.
///
/// Routes:
/// - `POST /api/segments` - Create a segment
/// - `DELETE /api/segments` - Delete a segment
/// - `POST /api/segments/sampled` - Create a segment filled by random sampling
/// - `POST /api/memberships` - Update one user's memberships
/// - `GET /api/users/:user_id/segments` - List a user's segments
/// - `GET /api/reports/:month` - Export a monthly report
/// - `GET /api/reports/download/:file` - Download an exported report
pub fn segment_router() -> Router<SegmentAppState> {
    Router::new()
        .route("/api/segments", post(create_segment).delete(delete_segment))
        .route("/api/segments/sampled", post(create_sampled_segment))
        .route("/api/memberships", post(update_memberships))
        .route("/api/users/:user_id/segments", get(get_user_segments))
        .route("/api/reports/:month", get(export_report))
        .route("/api/reports/download/:file", get(download_report))
}
