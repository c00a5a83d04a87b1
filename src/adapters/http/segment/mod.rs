//! HTTP adapter for segment endpoints.
//!
//! Exposes the segment service via REST API:
//! - `POST /api/segments` - Create a segment
//! - `DELETE /api/segments` - Delete a segment
//! - `POST /api/segments/sampled` - Create a segment filled by random sampling
//! - `POST /api/memberships` - Update one user's memberships
//! - `GET /api/users/:user_id/segments` - List a user's segments
//! - `GET /api/reports/:month` - Export a monthly report
//! - `GET /api/reports/download/:file` - Download an exported report

pub mod dto;
pub mod handlers;
pub mod routes;

pub use handlers::{SegmentApiError, SegmentAppState};
pub use routes::segment_router;
