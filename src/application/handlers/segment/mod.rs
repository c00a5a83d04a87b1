//! Segment handlers.
//!
//! ## Commands
//! - Creating segments, optionally filled by random sampling
//! - Deleting segments
//! - Updating one user's memberships
//!
//! ## Queries
//! - Listing a user's segments
//! - Exporting and downloading monthly reports

mod create_sampled_segment;
mod create_segment;
mod delete_segment;
mod export_monthly_report;
mod get_user_segments;
mod update_memberships;

// Commands
pub use create_sampled_segment::{
    CreateSampledSegmentCommand, CreateSampledSegmentHandler, CreateSampledSegmentResult,
};
pub use create_segment::{CreateSegmentCommand, CreateSegmentHandler, CreateSegmentResult};
pub use delete_segment::{DeleteSegmentCommand, DeleteSegmentHandler, DeleteSegmentResult};
pub use update_memberships::{
    UpdateMembershipsCommand, UpdateMembershipsHandler, UpdateMembershipsResult,
};

// Queries
pub use export_monthly_report::{
    DownloadReportHandler, DownloadReportQuery, ExportMonthlyReportHandler,
    ExportMonthlyReportQuery, ExportMonthlyReportResult,
};
pub use get_user_segments::{GetUserSegmentsHandler, GetUserSegmentsQuery, GetUserSegmentsResult};
