//! Application layer - Commands, Queries, and Handlers.
//!
//! This layer orchestrates domain operations and coordinates between ports.
//! Following CQRS, it separates command handlers (write) from query handlers (read).

pub mod handlers;

pub use handlers::segment::{
    CreateSampledSegmentCommand, CreateSampledSegmentHandler, CreateSampledSegmentResult,
    CreateSegmentCommand, CreateSegmentHandler, CreateSegmentResult, DeleteSegmentCommand,
    DeleteSegmentHandler, DeleteSegmentResult, DownloadReportHandler, DownloadReportQuery,
    ExportMonthlyReportHandler, ExportMonthlyReportQuery, ExportMonthlyReportResult,
    GetUserSegmentsHandler, GetUserSegmentsQuery, GetUserSegmentsResult,
    UpdateMembershipsCommand, UpdateMembershipsHandler, UpdateMembershipsResult,
};
