//! HTTP handlers for segment endpoints.
//!
//! These handlers connect Axum routes to application layer command/query handlers.

use std::sync::Arc;

use axum::extract::{Json, Path, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;

use crate::application::handlers::segment::{
    CreateSampledSegmentCommand, CreateSampledSegmentHandler, CreateSegmentCommand,
    CreateSegmentHandler, DeleteSegmentCommand, DeleteSegmentHandler, DownloadReportHandler,
    DownloadReportQuery, ExportMonthlyReportHandler, ExportMonthlyReportQuery,
    GetUserSegmentsHandler, GetUserSegmentsQuery, UpdateMembershipsCommand,
    UpdateMembershipsHandler,
};
use crate::domain::foundation::UserId;
use crate::domain::segment::{CohortSampler, SegmentError};
use crate::ports::{ReportStorage, SegmentRepository};

use super::dto::{
    CreateSampledSegmentRequest, CreateSegmentRequest, DeleteSegmentRequest,
    DeleteSegmentResponse, ErrorResponse, ReportResponse, SampledSegmentResponse,
    SegmentResponse, UpdateMembershipsRequest, UpdateMembershipsResponse, UserSegmentsResponse,
};

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared application state containing all dependencies.
#[derive(Clone)]
pub struct SegmentAppState {
    pub repository: Arc<dyn SegmentRepository>,
    pub report_storage: Arc<dyn ReportStorage>,
    pub sampler: Arc<CohortSampler>,
}

impl SegmentAppState {
    pub fn new(
        repository: Arc<dyn SegmentRepository>,
        report_storage: Arc<dyn ReportStorage>,
        sampler: Arc<CohortSampler>,
    ) -> Self {
        Self {
            repository,
            report_storage,
            sampler,
        }
    }

    pub fn create_segment_handler(&self) -> CreateSegmentHandler {
        CreateSegmentHandler::new(self.repository.clone())
    }

    pub fn create_sampled_segment_handler(&self) -> CreateSampledSegmentHandler {
        CreateSampledSegmentHandler::new(self.repository.clone(), self.sampler.clone())
    }

    pub fn delete_segment_handler(&self) -> DeleteSegmentHandler {
        DeleteSegmentHandler::new(self.repository.clone())
    }

    pub fn update_memberships_handler(&self) -> UpdateMembershipsHandler {
        UpdateMembershipsHandler::new(self.repository.clone())
    }

    pub fn get_user_segments_handler(&self) -> GetUserSegmentsHandler {
        GetUserSegmentsHandler::new(self.repository.clone())
    }

    pub fn export_report_handler(&self) -> ExportMonthlyReportHandler {
        ExportMonthlyReportHandler::new(self.repository.clone(), self.report_storage.clone())
    }

    pub fn download_report_handler(&self) -> DownloadReportHandler {
        DownloadReportHandler::new(self.report_storage.clone())
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Command Handlers
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/segments - Create an empty segment
pub async fn create_segment(
    State(state): State<SegmentAppState>,
    Json(request): Json<CreateSegmentRequest>,
) -> Result<impl IntoResponse, SegmentApiError> {
    let result = state
        .create_segment_handler()
        .handle(CreateSegmentCommand { slug: request.slug })
        .await?;

    Ok((StatusCode::CREATED, Json(SegmentResponse::from(result))))
}

/// POST /api/segments/sampled - Create a segment with random user sampling
pub async fn create_sampled_segment(
    State(state): State<SegmentAppState>,
    Json(request): Json<CreateSampledSegmentRequest>,
) -> Result<impl IntoResponse, SegmentApiError> {
    let cmd = CreateSampledSegmentCommand {
        slug: request.slug,
        percent: request.percent,
        ttl: request.ttl,
    };
    let result = state.create_sampled_segment_handler().handle(cmd).await?;

    Ok((StatusCode::CREATED, Json(SampledSegmentResponse::from(result))))
}

/// DELETE /api/segments - Delete a segment and its memberships
pub async fn delete_segment(
    State(state): State<SegmentAppState>,
    Json(request): Json<DeleteSegmentRequest>,
) -> Result<impl IntoResponse, SegmentApiError> {
    let result = state
        .delete_segment_handler()
        .handle(DeleteSegmentCommand { slug: request.slug })
        .await?;

    Ok(Json(DeleteSegmentResponse {
        deleted: result.deleted,
    }))
}

/// POST /api/memberships - Add a user to and remove them from segments
pub async fn update_memberships(
    State(state): State<SegmentAppState>,
    Json(request): Json<UpdateMembershipsRequest>,
) -> Result<impl IntoResponse, SegmentApiError> {
    let user_id = UserId::new(request.user_id).map_err(SegmentError::from)?;
    let cmd = UpdateMembershipsCommand {
        user_id,
        add_segments: request.add_segments,
        delete_segments: request.delete_segments,
        ttl: request.ttl,
    };
    let result = state.update_memberships_handler().handle(cmd).await?;

    Ok(Json(UpdateMembershipsResponse::from(result)))
}

// ════════════════════════════════════════════════════════════════════════════════
// Query Handlers
// ════════════════════════════════════════════════════════════════════════════════

/// GET /api/users/:user_id/segments - List the segments a user belongs to
pub async fn get_user_segments(
    State(state): State<SegmentAppState>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, SegmentApiError> {
    let user_id: UserId = user_id.parse().map_err(SegmentError::from)?;
    let result = state
        .get_user_segments_handler()
        .handle(GetUserSegmentsQuery { user_id })
        .await?;

    Ok(Json(UserSegmentsResponse::from(result)))
}

/// GET /api/reports/:month - Export the membership report for a month
pub async fn export_report(
    State(state): State<SegmentAppState>,
    Path(month): Path<String>,
) -> Result<impl IntoResponse, SegmentApiError> {
    let result = state
        .export_report_handler()
        .handle(ExportMonthlyReportQuery { month })
        .await?;

    Ok(Json(ReportResponse::from(result)))
}

/// GET /api/reports/download/:file - Download an exported report
pub async fn download_report(
    State(state): State<SegmentAppState>,
    Path(file): Path<String>,
) -> Result<impl IntoResponse, SegmentApiError> {
    let bytes = state
        .download_report_handler()
        .handle(DownloadReportQuery { key: file.clone() })
        .await?;

    let disposition = format!("attachment; filename=\"{}\"", file);
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    ))
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error type that converts segment errors to HTTP responses.
#[derive(Debug)]
pub struct SegmentApiError(SegmentError);

impl From<SegmentError> for SegmentApiError {
    fn from(err: SegmentError) -> Self {
        Self(err)
    }
}

impl SegmentApiError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            SegmentError::DuplicateSlug(_) => StatusCode::CONFLICT,
            SegmentError::SegmentNotFound(_) | SegmentError::ReportNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            SegmentError::InvalidTtl(_)
            | SegmentError::InvalidPercent(_)
            | SegmentError::InvalidReportMonth(_)
            | SegmentError::ValidationFailed { .. } => StatusCode::BAD_REQUEST,
            SegmentError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            SegmentError::StatementFailed(_) | SegmentError::ReportStorage(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for SegmentApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self.0, code = %self.0.code(), "Request failed");
        }

        let body = ErrorResponse::new(self.0.code().to_string(), self.0.to_string());
        (status, Json(body)).into_response()
    }
}
