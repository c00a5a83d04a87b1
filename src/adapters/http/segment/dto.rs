//! HTTP DTOs (Data Transfer Objects) for segment endpoints.
//!
//! These types define the JSON request/response structure for the segment API.
//! They serve as the boundary between HTTP and the application layer.

use serde::{Deserialize, Serialize};

use crate::application::handlers::segment::{
    CreateSampledSegmentResult, CreateSegmentResult, ExportMonthlyReportResult,
    GetUserSegmentsResult, UpdateMembershipsResult,
};

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Request to create an empty segment.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateSegmentRequest {
    pub slug: String,
}

/// Request to create a segment filled with a random share of all users.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateSampledSegmentRequest {
    pub slug: String,
    /// Share of users to add, 1 to 100.
    pub percent: i64,
    /// Membership lifetime such as `"72h"`; absent means permanent.
    #[serde(default)]
    pub ttl: Option<String>,
}

/// Request to delete a segment.
#[derive(Debug, Clone, Deserialize)]
pub struct DeleteSegmentRequest {
    pub slug: String,
}

/// Request to change one user's memberships.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateMembershipsRequest {
    pub user_id: u64,
    #[serde(default)]
    pub add_segments: Vec<String>,
    #[serde(default)]
    pub delete_segments: Vec<String>,
    #[serde(default)]
    pub ttl: Option<String>,
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// A created segment.
#[derive(Debug, Clone, Serialize)]
pub struct SegmentResponse {
    pub id: i64,
    pub slug: String,
}

impl From<CreateSegmentResult> for SegmentResponse {
    fn from(result: CreateSegmentResult) -> Self {
        Self {
            id: result.segment.id.value(),
            slug: result.segment.slug.into(),
        }
    }
}

/// A created and sampled segment.
#[derive(Debug, Clone, Serialize)]
pub struct SampledSegmentResponse {
    pub id: i64,
    pub slug: String,
    pub population: usize,
    pub members_added: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<String>,
}

impl From<CreateSampledSegmentResult> for SampledSegmentResponse {
    fn from(result: CreateSampledSegmentResult) -> Self {
        Self {
            id: result.segment.id.value(),
            slug: result.segment.slug.into(),
            population: result.population,
            members_added: result.members_added,
            expires_at: result.expires_at.map(|ts| ts.to_string()),
        }
    }
}

/// Outcome of a delete.
#[derive(Debug, Clone, Serialize)]
pub struct DeleteSegmentResponse {
    pub deleted: bool,
}

/// Row counts of a membership update.
#[derive(Debug, Clone, Serialize)]
pub struct UpdateMembershipsResponse {
    pub added: u64,
    pub removed: u64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub overlapping: Vec<String>,
}

impl From<UpdateMembershipsResult> for UpdateMembershipsResponse {
    fn from(result: UpdateMembershipsResult) -> Self {
        Self {
            added: result.outcome.added,
            removed: result.outcome.removed,
            overlapping: result.overlapping.into_iter().map(String::from).collect(),
        }
    }
}

/// Segments a user belongs to.
#[derive(Debug, Clone, Serialize)]
pub struct UserSegmentsResponse {
    pub user_id: u64,
    pub segments: Vec<String>,
}

impl From<GetUserSegmentsResult> for UserSegmentsResponse {
    fn from(result: GetUserSegmentsResult) -> Self {
        Self {
            user_id: result.user_id.value(),
            segments: result.segments.into_iter().map(String::from).collect(),
        }
    }
}

/// Location of an exported report.
#[derive(Debug, Clone, Serialize)]
pub struct ReportResponse {
    pub month: String,
    pub url: String,
    pub rows: usize,
}

impl From<ExportMonthlyReportResult> for ReportResponse {
    fn from(result: ExportMonthlyReportResult) -> Self {
        Self {
            month: result.month.to_string(),
            url: result.report.url,
            rows: result.report.rows,
        }
    }
}

/// Standard error response.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub error_code: String,
    /// Human-readable error message.
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error_code: error_code.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{SegmentId, Timestamp, UserId};
    use crate::domain::segment::{DeltaOutcome, Segment, SegmentSlug};
    use serde_json::json;

    #[test]
    fn sampled_request_ttl_is_optional() {
        let req: CreateSampledSegmentRequest =
            serde_json::from_value(json!({"slug": "beta", "percent": 30})).unwrap();
        assert_eq!(req.percent, 30);
        assert!(req.ttl.is_none());
    }

    #[test]
    fn update_request_lists_default_to_empty() {
        let req: UpdateMembershipsRequest =
            serde_json::from_value(json!({"user_id": 1000, "add_segments": ["a"]})).unwrap();
        assert_eq!(req.add_segments, vec!["a"]);
        assert!(req.delete_segments.is_empty());
    }

    #[test]
    fn update_request_rejects_negative_user_id() {
        let result: Result<UpdateMembershipsRequest, _> =
            serde_json::from_value(json!({"user_id": -1}));
        assert!(result.is_err());
    }

    #[test]
    fn sampled_response_omits_missing_expiry() {
        let response = SampledSegmentResponse::from(CreateSampledSegmentResult {
            segment: Segment::new(SegmentId::from_db(3), SegmentSlug::new("beta").unwrap()),
            population: 10,
            members_added: 5,
            expires_at: None,
        });
        let value = serde_json::to_value(response).unwrap();
        assert_eq!(value["members_added"], 5);
        assert!(value.get("expires_at").is_none());
    }

    #[test]
    fn sampled_response_formats_expiry_as_rfc3339() {
        let response = SampledSegmentResponse::from(CreateSampledSegmentResult {
            segment: Segment::new(SegmentId::from_db(3), SegmentSlug::new("beta").unwrap()),
            population: 0,
            members_added: 0,
            expires_at: Some(Timestamp::from_unix_secs(0)),
        });
        assert_eq!(response.expires_at.as_deref(), Some("1970-01-01T00:00:00+00:00"));
    }

    #[test]
    fn update_response_hides_empty_overlap() {
        let response = UpdateMembershipsResponse::from(UpdateMembershipsResult {
            outcome: DeltaOutcome { added: 1, removed: 0 },
            overlapping: vec![],
        });
        let value = serde_json::to_value(response).unwrap();
        assert!(value.get("overlapping").is_none());
    }

    #[test]
    fn user_segments_response_uses_raw_values() {
        let response = UserSegmentsResponse::from(GetUserSegmentsResult {
            user_id: UserId::new(1000).unwrap(),
            segments: vec![SegmentSlug::new("AVITO_VOICE_MESSAGES").unwrap()],
        });
        let value = serde_json::to_value(response).unwrap();
        assert_eq!(value, json!({"user_id": 1000, "segments": ["AVITO_VOICE_MESSAGES"]}));
    }
}
