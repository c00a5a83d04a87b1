//! ExportMonthlyReportHandler - Builds the membership audit report for one
//! month and stores it as a downloadable file.

use std::sync::Arc;

use crate::domain::segment::{ReportMonth, SegmentError};
use crate::ports::{ReportHandle, ReportStorage, SegmentRepository};

/// Query for a month's report, `month` in `YYYY-MM` form.
#[derive(Debug, Clone)]
pub struct ExportMonthlyReportQuery {
    pub month: String,
}

/// Where the generated report can be downloaded.
#[derive(Debug, Clone)]
pub struct ExportMonthlyReportResult {
    pub month: ReportMonth,
    pub report: ReportHandle,
}

/// Handler for exporting monthly reports.
pub struct ExportMonthlyReportHandler {
    repository: Arc<dyn SegmentRepository>,
    storage: Arc<dyn ReportStorage>,
}

impl ExportMonthlyReportHandler {
    pub fn new(repository: Arc<dyn SegmentRepository>, storage: Arc<dyn ReportStorage>) -> Self {
        Self {
            repository,
            storage,
        }
    }

    pub async fn handle(
        &self,
        query: ExportMonthlyReportQuery,
    ) -> Result<ExportMonthlyReportResult, SegmentError> {
        let month = ReportMonth::parse(&query.month)?;

        let rows = self.repository.monthly_report(month).await?;
        let report = self.storage.store(month, &rows).await?;

        tracing::info!(month = %month, rows = report.rows, key = %report.key, "Monthly report exported");

        Ok(ExportMonthlyReportResult { month, report })
    }
}

/// Query for the bytes of a previously exported report.
#[derive(Debug, Clone)]
pub struct DownloadReportQuery {
    pub key: String,
}

/// Handler for reading back exported reports.
pub struct DownloadReportHandler {
    storage: Arc<dyn ReportStorage>,
}

impl DownloadReportHandler {
    pub fn new(storage: Arc<dyn ReportStorage>) -> Self {
        Self { storage }
    }

    pub async fn handle(&self, query: DownloadReportQuery) -> Result<Vec<u8>, SegmentError> {
        Ok(self.storage.load(&query.key).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemorySegmentRepository;
    use crate::domain::foundation::{DomainError, ErrorCode, UserId};
    use crate::domain::segment::{MembershipEvent, MembershipOperation, MembershipWindow, SegmentSlug};
    use async_trait::async_trait;
    use chrono::Datelike;
    use std::sync::Mutex;

    // ════════════════════════════════════════════════════════════════════════════
    // Mock Implementations
    // ════════════════════════════════════════════════════════════════════════════

    #[derive(Default)]
    struct MockReportStorage {
        stored: Mutex<Vec<(ReportMonth, Vec<MembershipEvent>)>>,
        fail_store: bool,
    }

    impl MockReportStorage {
        fn failing() -> Self {
            Self {
                fail_store: true,
                ..Default::default()
            }
        }
    }

    #[async_trait]
    impl ReportStorage for MockReportStorage {
        async fn store(
            &self,
            month: ReportMonth,
            rows: &[MembershipEvent],
        ) -> Result<ReportHandle, DomainError> {
            if self.fail_store {
                return Err(DomainError::new(ErrorCode::ReportStorageError, "disk full"));
            }
            self.stored.lock().unwrap().push((month, rows.to_vec()));
            let key = format!("{}-test.csv", month);
            Ok(ReportHandle {
                url: format!("/download/{}", key),
                key,
                rows: rows.len(),
            })
        }

        async fn load(&self, key: &str) -> Result<Vec<u8>, DomainError> {
            if key == format!("{}-test.csv", ReportMonth::new(2023, 8).unwrap()) {
                Ok(b"1;a;add;t\n".to_vec())
            } else {
                Err(DomainError::new(ErrorCode::ReportNotFound, "missing")
                    .with_detail("report", key))
            }
        }
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn exports_current_month_activity() {
        let repo = Arc::new(InMemorySegmentRepository::new());
        let storage = Arc::new(MockReportStorage::default());
        let slug = SegmentSlug::new("beta").unwrap();
        let user = UserId::new(1000).unwrap();
        repo.create_segment(&slug).await.unwrap();
        repo.add_user_to_segments(user, &[slug.clone()], &MembershipWindow::permanent())
            .await
            .unwrap();
        repo.remove_user_from_segments(user, &[slug]).await.unwrap();

        let now = chrono::Utc::now();
        let month = format!("{:04}-{:02}", now.year(), now.month());
        let result = ExportMonthlyReportHandler::new(repo, storage.clone())
            .handle(ExportMonthlyReportQuery { month })
            .await
            .unwrap();

        assert_eq!(result.report.rows, 2);
        let stored = storage.stored.lock().unwrap();
        let ops: Vec<MembershipOperation> = stored[0].1.iter().map(|e| e.operation).collect();
        assert_eq!(ops, vec![MembershipOperation::Add, MembershipOperation::Delete]);
    }

    #[tokio::test]
    async fn malformed_month_is_rejected() {
        let handler = ExportMonthlyReportHandler::new(
            Arc::new(InMemorySegmentRepository::new()),
            Arc::new(MockReportStorage::default()),
        );

        for month in ["2023-13", "2023-1", "23-01", "2023/01", ""] {
            let err = handler
                .handle(ExportMonthlyReportQuery {
                    month: month.to_string(),
                })
                .await
                .unwrap_err();
            assert!(matches!(err, SegmentError::InvalidReportMonth(_)), "{}", month);
        }
    }

    #[tokio::test]
    async fn storage_failure_is_reported() {
        let handler = ExportMonthlyReportHandler::new(
            Arc::new(InMemorySegmentRepository::new()),
            Arc::new(MockReportStorage::failing()),
        );

        let err = handler
            .handle(ExportMonthlyReportQuery {
                month: "2023-08".to_string(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, SegmentError::ReportStorage(_)));
    }

    #[tokio::test]
    async fn download_missing_report_is_not_found() {
        let handler = DownloadReportHandler::new(Arc::new(MockReportStorage::default()));

        let err = handler
            .handle(DownloadReportQuery {
                key: "nope.csv".to_string(),
            })
            .await
            .unwrap_err();

        assert_eq!(err, SegmentError::ReportNotFound("nope.csv".to_string()));
    }

    #[tokio::test]
    async fn download_returns_stored_bytes() {
        let handler = DownloadReportHandler::new(Arc::new(MockReportStorage::default()));

        let bytes = handler
            .handle(DownloadReportQuery {
                key: "2023-08-test.csv".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(bytes, b"1;a;add;t\n");
    }
}
