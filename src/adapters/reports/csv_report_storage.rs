//! Local Filesystem Report Storage - Implementation of ReportStorage.
//!
//! Writes each monthly report as a `;`-separated file, one audit row per line:
//!
//! ```text
//! <user_id>;<segment_slug>;<add|delete>;<rfc3339 time>
//! ```

use async_trait::async_trait;
use std::path::PathBuf;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::domain::foundation::{DomainError, ErrorCode};
use crate::domain::segment::{MembershipEvent, ReportMonth};
use crate::ports::{ReportHandle, ReportStorage};

const EXTENSION: &str = ".csv";

/// Stores reports as CSV files under one directory.
///
/// Files are named `{month}-{uuid}.csv`, so repeated exports of the same
/// month never overwrite each other. Writes go to a `.tmp` file first and
/// are renamed into place once flushed.
#[derive(Debug, Clone)]
pub struct CsvReportStorage {
    directory: PathBuf,
    public_base_url: String,
}

impl CsvReportStorage {
    /// Creates storage rooted at `directory`; handles point at
    /// `{public_base_url}/{key}`.
    pub fn new(directory: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            directory: directory.into(),
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn render(rows: &[MembershipEvent]) -> String {
        let mut out = String::new();
        for row in rows {
            out.push_str(&format!(
                "{};{};{};{}\n",
                row.user_id, row.segment_slug, row.operation, row.time
            ));
        }
        out
    }

    /// Accepts only keys this storage could have produced.
    fn is_valid_key(key: &str) -> bool {
        match key.strip_suffix(EXTENSION) {
            Some(stem) => {
                !stem.is_empty()
                    && stem
                        .chars()
                        .all(|c| c.is_ascii_alphanumeric() || c == '-')
            }
            None => false,
        }
    }

    fn storage_error(action: &str, path: &std::path::Path, e: std::io::Error) -> DomainError {
        DomainError::new(
            ErrorCode::ReportStorageError,
            format!("Failed to {} {}: {}", action, path.display(), e),
        )
    }
}

#[async_trait]
impl ReportStorage for CsvReportStorage {
    async fn store(
        &self,
        month: ReportMonth,
        rows: &[MembershipEvent],
    ) -> Result<ReportHandle, DomainError> {
        fs::create_dir_all(&self.directory)
            .await
            .map_err(|e| Self::storage_error("create directory", &self.directory, e))?;

        let key = format!("{}-{}{}", month, Uuid::new_v4().simple(), EXTENSION);
        let final_path = self.directory.join(&key);
        let temp_path = self.directory.join(format!("{}.tmp", key));

        let mut file = fs::File::create(&temp_path)
            .await
            .map_err(|e| Self::storage_error("create", &temp_path, e))?;
        file.write_all(Self::render(rows).as_bytes())
            .await
            .map_err(|e| Self::storage_error("write", &temp_path, e))?;
        file.sync_all()
            .await
            .map_err(|e| Self::storage_error("sync", &temp_path, e))?;
        fs::rename(&temp_path, &final_path)
            .await
            .map_err(|e| Self::storage_error("rename", &temp_path, e))?;

        Ok(ReportHandle {
            url: format!("{}/{}", self.public_base_url, key),
            key,
            rows: rows.len(),
        })
    }

    async fn load(&self, key: &str) -> Result<Vec<u8>, DomainError> {
        let not_found = || {
            DomainError::new(ErrorCode::ReportNotFound, format!("Report '{}' not found", key))
                .with_detail("report", key)
        };
        if !Self::is_valid_key(key) {
            return Err(not_found());
        }

        let path = self.directory.join(key);
        match fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(not_found()),
            Err(e) => Err(Self::storage_error("read", &path, e)),
        }
    }
}
