//! Report storage port.
//!
//! Persists generated monthly reports and hands back an opaque handle the
//! caller can use to download them later.

use async_trait::async_trait;
use serde::Serialize;

use crate::domain::foundation::DomainError;
use crate::domain::segment::{MembershipEvent, ReportMonth};

/// Where a stored report can be fetched from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportHandle {
    /// Storage key, usable with [`ReportStorage::load`].
    pub key: String,
    /// Public location of the report.
    pub url: String,
    /// Number of rows written.
    pub rows: usize,
}

/// Port for writing and reading report files.
#[async_trait]
pub trait ReportStorage: Send + Sync {
    /// Store the rows for `month` and return a handle to them.
    ///
    /// # Errors
    ///
    /// - `ReportStorageError` if the report cannot be written
    async fn store(
        &self,
        month: ReportMonth,
        rows: &[MembershipEvent],
    ) -> Result<ReportHandle, DomainError>;

    /// Read back a stored report.
    ///
    /// # Errors
    ///
    /// - `ReportNotFound` if no report has this key
    async fn load(&self, key: &str) -> Result<Vec<u8>, DomainError>;
}
