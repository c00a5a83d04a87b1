//! Report export configuration

use serde::Deserialize;
use std::path::PathBuf;

use super::error::ValidationError;

/// Where exported CSV reports are written and how they are addressed.
#[derive(Debug, Clone, Deserialize)]
pub struct ReportsConfig {
    /// Directory receiving report files
    #[serde(default = "default_directory")]
    pub directory: PathBuf,

    /// Prefix of the download URL handed back to callers
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,
}

impl ReportsConfig {
    /// Validate report configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.directory.as_os_str().is_empty() {
            return Err(ValidationError::MissingRequired("REPORTS__DIRECTORY"));
        }
        if self.public_base_url.trim().is_empty() {
            return Err(ValidationError::MissingRequired("REPORTS__PUBLIC_BASE_URL"));
        }
        Ok(())
    }
}

impl Default for ReportsConfig {
    fn default() -> Self {
        Self {
            directory: default_directory(),
            public_base_url: default_public_base_url(),
        }
    }
}

fn default_directory() -> PathBuf {
    PathBuf::from("./reports")
}

fn default_public_base_url() -> String {
    "/api/reports/download".to_string()
}
