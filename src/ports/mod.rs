//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! - `SegmentRepository` - Segments, memberships, expiry sweep and audit report
//! - `ReportStorage` - Persistence of generated report files

mod report_storage;
mod segment_repository;

pub use report_storage::{ReportHandle, ReportStorage};
pub use segment_repository::SegmentRepository;
