//! PostgreSQL adapters - Database implementations for repository ports.
//!
//! - `PostgresSegmentRepository` - Segments, memberships, sweep and audit report

mod segment_repository;

pub use segment_repository::PostgresSegmentRepository;
