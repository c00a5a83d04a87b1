//! In-memory adapters for tests and local development.

mod segment_repository;

pub use segment_repository::InMemorySegmentRepository;
