//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `postgres` - PostgreSQL segment repository
//! - `memory` - In-memory segment repository (tests, local development)
//! - `reports` - CSV report files on the local filesystem
//! - `sweeper` - Background expiry sweep
//! - `http` - REST API

pub mod http;
pub mod memory;
pub mod postgres;
pub mod reports;
pub mod sweeper;

pub use memory::InMemorySegmentRepository;
pub use postgres::PostgresSegmentRepository;
pub use reports::CsvReportStorage;
pub use sweeper::{ExpirySweeper, ExpirySweeperConfig, SweeperHandle, SweeperStats};
