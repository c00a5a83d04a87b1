//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (value objects, IDs, errors)
//! - `segment` - Segments, memberships, sampling and reports

pub mod foundation;
pub mod segment;
