//! Segment Service - user segment membership engine
//!
//! Maintains named user segments, per-user memberships with optional
//! expiry, percentage-sampled cohorts and a monthly CSV audit report.
//! A background sweeper deletes memberships once their TTL has passed.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
