//! Database layer for netmon
//!
//! This module provides the storage layer using SQLite with:
//! - Schema migrations
//! - Sample insert/count/clear
//! - Timestamp-ordered row streaming for exports

pub mod repo;
pub mod schema;

pub use repo::Database;
