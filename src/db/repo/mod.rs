//! Repository layer for database operations.
//!
//! This module provides the `Repository` struct for all database operations.
//! Methods are organized across submodules by domain:
//! - `deals.rs` - Deal rows, status transitions, and published queries
//! - `votes.rs` - Vote ledger rows and transactional counter updates
//! - `engagement.rs` - View dedup, comment counts, and snapshot reads

mod deals;
mod engagement;
mod votes;

use crate::domain::{Deal, EngagementSnapshot};
use sqlx::sqlite::SqlitePool;

/// A deal joined with its engagement counters, read in one statement so the
/// pair reflects a single committed state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DealWithCounts {
    pub deal: Deal,
    pub counts: EngagementSnapshot,
}

/// Repository for database operations.
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Repository { pool }
    }

    pub(crate) fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
