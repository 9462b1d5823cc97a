//! Domain types for the deal ranking and moderation engine.
//!
//! This module provides:
//! - Lossless price handling via a Decimal wrapper
//! - Domain primitives: TimeMs, DealId, UserId
//! - The ordered Role hierarchy and capability helper
//! - Deal, Vote, and EngagementSnapshot types

pub mod deal;
pub mod decimal;
pub mod primitives;
pub mod role;
pub mod snapshot;
pub mod vote;

pub use deal::{Deal, DealStatus, NewDeal};
pub use decimal::Decimal;
pub use primitives::{DealId, TimeMs, UserId};
pub use role::{Role, RoleParseError};
pub use snapshot::EngagementSnapshot;
pub use vote::{Vote, VoteDirection, VoteState};
