pub mod api;
pub mod config;
pub mod db;
pub mod domain;
pub mod engagement;
pub mod engine;
pub mod error;
pub mod identity;
pub mod ledger;
pub mod moderation;
pub mod ranking;

pub use config::Config;
pub use db::{init_db, Repository};
pub use domain::{
    Deal, DealId, DealStatus, Decimal, EngagementSnapshot, NewDeal, Role, TimeMs, UserId, Vote,
    VoteDirection, VoteState,
};
pub use engagement::{EngagementService, ViewerKey};
pub use engine::{heat_score, HeatParams};
pub use error::EngineError;
pub use identity::{
    HttpIdentityProvider, Identity, IdentityGate, IdentityProvider, MockIdentityProvider,
};
pub use ledger::VoteLedger;
pub use moderation::{ModerationAction, ModerationService};
pub use ranking::{RankingService, SortOrder};
