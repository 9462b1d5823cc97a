//! Vote types: direction, ledger row, and the caller-visible vote state.

use crate::domain::{DealId, TimeMs, UserId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Direction of a vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteDirection {
    Up,
    Down,
}

impl VoteDirection {
    /// Canonical storage string.
    pub fn as_str(&self) -> &'static str {
        match self {
            VoteDirection::Up => "up",
            VoteDirection::Down => "down",
        }
    }
}

impl fmt::Display for VoteDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for VoteDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "up" => Ok(VoteDirection::Up),
            "down" => Ok(VoteDirection::Down),
            other => Err(format!("unknown vote direction: {}", other)),
        }
    }
}

/// A ledger row: at most one per (deal, user).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vote {
    pub deal_id: DealId,
    pub user_id: UserId,
    pub direction: VoteDirection,
    pub updated_at: TimeMs,
}

/// The caller's effective vote on a deal after a ledger operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteState {
    NoVote,
    Upvoted,
    Downvoted,
}

impl From<Option<VoteDirection>> for VoteState {
    fn from(direction: Option<VoteDirection>) -> Self {
        match direction {
            None => VoteState::NoVote,
            Some(VoteDirection::Up) => VoteState::Upvoted,
            Some(VoteDirection::Down) => VoteState::Downvoted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_round_trip() {
        assert_eq!(VoteDirection::from_str("up").unwrap(), VoteDirection::Up);
        assert_eq!(
            VoteDirection::from_str("down").unwrap(),
            VoteDirection::Down
        );
        assert!(VoteDirection::from_str("sideways").is_err());
    }

    #[test]
    fn test_vote_state_from_direction() {
        assert_eq!(VoteState::from(None), VoteState::NoVote);
        assert_eq!(VoteState::from(Some(VoteDirection::Up)), VoteState::Upvoted);
        assert_eq!(
            VoteState::from(Some(VoteDirection::Down)),
            VoteState::Downvoted
        );
    }

    #[test]
    fn test_vote_state_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&VoteState::NoVote).unwrap(),
            "\"no_vote\""
        );
    }
}
