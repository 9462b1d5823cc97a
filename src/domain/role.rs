//! Role hierarchy for capability checks.
//!
//! Roles form a strict capability ordering; every check in the engine goes
//! through [`Role::allows`] rather than comparing role names.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Capability level of a caller, ordered from least to most privileged.
///
/// A higher role can perform every action a lower role can.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    Anonymous,
    Member,
    Moderator,
    Admin,
    RootAdmin,
}

impl Role {
    /// True if this role meets or exceeds `required`.
    pub fn allows(&self, required: Role) -> bool {
        *self >= required
    }

    /// Canonical claim string, as issued by the identity service.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Anonymous => "anonymous",
            Role::Member => "member",
            Role::Moderator => "moderator",
            Role::Admin => "admin",
            Role::RootAdmin => "root_admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error returned when a role claim string is not recognized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleParseError(pub String);

impl fmt::Display for RoleParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown role claim: {}", self.0)
    }
}

impl std::error::Error for RoleParseError {}

impl FromStr for Role {
    type Err = RoleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "anonymous" => Ok(Role::Anonymous),
            "member" => Ok(Role::Member),
            "moderator" => Ok(Role::Moderator),
            "admin" => Ok(Role::Admin),
            "root_admin" => Ok(Role::RootAdmin),
            other => Err(RoleParseError(other.to_string())),
        }
    }
}
