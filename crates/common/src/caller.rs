//! Caller identity supplied by the authentication layer.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{UnknownStatus, UserId};

/// Role of a registered user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[default]
    Customer,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Customer => "customer",
            UserRole::Admin => "admin",
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(UserRole::Customer),
            "admin" => Ok(UserRole::Admin),
            other => Err(UnknownStatus {
                kind: "role",
                value: other.to_string(),
            }),
        }
    }
}

/// The authenticated principal on whose behalf an operation runs.
///
/// Authentication happens upstream; this crate only consumes the outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub user_id: UserId,
    pub role: UserRole,
}

impl Caller {
    pub fn customer(user_id: UserId) -> Self {
        Self {
            user_id,
            role: UserRole::Customer,
        }
    }

    pub fn admin(user_id: UserId) -> Self {
        Self {
            user_id,
            role: UserRole::Admin,
        }
    }

    /// Returns true if the caller holds administrator capability.
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    /// Returns true if the caller is the given user or an administrator.
    pub fn may_act_for(&self, owner: UserId) -> bool {
        self.user_id == owner || self.is_admin()
    }
}
