//! User role enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Subscription tiers used by the RBAC gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum UserRole {
    /// Free tier.
    #[default]
    Starter,
    /// Paid tier.
    Pro,
}

impl UserRole {
    /// All roles, lowest tier first.
    pub const ALL: [UserRole; 2] = [Self::Starter, Self::Pro];

    /// Return the role as its wire string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Starter => "STARTER",
            Self::Pro => "PRO",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = sessionhub_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "STARTER" => Ok(Self::Starter),
            "PRO" => Ok(Self::Pro),
            _ => Err(sessionhub_core::AppError::validation(format!(
                "Invalid user role: '{s}'. Expected one of: STARTER, PRO"
            ))),
        }
    }
}
