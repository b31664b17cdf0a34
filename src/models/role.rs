use serde::{Deserialize, Serialize};
use std::fmt;

/// System-wide role of a user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    /// Regular client submitting applications
    #[serde(alias = "CLIENT", alias = "ROLE_USER")]
    User,
    #[serde(alias = "ROLE_MANAGER")]
    Manager,
    #[serde(alias = "ROLE_ADMIN")]
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "USER",
            Self::Manager => "MANAGER",
            Self::Admin => "ADMIN",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }

    /// Managers and admins review applications
    pub fn is_reviewer(&self) -> bool {
        matches!(self, Self::Manager | Self::Admin)
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.strip_prefix("ROLE_").unwrap_or(s) {
            "USER" | "CLIENT" => Ok(Self::User),
            "MANAGER" => Ok(Self::Manager),
            "ADMIN" => Ok(Self::Admin),
            _ => Err(format!("Invalid user role: {s}")),
        }
    }
}

impl Default for UserRole {
    fn default() -> Self {
        Self::User
    }
}

/// Role a user holds over one specific product
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssignmentRole {
    ProductOwner,
    Reseller,
}

impl AssignmentRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ProductOwner => "PRODUCT_OWNER",
            Self::Reseller => "RESELLER",
        }
    }
}

impl fmt::Display for AssignmentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AssignmentRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PRODUCT_OWNER" => Ok(Self::ProductOwner),
            "RESELLER" => Ok(Self::Reseller),
            _ => Err(format!("Invalid assignment role: {s}")),
        }
    }
}
