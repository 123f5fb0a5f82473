//! User profile and caller types

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::review::AuditContext;
use crate::domain::DomainError;

/// Portal role of a user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Employee,
    Reviewer,
    Manager,
    Partner,
    Admin,
    Client,
}

impl Role {
    /// Roles notified when an item is submitted for review
    pub const REVIEW_AUDIENCE: [Role; 3] = [Role::Manager, Role::Partner, Role::Reviewer];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Employee => "employee",
            Role::Reviewer => "reviewer",
            Role::Manager => "manager",
            Role::Partner => "partner",
            Role::Admin => "admin",
            Role::Client => "client",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "employee" => Ok(Role::Employee),
            "reviewer" => Ok(Role::Reviewer),
            "manager" => Ok(Role::Manager),
            "partner" => Ok(Role::Partner),
            "admin" => Ok(Role::Admin),
            "client" => Ok(Role::Client),
            _ => Err(DomainError::validation(format!("Unknown role: {}", s))),
        }
    }
}

/// Profile row from the identity provider's profile table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl UserProfile {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        email: impl Into<String>,
        role: Role,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            email: email.into(),
            role,
        }
    }
}

/// Authenticated identity passed explicitly into every review operation
#[derive(Debug, Clone, PartialEq)]
pub struct Caller {
    pub user_id: String,
    pub role: Role,
    pub audit: AuditContext,
}

impl Caller {
    pub fn new(user_id: impl Into<String>, role: Role) -> Self {
        Self {
            user_id: user_id.into(),
            role,
            audit: AuditContext::system(),
        }
    }

    pub fn with_audit(mut self, audit: AuditContext) -> Self {
        self.audit = audit;
        self
    }
}
