//! User domain entity, role and acting identity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::{ROLE_ADMIN, ROLE_EMPLOYEE};

/// User roles enumeration.
///
/// The single role definition shared by the access policy, the identity
/// extracted from tokens and the persisted user rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "UPPERCASE")]
pub enum UserRole {
    Admin,
    Employee,
}

impl UserRole {
    /// Check if this role has admin privileges
    pub fn is_admin(&self) -> bool {
        matches!(self, UserRole::Admin)
    }

    /// Parse a stored or transmitted role, rejecting unknown values.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            ROLE_ADMIN => Some(UserRole::Admin),
            ROLE_EMPLOYEE => Some(UserRole::Employee),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => ROLE_ADMIN,
            UserRole::Employee => ROLE_EMPLOYEE,
        }
    }
}

/// Unknown values fall back to the least privileged role.
impl From<&str> for UserRole {
    fn from(s: &str) -> Self {
        UserRole::parse(s).unwrap_or(UserRole::Employee)
    }
}

impl From<String> for UserRole {
    fn from(s: String) -> Self {
        UserRole::from(s.as_str())
    }
}

impl From<UserRole> for String {
    fn from(role: UserRole) -> Self {
        role.as_str().to_string()
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User domain entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new user with the default role
    pub fn new(id: Uuid, email: String, name: String) -> Self {
        let now = Utc::now();
        Self {
            id,
            email,
            name,
            role: UserRole::Employee,
            created_at: now,
            updated_at: now,
        }
    }

    /// Check if user has admin role
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// Identity used when this user acts on the system
    pub fn actor(&self) -> Actor {
        Actor::new(self.id, self.role)
    }
}

/// The acting user supplied to every core call by the identity layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub id: Uuid,
    pub role: UserRole,
}

impl Actor {
    pub fn new(id: Uuid, role: UserRole) -> Self {
        Self { id, role }
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

/// Minimal user projection (id, name, email).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UserRef {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_wire_format() {
        assert_eq!(serde_json::to_string(&UserRole::Admin).unwrap(), "\"ADMIN\"");
        assert_eq!(
            serde_json::from_str::<UserRole>("\"EMPLOYEE\"").unwrap(),
            UserRole::Employee
        );
        assert!(serde_json::from_str::<UserRole>("\"user\"").is_err());
    }

    #[test]
    fn test_role_parse_and_fallback() {
        assert_eq!(UserRole::parse("ADMIN"), Some(UserRole::Admin));
        assert_eq!(UserRole::parse("admin"), None);
        assert_eq!(UserRole::from("superuser"), UserRole::Employee);
        assert_eq!(UserRole::Employee.to_string(), "EMPLOYEE");
    }

    #[test]
    fn test_new_user_is_employee() {
        let user = User::new(Uuid::new_v4(), "e@example.com".into(), "E".into());
        assert!(!user.is_admin());
        assert_eq!(user.actor().role, UserRole::Employee);
    }
}
