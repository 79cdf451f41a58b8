//! Authentication and authorization module
//!
//! Provides JWT identity tokens, the role-based access guard and
//! the per-route role declarations it enforces.

mod guard;
mod jwt;
mod middleware;
mod password;

pub use guard::{Access, AccessGuard, CredentialStore, Denial, Principal};
pub use jwt::{Claims, TokenError, TokenService};
pub use middleware::{resolve_roles, RouteScope};
pub use password::{generate_product_key, hash_password, verify_password, verify_product_key};

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// User roles for authorization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    /// Browses listings and sends inquiries
    Buyer,
    /// Publishes and manages listings, reads inquiries
    Realtor,
    /// Issues product keys and manages users
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Buyer => "BUYER",
            Role::Realtor => "REALTOR",
            Role::Admin => "ADMIN",
        }
    }

    /// Signing up with any role other than buyer requires a product key
    pub fn requires_product_key(&self) -> bool {
        !matches!(self, Role::Buyer)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "BUYER" => Ok(Role::Buyer),
            "REALTOR" => Ok(Role::Realtor),
            "ADMIN" => Ok(Role::Admin),
            other => Err(format!("Unknown user type: {}", other)),
        }
    }
}

/// Set of roles a route accepts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleSet(Vec<Role>);

impl RoleSet {
    pub fn of(roles: impl IntoIterator<Item = Role>) -> Self {
        let mut set = Vec::new();
        for role in roles {
            if !set.contains(&role) {
                set.push(role);
            }
        }
        Self(set)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, role: Role) -> bool {
        self.0.contains(&role)
    }

    pub fn roles(&self) -> &[Role] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parses_case_insensitively() {
        assert_eq!("realtor".parse::<Role>(), Ok(Role::Realtor));
        assert_eq!("ADMIN".parse::<Role>(), Ok(Role::Admin));
        assert!("landlord".parse::<Role>().is_err());
    }

    #[test]
    fn role_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&Role::Buyer).unwrap(), "\"BUYER\"");
        let role: Role = serde_json::from_str("\"REALTOR\"").unwrap();
        assert_eq!(role, Role::Realtor);
    }

    #[test]
    fn only_buyers_skip_product_key() {
        assert!(!Role::Buyer.requires_product_key());
        assert!(Role::Realtor.requires_product_key());
        assert!(Role::Admin.requires_product_key());
    }

    #[test]
    fn role_set_deduplicates() {
        let set = RoleSet::of([Role::Admin, Role::Admin, Role::Realtor]);
        assert_eq!(set.roles(), &[Role::Admin, Role::Realtor]);
        assert!(set.contains(Role::Realtor));
        assert!(!set.contains(Role::Buyer));
        assert!(RoleSet::default().is_empty());
    }
}
