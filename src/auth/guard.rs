//! Access guard
//!
//! Decides whether a request may reach a route that declares a set of
//! acceptable roles. The outcome is an explicit [`Access`] value; nothing
//! on this path returns an error or panics its way past the check.

use crate::auth::{Role, RoleSet, TokenError, TokenService};
use crate::error::AppError;
use crate::models::User;
use async_trait::async_trait;
use axum::http::{header::AUTHORIZATION, HeaderMap};
use chrono::Utc;
use std::sync::Arc;
use thiserror::Error;

/// The one store operation the guard depends on.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_by_id(&self, id: i32) -> Result<Option<User>, AppError>;
}

/// Why a guarded request was turned away.
///
/// Kept for logs and tests only; every variant produces the same
/// unauthorized response.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Denial {
    #[error("missing or malformed bearer credential")]
    MissingCredential,

    #[error("invalid token: {0}")]
    InvalidToken(TokenError),

    #[error("token subject {0} does not exist")]
    UnknownSubject(i32),

    #[error("role {actual} not in {required:?}")]
    InsufficientRole { actual: Role, required: Vec<Role> },

    #[error("credential store unavailable: {0}")]
    StoreUnavailable(String),
}

/// Outcome of evaluating a request against a route's role declaration.
#[derive(Debug, Clone)]
pub enum Access {
    /// Route declares no roles; nothing was checked
    Open,
    /// Caller resolved to a user whose role is accepted
    Granted(User),
    Denied(Denial),
}

impl Access {
    pub fn is_allowed(&self) -> bool {
        !matches!(self, Access::Denied(_))
    }

    /// The principal handlers see. `None` for open routes and every denial.
    pub fn principal(&self) -> Principal {
        match self {
            Access::Granted(user) => Principal(Some(user.clone())),
            Access::Open | Access::Denied(_) => Principal(None),
        }
    }
}

/// Per-request identity placed in the request extensions by the guard.
#[derive(Debug, Clone, Default)]
pub struct Principal(pub Option<User>);

impl Principal {
    pub fn user(&self) -> Option<&User> {
        self.0.as_ref()
    }

    /// The resolved user, or unauthorized when the route ran without one
    pub fn require(&self) -> Result<&User, AppError> {
        self.0.as_ref().ok_or(AppError::Unauthorized)
    }
}

/// Shared, immutable guard state: token verification plus user lookup.
#[derive(Clone)]
pub struct AccessGuard {
    tokens: Arc<TokenService>,
    store: Arc<dyn CredentialStore>,
}

impl AccessGuard {
    pub fn new(tokens: Arc<TokenService>, store: Arc<dyn CredentialStore>) -> Self {
        Self { tokens, store }
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    pub async fn evaluate(&self, roles: Option<&RoleSet>, headers: &HeaderMap) -> Access {
        self.evaluate_at(roles, headers, Utc::now().timestamp()).await
    }

    pub async fn evaluate_at(&self, roles: Option<&RoleSet>, headers: &HeaderMap, now: i64) -> Access {
        let roles = match roles {
            Some(roles) if !roles.is_empty() => roles,
            _ => return Access::Open,
        };

        let Some(token) = bearer_token(headers) else {
            return Access::Denied(Denial::MissingCredential);
        };

        let claims = match self.tokens.verify_at(token, now) {
            Ok(claims) => claims,
            Err(e) => return Access::Denied(Denial::InvalidToken(e)),
        };

        let user = match self.store.find_by_id(claims.sub).await {
            Ok(Some(user)) => user,
            Ok(None) => return Access::Denied(Denial::UnknownSubject(claims.sub)),
            Err(e) => return Access::Denied(Denial::StoreUnavailable(e.to_string())),
        };

        if roles.contains(user.role) {
            Access::Granted(user)
        } else {
            Access::Denied(Denial::InsufficientRole {
                actual: user.role,
                required: roles.roles().to_vec(),
            })
        }
    }
}

/// Token following the literal `Bearer ` scheme prefix, if any
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .filter(|token| !token.is_empty())
}
