//! Application state management
//!
//! Contains shared state accessible across all handlers.

use crate::auth::{AccessGuard, TokenService};
use crate::config::AuthConfig;
use crate::db::{HomeService, UserService};
use deadpool_postgres::Pool;
use std::sync::Arc;

/// Application state shared across all handlers
pub struct AppState {
    /// User service for signup/signin and user listing
    pub users: Arc<UserService>,

    /// Listing, image and inquiry operations
    pub homes: HomeService,

    /// Token verification plus user lookup for guarded routes
    pub guard: AccessGuard,

    /// Secret product keys are derived from
    pub product_key_secret: String,
}

impl AppState {
    pub fn new(pool: Pool, tokens: TokenService, auth: &AuthConfig) -> Self {
        let users = Arc::new(UserService::new(pool.clone()));
        let guard = AccessGuard::new(Arc::new(tokens), users.clone());

        Self {
            users,
            homes: HomeService::new(pool),
            guard,
            product_key_secret: auth.product_key_secret.clone(),
        }
    }

    pub fn tokens(&self) -> &TokenService {
        self.guard.tokens()
    }

    /// State around a caller-built guard. The pool points nowhere and
    /// never connects unless a handler reaches the database.
    #[cfg(test)]
    pub fn for_tests(guard: AccessGuard, product_key_secret: &str) -> Self {
        let mut cfg = deadpool_postgres::Config::new();
        cfg.host = Some("127.0.0.1".to_string());
        cfg.port = Some(1);
        cfg.dbname = Some("unused".to_string());
        let pool = cfg
            .create_pool(
                Some(deadpool_postgres::Runtime::Tokio1),
                tokio_postgres::NoTls,
            )
            .expect("lazy pool");

        Self {
            users: Arc::new(UserService::new(pool.clone())),
            homes: HomeService::new(pool),
            guard,
            product_key_secret: product_key_secret.to_string(),
        }
    }
}

/// Type alias for shared state
pub type SharedState = Arc<AppState>;
