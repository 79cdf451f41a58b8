//! In-memory user store
//!
//! Stands in for PostgreSQL wherever the access guard is exercised in tests.

use crate::auth::{CredentialStore, Role};
use crate::error::AppError;
use crate::models::User;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::RwLock;

#[derive(Default)]
pub struct MemoryCredentials {
    users: RwLock<HashMap<i32, User>>,
    lookups: AtomicUsize,
    unavailable: AtomicBool,
}

impl MemoryCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    /// A user with predictable contact details
    pub fn user(id: i32, role: Role) -> User {
        User {
            id,
            name: format!("user{}", id),
            email: format!("user{}@homes.example", id),
            phone: "555 555 5555".to_string(),
            password_hash: String::new(),
            role,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    pub fn insert(&self, user: User) {
        self.users.write().unwrap().insert(user.id, user);
    }

    /// Number of `find_by_id` calls served so far
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    /// Make every lookup fail as if the database were down
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentials {
    async fn find_by_id(&self, id: i32) -> Result<Option<User>, AppError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(AppError::Internal("credential store offline".to_string()));
        }
        Ok(self.users.read().unwrap().get(&id).cloned())
    }
}
