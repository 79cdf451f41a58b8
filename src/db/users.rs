// Database service for user operations
//
// Backs signup/signin and is the credential store the access guard reads.

use crate::auth::{CredentialStore, Role};
use crate::db::queries::{FIND_USER_BY_EMAIL, FIND_USER_BY_ID, INSERT_USER, LIST_USERS};
use crate::error::AppError;
use crate::models::{NewUser, User};
use async_trait::async_trait;
use deadpool_postgres::Pool;
use tokio_postgres::error::SqlState;
use tokio_postgres::Row;

pub struct UserService {
    pool: Pool,
}

impl UserService {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    // Create a new user
    pub async fn create_user(&self, user: &NewUser) -> Result<User, AppError> {
        let client = self.pool.get().await?;

        let row = client
            .query_one(
                INSERT_USER,
                &[
                    &user.name,
                    &user.email,
                    &user.phone,
                    &user.password_hash,
                    &user.role.as_str(),
                ],
            )
            .await
            .map_err(|e| {
                if e.code() == Some(&SqlState::UNIQUE_VIOLATION) {
                    AppError::Conflict("Email already registered".to_string())
                } else {
                    AppError::Database(e)
                }
            })?;

        user_from_row(&row)
    }

    // Find user by email
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let client = self.pool.get().await?;

        let row = client
            .query_opt(
                FIND_USER_BY_EMAIL,
                &[&email],
            )
            .await?;

        row.as_ref().map(user_from_row).transpose()
    }

    // Find user by ID
    pub async fn find_by_id(&self, id: i32) -> Result<Option<User>, AppError> {
        let client = self.pool.get().await?;

        let row = client
            .query_opt(
                FIND_USER_BY_ID,
                &[&id],
            )
            .await?;

        row.as_ref().map(user_from_row).transpose()
    }

    // List all users
    pub async fn list_users(&self) -> Result<Vec<User>, AppError> {
        let client = self.pool.get().await?;

        let rows = client
            .query(LIST_USERS, &[])
            .await?;

        rows.iter().map(user_from_row).collect()
    }
}

#[async_trait]
impl CredentialStore for UserService {
    async fn find_by_id(&self, id: i32) -> Result<Option<User>, AppError> {
        UserService::find_by_id(self, id).await
    }
}

fn user_from_row(row: &Row) -> Result<User, AppError> {
    let user_type: String = row.get("user_type");
    let role: Role = user_type
        .parse()
        .map_err(|e: String| AppError::Internal(format!("Corrupt user record: {}", e)))?;

    Ok(User {
        id: row.get("id"),
        name: row.get("name"),
        email: row.get("email"),
        phone: row.get("phone"),
        password_hash: row.get("password_hash"),
        role,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}
