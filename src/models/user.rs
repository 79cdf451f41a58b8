//! User models and auth DTOs

use crate::auth::Role;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// North-American phone number, optionally with a +1 prefix
pub static PHONE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\+?1\s*[-.]?\s*)?(\(\d{3}\)|\d{3})\s*[-.]?\s*\d{3}\s*[-.]?\s*\d{4}$")
        .expect("phone pattern is valid")
});

/// User represents a registered account
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub phone: String,
    #[serde(skip_serializing)] // Never send password hash to client
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields required to insert a user
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub password_hash: String,
    pub role: Role,
}

/// Request to sign up
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(regex(path = *PHONE_REGEX, message = "Phone must be a valid phone number"))]
    pub phone: String,
    #[validate(email(message = "Email must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 5, message = "Password must be at least 5 characters"))]
    pub password: String,
    pub product_key: Option<String>,
}

/// Request to sign in
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SigninRequest {
    #[validate(email(message = "Email must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Request for a signup product key (admin only)
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProductKeyRequest {
    #[validate(email(message = "Email must be a valid email address"))]
    pub email: String,
    pub user_type: Role,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductKeyResponse {
    pub product_key: String,
}
