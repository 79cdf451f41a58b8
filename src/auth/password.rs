//! Password hashing and product keys
//!
//! Uses bcrypt for password hashes and for the product keys an admin
//! hands out to realtors and admins before they can sign up.

use crate::auth::Role;
use crate::error::AppError;
use bcrypt::{hash, verify, DEFAULT_COST};
use sha2::{Digest, Sha256};

/// Hash a password using bcrypt
pub fn hash_password(password: &str) -> Result<String, AppError> {
    hash(password, DEFAULT_COST)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))
}

/// Verify a password against a hash
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    verify(password, hash)
        .map_err(|e| AppError::Internal(format!("Failed to verify password: {}", e)))
}

/// Material a product key is derived from.
///
/// bcrypt only reads the first 72 bytes of its input, so the
/// email/role/secret triple is digested first to keep the secret in play
/// for long email addresses.
fn product_key_material(email: &str, role: Role, secret: &str) -> String {
    let digest = Sha256::digest(format!("{}-{}-{}", email, role, secret).as_bytes());
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Generate the product key that lets `email` sign up as `role`
pub fn generate_product_key(email: &str, role: Role, secret: &str) -> Result<String, AppError> {
    hash(product_key_material(email, role, secret), DEFAULT_COST)
        .map_err(|e| AppError::Internal(format!("Failed to generate product key: {}", e)))
}

/// Check a caller-supplied product key. Malformed keys are simply invalid.
pub fn verify_product_key(product_key: &str, email: &str, role: Role, secret: &str) -> bool {
    verify(product_key_material(email, role, secret), product_key).unwrap_or(false)
}
