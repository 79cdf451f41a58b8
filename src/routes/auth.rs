//! Authentication route handlers
//!
//! Signup (with product keys for realtors and admins), signin,
//! product key generation and the current user.

use crate::auth::{
    generate_product_key as derive_product_key, hash_password, verify_password,
    verify_product_key, Principal, Role,
};
use crate::error::{validation_error, ApiResult, AppError};
use crate::models::{
    NewUser, ProductKeyRequest, ProductKeyResponse, SigninRequest, SignupRequest, TokenResponse,
    User,
};
use crate::state::SharedState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use tracing::{debug, info};
use validator::Validate;

fn issue_token(state: &SharedState, user: &User) -> ApiResult<TokenResponse> {
    let token = state
        .tokens()
        .issue(user.id, &user.name)
        .map_err(|e| AppError::Internal(e.to_string()))?;
    Ok(TokenResponse { token })
}

/// POST /auth/signup/{user_type}
///
/// Buyers sign up freely; realtors and admins need a product key
/// issued for their email and user type.
pub async fn signup(
    State(state): State<SharedState>,
    Path(user_type): Path<String>,
    Json(req): Json<SignupRequest>,
) -> ApiResult<(StatusCode, Json<TokenResponse>)> {
    let role: Role = user_type.parse().map_err(AppError::BadRequest)?;
    req.validate().map_err(|e| validation_error(e.to_string()))?;

    if role.requires_product_key() {
        let key = req.product_key.as_deref().ok_or(AppError::Unauthorized)?;
        if !verify_product_key(key, &req.email, role, &state.product_key_secret) {
            debug!("Rejected {} signup for {}: bad product key", role, req.email);
            return Err(AppError::Unauthorized);
        }
    }

    if state.users.find_by_email(&req.email).await?.is_some() {
        return Err(AppError::Conflict("Email already registered".to_string()));
    }

    let user = state
        .users
        .create_user(&NewUser {
            name: req.name,
            email: req.email,
            phone: req.phone,
            password_hash: hash_password(&req.password)?,
            role,
        })
        .await?;

    info!("User registered: {} (id: {}, role: {})", user.email, user.id, user.role);

    Ok((StatusCode::CREATED, Json(issue_token(&state, &user)?)))
}

/// POST /auth/signin
///
/// Unknown email and wrong password get the same answer.
pub async fn signin(
    State(state): State<SharedState>,
    Json(req): Json<SigninRequest>,
) -> ApiResult<Json<TokenResponse>> {
    req.validate().map_err(|e| validation_error(e.to_string()))?;

    let invalid = || AppError::BadRequest("Invalid credentials".to_string());

    let user = state
        .users
        .find_by_email(&req.email)
        .await?
        .ok_or_else(invalid)?;

    if !verify_password(&req.password, &user.password_hash)? {
        return Err(invalid());
    }

    debug!("User signed in: {}", user.id);
    Ok(Json(issue_token(&state, &user)?))
}

/// POST /auth/key (admin)
pub async fn generate_product_key(
    State(state): State<SharedState>,
    Json(req): Json<ProductKeyRequest>,
) -> ApiResult<Json<ProductKeyResponse>> {
    req.validate().map_err(|e| validation_error(e.to_string()))?;

    let product_key = derive_product_key(&req.email, req.user_type, &state.product_key_secret)?;
    info!("Product key issued for {} as {}", req.email, req.user_type);

    Ok(Json(ProductKeyResponse { product_key }))
}

/// GET /auth/me
pub async fn me(Extension(principal): Extension<Principal>) -> ApiResult<Json<User>> {
    Ok(Json(principal.require()?.clone()))
}
