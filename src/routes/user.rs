//! User administration handlers (admin group)

use crate::error::{not_found_error, ApiResult};
use crate::models::User;
use crate::state::SharedState;
use axum::{
    extract::{Path, State},
    Json,
};

/// GET /user
pub async fn list_users(State(state): State<SharedState>) -> ApiResult<Json<Vec<User>>> {
    Ok(Json(state.users.list_users().await?))
}

/// GET /user/{id}
pub async fn get_user(
    State(state): State<SharedState>,
    Path(id): Path<i32>,
) -> ApiResult<Json<User>> {
    state
        .users
        .find_by_id(id)
        .await?
        .map(Json)
        .ok_or_else(|| not_found_error("User not found"))
}
