//! Listing route handlers
//!
//! Reads are public. Realtors manage their own listings and read the
//! inquiries about them; admins may act on any listing.

use crate::auth::{Principal, Role};
use crate::error::{not_found_error, validation_error, ApiResult, AppError};
use crate::models::{
    CreateHomeRequest, Home, HomeDetail, HomeQuery, HomeSummary, InquireRequest, Inquiry,
    Message, SuccessResponse, UpdateHomeRequest, User,
};
use crate::state::SharedState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use tracing::{debug, info};
use validator::Validate;

/// Realtors may only touch their own listings
fn ensure_owner(user: &User, home: &Home) -> Result<(), AppError> {
    if user.role == Role::Admin || home.realtor_id == user.id {
        Ok(())
    } else {
        Err(AppError::Unauthorized)
    }
}

async fn load_home(state: &SharedState, id: i32) -> ApiResult<Home> {
    state
        .homes
        .find_home(id)
        .await?
        .ok_or_else(|| not_found_error("No home found by id"))
}

/// GET /home
pub async fn get_homes(
    State(state): State<SharedState>,
    Query(query): Query<HomeQuery>,
) -> ApiResult<Json<Vec<HomeSummary>>> {
    let homes = state.homes.list_homes(&query).await?;
    if homes.is_empty() {
        return Err(not_found_error("No homes found"));
    }

    debug!("Found {} homes", homes.len());
    Ok(Json(homes))
}

/// GET /home/{id}
pub async fn get_home(
    State(state): State<SharedState>,
    Path(id): Path<i32>,
) -> ApiResult<Json<HomeDetail>> {
    state
        .homes
        .home_detail(id)
        .await?
        .map(Json)
        .ok_or_else(|| not_found_error("No home found by id"))
}

/// POST /home (realtor, admin)
pub async fn create_home(
    State(state): State<SharedState>,
    Extension(principal): Extension<Principal>,
    Json(req): Json<CreateHomeRequest>,
) -> ApiResult<(StatusCode, Json<HomeSummary>)> {
    req.validate().map_err(|e| validation_error(e.to_string()))?;
    let realtor = principal.require()?;

    let home = state.homes.create_home(&req, realtor.id).await?;
    info!("Home listed: {} (id: {}, realtor: {})", home.address, home.id, realtor.id);

    Ok((StatusCode::CREATED, Json(home)))
}

/// PUT /home/{id} (owning realtor, admin)
pub async fn update_home(
    State(state): State<SharedState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<i32>,
    Json(req): Json<UpdateHomeRequest>,
) -> ApiResult<Json<Home>> {
    req.validate().map_err(|e| validation_error(e.to_string()))?;
    if req.is_empty() {
        return Err(validation_error("No fields to update"));
    }

    let home = load_home(&state, id).await?;
    ensure_owner(principal.require()?, &home)?;

    let updated = state
        .homes
        .update_home(id, &req)
        .await?
        .ok_or_else(|| not_found_error("No home found by id"))?;

    info!("Home updated: {}", id);
    Ok(Json(updated))
}

/// DELETE /home/{id} (owning realtor, admin)
pub async fn delete_home(
    State(state): State<SharedState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<i32>,
) -> ApiResult<Json<SuccessResponse<()>>> {
    let home = load_home(&state, id).await?;
    ensure_owner(principal.require()?, &home)?;

    if !state.homes.delete_home(id).await? {
        return Err(not_found_error("No home found by id"));
    }

    info!("Home deleted: {}", id);
    Ok(Json(SuccessResponse::message_only("Home deleted successfully.")))
}

/// POST /home/{id}/inquire (buyer)
pub async fn inquire(
    State(state): State<SharedState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<i32>,
    Json(req): Json<InquireRequest>,
) -> ApiResult<(StatusCode, Json<Message>)> {
    req.validate().map_err(|e| validation_error(e.to_string()))?;
    let buyer = principal.require()?;

    let home = load_home(&state, id).await?;
    let message = state.homes.create_message(&home, buyer.id, &req.message).await?;

    debug!("Buyer {} inquired about home {}", buyer.id, id);
    Ok((StatusCode::CREATED, Json(message)))
}

/// GET /home/{id}/messages (owning realtor, admin)
pub async fn get_messages(
    State(state): State<SharedState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<i32>,
) -> ApiResult<Json<Vec<Inquiry>>> {
    let home = load_home(&state, id).await?;
    ensure_owner(principal.require()?, &home)?;

    Ok(Json(state.homes.messages_by_home(id).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PropertyType;
    use crate::users::MemoryCredentials;
    use chrono::Utc;

    fn home_of(realtor_id: i32) -> Home {
        Home {
            id: 10,
            address: "1 Main St".to_string(),
            city: "Toronto".to_string(),
            number_of_bedrooms: 2,
            number_of_bathrooms: 1.0,
            listed_date: Utc::now(),
            price: 1.0,
            land_size: 1.0,
            property_type: PropertyType::Condo,
            realtor_id,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn owner_may_manage_listing() {
        let realtor = MemoryCredentials::user(2, Role::Realtor);
        assert!(ensure_owner(&realtor, &home_of(2)).is_ok());
    }

    #[test]
    fn other_realtor_is_unauthorized() {
        let realtor = MemoryCredentials::user(2, Role::Realtor);
        assert!(matches!(
            ensure_owner(&realtor, &home_of(5)),
            Err(AppError::Unauthorized)
        ));
    }

    #[test]
    fn admin_may_manage_any_listing() {
        let admin = MemoryCredentials::user(3, Role::Admin);
        assert!(ensure_owner(&admin, &home_of(5)).is_ok());
    }
}
