//! Favorite list endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{error::AppResult, models::property::PropertyShort, AppState};

use super::AuthenticatedUser;

#[derive(Debug, Deserialize, ToSchema)]
pub struct ToggleFavoriteRequest {
    pub property_id: Uuid,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ToggleFavoriteResponse {
    pub property_id: Uuid,
    /// Whether the property is in the list after the toggle
    pub favorite: bool,
}

/// Add a property to the favorites, or remove it
#[utoipa::path(
    post,
    path = "/favorites/{user_id}",
    tag = "favorites",
    security(("bearer_auth" = [])),
    params(
        ("user_id" = Uuid, Path, description = "User ID")
    ),
    request_body = ToggleFavoriteRequest,
    responses(
        (status = 200, description = "Favorite toggled", body = ToggleFavoriteResponse),
        (status = 403, description = "Forbidden access"),
        (status = 404, description = "Property not found")
    )
)]
pub async fn toggle_favorite(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(user_id): Path<Uuid>,
    Json(request): Json<ToggleFavoriteRequest>,
) -> AppResult<Json<ToggleFavoriteResponse>> {
    claims.require_self_or_admin(user_id)?;
    let favorite = state
        .services
        .favorites
        .toggle(user_id, request.property_id)
        .await?;
    Ok(Json(ToggleFavoriteResponse {
        property_id: request.property_id,
        favorite,
    }))
}

/// List a user's favorite properties
#[utoipa::path(
    get,
    path = "/favorites/{user_id}",
    tag = "favorites",
    security(("bearer_auth" = [])),
    params(
        ("user_id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "Favorite properties", body = Vec<PropertyShort>),
        (status = 403, description = "Forbidden access"),
        (status = 404, description = "User not found")
    )
)]
pub async fn list_favorites(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<Vec<PropertyShort>>> {
    claims.require_self_or_admin(user_id)?;
    let favorites = state.services.favorites.list(user_id).await?;
    Ok(Json(favorites))
}
