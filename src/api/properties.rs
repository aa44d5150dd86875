//! Property listing endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::AppResult,
    models::property::{CreateProperty, Property, PropertyQuery},
    AppState,
};

use super::AuthenticatedUser;

/// Date range to check against a property's calendar
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct AvailabilityQuery {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AvailabilityResponse {
    pub property_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub available: bool,
}

/// Publish a listing
#[utoipa::path(
    post,
    path = "/properties",
    tag = "properties",
    security(("bearer_auth" = [])),
    request_body = CreateProperty,
    responses(
        (status = 201, description = "Property created", body = Property),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "Agent account required")
    )
)]
pub async fn create_property(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<CreateProperty>,
) -> AppResult<(StatusCode, Json<Property>)> {
    request.validate()?;
    let property = state.services.properties.create(&claims, request).await?;
    Ok((StatusCode::CREATED, Json(property)))
}

/// List listings with optional filters
#[utoipa::path(
    get,
    path = "/properties",
    tag = "properties",
    params(PropertyQuery),
    responses(
        (status = 200, description = "Matching properties", body = Vec<Property>)
    )
)]
pub async fn list_properties(
    State(state): State<AppState>,
    Query(query): Query<PropertyQuery>,
) -> AppResult<Json<Vec<Property>>> {
    let properties = state.services.properties.list(&query).await?;
    Ok(Json(properties))
}

/// Get a listing by ID
#[utoipa::path(
    get,
    path = "/properties/{id}",
    tag = "properties",
    params(
        ("id" = Uuid, Path, description = "Property ID")
    ),
    responses(
        (status = 200, description = "Property details", body = Property),
        (status = 404, description = "Property not found")
    )
)]
pub async fn get_property(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Property>> {
    let property = state.services.properties.get(id).await?;
    Ok(Json(property))
}

/// Check whether a date range is still free
#[utoipa::path(
    get,
    path = "/properties/{id}/availability",
    tag = "properties",
    params(
        ("id" = Uuid, Path, description = "Property ID"),
        AvailabilityQuery
    ),
    responses(
        (status = 200, description = "Availability of the range", body = AvailabilityResponse),
        (status = 400, description = "End date before start date"),
        (status = 404, description = "Property not found")
    )
)]
pub async fn check_availability(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<AvailabilityQuery>,
) -> AppResult<Json<AvailabilityResponse>> {
    let taken = state
        .services
        .bookings
        .overlaps(id, query.start_date, query.end_date)
        .await?;

    Ok(Json(AvailabilityResponse {
        property_id: id,
        start_date: query.start_date,
        end_date: query.end_date,
        available: !taken,
    }))
}

/// List the listings of one agent
#[utoipa::path(
    get,
    path = "/agents/{email}/properties",
    tag = "properties",
    params(
        ("email" = String, Path, description = "Agent email")
    ),
    responses(
        (status = 200, description = "Agent's properties", body = Vec<Property>),
        (status = 404, description = "Agent not found")
    )
)]
pub async fn list_agent_properties(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> AppResult<Json<Vec<Property>>> {
    let properties = state.services.properties.list_by_agent_email(&email).await?;
    Ok(Json(properties))
}
