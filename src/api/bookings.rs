//! Booking endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        booking::{
            Booking, BookingAction, BookingDetails, BookingQuery, CreateBooking,
            PaymentDetailsRequest, TransactionIdRequest, TransitionRequest,
        },
        user::UserClaims,
    },
    AppState,
};

use super::AuthenticatedUser;

fn forbidden() -> AppError {
    AppError::Authorization("Forbidden access".to_string())
}

/// Guest, owner or admin
fn require_party(claims: &UserClaims, booking: &Booking) -> AppResult<()> {
    if claims.is_admin() || claims.user_id == booking.guest_id || claims.user_id == booking.owner_id {
        Ok(())
    } else {
        Err(forbidden())
    }
}

/// Request a booking for the caller
#[utoipa::path(
    post,
    path = "/bookings",
    tag = "bookings",
    security(("bearer_auth" = [])),
    request_body = CreateBooking,
    responses(
        (status = 201, description = "Booking created", body = Booking),
        (status = 400, description = "Invalid dates or input"),
        (status = 404, description = "Property not found"),
        (status = 409, description = "Dates overlap an existing booking")
    )
)]
pub async fn create_booking(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<CreateBooking>,
) -> AppResult<(StatusCode, Json<Booking>)> {
    request.validate()?;
    let booking = state
        .services
        .bookings
        .create_booking(claims.user_id, request)
        .await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

/// List bookings of a property, a guest or an owner
#[utoipa::path(
    get,
    path = "/bookings",
    tag = "bookings",
    security(("bearer_auth" = [])),
    params(BookingQuery),
    responses(
        (status = 200, description = "Bookings", body = Vec<Booking>),
        (status = 400, description = "Exactly one filter is required"),
        (status = 403, description = "Not allowed to list these bookings")
    )
)]
pub async fn list_bookings(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<BookingQuery>,
) -> AppResult<Json<Vec<Booking>>> {
    if let Some(user_id) = query.guest_id.or(query.owner_id) {
        claims.require_self_or_admin(user_id)?;
    }
    // A property's bookings expose every guest; only its owner sees them.
    if let Some(property_id) = query.property_id {
        let property = state.services.properties.get(property_id).await?;
        claims.require_self_or_admin(property.owner_id)?;
    }
    let bookings = state.services.bookings.list(&query).await?;
    Ok(Json(bookings))
}

/// Get booking details
#[utoipa::path(
    get,
    path = "/bookings/{id}",
    tag = "bookings",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Booking ID")
    ),
    responses(
        (status = 200, description = "Booking details", body = BookingDetails),
        (status = 403, description = "Not a party to this booking"),
        (status = 404, description = "Booking not found")
    )
)]
pub async fn get_booking(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<BookingDetails>> {
    let details = state.services.bookings.get_details(id).await?;
    require_party(&claims, &details.booking)?;
    Ok(Json(details))
}

/// Confirm or cancel a booking
#[utoipa::path(
    post,
    path = "/bookings/{id}/transition",
    tag = "bookings",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Booking ID")
    ),
    request_body = TransitionRequest,
    responses(
        (status = 200, description = "Booking after the transition", body = Booking),
        (status = 400, description = "Unknown action"),
        (status = 403, description = "Not allowed to perform this action"),
        (status = 404, description = "Booking not found"),
        (status = 422, description = "Transition guard not met")
    )
)]
pub async fn transition_booking(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(request): Json<TransitionRequest>,
) -> AppResult<Json<Booking>> {
    let current = state.services.bookings.get_booking(id).await?;
    require_party(&claims, &current)?;

    // Only the owner side confirms; an unknown action is left to the service.
    if let Ok(BookingAction::Confirm) = request.action.parse::<BookingAction>() {
        if !claims.is_admin() && claims.user_id != current.owner_id {
            return Err(forbidden());
        }
    }

    let booking = state.services.bookings.transition(id, &request.action).await?;
    Ok(Json(booking))
}

/// Set where the guest should pay (owner, once)
#[utoipa::path(
    put,
    path = "/bookings/{id}/payment-details",
    tag = "bookings",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Booking ID")
    ),
    request_body = PaymentDetailsRequest,
    responses(
        (status = 200, description = "Payment details recorded", body = Booking),
        (status = 403, description = "Not the property owner"),
        (status = 404, description = "Booking not found"),
        (status = 409, description = "Payment details already set")
    )
)]
pub async fn set_payment_details(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(request): Json<PaymentDetailsRequest>,
) -> AppResult<Json<Booking>> {
    request.validate()?;
    let current = state.services.bookings.get_booking(id).await?;
    if !claims.is_admin() && claims.user_id != current.owner_id {
        return Err(forbidden());
    }

    let booking = state
        .services
        .bookings
        .set_payment_details(id, request.payment_email, request.payment_instruction)
        .await?;
    Ok(Json(booking))
}

/// Submit the payment reference (guest, once)
#[utoipa::path(
    put,
    path = "/bookings/{id}/transaction-id",
    tag = "bookings",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Booking ID")
    ),
    request_body = TransactionIdRequest,
    responses(
        (status = 200, description = "Transaction id recorded", body = Booking),
        (status = 403, description = "Not the guest"),
        (status = 404, description = "Booking not found"),
        (status = 409, description = "Transaction id already set")
    )
)]
pub async fn set_transaction_id(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(request): Json<TransactionIdRequest>,
) -> AppResult<Json<Booking>> {
    request.validate()?;
    let current = state.services.bookings.get_booking(id).await?;
    if !claims.is_admin() && claims.user_id != current.guest_id {
        return Err(forbidden());
    }

    let booking = state
        .services
        .bookings
        .set_transaction_id(id, request.transaction_id)
        .await?;
    Ok(Json(booking))
}
