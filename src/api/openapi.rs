//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{auth, bookings, favorites, health, properties, transactions};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Staybook API",
        version = "1.0.0",
        description = "Vacation rental booking REST API"
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        // Auth
        auth::register,
        auth::login,
        auth::me,
        // Properties
        properties::create_property,
        properties::list_properties,
        properties::get_property,
        properties::check_availability,
        properties::list_agent_properties,
        // Bookings
        bookings::create_booking,
        bookings::list_bookings,
        bookings::get_booking,
        bookings::transition_booking,
        bookings::set_payment_details,
        bookings::set_transaction_id,
        // Transactions
        transactions::list_transactions,
        transactions::list_user_transactions,
        // Favorites
        favorites::toggle_favorite,
        favorites::list_favorites,
    ),
    components(
        schemas(
            // Users
            crate::models::user::Role,
            crate::models::user::User,
            crate::models::user::UserShort,
            crate::models::user::RegisterUser,
            crate::models::user::LoginRequest,
            crate::models::user::LoginResponse,
            // Properties
            crate::models::availability::DateRange,
            crate::models::property::Property,
            crate::models::property::PropertyShort,
            crate::models::property::CreateProperty,
            properties::AvailabilityResponse,
            // Bookings
            crate::models::booking::Booking,
            crate::models::booking::BookingStatus,
            crate::models::booking::BookingDetails,
            crate::models::booking::CreateBooking,
            crate::models::booking::TransitionRequest,
            crate::models::booking::PaymentDetailsRequest,
            crate::models::booking::TransactionIdRequest,
            // Transactions
            crate::models::transaction::Transaction,
            // Favorites
            favorites::ToggleFavoriteRequest,
            favorites::ToggleFavoriteResponse,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Registration and login"),
        (name = "properties", description = "Property listings"),
        (name = "bookings", description = "Booking lifecycle"),
        (name = "transactions", description = "Payment transactions"),
        (name = "favorites", description = "Guest favorite lists")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
