//! API handlers for Staybook REST endpoints

pub mod auth;
pub mod bookings;
pub mod favorites;
pub mod health;
pub mod openapi;
pub mod properties;
pub mod transactions;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{error::AppError, models::user::UserClaims, AppState};

/// Extractor for authenticated user from JWT token
pub struct AuthenticatedUser(pub UserClaims);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::Authentication("Missing authorization header".to_string()))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::Authentication("Invalid authorization header format".to_string()))?;

        let claims = UserClaims::from_token(token, &state.config.auth.jwt_secret)
            .map_err(|e| AppError::Authentication(e.to_string()))?;

        Ok(AuthenticatedUser(claims))
    }
}

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_v1 = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Authentication
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/me", get(auth::me))
        // Properties
        .route("/properties", get(properties::list_properties).post(properties::create_property))
        .route("/properties/:id", get(properties::get_property))
        .route("/properties/:id/availability", get(properties::check_availability))
        .route("/agents/:email/properties", get(properties::list_agent_properties))
        // Bookings
        .route("/bookings", get(bookings::list_bookings).post(bookings::create_booking))
        .route("/bookings/:id", get(bookings::get_booking))
        .route("/bookings/:id/transition", post(bookings::transition_booking))
        .route("/bookings/:id/payment-details", put(bookings::set_payment_details))
        .route("/bookings/:id/transaction-id", put(bookings::set_transaction_id))
        // Transactions
        .route("/transactions", get(transactions::list_transactions))
        .route("/transactions/:user_id", get(transactions::list_user_transactions))
        // Favorites
        .route(
            "/favorites/:user_id",
            get(favorites::list_favorites).post(favorites::toggle_favorite),
        )
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(openapi::create_openapi_router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
