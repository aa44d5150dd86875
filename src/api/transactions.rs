//! Transaction ledger endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::{error::AppResult, models::transaction::Transaction, AppState};

use super::AuthenticatedUser;

/// List every transaction
#[utoipa::path(
    get,
    path = "/transactions",
    tag = "transactions",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "All transactions", body = Vec<Transaction>),
        (status = 403, description = "Administrator privileges required")
    )
)]
pub async fn list_transactions(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<Transaction>>> {
    claims.require_admin()?;
    let transactions = state.services.transactions.list_all().await?;
    Ok(Json(transactions))
}

/// List the transactions a user paid or received
#[utoipa::path(
    get,
    path = "/transactions/{user_id}",
    tag = "transactions",
    security(("bearer_auth" = [])),
    params(
        ("user_id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User's transactions", body = Vec<Transaction>),
        (status = 403, description = "Forbidden access"),
        (status = 404, description = "User not found")
    )
)]
pub async fn list_user_transactions(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<Vec<Transaction>>> {
    claims.require_self_or_admin(user_id)?;
    let transactions = state.services.transactions.list_for_user(user_id).await?;
    Ok(Json(transactions))
}
