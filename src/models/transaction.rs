//! Payment transaction records

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// Payment method recorded for confirmed bookings
pub const PAYMENT_METHOD_PAYPAL: &str = "paypal";

/// Immutable record written once when a booking is confirmed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Transaction {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub guest_id: Uuid,
    pub owner_id: Uuid,
    #[schema(value_type = String)]
    pub amount: Decimal,
    /// Guest-submitted payment reference
    pub transaction_id: String,
    pub payment_method: String,
    pub created_at: DateTime<Utc>,
}
