//! Booking model and its lifecycle

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use super::{
    availability::DateRange,
    property::PropertyShort,
    transaction::{Transaction, PAYMENT_METHOD_PAYPAL},
    user::UserShort,
};
use crate::error::{AppError, AppResult};

/// Booking status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(BookingStatus::Pending),
            "confirmed" => Ok(BookingStatus::Confirmed),
            "cancelled" => Ok(BookingStatus::Cancelled),
            _ => Err(format!("Invalid booking status: {}", s)),
        }
    }
}

/// Lifecycle action requested by a client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingAction {
    Confirm,
    Cancel,
}

impl std::str::FromStr for BookingAction {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "confirm" => Ok(BookingAction::Confirm),
            "cancel" => Ok(BookingAction::Cancel),
            other => Err(AppError::InvalidAction(format!(
                "Unknown booking action '{}', expected 'confirm' or 'cancel'",
                other
            ))),
        }
    }
}

/// Outcome of a lifecycle transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Booking confirmed; the transaction must be stored with it
    Confirmed(Transaction),
    /// Booking cancelled; its range must be released from the property
    Cancelled(DateRange),
    /// Nothing to do (cancelling a cancelled booking)
    Unchanged,
}

/// Internal row structure for database queries
#[derive(Debug, Clone, FromRow)]
pub struct BookingRow {
    id: Uuid,
    guest_id: Uuid,
    owner_id: Uuid,
    property_id: Uuid,
    start_date: NaiveDate,
    end_date: NaiveDate,
    status: String,
    price: Decimal,
    total_guests: i32,
    payment_email: Option<String>,
    payment_instruction: Option<String>,
    transaction_id: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<BookingRow> for Booking {
    type Error = AppError;

    fn try_from(row: BookingRow) -> Result<Self, Self::Error> {
        Ok(Booking {
            id: row.id,
            guest_id: row.guest_id,
            owner_id: row.owner_id,
            property_id: row.property_id,
            start_date: row.start_date,
            end_date: row.end_date,
            status: row.status.parse().map_err(AppError::Internal)?,
            price: row.price,
            total_guests: row.total_guests,
            payment_email: row.payment_email,
            payment_instruction: row.payment_instruction,
            transaction_id: row.transaction_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Booking record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Booking {
    pub id: Uuid,
    pub guest_id: Uuid,
    pub owner_id: Uuid,
    pub property_id: Uuid,
    /// First night (inclusive)
    pub start_date: NaiveDate,
    /// Last night (inclusive)
    pub end_date: NaiveDate,
    pub status: BookingStatus,
    #[schema(value_type = String)]
    pub price: Decimal,
    pub total_guests: i32,
    /// Where the guest should send payment (set by the agent)
    pub payment_email: Option<String>,
    pub payment_instruction: Option<String>,
    /// Payment reference submitted by the guest
    pub transaction_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    /// A fresh pending booking
    pub fn new(
        guest_id: Uuid,
        owner_id: Uuid,
        property_id: Uuid,
        range: DateRange,
        price: Decimal,
        total_guests: i32,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            guest_id,
            owner_id,
            property_id,
            start_date: range.start_date,
            end_date: range.end_date,
            status: BookingStatus::Pending,
            price,
            total_guests,
            payment_email: None,
            payment_instruction: None,
            transaction_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn range(&self) -> DateRange {
        DateRange {
            start_date: self.start_date,
            end_date: self.end_date,
        }
    }

    /// Record the agent's payment details. Settable once.
    pub fn set_payment_details(&mut self, email: String, instruction: Option<String>) -> AppResult<()> {
        if self.payment_email.is_some() {
            return Err(AppError::AlreadySet("Payment details are already set".to_string()));
        }
        if self.status == BookingStatus::Cancelled {
            return Err(AppError::PreconditionFailed("Booking is cancelled".to_string()));
        }
        self.payment_email = Some(email);
        self.payment_instruction = instruction;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Record the guest's payment reference. Settable once.
    pub fn set_transaction_id(&mut self, transaction_id: String) -> AppResult<()> {
        if self.transaction_id.is_some() {
            return Err(AppError::AlreadySet("Transaction id is already set".to_string()));
        }
        if self.status == BookingStatus::Cancelled {
            return Err(AppError::PreconditionFailed("Booking is cancelled".to_string()));
        }
        self.transaction_id = Some(transaction_id);
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Apply a lifecycle action, enforcing its guards.
    ///
    /// On error the booking is left untouched.
    pub fn apply(&mut self, action: BookingAction) -> AppResult<Transition> {
        match action {
            BookingAction::Confirm => self.confirm().map(Transition::Confirmed),
            BookingAction::Cancel => self.cancel(),
        }
    }

    fn confirm(&mut self) -> AppResult<Transaction> {
        match self.status {
            BookingStatus::Confirmed => {
                return Err(AppError::PreconditionFailed("Booking is already confirmed".to_string()))
            }
            BookingStatus::Cancelled => {
                return Err(AppError::PreconditionFailed(
                    "A cancelled booking cannot be confirmed".to_string(),
                ))
            }
            BookingStatus::Pending => {}
        }
        if self.payment_email.is_none() {
            return Err(AppError::PreconditionFailed(
                "Payment details must be set before confirming".to_string(),
            ));
        }
        let transaction_id = self.transaction_id.clone().ok_or_else(|| {
            AppError::PreconditionFailed("Transaction id must be submitted before confirming".to_string())
        })?;

        let now = Utc::now();
        self.status = BookingStatus::Confirmed;
        self.updated_at = now;

        Ok(Transaction {
            id: Uuid::new_v4(),
            booking_id: self.id,
            guest_id: self.guest_id,
            owner_id: self.owner_id,
            amount: self.price,
            transaction_id,
            payment_method: PAYMENT_METHOD_PAYPAL.to_string(),
            created_at: now,
        })
    }

    fn cancel(&mut self) -> AppResult<Transition> {
        match self.status {
            BookingStatus::Confirmed => Err(AppError::PreconditionFailed(
                "A confirmed booking cannot be cancelled".to_string(),
            )),
            BookingStatus::Cancelled => Ok(Transition::Unchanged),
            BookingStatus::Pending => {
                self.status = BookingStatus::Cancelled;
                self.updated_at = Utc::now();
                Ok(Transition::Cancelled(self.range()))
            }
        }
    }
}

/// Create booking request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBooking {
    pub property_id: Uuid,
    /// Defaults to the property owner; must match it when given
    pub owner_id: Option<Uuid>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[schema(value_type = String)]
    pub price: Decimal,
    #[validate(range(min = 1, message = "At least one guest is required"))]
    pub total_guests: i32,
}

/// Lifecycle transition request
#[derive(Debug, Deserialize, ToSchema)]
pub struct TransitionRequest {
    /// `confirm` or `cancel`
    pub action: String,
}

/// Agent payment details request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct PaymentDetailsRequest {
    #[validate(email(message = "Invalid payment email"))]
    pub payment_email: String,
    pub payment_instruction: Option<String>,
}

/// Guest transaction id request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct TransactionIdRequest {
    #[validate(length(min = 1, message = "Transaction id is required"))]
    pub transaction_id: String,
}

/// Booking listing filter; exactly one field must be given
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct BookingQuery {
    pub property_id: Option<Uuid>,
    pub guest_id: Option<Uuid>,
    pub owner_id: Option<Uuid>,
}

/// Booking with its references resolved for display
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BookingDetails {
    #[serde(flatten)]
    pub booking: Booking,
    pub property: PropertyShort,
    pub guest: UserShort,
    pub nights: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending() -> Booking {
        let range = DateRange::new(
            NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 6, 5).unwrap(),
        )
        .unwrap();
        Booking::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            Uuid::new_v4(),
            range,
            Decimal::new(50000, 2),
            2,
        )
    }

    fn payable() -> Booking {
        let mut booking = pending();
        booking.set_payment_details("agent@pay.example".to_string(), None).unwrap();
        booking.set_transaction_id("TX-1".to_string()).unwrap();
        booking
    }

    #[test]
    fn test_action_parse() {
        assert_eq!(" Confirm ".parse::<BookingAction>().unwrap(), BookingAction::Confirm);
        assert_eq!("cancel".parse::<BookingAction>().unwrap(), BookingAction::Cancel);
        assert!(matches!("reject".parse::<BookingAction>(), Err(AppError::InvalidAction(_))));
    }

    #[test]
    fn test_confirm_requires_payment_details_then_transaction_id() {
        let mut booking = pending();
        let err = booking.apply(BookingAction::Confirm).unwrap_err();
        assert!(matches!(err, AppError::PreconditionFailed(ref m) if m.contains("Payment details")));

        booking.set_payment_details("agent@pay.example".to_string(), None).unwrap();
        let err = booking.apply(BookingAction::Confirm).unwrap_err();
        assert!(matches!(err, AppError::PreconditionFailed(ref m) if m.contains("Transaction id")));
        assert_eq!(booking.status, BookingStatus::Pending);
    }

    #[test]
    fn test_confirm_once() {
        let mut booking = payable();
        let transition = booking.apply(BookingAction::Confirm).unwrap();
        let Transition::Confirmed(tx) = transition else {
            panic!("expected a transaction");
        };
        assert_eq!(tx.booking_id, booking.id);
        assert_eq!(tx.amount, booking.price);
        assert_eq!(tx.transaction_id, "TX-1");
        assert_eq!(tx.payment_method, "paypal");
        assert_eq!(booking.status, BookingStatus::Confirmed);

        let err = booking.apply(BookingAction::Confirm).unwrap_err();
        assert!(matches!(err, AppError::PreconditionFailed(ref m) if m.contains("already confirmed")));
    }

    #[test]
    fn test_cancel_rules() {
        let mut confirmed = payable();
        confirmed.apply(BookingAction::Confirm).unwrap();
        assert!(matches!(
            confirmed.apply(BookingAction::Cancel),
            Err(AppError::PreconditionFailed(_))
        ));

        let mut booking = pending();
        let range = booking.range();
        assert_eq!(booking.apply(BookingAction::Cancel).unwrap(), Transition::Cancelled(range));
        assert_eq!(booking.apply(BookingAction::Cancel).unwrap(), Transition::Unchanged);
        assert!(matches!(
            booking.apply(BookingAction::Confirm),
            Err(AppError::PreconditionFailed(_))
        ));
    }

    #[test]
    fn test_one_shot_fields() {
        let mut booking = pending();
        booking.set_payment_details("a@pay.example".to_string(), Some("ref in memo".to_string())).unwrap();
        assert!(matches!(
            booking.set_payment_details("b@pay.example".to_string(), None),
            Err(AppError::AlreadySet(_))
        ));
        assert_eq!(booking.payment_email.as_deref(), Some("a@pay.example"));

        booking.set_transaction_id("TX-1".to_string()).unwrap();
        assert!(matches!(
            booking.set_transaction_id("TX-2".to_string()),
            Err(AppError::AlreadySet(_))
        ));
        assert_eq!(booking.transaction_id.as_deref(), Some("TX-1"));
    }
}
