//! Bookings repository for database operations

use async_trait::async_trait;
use sqlx::{types::Json, Pool, Postgres};
use uuid::Uuid;

use super::{BookingChange, BookingWrite, BookingsStore};
use crate::{
    error::{AppError, AppResult},
    models::booking::{Booking, BookingRow},
};

#[derive(Clone)]
pub struct BookingsRepository {
    pool: Pool<Postgres>,
}

impl BookingsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    async fn list_where(&self, column: &str, id: Uuid) -> AppResult<Vec<Booking>> {
        let query = format!(
            "SELECT * FROM bookings WHERE {} = $1 ORDER BY start_date, created_at",
            column
        );
        let rows = sqlx::query_as::<_, BookingRow>(&query)
            .bind(id)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(Booking::try_from).collect()
    }
}

#[async_trait]
impl BookingsStore for BookingsRepository {
    async fn get_by_id(&self, id: Uuid) -> AppResult<Booking> {
        sqlx::query_as::<_, BookingRow>("SELECT * FROM bookings WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Booking with id {} not found", id)))?
            .try_into()
    }

    async fn list_by_property(&self, property_id: Uuid) -> AppResult<Vec<Booking>> {
        self.list_where("property_id", property_id).await
    }

    async fn list_by_guest(&self, guest_id: Uuid) -> AppResult<Vec<Booking>> {
        self.list_where("guest_id", guest_id).await
    }

    async fn list_by_owner(&self, owner_id: Uuid) -> AppResult<Vec<Booking>> {
        self.list_where("owner_id", owner_id).await
    }

    /// Apply a booking change in one transaction.
    ///
    /// The property row is updated first with a version check; losing that
    /// check aborts the transaction before anything else is written.
    async fn apply(&self, change: &BookingChange) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            r#"
            UPDATE properties
            SET booked_dates = $1, version = version + 1
            WHERE id = $2 AND version = $3
            "#,
        )
        .bind(Json(change.booked_dates.clone()))
        .bind(change.property_id)
        .bind(change.expected_version)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if updated == 0 {
            let exists: bool =
                sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM properties WHERE id = $1)")
                    .bind(change.property_id)
                    .fetch_one(&mut *tx)
                    .await?;
            return Err(if exists {
                AppError::StaleWrite(format!(
                    "property {} changed since version {}",
                    change.property_id, change.expected_version
                ))
            } else {
                AppError::NotFound(format!("Property with id {} not found", change.property_id))
            });
        }

        match &change.booking {
            BookingWrite::Insert(b) => {
                sqlx::query(
                    r#"
                    INSERT INTO bookings (
                        id, guest_id, owner_id, property_id, start_date, end_date, status,
                        price, total_guests, payment_email, payment_instruction, transaction_id,
                        created_at, updated_at
                    )
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
                    "#,
                )
                .bind(b.id)
                .bind(b.guest_id)
                .bind(b.owner_id)
                .bind(b.property_id)
                .bind(b.start_date)
                .bind(b.end_date)
                .bind(b.status.as_str())
                .bind(b.price)
                .bind(b.total_guests)
                .bind(&b.payment_email)
                .bind(&b.payment_instruction)
                .bind(&b.transaction_id)
                .bind(b.created_at)
                .bind(b.updated_at)
                .execute(&mut *tx)
                .await?;
            }
            BookingWrite::Update(b) => {
                let rows = sqlx::query(
                    r#"
                    UPDATE bookings
                    SET status = $1, payment_email = $2, payment_instruction = $3,
                        transaction_id = $4, updated_at = $5
                    WHERE id = $6
                    "#,
                )
                .bind(b.status.as_str())
                .bind(&b.payment_email)
                .bind(&b.payment_instruction)
                .bind(&b.transaction_id)
                .bind(b.updated_at)
                .bind(b.id)
                .execute(&mut *tx)
                .await?
                .rows_affected();

                if rows == 0 {
                    return Err(AppError::NotFound(format!("Booking with id {} not found", b.id)));
                }
            }
        }

        if let Some(t) = &change.transaction {
            let result = sqlx::query(
                r#"
                INSERT INTO transactions (
                    id, booking_id, guest_id, owner_id, amount, transaction_id,
                    payment_method, created_at
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                "#,
            )
            .bind(t.id)
            .bind(t.booking_id)
            .bind(t.guest_id)
            .bind(t.owner_id)
            .bind(t.amount)
            .bind(&t.transaction_id)
            .bind(&t.payment_method)
            .bind(t.created_at)
            .execute(&mut *tx)
            .await;

            match result {
                Ok(_) => {}
                Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                    return Err(AppError::PreconditionFailed(
                        "Booking is already confirmed".to_string(),
                    ));
                }
                Err(e) => return Err(e.into()),
            }
        }

        tx.commit().await?;
        Ok(())
    }
}
