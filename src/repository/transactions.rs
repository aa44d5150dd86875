//! Transactions repository for database operations

use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use super::TransactionsStore;
use crate::{error::AppResult, models::transaction::Transaction};

#[derive(Clone)]
pub struct TransactionsRepository {
    pool: Pool<Postgres>,
}

impl TransactionsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TransactionsStore for TransactionsRepository {
    async fn list_all(&self) -> AppResult<Vec<Transaction>> {
        let rows = sqlx::query_as::<_, Transaction>("SELECT * FROM transactions ORDER BY created_at")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn list_by_guest(&self, guest_id: Uuid) -> AppResult<Vec<Transaction>> {
        let rows = sqlx::query_as::<_, Transaction>(
            "SELECT * FROM transactions WHERE guest_id = $1 ORDER BY created_at",
        )
        .bind(guest_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn list_by_owner(&self, owner_id: Uuid) -> AppResult<Vec<Transaction>> {
        let rows = sqlx::query_as::<_, Transaction>(
            "SELECT * FROM transactions WHERE owner_id = $1 ORDER BY created_at",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn get_by_booking(&self, booking_id: Uuid) -> AppResult<Option<Transaction>> {
        let row = sqlx::query_as::<_, Transaction>("SELECT * FROM transactions WHERE booking_id = $1")
            .bind(booking_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }
}
