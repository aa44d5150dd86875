//! Users repository for database operations

use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use super::UsersStore;
use crate::{
    error::{AppError, AppResult},
    models::user::{User, UserRow},
};

#[derive(Clone)]
pub struct UsersRepository {
    pool: Pool<Postgres>,
}

impl UsersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UsersStore for UsersRepository {
    async fn create(&self, user: &User) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO users (id, name, email, password, role, tax_number, image, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password)
        .bind(user.role.as_str())
        .bind(&user.tax_number)
        .bind(&user.image)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(AppError::Duplicate(
                format!("Email {} already exists", user.email),
            )),
            Err(e) => Err(e.into()),
        }
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<User> {
        sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))?
            .try_into()
    }

    async fn get_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        row.map(User::try_from).transpose()
    }

    async fn favorite_ids(&self, user_id: Uuid) -> AppResult<Vec<Uuid>> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            "SELECT property_id FROM favorites WHERE user_id = $1 ORDER BY created_at",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }

    async fn toggle_favorite(&self, user_id: Uuid, property_id: Uuid) -> AppResult<bool> {
        let mut tx = self.pool.begin().await?;

        let removed = sqlx::query("DELETE FROM favorites WHERE user_id = $1 AND property_id = $2")
            .bind(user_id)
            .bind(property_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if removed > 0 {
            tx.commit().await?;
            return Ok(false);
        }

        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM properties WHERE id = $1)")
                .bind(property_id)
                .fetch_one(&mut *tx)
                .await?;
        if !exists {
            return Err(AppError::NotFound(format!(
                "Property with id {} not found",
                property_id
            )));
        }

        sqlx::query("INSERT INTO favorites (user_id, property_id) VALUES ($1, $2)")
            .bind(user_id)
            .bind(property_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(true)
    }
}
