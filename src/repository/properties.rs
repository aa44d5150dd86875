//! Properties repository for database operations

use async_trait::async_trait;
use sqlx::{types::Json, Pool, Postgres};
use uuid::Uuid;

use super::PropertiesStore;
use crate::{
    error::{AppError, AppResult},
    models::property::{Property, PropertyQuery, PropertyRow},
};

#[derive(Clone)]
pub struct PropertiesRepository {
    pool: Pool<Postgres>,
}

impl PropertiesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PropertiesStore for PropertiesRepository {
    async fn create(&self, property: &Property) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO properties (
                id, owner_id, name, description, amenities, price_per_night,
                location, state, property_type, guests, property_images, ratings,
                booked_dates, version
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(property.id)
        .bind(property.owner_id)
        .bind(&property.name)
        .bind(&property.description)
        .bind(&property.amenities)
        .bind(property.price_per_night)
        .bind(&property.location)
        .bind(&property.state)
        .bind(&property.property_type)
        .bind(property.guests)
        .bind(&property.property_images)
        .bind(&property.ratings)
        .bind(Json(property.booked_dates.clone()))
        .bind(property.version)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Property> {
        sqlx::query_as::<_, PropertyRow>("SELECT * FROM properties WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(Property::from)
            .ok_or_else(|| AppError::NotFound(format!("Property with id {} not found", id)))
    }

    /// List properties with optional filters
    async fn list(&self, query: &PropertyQuery) -> AppResult<Vec<Property>> {
        let mut conditions = Vec::new();
        let mut idx = 1;

        if query.location.is_some() {
            conditions.push(format!("location ILIKE '%' || ${} || '%'", idx));
            idx += 1;
        }
        if query.guests.is_some() {
            conditions.push(format!("guests >= ${}", idx));
            idx += 1;
        }
        if query.category.is_some() {
            conditions.push(format!("property_type ILIKE '%' || ${} || '%'", idx));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let select_q = format!("SELECT * FROM properties {} ORDER BY name", where_clause);
        let mut builder = sqlx::query_as::<_, PropertyRow>(&select_q);
        if let Some(ref location) = query.location {
            builder = builder.bind(location);
        }
        if let Some(guests) = query.guests {
            builder = builder.bind(guests);
        }
        if let Some(ref category) = query.category {
            builder = builder.bind(category);
        }

        let rows = builder.fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(Property::from).collect())
    }

    async fn list_by_owner(&self, owner_id: Uuid) -> AppResult<Vec<Property>> {
        let rows = sqlx::query_as::<_, PropertyRow>(
            "SELECT * FROM properties WHERE owner_id = $1 ORDER BY name",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Property::from).collect())
    }

    async fn get_many(&self, ids: &[Uuid]) -> AppResult<Vec<Property>> {
        let rows = sqlx::query_as::<_, PropertyRow>(
            "SELECT * FROM properties WHERE id = ANY($1) ORDER BY array_position($1, id)",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Property::from).collect())
    }
}
