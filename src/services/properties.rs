//! Property listing service

use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        property::{CreateProperty, Property, PropertyQuery},
        user::{Role, UserClaims},
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct PropertiesService {
    repository: Repository,
}

impl PropertiesService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Publish a listing owned by the calling agent
    pub async fn create(&self, claims: &UserClaims, request: CreateProperty) -> AppResult<Property> {
        claims.require_agent()?;

        let property = Property {
            id: Uuid::new_v4(),
            owner_id: claims.user_id,
            name: request.name,
            description: request.description,
            amenities: request.amenities,
            price_per_night: request.price_per_night,
            location: request.location,
            state: request.state,
            property_type: request.property_type,
            guests: request.guests,
            property_images: request.property_images,
            ratings: Vec::new(),
            booked_dates: Vec::new(),
            version: 0,
        };
        self.repository.properties.create(&property).await?;

        tracing::info!(property_id = %property.id, owner_id = %property.owner_id, "Property created");
        Ok(property)
    }

    pub async fn list(&self, query: &PropertyQuery) -> AppResult<Vec<Property>> {
        self.repository.properties.list(query).await
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Property> {
        self.repository.properties.get_by_id(id).await
    }

    /// Listings of the agent registered under `email`
    pub async fn list_by_agent_email(&self, email: &str) -> AppResult<Vec<Property>> {
        let agent = self
            .repository
            .users
            .get_by_email(&email.trim().to_lowercase())
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User with email {} not found", email)))?;

        if agent.role == Role::User {
            return Err(AppError::BadRequest(format!("{} is not an agent", email)));
        }

        self.repository.properties.list_by_owner(agent.id).await
    }
}
