//! Guest favorite list

use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{property::PropertyShort, user::Role},
    repository::Repository,
};

#[derive(Clone)]
pub struct FavoritesService {
    repository: Repository,
}

impl FavoritesService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Add or remove a property from a guest's favorites.
    /// Returns true when it is now a favorite.
    pub async fn toggle(&self, user_id: Uuid, property_id: Uuid) -> AppResult<bool> {
        let user = self.repository.users.get_by_id(user_id).await?;
        if user.role != Role::User {
            return Err(AppError::Authorization(
                "Only guest accounts keep favorites".to_string(),
            ));
        }
        self.repository.users.toggle_favorite(user_id, property_id).await
    }

    pub async fn list(&self, user_id: Uuid) -> AppResult<Vec<PropertyShort>> {
        self.repository.users.get_by_id(user_id).await?;
        let ids = self.repository.users.favorite_ids(user_id).await?;
        let properties = self.repository.properties.get_many(&ids).await?;

        // Keep the order in which they were added.
        Ok(ids
            .iter()
            .filter_map(|id| properties.iter().find(|p| p.id == *id))
            .map(PropertyShort::from)
            .collect())
    }
}
