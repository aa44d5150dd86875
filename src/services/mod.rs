//! Business logic services

pub mod auth;
pub mod bookings;
pub mod email;
pub mod favorites;
pub mod notifications;
pub mod properties;
pub mod transactions;

use std::sync::Arc;

use crate::{
    config::{AuthConfig, BookingConfig},
    repository::Repository,
};

use notifications::Notifier;

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub auth: auth::AuthService,
    pub properties: properties::PropertiesService,
    pub bookings: bookings::BookingsService,
    pub transactions: transactions::TransactionsService,
    pub favorites: favorites::FavoritesService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(
        repository: Repository,
        auth_config: AuthConfig,
        booking_config: &BookingConfig,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            auth: auth::AuthService::new(repository.clone(), auth_config),
            properties: properties::PropertiesService::new(repository.clone()),
            bookings: bookings::BookingsService::new(repository.clone(), notifier, booking_config),
            transactions: transactions::TransactionsService::new(repository.clone()),
            favorites: favorites::FavoritesService::new(repository),
        }
    }
}
