//! In-memory implementation of every store

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    BookingChange, BookingWrite, BookingsStore, PropertiesStore, TransactionsStore, UsersStore,
};
use crate::{
    error::{AppError, AppResult},
    models::{
        booking::Booking,
        property::{Property, PropertyQuery},
        transaction::Transaction,
        user::User,
    },
};

#[derive(Default)]
struct MemoryState {
    users: HashMap<Uuid, User>,
    favorites: HashMap<Uuid, Vec<Uuid>>,
    properties: HashMap<Uuid, Property>,
    bookings: HashMap<Uuid, Booking>,
    transactions: Vec<Transaction>,
}

/// All collections behind one lock, so a [`BookingChange`] lands atomically.
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

fn sorted_bookings<'a>(bookings: impl Iterator<Item = &'a Booking>) -> Vec<Booking> {
    let mut list: Vec<Booking> = bookings.cloned().collect();
    list.sort_by_key(|b| (b.start_date, b.created_at));
    list
}

#[async_trait]
impl UsersStore for MemoryStore {
    async fn create(&self, user: &User) -> AppResult<()> {
        let mut state = self.state.write().await;
        if state.users.values().any(|u| u.email == user.email) {
            return Err(AppError::Duplicate(format!("Email {} already exists", user.email)));
        }
        state.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<User> {
        self.state
            .read()
            .await
            .users
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))
    }

    async fn get_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let state = self.state.read().await;
        Ok(state.users.values().find(|u| u.email == email).cloned())
    }

    async fn favorite_ids(&self, user_id: Uuid) -> AppResult<Vec<Uuid>> {
        let state = self.state.read().await;
        Ok(state.favorites.get(&user_id).cloned().unwrap_or_default())
    }

    async fn toggle_favorite(&self, user_id: Uuid, property_id: Uuid) -> AppResult<bool> {
        let mut state = self.state.write().await;
        if !state.properties.contains_key(&property_id) {
            return Err(AppError::NotFound(format!("Property with id {} not found", property_id)));
        }
        let list = state.favorites.entry(user_id).or_default();
        if let Some(pos) = list.iter().position(|id| *id == property_id) {
            list.remove(pos);
            Ok(false)
        } else {
            list.push(property_id);
            Ok(true)
        }
    }
}

#[async_trait]
impl PropertiesStore for MemoryStore {
    async fn create(&self, property: &Property) -> AppResult<()> {
        self.state
            .write()
            .await
            .properties
            .insert(property.id, property.clone());
        Ok(())
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Property> {
        self.state
            .read()
            .await
            .properties
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Property with id {} not found", id)))
    }

    async fn list(&self, query: &PropertyQuery) -> AppResult<Vec<Property>> {
        let state = self.state.read().await;
        let mut list: Vec<Property> = state
            .properties
            .values()
            .filter(|p| query.matches(p))
            .cloned()
            .collect();
        list.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(list)
    }

    async fn list_by_owner(&self, owner_id: Uuid) -> AppResult<Vec<Property>> {
        let state = self.state.read().await;
        let mut list: Vec<Property> = state
            .properties
            .values()
            .filter(|p| p.owner_id == owner_id)
            .cloned()
            .collect();
        list.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(list)
    }

    async fn get_many(&self, ids: &[Uuid]) -> AppResult<Vec<Property>> {
        let state = self.state.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| state.properties.get(id).cloned())
            .collect())
    }
}

#[async_trait]
impl BookingsStore for MemoryStore {
    async fn get_by_id(&self, id: Uuid) -> AppResult<Booking> {
        self.state
            .read()
            .await
            .bookings
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Booking with id {} not found", id)))
    }

    async fn list_by_property(&self, property_id: Uuid) -> AppResult<Vec<Booking>> {
        let state = self.state.read().await;
        Ok(sorted_bookings(
            state.bookings.values().filter(|b| b.property_id == property_id),
        ))
    }

    async fn list_by_guest(&self, guest_id: Uuid) -> AppResult<Vec<Booking>> {
        let state = self.state.read().await;
        Ok(sorted_bookings(
            state.bookings.values().filter(|b| b.guest_id == guest_id),
        ))
    }

    async fn list_by_owner(&self, owner_id: Uuid) -> AppResult<Vec<Booking>> {
        let state = self.state.read().await;
        Ok(sorted_bookings(
            state.bookings.values().filter(|b| b.owner_id == owner_id),
        ))
    }

    async fn apply(&self, change: &BookingChange) -> AppResult<()> {
        let mut state = self.state.write().await;

        // Validate everything first; mutate only once nothing can fail.
        let property = state.properties.get(&change.property_id).ok_or_else(|| {
            AppError::NotFound(format!("Property with id {} not found", change.property_id))
        })?;
        if property.version != change.expected_version {
            return Err(AppError::StaleWrite(format!(
                "property {} is at version {}, expected {}",
                change.property_id, property.version, change.expected_version
            )));
        }
        match &change.booking {
            BookingWrite::Insert(b) if state.bookings.contains_key(&b.id) => {
                return Err(AppError::Internal(format!("Duplicate booking id {}", b.id)));
            }
            BookingWrite::Update(b) if !state.bookings.contains_key(&b.id) => {
                return Err(AppError::NotFound(format!("Booking with id {} not found", b.id)));
            }
            _ => {}
        }
        if let Some(tx) = &change.transaction {
            if state.transactions.iter().any(|t| t.booking_id == tx.booking_id) {
                return Err(AppError::PreconditionFailed(
                    "Booking is already confirmed".to_string(),
                ));
            }
        }

        if let Some(property) = state.properties.get_mut(&change.property_id) {
            property.booked_dates = change.booked_dates.clone();
            property.version += 1;
        }
        let booking = change.booking.booking().clone();
        state.bookings.insert(booking.id, booking);
        if let Some(tx) = &change.transaction {
            state.transactions.push(tx.clone());
        }
        Ok(())
    }
}

#[async_trait]
impl TransactionsStore for MemoryStore {
    async fn list_all(&self) -> AppResult<Vec<Transaction>> {
        Ok(self.state.read().await.transactions.clone())
    }

    async fn list_by_guest(&self, guest_id: Uuid) -> AppResult<Vec<Transaction>> {
        let state = self.state.read().await;
        Ok(state
            .transactions
            .iter()
            .filter(|t| t.guest_id == guest_id)
            .cloned()
            .collect())
    }

    async fn list_by_owner(&self, owner_id: Uuid) -> AppResult<Vec<Transaction>> {
        let state = self.state.read().await;
        Ok(state
            .transactions
            .iter()
            .filter(|t| t.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn get_by_booking(&self, booking_id: Uuid) -> AppResult<Option<Transaction>> {
        let state = self.state.read().await;
        Ok(state
            .transactions
            .iter()
            .find(|t| t.booking_id == booking_id)
            .cloned())
    }
}
