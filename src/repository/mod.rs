//! Repository layer for database operations
//!
//! Each store is a trait so services receive their storage explicitly. Two
//! backends implement them: Postgres (one struct per table, below) and
//! [`memory::MemoryStore`] for tests and single-process demos.

pub mod bookings;
pub mod memory;
pub mod properties;
pub mod transactions;
pub mod users;

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        availability::DateRange,
        booking::Booking,
        property::{Property, PropertyQuery},
        transaction::Transaction,
        user::User,
    },
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UsersStore: Send + Sync {
    async fn create(&self, user: &User) -> AppResult<()>;

    async fn get_by_id(&self, id: Uuid) -> AppResult<User>;

    async fn get_by_email(&self, email: &str) -> AppResult<Option<User>>;

    /// Property ids in the user's favorite list, oldest first
    async fn favorite_ids(&self, user_id: Uuid) -> AppResult<Vec<Uuid>>;

    /// Add the property to the favorites, or remove it if already there.
    /// Returns true when the property is now a favorite.
    async fn toggle_favorite(&self, user_id: Uuid, property_id: Uuid) -> AppResult<bool>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PropertiesStore: Send + Sync {
    async fn create(&self, property: &Property) -> AppResult<()>;

    async fn get_by_id(&self, id: Uuid) -> AppResult<Property>;

    async fn list(&self, query: &PropertyQuery) -> AppResult<Vec<Property>>;

    async fn list_by_owner(&self, owner_id: Uuid) -> AppResult<Vec<Property>>;

    async fn get_many(&self, ids: &[Uuid]) -> AppResult<Vec<Property>>;
}

/// Booking row write carried by a [`BookingChange`]
#[derive(Debug, Clone)]
pub enum BookingWrite {
    Insert(Booking),
    Update(Booking),
}

impl BookingWrite {
    pub fn booking(&self) -> &Booking {
        match self {
            BookingWrite::Insert(b) | BookingWrite::Update(b) => b,
        }
    }
}

/// Everything one booking operation writes, applied as a single unit.
///
/// The property's committed ranges are replaced by `booked_dates` only if its
/// version still equals `expected_version`; otherwise nothing is written and
/// the store returns `AppError::StaleWrite`.
#[derive(Debug, Clone)]
pub struct BookingChange {
    pub property_id: Uuid,
    pub expected_version: i64,
    pub booked_dates: Vec<DateRange>,
    pub booking: BookingWrite,
    pub transaction: Option<Transaction>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookingsStore: Send + Sync {
    async fn get_by_id(&self, id: Uuid) -> AppResult<Booking>;

    async fn list_by_property(&self, property_id: Uuid) -> AppResult<Vec<Booking>>;

    async fn list_by_guest(&self, guest_id: Uuid) -> AppResult<Vec<Booking>>;

    async fn list_by_owner(&self, owner_id: Uuid) -> AppResult<Vec<Booking>>;

    async fn apply(&self, change: &BookingChange) -> AppResult<()>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TransactionsStore: Send + Sync {
    async fn list_all(&self) -> AppResult<Vec<Transaction>>;

    async fn list_by_guest(&self, guest_id: Uuid) -> AppResult<Vec<Transaction>>;

    async fn list_by_owner(&self, owner_id: Uuid) -> AppResult<Vec<Transaction>>;

    async fn get_by_booking(&self, booking_id: Uuid) -> AppResult<Option<Transaction>>;
}

/// Main repository struct holding one handle per store
#[derive(Clone)]
pub struct Repository {
    pub users: Arc<dyn UsersStore>,
    pub properties: Arc<dyn PropertiesStore>,
    pub bookings: Arc<dyn BookingsStore>,
    pub transactions: Arc<dyn TransactionsStore>,
}

impl Repository {
    /// Create a Postgres-backed repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            users: Arc::new(users::UsersRepository::new(pool.clone())),
            properties: Arc::new(properties::PropertiesRepository::new(pool.clone())),
            bookings: Arc::new(bookings::BookingsRepository::new(pool.clone())),
            transactions: Arc::new(transactions::TransactionsRepository::new(pool)),
        }
    }

    /// Create a repository keeping all data in process memory
    pub fn in_memory() -> Self {
        let store = Arc::new(memory::MemoryStore::default());
        Self {
            users: store.clone(),
            properties: store.clone(),
            bookings: store.clone(),
            transactions: store,
        }
    }
}
