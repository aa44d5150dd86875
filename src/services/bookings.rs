//! Booking service: availability checks and the booking lifecycle
//!
//! Every write to a booking goes through this service. Writes for one
//! property are serialized twice over: by an in-process mutex per property,
//! and by the optimistic version check that the store performs when applying
//! a [`BookingChange`], which covers other server processes.

use std::sync::Arc;

use chrono::NaiveDate;
use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use super::notifications::{BookingEvent, BookingNotification, Notifier};
use crate::{
    config::BookingConfig,
    error::{AppError, AppResult},
    models::{
        availability::DateRange,
        booking::{Booking, BookingAction, BookingDetails, BookingQuery, BookingStatus, CreateBooking, Transition},
        property::PropertyShort,
        transaction::Transaction,
        user::UserShort,
    },
    repository::{BookingChange, BookingWrite, Repository},
};

/// One async mutex per property id
#[derive(Default)]
struct PropertyLocks {
    locks: DashMap<Uuid, Arc<Mutex<()>>>,
}

impl PropertyLocks {
    async fn acquire(self: &Arc<Self>, property_id: Uuid) -> PropertyGuard {
        // Clone the Arc out so no map shard stays locked across the await.
        let lock = self.locks.entry(property_id).or_default().clone();
        PropertyGuard {
            guard: Some(lock.lock_owned().await),
            locks: Arc::clone(self),
            property_id,
        }
    }
}

/// Holds a property's lock; drops the map entry once nobody else wants it
struct PropertyGuard {
    guard: Option<OwnedMutexGuard<()>>,
    locks: Arc<PropertyLocks>,
    property_id: Uuid,
}

impl Drop for PropertyGuard {
    fn drop(&mut self) {
        self.guard.take();
        // Waiters clone the Arc under the shard lock, so a count of one
        // means only the map still refers to this mutex.
        self.locks
            .locks
            .remove_if(&self.property_id, |_, lock| Arc::strong_count(lock) == 1);
    }
}

/// What a booking mutation requires the store to write
enum Outcome {
    /// Nothing changed, skip the write
    Skip,
    Write {
        transaction: Option<Transaction>,
        release: Option<DateRange>,
    },
}

#[derive(Clone)]
pub struct BookingsService {
    repository: Repository,
    notifier: Arc<dyn Notifier>,
    locks: Arc<PropertyLocks>,
    max_write_attempts: u32,
}

impl BookingsService {
    pub fn new(repository: Repository, notifier: Arc<dyn Notifier>, config: &BookingConfig) -> Self {
        Self {
            repository,
            notifier,
            locks: Arc::new(PropertyLocks::default()),
            max_write_attempts: config.max_write_attempts.max(1),
        }
    }

    /// Whether `[start, end]` overlaps a committed range of the property
    pub async fn overlaps(&self, property_id: Uuid, start: NaiveDate, end: NaiveDate) -> AppResult<bool> {
        let range = DateRange::new(start, end)?;
        let property = self.repository.properties.get_by_id(property_id).await?;
        Ok(property.availability().overlaps(&range))
    }

    /// Create a pending booking and commit its dates on the property
    pub async fn create_booking(&self, guest_id: Uuid, request: CreateBooking) -> AppResult<Booking> {
        let range = DateRange::new(request.start_date, request.end_date)?;
        // Unknown guests fail before taking the property lock.
        self.repository.users.get_by_id(guest_id).await?;

        let booking = {
            let _guard = self.locks.acquire(request.property_id).await;
            let mut attempt = 1;
            loop {
                match self.try_create(guest_id, &request, range).await {
                    Err(AppError::StaleWrite(msg)) => {
                        self.check_retry(attempt, &msg)?;
                        attempt += 1;
                    }
                    other => break other?,
                }
            }
        };

        tracing::info!(
            booking_id = %booking.id,
            property_id = %booking.property_id,
            "Booking created for {}",
            range
        );
        self.dispatch(BookingEvent::Created, &booking);

        Ok(booking)
    }

    async fn try_create(&self, guest_id: Uuid, request: &CreateBooking, range: DateRange) -> AppResult<Booking> {
        let property = self.repository.properties.get_by_id(request.property_id).await?;

        if let Some(owner_id) = request.owner_id {
            if owner_id != property.owner_id {
                return Err(AppError::Validation(
                    "Owner does not match the property owner".to_string(),
                ));
            }
        }

        let mut availability = property.availability();
        availability.commit(range)?;

        let booking = Booking::new(
            guest_id,
            property.owner_id,
            property.id,
            range,
            request.price,
            request.total_guests,
        );

        self.repository
            .bookings
            .apply(&BookingChange {
                property_id: property.id,
                expected_version: property.version,
                booked_dates: availability.into_ranges(),
                booking: BookingWrite::Insert(booking.clone()),
                transaction: None,
            })
            .await?;

        Ok(booking)
    }

    /// Drive the lifecycle with an action token (`confirm` or `cancel`)
    pub async fn transition(&self, booking_id: Uuid, action: &str) -> AppResult<Booking> {
        // Existence first, so an unknown booking is NotFound whatever the action.
        self.repository.bookings.get_by_id(booking_id).await?;
        let action: BookingAction = action.parse()?;

        let (booking, written) = self
            .update_booking(booking_id, |booking| {
                Ok(match booking.apply(action)? {
                    Transition::Unchanged => Outcome::Skip,
                    Transition::Confirmed(tx) => Outcome::Write {
                        transaction: Some(tx),
                        release: None,
                    },
                    Transition::Cancelled(range) => Outcome::Write {
                        transaction: None,
                        release: Some(range),
                    },
                })
            })
            .await?;

        if written {
            tracing::info!(booking_id = %booking.id, status = %booking.status, "Booking transitioned");
            let event = match booking.status {
                BookingStatus::Confirmed => Some(BookingEvent::Confirmed),
                BookingStatus::Cancelled => Some(BookingEvent::Cancelled),
                BookingStatus::Pending => None,
            };
            if let Some(event) = event {
                self.dispatch(event, &booking);
            }
        }

        Ok(booking)
    }

    /// Agent sets where the guest should pay. One-shot.
    pub async fn set_payment_details(
        &self,
        booking_id: Uuid,
        payment_email: String,
        payment_instruction: Option<String>,
    ) -> AppResult<Booking> {
        let (booking, _) = self
            .update_booking(booking_id, |booking| {
                booking.set_payment_details(payment_email.clone(), payment_instruction.clone())?;
                Ok(Outcome::Write {
                    transaction: None,
                    release: None,
                })
            })
            .await?;
        Ok(booking)
    }

    /// Guest submits the payment reference. One-shot.
    pub async fn set_transaction_id(&self, booking_id: Uuid, transaction_id: String) -> AppResult<Booking> {
        let (booking, _) = self
            .update_booking(booking_id, |booking| {
                booking.set_transaction_id(transaction_id.clone())?;
                Ok(Outcome::Write {
                    transaction: None,
                    release: None,
                })
            })
            .await?;
        Ok(booking)
    }

    /// Run `mutate` on the current booking under its property's lock and
    /// persist the result. Returns the booking and whether anything was written.
    async fn update_booking<F>(&self, booking_id: Uuid, mutate: F) -> AppResult<(Booking, bool)>
    where
        F: Fn(&mut Booking) -> AppResult<Outcome> + Send + Sync,
    {
        let property_id = self.repository.bookings.get_by_id(booking_id).await?.property_id;
        let _guard = self.locks.acquire(property_id).await;

        let mut attempt = 1;
        loop {
            match self.try_update(booking_id, &mutate).await {
                Err(AppError::StaleWrite(msg)) => {
                    self.check_retry(attempt, &msg)?;
                    attempt += 1;
                }
                other => return other,
            }
        }
    }

    async fn try_update<F>(&self, booking_id: Uuid, mutate: &F) -> AppResult<(Booking, bool)>
    where
        F: Fn(&mut Booking) -> AppResult<Outcome> + Send + Sync,
    {
        let mut booking = self.repository.bookings.get_by_id(booking_id).await?;
        let property = self.repository.properties.get_by_id(booking.property_id).await?;

        let (transaction, release) = match mutate(&mut booking)? {
            Outcome::Skip => return Ok((booking, false)),
            Outcome::Write { transaction, release } => (transaction, release),
        };

        let mut availability = property.availability();
        if let Some(range) = release {
            if !availability.release(&range) {
                tracing::warn!(
                    booking_id = %booking.id,
                    property_id = %property.id,
                    "Range {} was not committed on the property",
                    range
                );
            }
        }

        self.repository
            .bookings
            .apply(&BookingChange {
                property_id: property.id,
                expected_version: property.version,
                booked_dates: availability.into_ranges(),
                booking: BookingWrite::Update(booking.clone()),
                transaction,
            })
            .await?;

        Ok((booking, true))
    }

    fn check_retry(&self, attempt: u32, msg: &str) -> AppResult<()> {
        if attempt >= self.max_write_attempts {
            return Err(AppError::Internal(format!(
                "Booking write failed after {} attempts: {}",
                attempt, msg
            )));
        }
        tracing::debug!(attempt, "Retrying booking write: {}", msg);
        Ok(())
    }

    /// Hand a notification to the notifier without waiting for it
    fn dispatch(&self, event: BookingEvent, booking: &Booking) {
        let repository = self.repository.clone();
        let notifier = self.notifier.clone();
        let booking = booking.clone();

        tokio::spawn(async move {
            if let Err(e) = deliver(&repository, notifier.as_ref(), event, &booking).await {
                tracing::warn!(booking_id = %booking.id, "Failed to send booking notification: {}", e);
            }
        });
    }

    pub async fn get_booking(&self, booking_id: Uuid) -> AppResult<Booking> {
        self.repository.bookings.get_by_id(booking_id).await
    }

    /// Booking with its property and guest resolved
    pub async fn get_details(&self, booking_id: Uuid) -> AppResult<BookingDetails> {
        let booking = self.repository.bookings.get_by_id(booking_id).await?;
        let property = self.repository.properties.get_by_id(booking.property_id).await?;
        let guest = self.repository.users.get_by_id(booking.guest_id).await?;

        Ok(BookingDetails {
            nights: booking.range().nights(),
            property: PropertyShort::from(&property),
            guest: UserShort::from(&guest),
            booking,
        })
    }

    /// List bookings by exactly one of property, guest or owner
    pub async fn list(&self, query: &BookingQuery) -> AppResult<Vec<Booking>> {
        match (query.property_id, query.guest_id, query.owner_id) {
            (Some(id), None, None) => self.list_by_property(id).await,
            (None, Some(id), None) => self.list_by_guest(id).await,
            (None, None, Some(id)) => self.list_by_owner(id).await,
            _ => Err(AppError::BadRequest(
                "Exactly one of property_id, guest_id or owner_id is required".to_string(),
            )),
        }
    }

    pub async fn list_by_property(&self, property_id: Uuid) -> AppResult<Vec<Booking>> {
        self.repository.properties.get_by_id(property_id).await?;
        self.repository.bookings.list_by_property(property_id).await
    }

    pub async fn list_by_guest(&self, guest_id: Uuid) -> AppResult<Vec<Booking>> {
        self.repository.bookings.list_by_guest(guest_id).await
    }

    pub async fn list_by_owner(&self, owner_id: Uuid) -> AppResult<Vec<Booking>> {
        self.repository.bookings.list_by_owner(owner_id).await
    }
}

async fn deliver(
    repository: &Repository,
    notifier: &dyn Notifier,
    event: BookingEvent,
    booking: &Booking,
) -> AppResult<()> {
    let recipient_id = match event {
        BookingEvent::Created => booking.owner_id,
        BookingEvent::Confirmed | BookingEvent::Cancelled => booking.guest_id,
    };
    let recipient = repository.users.get_by_id(recipient_id).await?;
    let property = repository.properties.get_by_id(booking.property_id).await?;

    notifier
        .notify(&BookingNotification {
            event,
            booking_id: booking.id,
            property_name: property.name,
            start_date: booking.start_date,
            end_date: booking.end_date,
            recipient_name: recipient.name,
            recipient_email: recipient.email,
        })
        .await
}
