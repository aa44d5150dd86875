//! Booking notifications

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::error::AppResult;

/// What happened to the booking
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingEvent {
    /// New booking, sent to the property owner
    Created,
    /// Sent to the guest
    Confirmed,
    /// Sent to the guest
    Cancelled,
}

#[derive(Debug, Clone)]
pub struct BookingNotification {
    pub event: BookingEvent,
    pub booking_id: Uuid,
    pub property_name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub recipient_name: String,
    pub recipient_email: String,
}

impl BookingNotification {
    pub fn subject(&self) -> &'static str {
        match self.event {
            BookingEvent::Created => "New Booking Confirmation",
            BookingEvent::Confirmed => "Your booking is confirmed",
            BookingEvent::Cancelled => "Your booking was cancelled",
        }
    }

    pub fn body(&self) -> String {
        let what = match self.event {
            BookingEvent::Created => "a new booking has been made for your property",
            BookingEvent::Confirmed => "your booking has been confirmed",
            BookingEvent::Cancelled => "your booking has been cancelled",
        };
        format!(
            "Hello {name},\n\n{what}: {property}, {start} to {end} (booking {id}).\n",
            name = self.recipient_name,
            what = what,
            property = self.property_name,
            start = self.start_date,
            end = self.end_date,
            id = self.booking_id,
        )
    }
}

/// Delivers booking notifications. Failures are reported, never retried.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notification: &BookingNotification) -> AppResult<()>;
}

/// Writes notifications to the log when email delivery is disabled
#[derive(Clone, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, notification: &BookingNotification) -> AppResult<()> {
        tracing::info!(
            booking_id = %notification.booking_id,
            to = %notification.recipient_email,
            event = ?notification.event,
            "{}",
            notification.subject()
        );
        Ok(())
    }
}
