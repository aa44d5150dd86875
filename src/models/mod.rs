//! Data models for Staybook

pub mod availability;
pub mod booking;
pub mod property;
pub mod transaction;
pub mod user;

// Re-export commonly used types
pub use availability::{AvailabilityIndex, DateRange};
pub use booking::{Booking, BookingAction, BookingDetails, BookingStatus, Transition};
pub use property::{Property, PropertyShort};
pub use transaction::Transaction;
pub use user::{Role, User, UserShort};
