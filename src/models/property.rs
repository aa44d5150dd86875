//! Property (listing) model and related types

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use super::availability::{AvailabilityIndex, DateRange};

/// Internal row structure for database queries
#[derive(Debug, Clone, FromRow)]
pub struct PropertyRow {
    id: Uuid,
    owner_id: Uuid,
    name: String,
    description: String,
    amenities: Vec<String>,
    price_per_night: Decimal,
    location: String,
    state: String,
    property_type: String,
    guests: i32,
    property_images: Vec<String>,
    ratings: Vec<i32>,
    booked_dates: Json<Vec<DateRange>>,
    version: i64,
}

impl From<PropertyRow> for Property {
    fn from(row: PropertyRow) -> Self {
        Property {
            id: row.id,
            owner_id: row.owner_id,
            name: row.name,
            description: row.description,
            amenities: row.amenities,
            price_per_night: row.price_per_night,
            location: row.location,
            state: row.state,
            property_type: row.property_type,
            guests: row.guests,
            property_images: row.property_images,
            ratings: row.ratings,
            booked_dates: row.booked_dates.0,
            version: row.version,
        }
    }
}

/// Property listing
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Property {
    pub id: Uuid,
    /// Letting agent owning the listing
    pub owner_id: Uuid,
    pub name: String,
    pub description: String,
    pub amenities: Vec<String>,
    #[schema(value_type = String)]
    pub price_per_night: Decimal,
    pub location: String,
    pub state: String,
    pub property_type: String,
    /// Maximum number of guests
    pub guests: i32,
    pub property_images: Vec<String>,
    pub ratings: Vec<i32>,
    /// Committed ranges, maintained only by the booking service
    pub booked_dates: Vec<DateRange>,
    #[serde(skip)]
    pub version: i64,
}

impl Property {
    pub fn availability(&self) -> AvailabilityIndex {
        AvailabilityIndex::from_ranges(self.booked_dates.clone())
    }
}

/// Listing without its booking calendar
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PropertyShort {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub location: String,
    pub property_type: String,
    #[schema(value_type = String)]
    pub price_per_night: Decimal,
    pub guests: i32,
    pub property_images: Vec<String>,
}

impl From<&Property> for PropertyShort {
    fn from(p: &Property) -> Self {
        PropertyShort {
            id: p.id,
            owner_id: p.owner_id,
            name: p.name.clone(),
            location: p.location.clone(),
            property_type: p.property_type.clone(),
            price_per_night: p.price_per_night,
            guests: p.guests,
            property_images: p.property_images.clone(),
        }
    }
}

/// Create property request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateProperty {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "Description is required"))]
    pub description: String,
    #[serde(default)]
    pub amenities: Vec<String>,
    #[schema(value_type = String)]
    pub price_per_night: Decimal,
    #[validate(length(min = 1, message = "Location is required"))]
    pub location: String,
    pub state: String,
    pub property_type: String,
    #[validate(range(min = 1, message = "A property must host at least one guest"))]
    pub guests: i32,
    #[serde(default)]
    pub property_images: Vec<String>,
}

/// Listing search filters (case-insensitive substring matches)
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct PropertyQuery {
    /// Location contains
    pub location: Option<String>,
    /// Minimum guest capacity
    pub guests: Option<i32>,
    /// Property type contains
    pub category: Option<String>,
}

impl PropertyQuery {
    /// In-process version of the listing filter
    pub fn matches(&self, property: &Property) -> bool {
        fn contains(haystack: &str, needle: &Option<String>) -> bool {
            needle
                .as_ref()
                .map(|n| haystack.to_lowercase().contains(&n.to_lowercase()))
                .unwrap_or(true)
        }

        contains(&property.location, &self.location)
            && contains(&property.property_type, &self.category)
            && self.guests.map(|g| property.guests >= g).unwrap_or(true)
    }
}
