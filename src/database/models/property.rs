use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::macros::text_enum;
use crate::services::place_icons::{IconCatalog, NearbyPlace};

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

text_enum! {
    #[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
    #[serde(rename_all = "snake_case")]
    pub enum ListingType {
        Sale => "sale",
        Rent => "rent",
        VacationRent => "vacation_rent",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub listing_type: ListingType,
    pub property_type: String,
    pub price: BigDecimal,
    pub surface_m2: Option<i32>,
    pub rooms: Option<i32>,
    pub wilaya_code: String,
    pub daira: Option<String>,
    pub commune: Option<String>,
    pub address: Option<String>,
    /// Raw labels as typed by the agent; rendered with icons in [`PropertyDetail`].
    #[serde(skip_serializing)]
    pub nearby_places: Vec<String>,
    pub is_featured: bool,
    pub agent_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Single-property payload with icon-resolved nearby places.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyDetail {
    #[serde(flatten)]
    pub property: Property,
    pub nearby_places: Vec<NearbyPlace>,
}

impl PropertyDetail {
    pub fn new(property: Property, icons: &IconCatalog) -> Self {
        let nearby_places = icons.nearby_places(&property.nearby_places);
        Self {
            property,
            nearby_places,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyInput {
    pub title: String,
    pub description: Option<String>,
    pub listing_type: ListingType,
    pub property_type: String,
    pub price: BigDecimal,
    pub surface_m2: Option<i32>,
    pub rooms: Option<i32>,
    pub wilaya_code: String,
    pub daira: Option<String>,
    pub commune: Option<String>,
    pub address: Option<String>,
    #[serde(default)]
    pub nearby_places: Vec<String>,
    #[serde(default)]
    pub is_featured: bool,
    pub agent_id: Option<Uuid>,
}

impl PropertyInput {
    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("Title is required".to_string());
        }
        if self.price < BigDecimal::from(0) {
            return Err("Price cannot be negative".to_string());
        }
        if self.wilaya_code.trim().is_empty() {
            return Err("Wilaya code is required".to_string());
        }
        if matches!(self.rooms, Some(n) if n < 0) || matches!(self.surface_m2, Some(n) if n <= 0)
        {
            return Err("Rooms and surface must be positive".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PropertyFilters {
    pub wilaya: Option<String>,
    pub daira: Option<String>,
    pub listing_type: Option<ListingType>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl PropertyFilters {
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn limit(&self) -> u32 {
        self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
    }

    pub fn offset(&self) -> u32 {
        (self.page() - 1) * self.limit()
    }
}
