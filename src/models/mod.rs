mod display;

pub use display::{format_count, format_price, format_status};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Location information for a listing
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Location {
    pub address: Option<String>,
    pub unit: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl Location {
    /// Single-line heading, e.g. "12 Pike St Apt 3 - Seattle"
    pub fn headline(&self) -> String {
        let street = match (&self.address, &self.unit) {
            (Some(address), Some(unit)) => format!("{} {}", address, unit),
            (Some(address), None) => address.clone(),
            _ => "Property".to_string(),
        };

        match &self.city {
            Some(city) => format!("{} - {}", street, city),
            None => street,
        }
    }
}

/// Market status of a listing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum ListingStatus {
    ForSale,
    ForRent,
    Sold,
    Pending,
    Contingent,
    /// A status the lookup table doesn't know; shown as-is.
    Other(String),
    Unknown,
}

impl ListingStatus {
    pub fn from_raw(raw: Option<&str>) -> Self {
        match raw {
            None => Self::Unknown,
            Some("FOR_SALE") => Self::ForSale,
            Some("FOR_RENT") => Self::ForRent,
            Some("SOLD") => Self::Sold,
            Some("PENDING") => Self::Pending,
            Some("CONTINGENT") => Self::Contingent,
            Some(other) => Self::Other(other.to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::ForSale => "For Sale",
            Self::ForRent => "For Rent",
            Self::Sold => "Sold",
            Self::Pending => "Pending",
            Self::Contingent => "Contingent",
            Self::Other(raw) => raw,
            Self::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for ListingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Normalized view of one search result.
///
/// Built once from a query-service payload and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyListing {
    pub id: Option<String>,
    pub location: Location,
    pub price: Option<u64>,
    pub beds: Option<u32>,
    pub full_baths: Option<u32>,
    pub half_baths: Option<u32>,
    pub sqft: Option<u64>,
    pub lot_sqft: Option<u64>,
    pub year_built: Option<u32>,
    pub property_type: Option<String>,
    pub description: Option<String>,
    pub days_on_market: Option<u32>,
    /// Ordered, first is the primary photo
    pub images: Vec<String>,
    pub url: Option<String>,
    pub status: ListingStatus,
    pub normalized_at: DateTime<Utc>,
    pub raw_data: serde_json::Value,
}

impl PropertyListing {
    pub fn primary_image(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }

    pub fn price_label(&self) -> String {
        format_price(self.price)
    }

    /// Description cut to 200 characters for result cards.
    pub fn summary(&self) -> String {
        const LIMIT: usize = 200;

        match &self.description {
            Some(text) if text.chars().count() > LIMIT => {
                format!("{}...", text.chars().take(LIMIT).collect::<String>())
            }
            Some(text) => text.clone(),
            None => "No description available".to_string(),
        }
    }
}
