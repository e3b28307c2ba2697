use super::StoreError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A property record as kept by the listing store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ListingRecord {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub price: u64,
    pub address: String,
    pub bedrooms: u32,
    pub bathrooms: f32,
    /// Square feet
    #[serde(default)]
    pub area: u32,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default, rename = "type")]
    pub property_type: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Fields submitted when creating or editing a listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ListingDraft {
    pub title: String,
    pub description: String,
    pub price: u64,
    pub address: String,
    pub bedrooms: u32,
    pub bathrooms: f32,
    pub area: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl ListingDraft {
    pub fn validate(&self) -> Result<(), StoreError> {
        if self.title.trim().is_empty() {
            return Err(StoreError::Invalid("title is required".to_string()));
        }
        if self.address.trim().is_empty() {
            return Err(StoreError::Invalid("address is required".to_string()));
        }
        if self.bedrooms == 0 {
            return Err(StoreError::Invalid("at least one bedroom is required".to_string()));
        }
        if !(self.bathrooms.is_finite() && self.bathrooms >= 1.0) {
            return Err(StoreError::Invalid("at least one bathroom is required".to_string()));
        }
        Ok(())
    }
}

impl From<&ListingRecord> for ListingDraft {
    fn from(record: &ListingRecord) -> Self {
        Self {
            title: record.title.clone(),
            description: record.description.clone(),
            price: record.price,
            address: record.address.clone(),
            bedrooms: record.bedrooms,
            bathrooms: record.bathrooms,
            area: record.area,
            image_url: record.image_url.clone(),
        }
    }
}

/// What a buyer cares about most; sent along with a filtered search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HousingPriority {
    Price,
    Schools,
    Proximity,
    Transport,
    Safety,
    Amenities,
    Size,
    New,
    Green,
}

impl HousingPriority {
    pub const ALL: [HousingPriority; 9] = [
        HousingPriority::Price,
        HousingPriority::Schools,
        HousingPriority::Proximity,
        HousingPriority::Transport,
        HousingPriority::Safety,
        HousingPriority::Amenities,
        HousingPriority::Size,
        HousingPriority::New,
        HousingPriority::Green,
    ];

    pub fn id(self) -> &'static str {
        match self {
            HousingPriority::Price => "price",
            HousingPriority::Schools => "schools",
            HousingPriority::Proximity => "proximity",
            HousingPriority::Transport => "transport",
            HousingPriority::Safety => "safety",
            HousingPriority::Amenities => "amenities",
            HousingPriority::Size => "size",
            HousingPriority::New => "new",
            HousingPriority::Green => "green",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            HousingPriority::Price => "Affordable Price",
            HousingPriority::Schools => "Good School District",
            HousingPriority::Proximity => "Proximity to City Center",
            HousingPriority::Transport => "Public Transportation",
            HousingPriority::Safety => "Neighborhood Safety",
            HousingPriority::Amenities => "Local Amenities",
            HousingPriority::Size => "Property Size",
            HousingPriority::New => "New Construction",
            HousingPriority::Green => "Green Spaces Nearby",
        }
    }
}

impl fmt::Display for HousingPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for HousingPriority {
    type Err = StoreError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        Self::ALL
            .into_iter()
            .find(|priority| priority.id().eq_ignore_ascii_case(value))
            .ok_or_else(|| StoreError::Invalid(format!("unknown priority '{}'", value)))
    }
}

/// Filtered search against the listing store.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ListingFilter {
    pub query: Option<String>,
    /// `None` or `"all"` means every type
    pub property_type: Option<String>,
    pub min_price: Option<u64>,
    pub max_price: Option<u64>,
    /// `None` means any number of bedrooms
    pub min_bedrooms: Option<u32>,
    #[serde(default)]
    pub priorities: Vec<HousingPriority>,
}

impl ListingFilter {
    pub fn validate(&self) -> Result<(), StoreError> {
        if let (Some(min), Some(max)) = (self.min_price, self.max_price) {
            if min > max {
                return Err(StoreError::Invalid(format!(
                    "minimum price {} exceeds maximum price {}",
                    min, max
                )));
            }
        }
        Ok(())
    }

    /// Query-string pairs; unset and catch-all values are left out.
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();

        if let Some(query) = self.query.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
            pairs.push(("query", query.to_string()));
        }
        if let Some(kind) = self
            .property_type
            .as_deref()
            .filter(|kind| !kind.eq_ignore_ascii_case("all"))
        {
            pairs.push(("type", kind.to_string()));
        }
        if let Some(min) = self.min_price {
            pairs.push(("minPrice", min.to_string()));
        }
        if let Some(max) = self.max_price {
            pairs.push(("maxPrice", max.to_string()));
        }
        if let Some(bedrooms) = self.min_bedrooms {
            pairs.push(("bedrooms", bedrooms.to_string()));
        }
        if !self.priorities.is_empty() {
            let joined = self
                .priorities
                .iter()
                .map(|priority| priority.id())
                .collect::<Vec<_>>()
                .join(",");
            pairs.push(("priorities", joined));
        }

        pairs
    }

    pub fn is_empty(&self) -> bool {
        self.to_query_pairs().is_empty()
    }
}

/// A filter the user bookmarked under a name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SavedSearch {
    pub name: String,
    pub filter: ListingFilter,
    pub saved_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catch_all_values_are_left_out() {
        let filter = ListingFilter {
            query: Some("  ".to_string()),
            property_type: Some("all".to_string()),
            ..ListingFilter::default()
        };
        assert!(filter.to_query_pairs().is_empty());
        assert!(filter.is_empty());
    }

    #[test]
    fn full_filter_builds_every_pair_in_order() {
        let filter = ListingFilter {
            query: Some("Capitol Hill".to_string()),
            property_type: Some("condo".to_string()),
            min_price: Some(300_000),
            max_price: Some(650_000),
            min_bedrooms: Some(2),
            priorities: vec![HousingPriority::Schools, HousingPriority::Transport],
        };
        assert_eq!(
            filter.to_query_pairs(),
            vec![
                ("query", "Capitol Hill".to_string()),
                ("type", "condo".to_string()),
                ("minPrice", "300000".to_string()),
                ("maxPrice", "650000".to_string()),
                ("bedrooms", "2".to_string()),
                ("priorities", "schools,transport".to_string()),
            ]
        );
    }

    #[test]
    fn inverted_price_range_is_invalid() {
        let filter = ListingFilter {
            min_price: Some(900_000),
            max_price: Some(100_000),
            ..ListingFilter::default()
        };
        assert!(matches!(filter.validate(), Err(StoreError::Invalid(_))));
    }

    #[test]
    fn priorities_parse_case_insensitively() {
        assert_eq!("Green".parse::<HousingPriority>().ok(), Some(HousingPriority::Green));
        assert!("pool".parse::<HousingPriority>().is_err());
        assert_eq!(HousingPriority::New.label(), "New Construction");
    }

    #[test]
    fn draft_requires_title_address_and_rooms() {
        let mut draft = ListingDraft {
            title: "Craftsman bungalow".to_string(),
            description: String::new(),
            price: 525_000,
            address: "88 Elm St".to_string(),
            bedrooms: 2,
            bathrooms: 1.5,
            area: 1100,
            image_url: None,
        };
        assert!(draft.validate().is_ok());

        draft.bathrooms = 0.0;
        assert!(draft.validate().is_err());

        draft.bathrooms = 1.0;
        draft.title = " ".to_string();
        assert!(draft.validate().is_err());
    }
}
