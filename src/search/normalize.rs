//! Turns whatever `search-with-responses` returned into `PropertyListing`s.
//!
//! Backends disagree on the envelope: some send a JSON-encoded string, some a
//! bare array, some wrap the array in `properties` or `results`, and some send
//! one listing object on its own. `ListingPayload` names each of those shapes;
//! anything else is a `DecodeError`.

use crate::error::DecodeError;
use crate::models::{ListingStatus, Location, PropertyListing};
use chrono::Utc;
use serde_json::{Map, Value};
use tracing::debug;

type RawListing = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WrapperField {
    Properties,
    Results,
}

impl WrapperField {
    const ALL: [WrapperField; 2] = [WrapperField::Properties, WrapperField::Results];

    pub fn key(self) -> &'static str {
        match self {
            WrapperField::Properties => "properties",
            WrapperField::Results => "results",
        }
    }
}

/// The accepted envelopes of a search payload.
#[derive(Debug, Clone, PartialEq)]
pub enum ListingPayload {
    /// A JSON string whose contents decode to one of the other shapes
    Encoded(Box<ListingPayload>),
    List(Vec<RawListing>),
    Wrapped {
        field: WrapperField,
        listings: Vec<RawListing>,
    },
    Single(RawListing),
}

impl ListingPayload {
    pub fn decode(value: Value) -> Result<Self, DecodeError> {
        match value {
            Value::String(text) => {
                let inner: Value = serde_json::from_str(&text)?;
                if inner.is_string() {
                    return Err(DecodeError::NestedEncoding);
                }
                Ok(Self::Encoded(Box::new(Self::decode_structured(inner)?)))
            }
            other => Self::decode_structured(other),
        }
    }

    fn decode_structured(value: Value) -> Result<Self, DecodeError> {
        match value {
            Value::Array(items) => Ok(Self::List(into_objects(items)?)),
            Value::Object(mut map) => {
                for field in WrapperField::ALL {
                    match map.remove(field.key()) {
                        Some(Value::Array(items)) => {
                            return Ok(Self::Wrapped {
                                field,
                                listings: into_objects(items)?,
                            })
                        }
                        Some(_) => return Err(DecodeError::BadWrapper { field: field.key() }),
                        None => {}
                    }
                }
                Ok(Self::Single(map))
            }
            Value::String(_) => Err(DecodeError::NestedEncoding),
            other => Err(DecodeError::UnrecognizedShape {
                found: json_kind(&other),
            }),
        }
    }

    /// Short label for logs
    pub fn shape(&self) -> &'static str {
        match self {
            Self::Encoded(_) => "encoded string",
            Self::List(_) => "array",
            Self::Wrapped {
                field: WrapperField::Properties,
                ..
            } => "properties wrapper",
            Self::Wrapped {
                field: WrapperField::Results,
                ..
            } => "results wrapper",
            Self::Single(_) => "single listing",
        }
    }

    pub fn into_raw_listings(self) -> Vec<RawListing> {
        match self {
            Self::Encoded(inner) => inner.into_raw_listings(),
            Self::List(listings) | Self::Wrapped { listings, .. } => listings,
            Self::Single(listing) => vec![listing],
        }
    }
}

/// Decodes a raw service payload into listings, preserving order.
pub fn normalize_listings(payload: Value) -> Result<Vec<PropertyListing>, DecodeError> {
    let payload = ListingPayload::decode(payload)?;
    debug!("Decoded search payload as {}", payload.shape());

    Ok(payload
        .into_raw_listings()
        .into_iter()
        .map(listing_from_raw)
        .collect())
}

pub fn listing_from_raw(raw: RawListing) -> PropertyListing {
    let location = Location {
        address: text(&raw, "street").or_else(|| text(&raw, "address")),
        unit: text(&raw, "unit"),
        city: text(&raw, "city"),
        state: text(&raw, "state"),
        zip_code: text(&raw, "zip_code"),
        latitude: number(&raw, "latitude"),
        longitude: number(&raw, "longitude"),
    };

    let images = extract_images(
        raw.get("primary_photo").or_else(|| raw.get("image_url")),
        raw.get("alt_photos"),
    );

    PropertyListing {
        id: first_text(&raw, &["property_id", "listing_id", "mls_id", "id"]),
        location,
        price: whole(&raw, "list_price").or_else(|| whole(&raw, "price")),
        beds: whole(&raw, "beds").or_else(|| whole(&raw, "bedrooms")),
        full_baths: whole(&raw, "full_baths").or_else(|| whole(&raw, "bathrooms")),
        half_baths: whole(&raw, "half_baths"),
        sqft: whole(&raw, "sqft").or_else(|| whole(&raw, "area")),
        lot_sqft: whole(&raw, "lot_sqft"),
        year_built: whole(&raw, "year_built"),
        property_type: first_text(&raw, &["style", "property_type", "type"]),
        description: text(&raw, "text").or_else(|| text(&raw, "description")),
        days_on_market: whole(&raw, "days_on_mls"),
        images,
        url: text(&raw, "property_url"),
        status: ListingStatus::from_raw(text(&raw, "status").as_deref()),
        normalized_at: Utc::now(),
        raw_data: Value::Object(raw),
    }
}

/// Primary photo first, then secondary photos in order, without repeats.
///
/// Secondary photos arrive either as one `", "`-separated string or as an
/// array of strings.
pub fn extract_images(primary: Option<&Value>, secondary: Option<&Value>) -> Vec<String> {
    let mut images: Vec<String> = Vec::new();
    let mut push = |url: &str| {
        let url = url.trim();
        if !url.is_empty() && !images.iter().any(|seen| seen == url) {
            images.push(url.to_string());
        }
    };

    if let Some(Value::String(url)) = primary {
        push(url.as_str());
    }

    match secondary {
        Some(Value::String(list)) => list.split(", ").for_each(&mut push),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .for_each(&mut push),
        _ => {}
    }

    images
}

fn into_objects(items: Vec<Value>) -> Result<Vec<RawListing>, DecodeError> {
    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| match item {
            Value::Object(map) => Ok(map),
            other => Err(DecodeError::NotAnObject {
                index,
                found: json_kind(&other),
            }),
        })
        .collect()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn text(raw: &RawListing, key: &str) -> Option<String> {
    match raw.get(key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn first_text(raw: &RawListing, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| text(raw, key))
}

fn number(raw: &RawListing, key: &str) -> Option<f64> {
    let value = match raw.get(key)? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().replace(',', "").parse::<f64>().ok()?,
        _ => return None,
    };
    value.is_finite().then_some(value)
}

/// Non-negative whole number; floats such as `3.0` are rounded. Values
/// beyond `u64` are treated as absent rather than clamped.
fn whole<T: TryFrom<u64>>(raw: &RawListing, key: &str) -> Option<T> {
    let value = number(raw, key)?.round();
    if value < 0.0 || value >= u64::MAX as f64 {
        return None;
    }
    T::try_from(value as u64).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn encoded_string_payload_is_parsed_first() {
        let payload = Value::String(r#"[{"list_price":500000,"beds":3}]"#.to_string());
        let listings = normalize_listings(payload).expect("encoded array decodes");
        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].price, Some(500_000));
        assert_eq!(listings[0].beds, Some(3));
    }

    #[test]
    fn results_wrapper_is_unwrapped() {
        let listings = normalize_listings(json!({"results": [{"list_price": 300000}]}))
            .expect("wrapper decodes");
        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].price, Some(300_000));
    }

    #[test]
    fn properties_wrapper_is_unwrapped() {
        let payload = ListingPayload::decode(json!({
            "properties": [{"list_price": 1}, {"list_price": 2}],
            "count": 2
        }))
        .expect("wrapper decodes");
        assert_eq!(payload.shape(), "properties wrapper");
        assert_eq!(payload.into_raw_listings().len(), 2);
    }

    #[test]
    fn bare_object_becomes_single_listing() {
        let listings = normalize_listings(json!({"list_price": 200000})).expect("object decodes");
        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].price, Some(200_000));
    }

    #[test]
    fn empty_array_is_a_valid_empty_result() {
        let listings = normalize_listings(json!([])).expect("empty array decodes");
        assert!(listings.is_empty());
    }

    #[test]
    fn unparseable_string_is_a_decode_error() {
        let err = normalize_listings(Value::String("not json at all".to_string()))
            .expect_err("garbage is rejected");
        assert!(matches!(err, DecodeError::InvalidJson(_)));
    }

    #[test]
    fn doubly_encoded_string_is_rejected() {
        let payload = Value::String(r#""[]""#.to_string());
        let err = ListingPayload::decode(payload).expect_err("nested encoding rejected");
        assert!(matches!(err, DecodeError::NestedEncoding));
    }

    #[test]
    fn scalars_are_unrecognized() {
        for (value, kind) in [(json!(42), "number"), (json!(null), "null"), (json!(true), "boolean")] {
            match ListingPayload::decode(value) {
                Err(DecodeError::UnrecognizedShape { found }) => assert_eq!(found, kind),
                other => panic!("expected unrecognized shape, got {:?}", other),
            }
        }
    }

    #[test]
    fn array_of_non_objects_is_rejected() {
        let err = ListingPayload::decode(json!([{"list_price": 1}, "oops"]))
            .expect_err("non-object element rejected");
        assert!(matches!(err, DecodeError::NotAnObject { index: 1, found: "string" }));
    }

    #[test]
    fn wrapper_field_must_be_an_array() {
        let err = ListingPayload::decode(json!({"results": "none"}))
            .expect_err("non-array wrapper rejected");
        assert!(matches!(err, DecodeError::BadWrapper { field: "results" }));
    }

    #[test]
    fn encoded_wrapper_keeps_inner_shape() {
        let payload = ListingPayload::decode(Value::String(
            r#"{"results":[{"beds":2}]}"#.to_string(),
        ))
        .expect("encoded wrapper decodes");
        match &payload {
            ListingPayload::Encoded(inner) => assert_eq!(inner.shape(), "results wrapper"),
            other => panic!("expected encoded payload, got {:?}", other),
        }
    }

    #[test]
    fn images_dedupe_with_primary_first() {
        let images = extract_images(
            Some(&json!("a.jpg")),
            Some(&json!("a.jpg, b.jpg")),
        );
        assert_eq!(images, vec!["a.jpg", "b.jpg"]);
    }

    #[test]
    fn image_urls_containing_commas_stay_whole() {
        let resized = "https://img.example.com/w_100,h_100/a.jpg";
        let images = extract_images(
            Some(&json!(resized)),
            Some(&json!("https://img.example.com/w_100,h_100/a.jpg, https://img.example.com/b.jpg")),
        );
        assert_eq!(images, vec![resized, "https://img.example.com/b.jpg"]);
    }

    #[test]
    fn out_of_range_numbers_are_absent() {
        let listing = listing_from_raw(
            json!({"list_price": 1e30, "beds": 5e9, "sqft": -10})
                .as_object()
                .cloned()
                .expect("object literal"),
        );
        assert_eq!(listing.price, None);
        assert_eq!(listing.beds, None);
        assert_eq!(listing.sqft, None);
    }

    #[test]
    fn images_accept_array_of_secondary_photos() {
        let images = extract_images(None, Some(&json!(["x.jpg", "y.jpg", "x.jpg", 7])));
        assert_eq!(images, vec!["x.jpg", "y.jpg"]);
    }

    #[test]
    fn maps_homeharvest_fields() {
        let listing = listing_from_raw(
            json!({
                "property_id": 9876543,
                "street": "1200 Pike St",
                "unit": "Apt 4",
                "city": "Seattle",
                "state": "WA",
                "zip_code": "98101",
                "list_price": 799000.0,
                "beds": 3.0,
                "full_baths": "2",
                "half_baths": null,
                "sqft": 1850,
                "year_built": 1998,
                "style": "CONDOS",
                "text": "Bright corner unit.",
                "status": "FOR_SALE",
                "property_url": "https://www.realtor.com/x",
                "primary_photo": "p.jpg",
                "alt_photos": "p.jpg, q.jpg, r.jpg"
            })
            .as_object()
            .cloned()
            .expect("object literal"),
        );

        assert_eq!(listing.id.as_deref(), Some("9876543"));
        assert_eq!(listing.location.headline(), "1200 Pike St Apt 4 - Seattle");
        assert_eq!(listing.price, Some(799_000));
        assert_eq!(listing.beds, Some(3));
        assert_eq!(listing.full_baths, Some(2));
        assert_eq!(listing.half_baths, None);
        assert_eq!(listing.sqft, Some(1850));
        assert_eq!(listing.year_built, Some(1998));
        assert_eq!(listing.property_type.as_deref(), Some("CONDOS"));
        assert_eq!(listing.status, ListingStatus::ForSale);
        assert_eq!(listing.images, vec!["p.jpg", "q.jpg", "r.jpg"]);
        assert_eq!(listing.url.as_deref(), Some("https://www.realtor.com/x"));
        assert_eq!(listing.raw_data["style"], "CONDOS");
    }

    #[test]
    fn missing_fields_stay_absent() {
        let listing = listing_from_raw(Map::new());
        assert_eq!(listing.price, None);
        assert_eq!(listing.status, ListingStatus::Unknown);
        assert!(listing.images.is_empty());
        assert_eq!(listing.location.headline(), "Property");
        assert_eq!(listing.summary(), "No description available");
    }

    #[test]
    fn negative_numbers_are_dropped() {
        let listing = listing_from_raw(
            json!({"list_price": -5, "beds": "three"})
                .as_object()
                .cloned()
                .expect("object literal"),
        );
        assert_eq!(listing.price, None);
        assert_eq!(listing.beds, None);
    }
}
