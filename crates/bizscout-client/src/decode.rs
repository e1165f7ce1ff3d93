//! Validated decode of raw listing JSON into domain types.
//!
//! Listings are decoded one at a time. A listing missing its id, name or
//! coordinate is dropped with a warning and the rest of the page survives;
//! a missing coordinate is never defaulted to `(0, 0)`.

use bizscout_core::{format_distance_miles, Coordinate, Item, ItemId, Review, SearchPage};
use chrono::DateTime;
use thiserror::Error;

use crate::types::{RawBusiness, RawLocation, RawReview, SearchResponse};

#[derive(Debug, Error, PartialEq)]
pub enum DecodeError {
    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    #[error("invalid field `{field}`: {reason}")]
    InvalidField { field: &'static str, reason: String },

    /// The listing is not an object of the expected shape at all.
    #[error("malformed listing: {0}")]
    Malformed(String),
}

/// Decodes a `search` response body, dropping listings that fail to decode.
///
/// `raw_count` on the returned page counts every listing the API sent,
/// including dropped ones.
#[must_use]
pub fn decode_page(response: SearchResponse) -> SearchPage {
    let raw_count = response.businesses.len();
    let mut items = Vec::with_capacity(raw_count);

    for (index, value) in response.businesses.into_iter().enumerate() {
        let listing_id = value
            .get("id")
            .and_then(serde_json::Value::as_str)
            .map(str::to_owned);
        match decode_business(value) {
            Ok(item) => items.push(item),
            Err(error) => {
                tracing::warn!(
                    index,
                    listing_id = listing_id.as_deref().unwrap_or("<none>"),
                    %error,
                    "dropping malformed listing"
                );
            }
        }
    }

    SearchPage {
        items,
        raw_count,
        total: response.total,
    }
}

/// Decodes one raw listing object.
///
/// # Errors
///
/// - [`DecodeError::Malformed`] if the value is not a listing object.
/// - [`DecodeError::MissingField`] if `id`, `name` or the coordinate is absent.
/// - [`DecodeError::InvalidField`] if the coordinate is out of range.
pub fn decode_business(value: serde_json::Value) -> Result<Item, DecodeError> {
    let raw: RawBusiness =
        serde_json::from_value(value).map_err(|e| DecodeError::Malformed(e.to_string()))?;

    let id = non_blank(raw.id).ok_or(DecodeError::MissingField("id"))?;
    let name = non_blank(raw.name).ok_or(DecodeError::MissingField("name"))?;
    let location = raw.location.unwrap_or_default();
    let coordinate = decode_coordinate(&location)?;

    Ok(Item {
        id: ItemId::new(id),
        name,
        coordinate,
        address: compose_address(&location),
        image_url: non_blank(raw.image_url),
        categories: raw.categories.as_deref().and_then(join_categories),
        distance: raw.distance.map(format_distance_miles),
        rating_image_url: non_blank(raw.rating_img_url_large),
        review_count: raw.review_count,
    })
}

/// Decodes one raw review object.
///
/// # Errors
///
/// - [`DecodeError::Malformed`] if the value is not a review object.
/// - [`DecodeError::MissingField`] if `rating` is absent.
/// - [`DecodeError::InvalidField`] if `time_created` is not a valid timestamp.
pub fn decode_review(value: serde_json::Value) -> Result<Review, DecodeError> {
    let raw: RawReview =
        serde_json::from_value(value).map_err(|e| DecodeError::Malformed(e.to_string()))?;

    let rating = raw.rating.ok_or(DecodeError::MissingField("rating"))?;
    let created_at = raw
        .time_created
        .map(|secs| {
            DateTime::from_timestamp(secs, 0).ok_or_else(|| DecodeError::InvalidField {
                field: "time_created",
                reason: format!("{secs} is out of range"),
            })
        })
        .transpose()?;

    Ok(Review {
        id: non_blank(raw.id),
        rating,
        excerpt: raw.excerpt.unwrap_or_default(),
        user_name: raw
            .user
            .and_then(|u| non_blank(u.name))
            .unwrap_or_else(|| "Anonymous".to_string()),
        created_at,
    })
}

fn decode_coordinate(location: &RawLocation) -> Result<Coordinate, DecodeError> {
    let raw = location
        .coordinate
        .as_ref()
        .ok_or(DecodeError::MissingField("location.coordinate"))?;
    let latitude = degrees(raw.latitude.as_ref(), "location.coordinate.latitude")?;
    let longitude = degrees(raw.longitude.as_ref(), "location.coordinate.longitude")?;

    let coordinate = Coordinate::new(latitude, longitude);
    if !coordinate.is_valid() {
        return Err(DecodeError::InvalidField {
            field: "location.coordinate",
            reason: format!("out of range: {coordinate}"),
        });
    }
    Ok(coordinate)
}

fn degrees(value: Option<&serde_json::Value>, field: &'static str) -> Result<f64, DecodeError> {
    match value {
        None | Some(serde_json::Value::Null) => Err(DecodeError::MissingField(field)),
        Some(value) => value.as_f64().ok_or_else(|| DecodeError::InvalidField {
            field,
            reason: format!("expected a number, got {value}"),
        }),
    }
}

/// First street line, then the first neighborhood, joined with `", "`.
fn compose_address(location: &RawLocation) -> Option<String> {
    let street = location
        .address
        .iter()
        .flatten()
        .next()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty());
    let neighborhood = location
        .neighborhoods
        .iter()
        .flatten()
        .next()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty());

    match (street, neighborhood) {
        (Some(street), Some(hood)) => Some(format!("{street}, {hood}")),
        (Some(only), None) | (None, Some(only)) => Some(only.to_string()),
        (None, None) => None,
    }
}

fn join_categories(categories: &[Vec<String>]) -> Option<String> {
    let names: Vec<&str> = categories
        .iter()
        .filter_map(|pair| pair.first())
        .map(|name| name.trim())
        .filter(|name| !name.is_empty())
        .collect();
    if names.is_empty() {
        None
    } else {
        Some(names.join(", "))
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
#[path = "decode_test.rs"]
mod tests;
