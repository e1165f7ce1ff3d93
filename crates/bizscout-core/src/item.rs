//! Listing records as the rest of the workspace sees them.
//!
//! An [`Item`] is built once by the response decoder and never mutated
//! afterwards; the session shares them behind `Arc`. Identity is the
//! [`ItemId`] alone, so two decodes of the same listing compare equal by id
//! even if their descriptive fields drifted between pages.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Meters to statute miles.
const MILES_PER_METER: f64 = 0.000_621_371;

/// Stable provider-assigned listing identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// WGS84 point in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    #[must_use]
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Both components are finite and inside the valid degree ranges.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.latitude, self.longitude)
    }
}

/// Parses the `"lat,lng"` form used by the search API's `ll` parameter.
impl FromStr for Coordinate {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (lat, lng) = s
            .split_once(',')
            .ok_or_else(|| format!("expected 'lat,lng', got '{s}'"))?;
        let latitude = lat
            .trim()
            .parse::<f64>()
            .map_err(|e| format!("invalid latitude '{}': {e}", lat.trim()))?;
        let longitude = lng
            .trim()
            .parse::<f64>()
            .map_err(|e| format!("invalid longitude '{}': {e}", lng.trim()))?;
        let coordinate = Self::new(latitude, longitude);
        if !coordinate.is_valid() {
            return Err(format!("coordinate out of range: {coordinate}"));
        }
        Ok(coordinate)
    }
}

/// A single business listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    /// Display name; the text query matches against this.
    pub name: String,
    pub coordinate: Coordinate,
    /// Street line and neighborhood, e.g. `"1 Market St, Financial District"`.
    pub address: Option<String>,
    pub image_url: Option<String>,
    /// Category display names joined with `", "`.
    pub categories: Option<String>,
    /// Pre-rendered distance from the search center, e.g. `"0.93 mi"`.
    pub distance: Option<String>,
    pub rating_image_url: Option<String>,
    pub review_count: Option<u32>,
}

impl Item {
    /// Creates an item carrying only the required fields.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, coordinate: Coordinate) -> Self {
        Self {
            id: ItemId::new(id),
            name: name.into(),
            coordinate,
            address: None,
            image_url: None,
            categories: None,
            distance: None,
            rating_image_url: None,
            review_count: None,
        }
    }

    /// Case-insensitive substring match against the display name.
    ///
    /// `needle_lower` must already be lowercased; callers filtering a whole
    /// list lowercase the query once.
    #[must_use]
    pub fn name_contains(&self, needle_lower: &str) -> bool {
        self.name.to_lowercase().contains(needle_lower)
    }
}

impl PartialEq for Item {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Item {}

impl std::hash::Hash for Item {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// A user review of a single listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub id: Option<String>,
    pub rating: f64,
    pub excerpt: String,
    pub user_name: String,
    pub created_at: Option<DateTime<Utc>>,
}

/// Renders a distance in meters as miles with two decimals.
#[must_use]
pub fn format_distance_miles(meters: f64) -> String {
    format!("{:.2} mi", meters * MILES_PER_METER)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_lat_lng_pair() {
        let c: Coordinate = "37.7838,-122.3875".parse().unwrap();
        assert!((c.latitude - 37.7838).abs() < f64::EPSILON);
        assert!((c.longitude + 122.3875).abs() < f64::EPSILON);
    }

    #[test]
    fn parse_tolerates_spaces_around_components() {
        let c: Coordinate = " 40.7 , -74.0 ".parse().unwrap();
        assert!((c.latitude - 40.7).abs() < f64::EPSILON);
    }

    #[test]
    fn parse_rejects_missing_comma() {
        assert!("37.7838".parse::<Coordinate>().is_err());
    }

    #[test]
    fn parse_rejects_out_of_range_latitude() {
        let err = "91.0,0.0".parse::<Coordinate>().unwrap_err();
        assert!(err.contains("out of range"), "got: {err}");
    }

    #[test]
    fn display_round_trips_through_ll_form() {
        let c = Coordinate::new(1.5, -2.25);
        assert_eq!(c.to_string(), "1.5,-2.25");
    }

    #[test]
    fn formats_distance_in_miles() {
        assert_eq!(format_distance_miles(1500.0), "0.93 mi");
        assert_eq!(format_distance_miles(0.0), "0.00 mi");
    }

    #[test]
    fn name_match_is_case_insensitive() {
        let item = Item::new("cafe-roma", "Cafe ROMA", Coordinate::new(0.0, 0.0));
        assert!(item.name_contains("roma"));
        assert!(!item.name_contains("sushi"));
    }

    #[test]
    fn items_with_same_id_are_equal() {
        let first = Item::new("cafe-roma-sf", "Cafe Roma", Coordinate::new(37.78, -122.39));
        let mut later = first.clone();
        later.review_count = Some(213);
        later.distance = Some("0.94 mi".to_string());
        assert_eq!(first, later);

        let other = Item::new("roma-pizza", "Cafe Roma", first.coordinate);
        assert_ne!(first, other);

        let set: std::collections::HashSet<Item> = [first, later].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn item_id_serializes_as_plain_string() {
        let json = serde_json::to_string(&ItemId::new("abc")).unwrap();
        assert_eq!(json, "\"abc\"");
    }
}
