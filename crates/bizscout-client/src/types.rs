//! Wire types for the listing search API.
//!
//! Listing and review fields are all optional here: the API omits fields
//! freely, sends `null`, and a single bad field must not sink the listing.
//! Optional members go through [`lenient`], which reads a `null` or mistyped
//! value as absent. [`crate::decode`] then enforces the required fields and
//! turns these into validated [`bizscout_core::Item`]s and
//! [`bizscout_core::Review`]s.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};

/// Body of a `search` response. Listings stay as raw JSON so that each one
/// can be decoded (and rejected) on its own.
#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    #[serde(default, deserialize_with = "lenient")]
    pub total: Option<u32>,
    pub businesses: Vec<serde_json::Value>,
}

/// Body of a `business/{id}` response; only the reviews are read.
#[derive(Debug, Deserialize)]
pub struct BusinessResponse {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub reviews: Vec<serde_json::Value>,
}

/// The object form of an `{"error": {...}}` member.
#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawBusiness {
    #[serde(default, deserialize_with = "lenient")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub image_url: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub location: Option<RawLocation>,
    /// `[["Thai", "thai"], ["Bars", "bars"]]`: display name, then alias.
    #[serde(default, deserialize_with = "lenient")]
    pub categories: Option<Vec<Vec<String>>>,
    /// Meters from the search center.
    #[serde(default, deserialize_with = "lenient")]
    pub distance: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub rating_img_url_large: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub review_count: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawLocation {
    #[serde(default, deserialize_with = "lenient")]
    pub address: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient")]
    pub neighborhoods: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient")]
    pub coordinate: Option<RawCoordinate>,
}

/// Kept as raw JSON so a non-numeric value is reported as an invalid field
/// rather than a missing one.
#[derive(Debug, Default, Deserialize)]
pub struct RawCoordinate {
    #[serde(default)]
    pub latitude: Option<serde_json::Value>,
    #[serde(default)]
    pub longitude: Option<serde_json::Value>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawReview {
    #[serde(default, deserialize_with = "lenient")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub rating: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub excerpt: Option<String>,
    /// Unix seconds.
    #[serde(default, deserialize_with = "lenient")]
    pub time_created: Option<i64>,
    #[serde(default, deserialize_with = "lenient")]
    pub user: Option<RawUser>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawUser {
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,
}

/// Reads an optional member, mapping `null` and values of the wrong type to
/// `None`.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| serde_json::from_value(v).ok()))
}
