//! Server-side search criteria.
//!
//! Changing any of these fields means a fresh search from offset 0; the
//! client-side text query is not part of the criteria.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::item::Coordinate;

/// Result ordering understood by the search API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortMode {
    BestMatched,
    Distance,
    HighestRated,
}

impl SortMode {
    /// Numeric wire value of the `sort` query parameter.
    #[must_use]
    pub fn wire_value(self) -> u8 {
        match self {
            SortMode::BestMatched => 0,
            SortMode::Distance => 1,
            SortMode::HighestRated => 2,
        }
    }
}

impl fmt::Display for SortMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortMode::BestMatched => write!(f, "best_matched"),
            SortMode::Distance => write!(f, "distance"),
            SortMode::HighestRated => write!(f, "highest_rated"),
        }
    }
}

impl FromStr for SortMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "best_matched" | "0" => Ok(SortMode::BestMatched),
            "distance" | "1" => Ok(SortMode::Distance),
            "highest_rated" | "2" => Ok(SortMode::HighestRated),
            other => Err(format!("unknown sort mode '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchCriteria {
    pub term: String,
    pub location: Coordinate,
    pub sort: Option<SortMode>,
    /// Category aliases, e.g. `["thai", "vietnamese"]`.
    pub categories: Vec<String>,
    pub deals_only: bool,
    pub radius_meters: Option<u32>,
}

impl SearchCriteria {
    #[must_use]
    pub fn new(term: impl Into<String>, location: Coordinate) -> Self {
        Self {
            term: term.into(),
            location,
            sort: None,
            categories: Vec::new(),
            deals_only: false,
            radius_meters: None,
        }
    }

    #[must_use]
    pub fn with_sort(mut self, sort: SortMode) -> Self {
        self.sort = Some(sort);
        self
    }

    #[must_use]
    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories = categories.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_deals_only(mut self, deals_only: bool) -> Self {
        self.deals_only = deals_only;
        self
    }

    #[must_use]
    pub fn with_radius_meters(mut self, radius_meters: u32) -> Self {
        self.radius_meters = Some(radius_meters);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_mode_wire_values_match_api() {
        assert_eq!(SortMode::BestMatched.wire_value(), 0);
        assert_eq!(SortMode::Distance.wire_value(), 1);
        assert_eq!(SortMode::HighestRated.wire_value(), 2);
    }

    #[test]
    fn sort_mode_parses_names_and_numbers() {
        assert_eq!("distance".parse::<SortMode>().unwrap(), SortMode::Distance);
        assert_eq!("2".parse::<SortMode>().unwrap(), SortMode::HighestRated);
        assert!("fastest".parse::<SortMode>().is_err());
    }

    #[test]
    fn builder_sets_every_filter() {
        let criteria = SearchCriteria::new("Restaurants", Coordinate::new(1.0, 2.0))
            .with_sort(SortMode::Distance)
            .with_categories(["thai", "sushi"])
            .with_deals_only(true)
            .with_radius_meters(1600);
        assert_eq!(criteria.sort, Some(SortMode::Distance));
        assert_eq!(criteria.categories, vec!["thai", "sushi"]);
        assert!(criteria.deals_only);
        assert_eq!(criteria.radius_meters, Some(1600));
    }
}
