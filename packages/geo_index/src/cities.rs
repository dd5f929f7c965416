//! Compile-time registry of the cities a session can start in.
//!
//! The list lives in `cities/cities.toml` and is embedded into the binary
//! with [`include_str!`]. A city's id is also the [`PlaceId`] its palette
//! history is filed under.

use color_world_models::{Coordinate, PlaceId};
use serde::Deserialize;

/// A city the viewport can be centered on.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct City {
    /// Stable numeric id.
    pub id: u32,
    /// Display name.
    pub name: String,
    /// Latitude of the city center.
    pub latitude: f64,
    /// Longitude of the city center.
    pub longitude: f64,
}

impl City {
    /// The history buffer this city's colors are collected into.
    #[must_use]
    pub const fn place_id(&self) -> PlaceId {
        PlaceId(self.id)
    }

    /// The city center as a coordinate.
    #[must_use]
    pub const fn center(&self) -> Coordinate {
        Coordinate::new(self.longitude, self.latitude)
    }
}

#[derive(Deserialize)]
struct CityRegistry {
    city: Vec<City>,
}

const CITIES_TOML: &str = include_str!("../cities/cities.toml");

#[cfg(test)]
const EXPECTED_CITY_COUNT: usize = 6;

/// Returns all configured cities in file order.
///
/// # Panics
///
/// Panics if the embedded TOML is malformed (a compile-time guarantee since
/// the file is embedded).
#[must_use]
pub fn all_cities() -> Vec<City> {
    toml::de::from_str::<CityRegistry>(CITIES_TOML)
        .unwrap_or_else(|e| panic!("Failed to parse cities.toml: {e}"))
        .city
}

/// Looks up a city by id.
#[must_use]
pub fn city_by_id(id: u32) -> Option<City> {
    all_cities().into_iter().find(|c| c.id == id)
}

/// Looks up a city by name, ignoring ASCII case.
#[must_use]
pub fn city_by_name(name: &str) -> Option<City> {
    all_cities()
        .into_iter()
        .find(|c| c.name.eq_ignore_ascii_case(name.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn loads_all_cities() {
        assert_eq!(all_cities().len(), EXPECTED_CITY_COUNT);
    }

    #[test]
    fn city_ids_are_unique() {
        let mut seen = BTreeSet::new();
        for city in &all_cities() {
            assert!(seen.insert(city.id), "Duplicate city id: {}", city.id);
        }
    }

    #[test]
    fn all_centers_are_valid() {
        for city in &all_cities() {
            assert!(city.center().is_valid(), "{} has an invalid center", city.name);
        }
    }

    #[test]
    fn finds_city_by_name_case_insensitively() {
        let city = city_by_name("san francisco").unwrap();
        assert_eq!(city.place_id(), PlaceId(0));
    }

    #[test]
    fn unknown_city_is_none() {
        assert!(city_by_id(999).is_none());
        assert!(city_by_name("Atlantis").is_none());
    }
}
