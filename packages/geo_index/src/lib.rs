#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! In-memory index of the geo-tagged sample points.
//!
//! Loaded once at startup from a CSV of `longitude,latitude,street,city`
//! records and an optional JSON elevation table keyed by coordinate key.
//! After loading the index is read-only: the frame loop iterates
//! [`GeoIndex::all_coordinates`] in load order and joins against the
//! metadata and elevation tables through [`CoordinateKey`]s.

pub mod cities;
pub mod progress;

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::io::Read;
use std::path::Path;

use color_world_models::{Coordinate, CoordinateKey, PlaceMetadata};
use serde::Deserialize;

use crate::progress::ProgressCallback;

/// Errors that abort loading. No partial index is ever returned.
#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    /// I/O error (file open/read).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV parsing failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON parsing failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A record lacks a required field.
    #[error("Record {record}: missing required field '{field}'")]
    MissingField {
        /// 1-based record number (excluding the header row).
        record: usize,
        /// Name of the missing column.
        field: &'static str,
    },

    /// A record's coordinate is outside the WGS84 ranges.
    #[error("Record {record}: invalid coordinate {coordinate}")]
    InvalidCoordinate {
        /// 1-based record number (excluding the header row).
        record: usize,
        /// The rejected coordinate.
        coordinate: Coordinate,
    },

    /// An elevation table key is not a `"lon,lat"` pair.
    #[error("Invalid elevation key '{key}'")]
    InvalidKey {
        /// The offending key.
        key: String,
    },

    /// Two elevation table keys name the same coordinate with different
    /// elevations.
    #[error("Elevation key '{key}' collides with '{existing}' ({first} m vs {second} m)")]
    ConflictingElevation {
        /// The normalized coordinate key both entries map to.
        existing: String,
        /// The raw key of the conflicting entry.
        key: String,
        /// Elevation already recorded for the coordinate.
        first: f64,
        /// Elevation of the conflicting entry.
        second: f64,
    },
}

/// One row of the sample CSV.
#[derive(Debug, Deserialize)]
struct RawRecord {
    longitude: Option<f64>,
    latitude: Option<f64>,
    #[serde(default)]
    street: Option<String>,
    #[serde(default)]
    city: Option<String>,
}

/// The loaded sample points and their lookup tables.
#[derive(Debug, Clone, Default)]
pub struct GeoIndex {
    coordinates: Vec<Coordinate>,
    metadata: HashMap<CoordinateKey, PlaceMetadata>,
    elevations: HashMap<CoordinateKey, f64>,
}

impl GeoIndex {
    /// Builds an index from a CSV stream with a header row containing at
    /// least `longitude` and `latitude` (`street` and `city` are optional).
    ///
    /// Duplicate coordinates (same key) keep their first record; later
    /// duplicates are skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns [`DataLoadError`] if the stream is not valid CSV, a record
    /// lacks a coordinate component, or a coordinate is out of range.
    pub fn load<R: Read>(
        reader: R,
        progress: &dyn ProgressCallback,
    ) -> Result<Self, DataLoadError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        let mut index = Self::default();
        let mut duplicates = 0usize;

        progress.set_message("Reading sample points".to_string());

        for (i, result) in csv_reader.deserialize::<RawRecord>().enumerate() {
            let record_number = i + 1;
            let raw = result?;

            let longitude = raw.longitude.ok_or(DataLoadError::MissingField {
                record: record_number,
                field: "longitude",
            })?;
            let latitude = raw.latitude.ok_or(DataLoadError::MissingField {
                record: record_number,
                field: "latitude",
            })?;

            let coordinate = Coordinate::new(longitude, latitude);
            if !coordinate.is_valid() {
                return Err(DataLoadError::InvalidCoordinate {
                    record: record_number,
                    coordinate,
                });
            }

            match index.metadata.entry(coordinate.key()) {
                Entry::Occupied(_) => {
                    duplicates += 1;
                    log::debug!("Skipping duplicate coordinate {coordinate} (record {record_number})");
                }
                Entry::Vacant(slot) => {
                    slot.insert(PlaceMetadata {
                        street: raw.street.unwrap_or_default(),
                        city: raw.city.unwrap_or_default(),
                    });
                    index.coordinates.push(coordinate);
                }
            }

            progress.inc(1);
        }

        if duplicates > 0 {
            log::warn!("Skipped {duplicates} duplicate coordinates while loading samples");
        }

        progress.finish(format!("Loaded {} sample points", index.coordinates.len()));
        log::info!("Loaded {} sample points into geo index", index.coordinates.len());

        Ok(index)
    }

    /// Loads the sample CSV at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`DataLoadError`] if the file cannot be opened or parsed.
    pub fn load_path(path: &Path, progress: &dyn ProgressCallback) -> Result<Self, DataLoadError> {
        log::info!("Loading sample points from {}", path.display());
        let file = std::fs::File::open(path)?;
        Self::load(file, progress)
    }

    /// Attaches an elevation table read from a JSON object mapping
    /// `"lon,lat"` keys to meters.
    ///
    /// Keys are re-normalized through [`CoordinateKey`] parsing, so tables
    /// written with a different decimal precision still join. Raw keys that
    /// normalize to the same coordinate must agree on the elevation.
    ///
    /// # Errors
    ///
    /// Returns [`DataLoadError`] if the JSON is malformed, a key is not a
    /// coordinate pair, or two keys for one coordinate disagree.
    pub fn with_elevations<R: Read>(mut self, reader: R) -> Result<Self, DataLoadError> {
        let raw: HashMap<String, f64> = serde_json::from_reader(reader)?;

        let mut elevations = HashMap::with_capacity(raw.len());
        for (key, meters) in raw {
            let parsed: CoordinateKey = key
                .parse()
                .map_err(|_| DataLoadError::InvalidKey { key: key.clone() })?;
            match elevations.entry(parsed) {
                Entry::Vacant(entry) => {
                    entry.insert(meters);
                }
                Entry::Occupied(entry) => {
                    let first = *entry.get();
                    if first.to_bits() != meters.to_bits() {
                        return Err(DataLoadError::ConflictingElevation {
                            existing: entry.key().as_str().to_string(),
                            key,
                            first,
                            second: meters,
                        });
                    }
                }
            }
        }

        let unmatched = elevations
            .keys()
            .filter(|key| !self.metadata.contains_key(*key))
            .count();
        if unmatched > 0 {
            log::debug!("{unmatched} elevation keys have no matching sample point");
        }

        log::info!("Loaded {} elevation samples", elevations.len());
        self.elevations = elevations;
        Ok(self)
    }

    /// Attaches the elevation table at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`DataLoadError`] if the file cannot be opened or parsed.
    pub fn with_elevations_path(self, path: &Path) -> Result<Self, DataLoadError> {
        log::info!("Loading elevations from {}", path.display());
        let file = std::fs::File::open(path)?;
        self.with_elevations(std::io::BufReader::new(file))
    }

    /// All sample coordinates in load order.
    #[must_use]
    pub fn all_coordinates(&self) -> &[Coordinate] {
        &self.coordinates
    }

    /// Street and city for a coordinate key.
    #[must_use]
    pub fn metadata_for(&self, key: &CoordinateKey) -> Option<&PlaceMetadata> {
        self.metadata.get(key)
    }

    /// Elevation in meters for a coordinate key.
    #[must_use]
    pub fn elevation_for(&self, key: &CoordinateKey) -> Option<f64> {
        self.elevations.get(key).copied()
    }

    /// Street name for a key, or `""` when the key is unknown.
    #[must_use]
    pub fn street_or_empty(&self, key: &CoordinateKey) -> &str {
        self.metadata_for(key).map_or("", |m| m.street.as_str())
    }

    /// City name for a key, or `""` when the key is unknown.
    #[must_use]
    pub fn city_or_empty(&self, key: &CoordinateKey) -> &str {
        self.metadata_for(key).map_or("", |m| m.city.as_str())
    }

    /// Elevation for a key, or `0.0` when the key is unknown.
    #[must_use]
    pub fn elevation_or_zero(&self, key: &CoordinateKey) -> f64 {
        self.elevation_for(key).unwrap_or(0.0)
    }

    /// Number of sample points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.coordinates.len()
    }

    /// `true` if no sample points were loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.coordinates.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::NullProgress;

    const SAMPLES: &str = "\
longitude,latitude,street,city
-122.41942,37.774930,Market St,San Francisco
-122.4180,37.7755,Mission St,San Francisco
-122.4100,37.7800,,San Francisco
";

    fn load(csv: &str) -> Result<GeoIndex, DataLoadError> {
        GeoIndex::load(csv.as_bytes(), &NullProgress)
    }

    #[test]
    fn preserves_load_order() {
        let index = load(SAMPLES).unwrap();
        let coords = index.all_coordinates();
        assert_eq!(coords.len(), 3);
        assert!((coords[0].longitude - -122.41942).abs() < 1e-9);
        assert!((coords[2].latitude - 37.78).abs() < 1e-9);
    }

    #[test]
    fn formatted_key_matches_load_time_key() {
        let index = load(SAMPLES).unwrap();
        let key = Coordinate::new(-122.41942, 37.774_930).key();
        let meta = index.metadata_for(&key).unwrap();
        assert_eq!(meta.street, "Market St");
        assert_eq!(meta.city, "San Francisco");
    }

    #[test]
    fn every_loaded_coordinate_joins_by_key() {
        let index = load(SAMPLES).unwrap();
        for coord in index.all_coordinates() {
            assert!(index.metadata_for(&coord.key()).is_some());
        }
    }

    #[test]
    fn empty_street_is_allowed() {
        let index = load(SAMPLES).unwrap();
        let key = Coordinate::new(-122.41, 37.78).key();
        assert_eq!(index.street_or_empty(&key), "");
        assert_eq!(index.city_or_empty(&key), "San Francisco");
    }

    #[test]
    fn lookup_miss_uses_defaults() {
        let index = load(SAMPLES).unwrap();
        let key = Coordinate::new(0.0, 0.0).key();
        assert!(index.metadata_for(&key).is_none());
        assert_eq!(index.street_or_empty(&key), "");
        assert!(index.elevation_for(&key).is_none());
        assert!(index.elevation_or_zero(&key).abs() < f64::EPSILON);
    }

    #[test]
    fn missing_latitude_fails_whole_load() {
        let csv = "longitude,latitude,street,city\n-122.4,37.7,A,B\n-122.5,,C,D\n";
        let err = load(csv).unwrap_err();
        assert!(matches!(
            err,
            DataLoadError::MissingField {
                record: 2,
                field: "latitude"
            }
        ));
    }

    #[test]
    fn missing_longitude_column_fails() {
        let csv = "latitude,street\n37.7,A\n";
        assert!(matches!(
            load(csv).unwrap_err(),
            DataLoadError::MissingField {
                field: "longitude",
                ..
            }
        ));
    }

    #[test]
    fn malformed_number_fails() {
        let csv = "longitude,latitude\nabc,37.7\n";
        assert!(matches!(load(csv).unwrap_err(), DataLoadError::Csv(_)));
    }

    #[test]
    fn out_of_range_coordinate_fails() {
        let csv = "longitude,latitude\n-122.4,137.7\n";
        assert!(matches!(
            load(csv).unwrap_err(),
            DataLoadError::InvalidCoordinate { record: 1, .. }
        ));
    }

    #[test]
    fn duplicates_keep_first_record() {
        let csv = "longitude,latitude,street,city\n1.0,2.0,First,X\n1.0,2.0,Second,Y\n";
        let index = load(csv).unwrap();
        assert_eq!(index.len(), 1);
        let key = Coordinate::new(1.0, 2.0).key();
        assert_eq!(index.street_or_empty(&key), "First");
    }

    #[test]
    fn elevation_keys_are_normalized() {
        let index = load(SAMPLES)
            .unwrap()
            .with_elevations(r#"{"-122.41942,37.77493": 16.5}"#.as_bytes())
            .unwrap();
        let key = Coordinate::new(-122.41942, 37.774_93).key();
        assert!((index.elevation_or_zero(&key) - 16.5).abs() < f64::EPSILON);
    }

    #[test]
    fn bad_elevation_key_fails() {
        let err = load(SAMPLES)
            .unwrap()
            .with_elevations(r#"{"nowhere": 1.0}"#.as_bytes())
            .unwrap_err();
        assert!(matches!(err, DataLoadError::InvalidKey { .. }));
    }

    #[test]
    fn colliding_elevation_keys_with_different_values_fail() {
        let table = r#"{"1.0,2.0": 5.0, "1.000000,2.000000": 9.0}"#;
        for _ in 0..16 {
            let err = load(SAMPLES)
                .unwrap()
                .with_elevations(table.as_bytes())
                .unwrap_err();
            assert!(
                matches!(err, DataLoadError::ConflictingElevation { .. }),
                "{err}"
            );
        }
    }

    #[test]
    fn colliding_elevation_keys_with_equal_values_join() {
        let index = load(SAMPLES)
            .unwrap()
            .with_elevations(r#"{"1.0,2.0": 5.0, "1.000000,2.000000": 5.0}"#.as_bytes())
            .unwrap();
        let key = Coordinate::new(1.0, 2.0).key();
        assert!((index.elevation_or_zero(&key) - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_source_yields_empty_index() {
        let index = load("longitude,latitude\n").unwrap();
        assert!(index.is_empty());
    }
}
