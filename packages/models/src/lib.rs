#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Shared value types for the color world installation.
//!
//! Every other package speaks in these types: geographic [`Coordinate`]s and
//! their string [`CoordinateKey`]s (the join key for metadata and elevation
//! tables), projected [`ScreenPoint`]s, [`SampledColor`]s and the
//! [`HistoryEntry`] records that accumulate in a place's palette.

pub mod color;
pub mod tween;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

pub use color::SampledColor;

/// Number of decimal places used when formatting a [`CoordinateKey`].
pub const KEY_PRECISION: usize = 6;

/// A WGS84 position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Longitude in degrees.
    pub longitude: f64,
    /// Latitude in degrees.
    pub latitude: f64,
}

impl Coordinate {
    /// Creates a coordinate from a longitude/latitude pair.
    #[must_use]
    pub const fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
        }
    }

    /// Formats this coordinate as its `"lon,lat"` join key.
    ///
    /// Both components are printed with [`KEY_PRECISION`] decimals, and
    /// negative zero is folded into zero so the same point always yields the
    /// same key.
    #[must_use]
    pub fn key(&self) -> CoordinateKey {
        CoordinateKey(format!(
            "{:.prec$},{:.prec$}",
            self.longitude + 0.0,
            self.latitude + 0.0,
            prec = KEY_PRECISION
        ))
    }

    /// Returns `true` if both components are finite and inside the WGS84
    /// ranges.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.longitude.is_finite()
            && self.latitude.is_finite()
            && (-180.0..=180.0).contains(&self.longitude)
            && (-90.0..=90.0).contains(&self.latitude)
    }

    /// Returns this coordinate shifted by the given deltas.
    #[must_use]
    pub fn offset(&self, d_lat: f64, d_lon: f64) -> Self {
        Self::new(self.longitude + d_lon, self.latitude + d_lat)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.longitude, self.latitude)
    }
}

/// Error returned when a `"lon,lat"` string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseCoordinateError {
    /// The offending input.
    pub input: String,
}

impl fmt::Display for ParseCoordinateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid coordinate '{}': expected \"lon,lat\"", self.input)
    }
}

impl std::error::Error for ParseCoordinateError {}

impl FromStr for Coordinate {
    type Err = ParseCoordinateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseCoordinateError {
            input: s.to_string(),
        };

        let (lon, lat) = s.split_once(',').ok_or_else(err)?;
        let longitude = lon.trim().parse::<f64>().map_err(|_| err())?;
        let latitude = lat.trim().parse::<f64>().map_err(|_| err())?;

        Ok(Self::new(longitude, latitude))
    }
}

/// The string identity of a [`Coordinate`], used to join against the
/// metadata and elevation tables.
///
/// Only constructible through [`Coordinate::key`] or by parsing, so every
/// key in the system shares one format.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CoordinateKey(String);

impl CoordinateKey {
    /// Returns the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parses the key back into the coordinate it was formatted from.
    ///
    /// # Panics
    ///
    /// Never: keys are only built from valid coordinates.
    #[must_use]
    pub fn coordinate(&self) -> Coordinate {
        self.0
            .parse()
            .unwrap_or_else(|e| panic!("CoordinateKey holds an unparsable value: {e}"))
    }
}

impl FromStr for CoordinateKey {
    type Err = ParseCoordinateError;

    /// Parses any `"lon,lat"` string and re-formats it, so keys written with
    /// a different precision still join against load-time keys.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(s.parse::<Coordinate>()?.key())
    }
}

impl TryFrom<String> for CoordinateKey {
    type Error = ParseCoordinateError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CoordinateKey> for String {
    fn from(value: CoordinateKey) -> Self {
        value.0
    }
}

impl fmt::Display for CoordinateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A position in map screen space (pixels).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenPoint {
    /// Horizontal pixel offset.
    pub x: f64,
    /// Vertical pixel offset (grows downward).
    pub y: f64,
}

impl ScreenPoint {
    /// Creates a screen point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another screen point.
    #[must_use]
    pub fn distance(&self, other: &Self) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Street-level metadata for one sample coordinate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceMetadata {
    /// Street name (may be empty).
    pub street: String,
    /// City name (may be empty).
    pub city: String,
}

/// Identifier of a place (city) whose colors share one history buffer.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct PlaceId(pub u32);

impl fmt::Display for PlaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "place-{}", self.0)
    }
}

/// One sample in a place's palette history.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// The normalized sampled color.
    pub color: SampledColor,
    /// Where the color was sampled.
    pub location: Coordinate,
    /// Auxiliary scalar (hand depth remapped) used for bar heights and
    /// playback.
    pub height_metric: f32,
}

/// How the color sampler resolves a color.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SampleMode {
    /// Fetch a street-level image from the remote image service.
    #[default]
    Remote,
    /// Reuse a precomputed image from the local cache.
    Local,
}

/// Which input device drives navigation.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum InputMode {
    /// Mouse pointer in window coordinates.
    Pointer,
    /// Hand-tracking controller palm position.
    #[default]
    Hand,
}

/// Half-extent of the viewport window in longitude degrees.
pub const DEFAULT_HALF_WIDTH: f64 = 0.01;
/// Half-extent of the viewport window in latitude degrees, before padding.
pub const DEFAULT_HALF_HEIGHT: f64 = 0.01;
/// Extra latitude added on both sides of the window.
pub const DEFAULT_VERTICAL_PADDING: f64 = 0.004;

/// The rectangular geographic window considered visible.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Window center.
    pub center: Coordinate,
    /// Longitude half-extent.
    pub half_width: f64,
    /// Latitude half-extent, before padding.
    pub half_height: f64,
    /// Latitude padding added to `half_height` on both sides.
    pub vertical_padding: f64,
}

impl Viewport {
    /// Creates a viewport with the default extents around `center`.
    #[must_use]
    pub const fn centered_on(center: Coordinate) -> Self {
        Self {
            center,
            half_width: DEFAULT_HALF_WIDTH,
            half_height: DEFAULT_HALF_HEIGHT,
            vertical_padding: DEFAULT_VERTICAL_PADDING,
        }
    }

    /// Returns `true` if `coordinate` falls inside the half-open window.
    ///
    /// Lower bounds are inclusive and upper bounds exclusive on both axes.
    /// The latitude extent is widened by `vertical_padding`, making the
    /// window taller than it is wide.
    #[must_use]
    pub fn contains(&self, coordinate: &Coordinate) -> bool {
        let lon_min = self.center.longitude - self.half_width;
        let lon_max = self.center.longitude + self.half_width;
        let lat_extent = self.half_height + self.vertical_padding;
        let lat_min = self.center.latitude - lat_extent;
        let lat_max = self.center.latitude + lat_extent;

        coordinate.longitude >= lon_min
            && coordinate.longitude < lon_max
            && coordinate.latitude >= lat_min
            && coordinate.latitude < lat_max
    }

    /// Moves the center by the given deltas.
    pub fn pan(&mut self, d_lat: f64, d_lon: f64) {
        self.center = self.center.offset(d_lat, d_lon);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_uses_fixed_precision() {
        let key = Coordinate::new(-122.41942, 37.774_930).key();
        assert_eq!(key.as_str(), "-122.419420,37.774930");
    }

    #[test]
    fn key_folds_negative_zero() {
        assert_eq!(Coordinate::new(-0.0, 0.0).key().as_str(), "0.000000,0.000000");
    }

    #[test]
    fn key_parses_other_precisions_to_same_key() {
        let loose: CoordinateKey = "-122.41942,37.77493".parse().unwrap();
        assert_eq!(loose, Coordinate::new(-122.41942, 37.77493).key());
    }

    #[test]
    fn key_round_trips_to_coordinate() {
        let coord = Coordinate::new(126.978, 37.5665);
        let back = coord.key().coordinate();
        assert!((back.longitude - coord.longitude).abs() < 1e-9);
        assert!((back.latitude - coord.latitude).abs() < 1e-9);
    }

    #[test]
    fn rejects_malformed_coordinate() {
        assert!("abc".parse::<Coordinate>().is_err());
        assert!("1.0;2.0".parse::<Coordinate>().is_err());
        assert!("1.0,".parse::<Coordinate>().is_err());
    }

    #[test]
    fn validity_checks_ranges() {
        assert!(Coordinate::new(-122.4, 37.7).is_valid());
        assert!(!Coordinate::new(200.0, 0.0).is_valid());
        assert!(!Coordinate::new(0.0, f64::NAN).is_valid());
    }

    #[test]
    fn viewport_is_half_open_and_taller_than_wide() {
        let viewport = Viewport::centered_on(Coordinate::new(0.0, 0.0));

        assert!(viewport.contains(&Coordinate::new(-0.01, 0.0)));
        assert!(!viewport.contains(&Coordinate::new(0.01, 0.0)));

        assert!(viewport.contains(&Coordinate::new(0.0, -0.0139)));
        assert!(viewport.contains(&Coordinate::new(0.0, 0.0139)));
        assert!(!viewport.contains(&Coordinate::new(0.0, 0.0141)));
        assert!(!viewport.contains(&Coordinate::new(0.0, -0.0141)));
    }

    #[test]
    fn pan_moves_center() {
        let mut viewport = Viewport::centered_on(Coordinate::new(10.0, 20.0));
        viewport.pan(0.5, -0.25);
        assert!((viewport.center.latitude - 20.5).abs() < 1e-12);
        assert!((viewport.center.longitude - 9.75).abs() < 1e-12);
    }

    #[test]
    fn modes_parse_from_snake_case() {
        assert_eq!("local".parse::<SampleMode>().unwrap(), SampleMode::Local);
        assert_eq!("pointer".parse::<InputMode>().unwrap(), InputMode::Pointer);
        assert_eq!(SampleMode::Remote.to_string(), "remote");
    }

    #[test]
    fn screen_distance_is_euclidean() {
        let a = ScreenPoint::new(0.0, 0.0);
        let b = ScreenPoint::new(3.0, 4.0);
        assert!((a.distance(&b) - 5.0).abs() < 1e-12);
    }
}
