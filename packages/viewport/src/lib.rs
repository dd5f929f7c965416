#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Per-frame selection of the sample points inside the viewport.
//!
//! [`select`] scans every point of the [`GeoIndex`], keeps those inside the
//! viewport window, projects them to screen space and attaches the
//! distance-based [`Falloff`] the renderer uses to fade points toward the
//! edge of the map. There is no incremental state: each frame rebuilds the
//! selection from scratch, so identical inputs always produce identical
//! output.

pub mod projection;

use color_world_geo_index::GeoIndex;
use color_world_models::tween::Remap;
use color_world_models::{Coordinate, CoordinateKey, ScreenPoint, Viewport};
use serde::{Deserialize, Serialize};

pub use projection::{MapProjection, WebMercator};

/// Street labels are attached to every n-th visible point.
pub const STREET_LABEL_STRIDE: usize = 200;

/// The city label is taken from every n-th visible point.
pub const CITY_LABEL_STRIDE: usize = 500;

/// The remap curves that turn screen distance and elevation into draw
/// parameters.
///
/// The domains are tuning constants with no derivation; they are kept
/// configurable rather than recomputed from the map size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FalloffCurves {
    /// Distance → point alpha.
    pub alpha: Remap,
    /// Distance → point radius.
    pub radius: Remap,
    /// Distance → point height above the map plane.
    pub height: Remap,
    /// Distance → street label alpha.
    pub label_alpha: Remap,
    /// Elevation (m) → extra height.
    pub elevation_offset: Remap,
    /// Elevation (m) → radius adjustment.
    pub elevation_radius: Remap,
}

impl Default for FalloffCurves {
    fn default() -> Self {
        Self {
            alpha: Remap::new(40.0, 280.0, 180.0, 0.0),
            radius: Remap::new(40.0, 280.0, 4.5, 0.5),
            height: Remap::new(40.0, 280.0, 15.0, 0.0),
            label_alpha: Remap::new(70.0, 280.0, 255.0, 0.0),
            elevation_offset: Remap::new(0.0, 280.0, -15.0, 50.0),
            elevation_radius: Remap::new(0.0, 280.0, 0.0, -1.5),
        }
    }
}

/// Draw parameters derived from a point's distance to the viewport center
/// and its elevation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Falloff {
    /// Point alpha.
    pub alpha: f64,
    /// Point radius.
    pub radius: f64,
    /// Height above the map plane.
    pub height: f64,
    /// Street label alpha.
    pub label_alpha: f64,
    /// Elevation-derived extra height.
    pub elevation_offset: f64,
    /// Elevation-derived radius adjustment.
    pub elevation_radius: f64,
}

impl Falloff {
    /// Total height: distance height plus elevation offset.
    #[must_use]
    pub fn total_height(&self) -> f64 {
        self.height + self.elevation_offset
    }

    /// Total radius: distance radius plus elevation adjustment.
    #[must_use]
    pub fn total_radius(&self) -> f64 {
        self.radius + self.elevation_radius
    }
}

impl FalloffCurves {
    /// Evaluates every curve for a point `distance` pixels from the center
    /// at `elevation` meters.
    #[must_use]
    pub fn evaluate(&self, distance: f64, elevation: f64) -> Falloff {
        Falloff {
            alpha: self.alpha.ease(distance),
            radius: self.radius.ease(distance),
            height: self.height.ease(distance),
            label_alpha: self.label_alpha.ease(distance),
            elevation_offset: self.elevation_offset.ease(elevation),
            elevation_radius: self.elevation_radius.ease(elevation),
        }
    }
}

/// A sample point inside the viewport.
#[derive(Debug, Clone, PartialEq)]
pub struct VisiblePoint {
    /// Geographic position.
    pub coordinate: Coordinate,
    /// Join key for metadata lookups.
    pub key: CoordinateKey,
    /// Projected position.
    pub screen: ScreenPoint,
    /// Screen distance to the projected viewport center.
    pub distance: f64,
    /// Elevation in meters (zero when unknown).
    pub elevation: f64,
    /// Draw parameters.
    pub falloff: Falloff,
}

/// The result of one frame's selection.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    /// Where the viewport center projects.
    pub center: ScreenPoint,
    /// Visible points in index load order.
    pub points: Vec<VisiblePoint>,
}

impl Selection {
    /// Number of visible points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// `true` if nothing is visible.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Visible points that carry a street label.
    pub fn labeled_points(&self) -> impl Iterator<Item = &VisiblePoint> {
        self.points.iter().step_by(STREET_LABEL_STRIDE)
    }

    /// The city name shown for the current view: the city of the last point
    /// whose position in the selection is a multiple of
    /// [`CITY_LABEL_STRIDE`].
    #[must_use]
    pub fn city_label<'a>(&self, index: &'a GeoIndex) -> Option<&'a str> {
        self.points
            .iter()
            .step_by(CITY_LABEL_STRIDE)
            .last()
            .map(|p| index.city_or_empty(&p.key))
    }

    /// Elevation-derived height of the last visible point within
    /// `max_distance` pixels of `screen`, if any.
    #[must_use]
    pub fn height_near(
        &self,
        screen: ScreenPoint,
        max_distance: f64,
        curves: &FalloffCurves,
    ) -> Option<f64> {
        self.points
            .iter()
            .rev()
            .find(|p| p.screen.distance(&screen) <= max_distance)
            .map(|p| curves.elevation_offset.ease(p.elevation))
    }
}

/// Selects and projects every index point inside `viewport`.
///
/// The projection must already be centered on the viewport center.
#[must_use]
pub fn select<P: MapProjection + ?Sized>(
    index: &GeoIndex,
    viewport: &Viewport,
    projection: &P,
    curves: &FalloffCurves,
) -> Selection {
    let center = projection.geo_to_screen(viewport.center);

    let points: Vec<VisiblePoint> = index
        .all_coordinates()
        .iter()
        .filter(|coordinate| viewport.contains(coordinate))
        .map(|&coordinate| {
            let key = coordinate.key();
            let screen = projection.geo_to_screen(coordinate);
            let distance = screen.distance(&center);
            let elevation = index.elevation_or_zero(&key);

            VisiblePoint {
                coordinate,
                key,
                screen,
                distance,
                elevation,
                falloff: curves.evaluate(distance, elevation),
            }
        })
        .collect();

    log::trace!(
        "Selected {} of {} points around {}",
        points.len(),
        index.len(),
        viewport.center
    );

    Selection { center, points }
}

#[cfg(test)]
mod tests {
    use super::*;
    use color_world_geo_index::progress::NullProgress;

    const SAMPLES: &str = "\
longitude,latitude,street,city
-122.41942,37.77493,Market St,San Francisco
-122.4150,37.7760,Mission St,San Francisco
-122.4300,37.7749,Hayes St,San Francisco
-122.4194,37.7890,Polk St,San Francisco
-122.4194,37.7610,Valencia St,San Francisco
-122.4000,37.7749,Far East St,San Francisco
";

    fn index() -> GeoIndex {
        GeoIndex::load(SAMPLES.as_bytes(), &NullProgress)
            .unwrap()
            .with_elevations(r#"{"-122.41942,37.77493": 280.0}"#.as_bytes())
            .unwrap()
    }

    fn setup() -> (GeoIndex, Viewport, WebMercator) {
        let center = Coordinate::new(-122.41942, 37.77493);
        let mut projection = WebMercator::new(460.8, 512.0);
        projection.set_center(center);
        (index(), Viewport::centered_on(center), projection)
    }

    fn streets(selection: &Selection, index: &GeoIndex) -> Vec<String> {
        selection
            .points
            .iter()
            .map(|p| index.street_or_empty(&p.key).to_string())
            .collect()
    }

    #[test]
    fn keeps_points_inside_asymmetric_window() {
        let (index, viewport, projection) = setup();
        let selection = select(&index, &viewport, &projection, &FalloffCurves::default());

        // Polk (+0.01407 lat) and Valencia (-0.01393 lat) straddle the padded
        // latitude bound; Hayes and Far East are outside the width.
        assert_eq!(
            streets(&selection, &index),
            vec!["Market St", "Mission St", "Valencia St"]
        );
    }

    #[test]
    fn hayes_is_outside_lower_longitude_bound() {
        let (index, viewport, projection) = setup();
        let selection = select(&index, &viewport, &projection, &FalloffCurves::default());
        assert!(!streets(&selection, &index).contains(&"Hayes St".to_string()));
    }

    #[test]
    fn selection_is_deterministic() {
        let (index, viewport, projection) = setup();
        let curves = FalloffCurves::default();
        let first = select(&index, &viewport, &projection, &curves);
        let second = select(&index, &viewport, &projection, &curves);
        assert_eq!(first, second);
    }

    #[test]
    fn center_point_gets_full_falloff() {
        let (index, viewport, projection) = setup();
        let selection = select(&index, &viewport, &projection, &FalloffCurves::default());
        let center = &selection.points[0];

        assert!(center.distance < 1e-6);
        assert!((center.falloff.alpha - 180.0).abs() < 1e-9);
        assert!((center.falloff.radius - 4.5).abs() < 1e-9);
        assert!((center.falloff.height - 15.0).abs() < 1e-9);
        assert!((center.falloff.label_alpha - 255.0).abs() < 1e-9);
        assert!((center.falloff.elevation_offset - 50.0).abs() < 1e-9);
        assert!((center.falloff.elevation_radius - -1.5).abs() < 1e-9);
        assert!((center.falloff.total_height() - 65.0).abs() < 1e-9);
    }

    #[test]
    fn unknown_elevation_counts_as_zero() {
        let (index, viewport, projection) = setup();
        let selection = select(&index, &viewport, &projection, &FalloffCurves::default());
        let mission = &selection.points[1];
        assert!(mission.elevation.abs() < f64::EPSILON);
        assert!((mission.falloff.elevation_offset - -15.0).abs() < 1e-9);
    }

    #[test]
    fn falloff_fades_with_distance() {
        let (index, viewport, projection) = setup();
        let selection = select(&index, &viewport, &projection, &FalloffCurves::default());
        let valencia = &selection.points[2];
        assert!(valencia.distance > 40.0);
        assert!(valencia.falloff.alpha < 180.0);
        assert!(valencia.falloff.alpha >= 0.0);
    }

    #[test]
    fn empty_viewport_selects_nothing() {
        let (index, _, projection) = setup();
        let viewport = Viewport::centered_on(Coordinate::new(0.0, 0.0));
        let selection = select(&index, &viewport, &projection, &FalloffCurves::default());
        assert!(selection.is_empty());
    }

    #[test]
    fn city_label_comes_from_first_stride() {
        let (index, viewport, projection) = setup();
        let selection = select(&index, &viewport, &projection, &FalloffCurves::default());
        assert_eq!(selection.city_label(&index), Some("San Francisco"));
        assert_eq!(selection.labeled_points().count(), 1);
    }

    #[test]
    fn height_near_finds_point_under_finger() {
        let (index, viewport, projection) = setup();
        let curves = FalloffCurves::default();
        let selection = select(&index, &viewport, &projection, &curves);
        let height = selection.height_near(selection.center, 7.0, &curves);
        assert!((height.unwrap() - 50.0).abs() < 1e-9);
        assert!(
            selection
                .height_near(ScreenPoint::new(-500.0, -500.0), 7.0, &curves)
                .is_none()
        );
    }
}
