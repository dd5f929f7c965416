//! Geographic ↔ screen projection.
//!
//! The selection code only needs the four operations of [`MapProjection`].
//! [`WebMercator`] implements them with the slippy-map tile math used by
//! `OpenStreetMap` tiles (256-pixel tiles, zoom level as a power of two).

use std::f64::consts::PI;

use color_world_models::{Coordinate, ScreenPoint};

/// Tile edge in pixels.
const TILE_SIZE: f64 = 256.0;

/// Latitude limit of the Web Mercator square.
const MAX_LATITUDE: f64 = 85.051_128_779_806_59;

/// The map-projection collaborator.
pub trait MapProjection {
    /// Projects a coordinate into screen space.
    fn geo_to_screen(&self, coordinate: Coordinate) -> ScreenPoint;

    /// Inverse of [`MapProjection::geo_to_screen`].
    fn screen_to_geo(&self, point: ScreenPoint) -> Coordinate;

    /// Recenters the map so `center` projects to the middle of the screen.
    fn set_center(&mut self, center: Coordinate);

    /// Sets the zoom level.
    fn set_zoom(&mut self, zoom: f64);
}

/// Web Mercator projection onto a `width × height` map surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WebMercator {
    center: Coordinate,
    zoom: f64,
    width: f64,
    height: f64,
}

impl WebMercator {
    /// Zoom level the installation renders at.
    pub const DEFAULT_ZOOM: f64 = 15.0;

    /// Creates a projection for a map surface of the given size.
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self {
            center: Coordinate::new(0.0, 0.0),
            zoom: Self::DEFAULT_ZOOM,
            width,
            height,
        }
    }

    /// Current center.
    #[must_use]
    pub const fn center(&self) -> Coordinate {
        self.center
    }

    /// Current zoom level.
    #[must_use]
    pub const fn zoom(&self) -> f64 {
        self.zoom
    }

    fn world_size(&self) -> f64 {
        TILE_SIZE * self.zoom.exp2()
    }

    /// Projects to absolute world pixels at the current zoom.
    fn to_world(&self, coordinate: Coordinate) -> (f64, f64) {
        let size = self.world_size();
        let lat = coordinate.latitude.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();

        let x = (coordinate.longitude + 180.0) / 360.0 * size;
        let y = (1.0 - lat.tan().asinh() / PI) / 2.0 * size;
        (x, y)
    }

    fn from_world(&self, x: f64, y: f64) -> Coordinate {
        let size = self.world_size();
        let longitude = x / size * 360.0 - 180.0;
        let n = PI * (1.0 - 2.0 * y / size);
        let latitude = n.sinh().atan().to_degrees();
        Coordinate::new(longitude, latitude)
    }
}

impl MapProjection for WebMercator {
    fn geo_to_screen(&self, coordinate: Coordinate) -> ScreenPoint {
        let (cx, cy) = self.to_world(self.center);
        let (x, y) = self.to_world(coordinate);
        ScreenPoint::new(x - cx + self.width / 2.0, y - cy + self.height / 2.0)
    }

    fn screen_to_geo(&self, point: ScreenPoint) -> Coordinate {
        let (cx, cy) = self.to_world(self.center);
        self.from_world(
            point.x - self.width / 2.0 + cx,
            point.y - self.height / 2.0 + cy,
        )
    }

    fn set_center(&mut self, center: Coordinate) {
        self.center = center;
    }

    fn set_zoom(&mut self, zoom: f64) {
        self.zoom = zoom;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sf_projection() -> WebMercator {
        let mut projection = WebMercator::new(460.8, 512.0);
        projection.set_center(Coordinate::new(-122.41942, 37.77493));
        projection
    }

    #[test]
    fn center_projects_to_middle_of_screen() {
        let projection = sf_projection();
        let point = projection.geo_to_screen(projection.center());
        assert!((point.x - 230.4).abs() < 1e-6);
        assert!((point.y - 256.0).abs() < 1e-6);
    }

    #[test]
    fn east_is_right_and_north_is_up() {
        let projection = sf_projection();
        let center = projection.geo_to_screen(projection.center());
        let east = projection.geo_to_screen(Coordinate::new(-122.41, 37.77493));
        let north = projection.geo_to_screen(Coordinate::new(-122.41942, 37.78));
        assert!(east.x > center.x);
        assert!(north.y < center.y);
    }

    #[test]
    fn screen_to_geo_inverts_geo_to_screen() {
        let projection = sf_projection();
        let coord = Coordinate::new(-122.4101, 37.7802);
        let back = projection.screen_to_geo(projection.geo_to_screen(coord));
        assert!((back.longitude - coord.longitude).abs() < 1e-9);
        assert!((back.latitude - coord.latitude).abs() < 1e-9);
    }

    #[test]
    fn zooming_in_spreads_points_apart() {
        let mut projection = sf_projection();
        let coord = Coordinate::new(-122.41, 37.78);
        let near = projection.geo_to_screen(coord);
        projection.set_zoom(16.0);
        let far = projection.geo_to_screen(coord);
        let middle = ScreenPoint::new(230.4, 256.0);
        assert!((far.distance(&middle) / near.distance(&middle) - 2.0).abs() < 1e-6);
    }
}
