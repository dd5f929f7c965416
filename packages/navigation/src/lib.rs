#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Turns pointer or hand input into a per-frame pan of the map.
//!
//! Every axis is handled by the same [`ZoneMapper`]: input inside the dead
//! zone does nothing, and input past either edge ramps up to the maximum
//! speed over the activation distance with a clamped quadratic ease. The
//! two input devices only differ in which components they read and how the
//! zones are placed ([`NavigationProfile`]).

use color_world_models::InputMode;
use color_world_models::tween::Remap;
use serde::{Deserialize, Serialize};

/// Maximum pan speed in degrees per frame.
pub const MOVEMENT: f64 = 0.0001;

/// Pointer dead zone as fractions of the window extent.
pub const POINTER_DEAD_ZONE: (f64, f64) = (0.4, 0.6);

/// Half-width of the hand dead zone around the rest position.
pub const HAND_THRESHOLD: f64 = 6.0;

/// Distance past the hand dead zone over which speed ramps to maximum.
pub const HAND_ACTIVATION: f64 = 90.0;

/// Offset added to the palm's x component before zoning.
pub const PALM_OFFSET_X: f64 = -300.0;

/// Offset added to the palm's z component before zoning.
pub const PALM_OFFSET_Z: f64 = 200.0;

/// One axis of dead-zone navigation.
///
/// Input below `dead_lo` eases from `-sign * max_speed` (at
/// `dead_lo - activation` and beyond) to zero; input above `dead_hi` eases
/// from zero to `+sign * max_speed` (at `dead_hi + activation` and beyond).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoneMapper {
    pub dead_lo: f64,
    pub dead_hi: f64,
    pub activation: f64,
    pub max_speed: f64,
    /// `1.0` if larger input moves toward larger coordinates, `-1.0` if it
    /// moves the other way.
    pub sign: f64,
}

impl ZoneMapper {
    #[must_use]
    pub const fn new(dead_lo: f64, dead_hi: f64, activation: f64, max_speed: f64, sign: f64) -> Self {
        Self {
            dead_lo,
            dead_hi,
            activation,
            max_speed,
            sign,
        }
    }

    /// Signed displacement for `input`.
    #[must_use]
    pub fn displacement(&self, input: f64) -> f64 {
        let top = self.sign * self.max_speed;
        if input <= self.dead_lo {
            Remap::new(self.dead_lo - self.activation, self.dead_lo, -top, 0.0).ease(input)
        } else if input <= self.dead_hi {
            0.0
        } else {
            Remap::new(self.dead_hi, self.dead_hi + self.activation, 0.0, top).ease(input)
        }
    }
}

/// Which input components drive which axis, and the zones they run through.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NavigationProfile {
    /// Input component that pans longitude.
    pub horizontal_axis: usize,
    /// Input component that pans latitude.
    pub vertical_axis: usize,
    /// Added to the input vector before zoning.
    pub offset: [f64; 3],
    /// Zones for the longitude axis.
    pub horizontal: ZoneMapper,
    /// Zones for the latitude axis.
    pub vertical: ZoneMapper,
}

impl NavigationProfile {
    /// Pointer navigation over a `width × height` window.
    ///
    /// Reads x and y. Screen y grows downward, so the top of the window
    /// pans north.
    #[must_use]
    pub fn pointer(width: f64, height: f64, max_speed: f64) -> Self {
        let (lo, hi) = POINTER_DEAD_ZONE;
        Self {
            horizontal_axis: 0,
            vertical_axis: 1,
            offset: [0.0; 3],
            horizontal: ZoneMapper::new(width * lo, width * hi, width * lo, max_speed, 1.0),
            vertical: ZoneMapper::new(height * lo, height * hi, height * lo, max_speed, -1.0),
        }
    }

    /// Hand navigation from the controller's palm position.
    ///
    /// Reads x and z (z grows toward the user, so reaching forward pans
    /// north).
    #[must_use]
    pub fn hand(threshold: f64, activation: f64, max_speed: f64) -> Self {
        Self {
            horizontal_axis: 0,
            vertical_axis: 2,
            offset: [PALM_OFFSET_X, 0.0, PALM_OFFSET_Z],
            horizontal: ZoneMapper::new(
                -threshold + PALM_OFFSET_X,
                threshold + PALM_OFFSET_X,
                activation,
                max_speed,
                1.0,
            ),
            vertical: ZoneMapper::new(
                -threshold + PALM_OFFSET_Z,
                threshold + PALM_OFFSET_Z,
                activation,
                max_speed,
                -1.0,
            ),
        }
    }

    /// `(d_lat, d_lon)` for one input sample.
    #[must_use]
    pub fn step(&self, input: [f64; 3]) -> (f64, f64) {
        let component = |axis: usize| input[axis] + self.offset[axis];
        let d_lon = self.horizontal.displacement(component(self.horizontal_axis));
        let d_lat = self.vertical.displacement(component(self.vertical_axis));
        (d_lat, d_lon)
    }
}

/// Navigation tuning, as read from the application config.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationConfig {
    /// Maximum pan speed in degrees per frame.
    pub max_speed: f64,
    /// Hand dead-zone half-width.
    pub hand_threshold: f64,
    /// Hand ramp length.
    pub hand_activation: f64,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            max_speed: MOVEMENT,
            hand_threshold: HAND_THRESHOLD,
            hand_activation: HAND_ACTIVATION,
        }
    }
}

/// Holds one profile per input device.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NavigationController {
    config: NavigationConfig,
    pointer: NavigationProfile,
    hand: NavigationProfile,
}

impl NavigationController {
    /// Creates a controller for a `width × height` window.
    #[must_use]
    pub fn new(config: NavigationConfig, width: f64, height: f64) -> Self {
        Self {
            config,
            pointer: NavigationProfile::pointer(width, height, config.max_speed),
            hand: NavigationProfile::hand(
                config.hand_threshold,
                config.hand_activation,
                config.max_speed,
            ),
        }
    }

    /// Re-derives the pointer zones after the window changed size.
    pub fn resize(&mut self, width: f64, height: f64) {
        self.pointer = NavigationProfile::pointer(width, height, self.config.max_speed);
    }

    /// `(d_lat, d_lon)` for this frame's input.
    #[must_use]
    pub fn step(&self, input: [f64; 3], mode: InputMode) -> (f64, f64) {
        match mode {
            InputMode::Pointer => self.pointer.step(input),
            InputMode::Hand => self.hand.step(input),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const W: f64 = 1000.0;
    const H: f64 = 800.0;

    fn controller() -> NavigationController {
        NavigationController::new(NavigationConfig::default(), W, H)
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn zone_is_zero_at_dead_zone_boundary() {
        let zone = ZoneMapper::new(-6.0, 6.0, 90.0, MOVEMENT, 1.0);
        assert!(close(zone.displacement(-6.0), 0.0));
        assert!(close(zone.displacement(6.0), 0.0));
        assert!(close(zone.displacement(0.0), 0.0));
    }

    #[test]
    fn zone_reaches_max_at_outer_bound() {
        let zone = ZoneMapper::new(-6.0, 6.0, 90.0, MOVEMENT, 1.0);
        assert!(close(zone.displacement(96.0), MOVEMENT));
        assert!(close(zone.displacement(-96.0), -MOVEMENT));
    }

    #[test]
    fn zone_clamps_beyond_outer_bound() {
        let zone = ZoneMapper::new(-6.0, 6.0, 90.0, MOVEMENT, -1.0);
        assert!(close(zone.displacement(500.0), -MOVEMENT));
        assert!(close(zone.displacement(-500.0), MOVEMENT));
    }

    #[test]
    fn zone_ramp_is_monotonic() {
        let zone = ZoneMapper::new(-6.0, 6.0, 90.0, MOVEMENT, 1.0);
        let mut previous = 0.0;
        for step in 0..=90 {
            let value = zone.displacement(6.0 + f64::from(step));
            assert!(value >= previous);
            previous = value;
        }
    }

    #[test]
    fn pointer_center_does_not_move() {
        let (d_lat, d_lon) = controller().step([W / 2.0, H / 2.0, 0.0], InputMode::Pointer);
        assert!(close(d_lat, 0.0));
        assert!(close(d_lon, 0.0));
    }

    #[test]
    fn pointer_corners_pan_at_full_speed() {
        let nav = controller();

        // Top-left: north-west.
        let (d_lat, d_lon) = nav.step([0.0, 0.0, 0.0], InputMode::Pointer);
        assert!(close(d_lat, MOVEMENT));
        assert!(close(d_lon, -MOVEMENT));

        // Bottom-right: south-east.
        let (d_lat, d_lon) = nav.step([W, H, 0.0], InputMode::Pointer);
        assert!(close(d_lat, -MOVEMENT));
        assert!(close(d_lon, MOVEMENT));
    }

    #[test]
    fn pointer_dead_zone_spans_middle_fifth() {
        let nav = controller();
        let (_, d_lon) = nav.step([W * 0.4, H / 2.0, 0.0], InputMode::Pointer);
        assert!(close(d_lon, 0.0));
        let (_, d_lon) = nav.step([W * 0.6, H / 2.0, 0.0], InputMode::Pointer);
        assert!(close(d_lon, 0.0));
        let (_, d_lon) = nav.step([W * 0.7, H / 2.0, 0.0], InputMode::Pointer);
        assert!(d_lon > 0.0);
    }

    #[test]
    fn hand_at_rest_does_not_move() {
        let (d_lat, d_lon) = controller().step([0.0, 150.0, 0.0], InputMode::Hand);
        assert!(close(d_lat, 0.0));
        assert!(close(d_lon, 0.0));
    }

    #[test]
    fn hand_ignores_height() {
        let nav = controller();
        assert_eq!(
            nav.step([0.0, 0.0, 0.0], InputMode::Hand),
            nav.step([0.0, 400.0, 0.0], InputMode::Hand)
        );
    }

    #[test]
    fn hand_reach_pans_at_full_speed() {
        let nav = controller();

        let (d_lat, d_lon) = nav.step([96.0, 0.0, 0.0], InputMode::Hand);
        assert!(close(d_lat, 0.0));
        assert!(close(d_lon, MOVEMENT));

        let (d_lat, d_lon) = nav.step([0.0, 0.0, -96.0], InputMode::Hand);
        assert!(close(d_lat, MOVEMENT));
        assert!(close(d_lon, 0.0));
    }

    #[test]
    fn resize_moves_pointer_zones() {
        let mut nav = controller();
        nav.resize(2000.0, 1600.0);
        let (d_lat, d_lon) = nav.step([1000.0, 800.0, 0.0], InputMode::Pointer);
        assert!(close(d_lat, 0.0));
        assert!(close(d_lon, 0.0));
    }
}
