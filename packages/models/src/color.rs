//! RGB sample colors with HSB accessors on the 0–255 scale.
//!
//! Hue, saturation and brightness all share the byte range of the channels:
//! a hue of 255 wraps back to red. Setting a component out of range clamps
//! it, so a brightness of 300 lands on 255.

use serde::{Deserialize, Serialize};

/// Upper bound of every HSB component.
const LIMIT: f32 = 255.0;

/// A sampled RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct SampledColor {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

impl SampledColor {
    /// Black, also used as the empty color by image lookups that found
    /// nothing.
    pub const EMPTY: Self = Self::new(0, 0, 0);

    /// Creates a color from its channels.
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// `true` for colors with every channel above 254, which image services
    /// return when they have no imagery for a location.
    #[must_use]
    pub const fn is_near_white(&self) -> bool {
        self.r > 254 && self.g > 254 && self.b > 254
    }

    /// Returns `(hue, saturation, brightness)`, each in `0.0..=255.0`.
    #[must_use]
    pub fn hsb(&self) -> (f32, f32, f32) {
        let r = f32::from(self.r);
        let g = f32::from(self.g);
        let b = f32::from(self.b);

        let max = r.max(g).max(b);
        let min = r.min(g).min(b);

        if max <= min {
            return (0.0, 0.0, max);
        }

        let delta = max - min;
        let saturation = delta / max * LIMIT;

        #[allow(clippy::float_cmp)]
        let mut hue = if r == max {
            (g - b) / delta
        } else if g == max {
            2.0 + (b - r) / delta
        } else {
            4.0 + (r - g) / delta
        };
        hue /= 6.0;
        if hue < 0.0 {
            hue += 1.0;
        }

        (hue * LIMIT, saturation, max)
    }

    /// Hue on the 0–255 scale.
    #[must_use]
    pub fn hue(&self) -> f32 {
        self.hsb().0
    }

    /// Saturation on the 0–255 scale.
    #[must_use]
    pub fn saturation(&self) -> f32 {
        self.hsb().1
    }

    /// Brightness (max channel) on the 0–255 scale.
    #[must_use]
    pub fn brightness(&self) -> f32 {
        self.hsb().2
    }

    /// Builds a color from HSB components. Saturation and brightness are
    /// clamped to `0..=255`; hue wraps.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn from_hsb(hue: f32, saturation: f32, brightness: f32) -> Self {
        let saturation = saturation.clamp(0.0, LIMIT);
        let brightness = brightness.clamp(0.0, LIMIT);

        if brightness <= 0.0 {
            return Self::EMPTY;
        }
        if saturation <= 0.0 {
            let v = brightness as u8;
            return Self::new(v, v, v);
        }

        let hue = hue.rem_euclid(LIMIT + 1.0);
        let hue_six = hue * 6.0 / LIMIT;
        let category = hue_six.floor();
        let remainder = hue_six - category;
        let sat = saturation / LIMIT;

        let pv = (1.0 - sat) * brightness;
        let qv = sat.mul_add(-remainder, 1.0) * brightness;
        let tv = sat.mul_add(-(1.0 - remainder), 1.0) * brightness;

        let (r, g, b) = match category as u8 {
            1 => (qv, brightness, pv),
            2 => (pv, brightness, tv),
            3 => (pv, qv, brightness),
            4 => (tv, pv, brightness),
            5 => (brightness, pv, qv),
            // 0, and 6 when hue sits exactly on the limit
            _ => (brightness, tv, pv),
        };

        Self::new(r as u8, g as u8, b as u8)
    }

    /// Returns this color with its saturation replaced.
    #[must_use]
    pub fn with_saturation(&self, saturation: f32) -> Self {
        let (hue, _, brightness) = self.hsb();
        Self::from_hsb(hue, saturation, brightness)
    }

    /// Returns this color with its brightness replaced.
    #[must_use]
    pub fn with_brightness(&self, brightness: f32) -> Self {
        let (hue, saturation, _) = self.hsb();
        Self::from_hsb(hue, saturation, brightness)
    }

    /// Mean of the three channels scaled by 0.9, the "color loudness" the
    /// playback view reads.
    #[must_use]
    pub fn channel_sum_scaled(&self) -> f32 {
        (f32::from(self.r) + f32::from(self.g) + f32::from(self.b)) * 0.3
    }
}

impl From<[u8; 3]> for SampledColor {
    fn from([r, g, b]: [u8; 3]) -> Self {
        Self::new(r, g, b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gray_has_no_saturation() {
        let (hue, sat, bri) = SampledColor::new(80, 80, 80).hsb();
        assert!(hue.abs() < f32::EPSILON);
        assert!(sat.abs() < f32::EPSILON);
        assert!((bri - 80.0).abs() < f32::EPSILON);
    }

    #[test]
    fn pure_red_is_fully_saturated() {
        let (hue, sat, bri) = SampledColor::new(255, 0, 0).hsb();
        assert!(hue.abs() < f32::EPSILON);
        assert!((sat - 255.0).abs() < f32::EPSILON);
        assert!((bri - 255.0).abs() < f32::EPSILON);
    }

    #[test]
    fn hsb_round_trips_primary_colors() {
        for color in [
            SampledColor::new(255, 0, 0),
            SampledColor::new(0, 255, 0),
            SampledColor::new(0, 0, 255),
        ] {
            let (h, s, b) = color.hsb();
            assert_eq!(SampledColor::from_hsb(h, s, b), color);
        }
    }

    #[test]
    fn brightness_is_clamped() {
        let color = SampledColor::new(100, 50, 25).with_brightness(300.0);
        assert_eq!(color.r, 255);
        assert!((color.brightness() - 255.0).abs() < f32::EPSILON);
    }

    #[test]
    fn saturation_change_keeps_brightness() {
        let color = SampledColor::new(200, 100, 100).with_saturation(255.0);
        assert_eq!(color.r, 200);
        assert_eq!(color.g, 0);
        assert_eq!(color.b, 0);
    }

    #[test]
    fn detects_near_white() {
        assert!(SampledColor::new(255, 255, 255).is_near_white());
        assert!(!SampledColor::new(255, 254, 255).is_near_white());
    }

    #[test]
    fn zero_brightness_is_black() {
        assert_eq!(
            SampledColor::from_hsb(100.0, 200.0, 0.0),
            SampledColor::EMPTY
        );
    }
}
