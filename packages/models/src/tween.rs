//! Range remapping with quadratic ease-in-out.
//!
//! Both the viewport falloffs (distance → alpha/radius/height) and the
//! navigation ramps (input → speed) are a [`Remap`] evaluated with
//! [`Remap::ease`]: the input is clamped to its domain, normalized, passed
//! through a quadratic in-out curve and scaled into the output range.

use serde::{Deserialize, Serialize};

/// A mapping from an input domain to an output range.
///
/// The output range may be descending (`out_start > out_end`), which is how
/// the falloffs fade toward the edge of the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Remap {
    /// Start of the input domain.
    pub in_start: f64,
    /// End of the input domain.
    pub in_end: f64,
    /// Output at `in_start`.
    pub out_start: f64,
    /// Output at `in_end`.
    pub out_end: f64,
}

impl Remap {
    /// Creates a remap from `[in_start, in_end]` to `[out_start, out_end]`.
    #[must_use]
    pub const fn new(in_start: f64, in_end: f64, out_start: f64, out_end: f64) -> Self {
        Self {
            in_start,
            in_end,
            out_start,
            out_end,
        }
    }

    /// Clamped quadratic ease-in-out remap.
    #[must_use]
    pub fn ease(&self, value: f64) -> f64 {
        let span = self.in_end - self.in_start;
        if span.abs() < f64::EPSILON {
            return if value < self.in_start {
                self.out_start
            } else {
                self.out_end
            };
        }

        let t = ((value - self.in_start) / span).clamp(0.0, 1.0);
        let eased = if t < 0.5 {
            2.0 * t * t
        } else {
            let u = 2.0f64.mul_add(-t, 2.0);
            1.0 - u * u / 2.0
        };

        (self.out_end - self.out_start).mul_add(eased, self.out_start)
    }

    /// Unclamped linear remap.
    #[must_use]
    pub fn linear(&self, value: f64) -> f64 {
        let span = self.in_end - self.in_start;
        if span.abs() < f64::EPSILON {
            return self.out_start;
        }
        let t = (value - self.in_start) / span;
        (self.out_end - self.out_start).mul_add(t, self.out_start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FALLOFF: Remap = Remap::new(40.0, 280.0, 180.0, 0.0);

    #[test]
    fn ease_hits_endpoints() {
        assert!((FALLOFF.ease(40.0) - 180.0).abs() < 1e-9);
        assert!(FALLOFF.ease(280.0).abs() < 1e-9);
    }

    #[test]
    fn ease_is_symmetric_at_midpoint() {
        assert!((FALLOFF.ease(160.0) - 90.0).abs() < 1e-9);
    }

    #[test]
    fn ease_clamps_outside_domain() {
        assert!((FALLOFF.ease(0.0) - 180.0).abs() < 1e-9);
        assert!(FALLOFF.ease(1000.0).abs() < 1e-9);
    }

    #[test]
    fn ease_starts_slow() {
        // A quarter of the way in, a quadratic ease covers an eighth of the
        // output range.
        let remap = Remap::new(0.0, 100.0, 0.0, 8.0);
        assert!((remap.ease(25.0) - 1.0).abs() < 1e-9);
        assert!((remap.ease(75.0) - 7.0).abs() < 1e-9);
    }

    #[test]
    fn linear_does_not_clamp() {
        let remap = Remap::new(220.0, 385.0, 10.0, 100.0);
        assert!((remap.linear(220.0) - 10.0).abs() < 1e-9);
        assert!((remap.linear(385.0) - 100.0).abs() < 1e-9);
        assert!(remap.linear(500.0) > 100.0);
    }

    #[test]
    fn degenerate_domain_is_a_step() {
        let remap = Remap::new(5.0, 5.0, 1.0, 2.0);
        assert!((remap.ease(4.0) - 1.0).abs() < 1e-9);
        assert!((remap.ease(6.0) - 2.0).abs() < 1e-9);
    }
}
