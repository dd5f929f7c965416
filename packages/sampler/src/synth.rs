//! Deterministic per-street color synthesis.
//!
//! Each channel is one draw from a generator seeded by the street name
//! length, so two streets with names of the same length share a tint and
//! the same street always renders identically on every machine. No
//! generator state is shared between calls.

use color_world_models::SampledColor;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Per-channel `(seed offset, modulus offset, factor)`.
const CHANNELS: [(u64, u64, f32); 3] = [(1, 10, 56.0), (2, 20, 56.0), (3, 30, 36.0)];

/// One draw from a generator seeded with `seed`, reduced modulo `range`.
///
/// # Panics
///
/// Panics if `range` is zero.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn synthesize_channel(seed: u64, range: u64) -> u32 {
    assert!(range > 0, "synthesis range must be non-zero");
    let draw = u64::from(ChaCha8Rng::seed_from_u64(seed).next_u32());
    (draw % range) as u32
}

/// Tints `base` by the street-name length.
///
/// Channel `c` becomes `min(255, d_c * factor_c * base_c / 255)` where
/// `d_c` is drawn by [`synthesize_channel`].
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]
pub fn synthesize(street_len: usize, base: SampledColor) -> SampledColor {
    let len = street_len as u64;
    let bases = [base.r, base.g, base.b];

    let mut out = [0u8; 3];
    for ((slot, &(seed_offset, range_offset, factor)), base) in
        out.iter_mut().zip(CHANNELS.iter()).zip(bases)
    {
        let draw = synthesize_channel(len + seed_offset, len + range_offset);
        let value = draw as f32 * factor * f32::from(base) / 255.0;
        *slot = value.clamp(0.0, 255.0) as u8;
    }

    SampledColor::from(out)
}
