#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Turns a geographic location into a color.
//!
//! Two sources are supported, selected per call by [`SampleMode`]:
//!
//! - **Remote**: a small street-level image is fetched from the image
//!   service in the background ([`remote::RemoteFetcher`]) and its interior
//!   pixel becomes the sample once the fetch completes.
//! - **Local**: the nearest precomputed image in the [`cache::ImageCache`]
//!   within a small tolerance box is sampled immediately.
//!
//! Every accepted sample is normalized ([`normalize`]); near-white pixels
//! are rejected so the caller keeps its previous color. [`synth`] holds the
//! deterministic per-street color synthesis used for map display.

pub mod cache;
pub mod remote;
mod retry;
pub mod synth;

use color_world_models::{Coordinate, SampleMode, SampledColor};
use image::RgbImage;

pub use cache::ImageCache;
pub use remote::{Completion, FetchState, HttpImageSource, ImageSource, RemoteFetcher};

/// Saturation every accepted sample is forced to.
pub const SAMPLE_SATURATION: f32 = 200.0;

/// Brightness every accepted sample is forced to (clamped to the HSB
/// ceiling).
pub const SAMPLE_BRIGHTNESS: f32 = 300.0;

/// Pixel sampled from a remote street-level image.
pub const REMOTE_PIXEL: (u32, u32) = (25, 25);

/// Pixel sampled from a locally cached image.
pub const LOCAL_PIXEL: (u32, u32) = (65, 65);

/// Errors from loading or fetching images.
#[derive(Debug, thiserror::Error)]
pub enum SampleError {
    /// Filesystem error while reading the image cache.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An image could not be decoded.
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The image service answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    Status {
        /// Response status code.
        status: u16,
        /// Requested URL (with the key redacted).
        url: String,
    },
}

/// Result of one sampling attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleOutcome {
    /// A normalized color to record.
    Accepted(SampledColor),
    /// The pixel was near-white; keep the previous color.
    Rejected,
    /// No image matched the location.
    Miss,
    /// A remote fetch was issued; the result arrives through
    /// [`ColorSampler::poll`].
    Pending,
}

impl SampleOutcome {
    /// The accepted color, if any.
    #[must_use]
    pub const fn color(&self) -> Option<SampledColor> {
        match self {
            Self::Accepted(color) => Some(*color),
            Self::Rejected | Self::Miss | Self::Pending => None,
        }
    }
}

/// Forces saturation and brightness to the collection levels.
#[must_use]
pub fn normalize(color: SampledColor) -> SampledColor {
    color
        .with_saturation(SAMPLE_SATURATION)
        .with_brightness(SAMPLE_BRIGHTNESS)
}

/// Rejects near-white pixels and normalizes everything else.
#[must_use]
pub fn classify(pixel: SampledColor) -> SampleOutcome {
    if pixel.is_near_white() {
        SampleOutcome::Rejected
    } else {
        SampleOutcome::Accepted(normalize(pixel))
    }
}

/// Reads pixel `(x, y)` of `image`, clamping the position into the image.
///
/// Returns `None` for an empty image.
#[must_use]
pub fn pixel_at(image: &RgbImage, (x, y): (u32, u32)) -> Option<SampledColor> {
    if image.width() == 0 || image.height() == 0 {
        return None;
    }
    let x = x.min(image.width() - 1);
    let y = y.min(image.height() - 1);
    Some(SampledColor::from(image.get_pixel(x, y).0))
}

/// Single entry point over both sample sources.
pub struct ColorSampler {
    cache: ImageCache,
    remote: RemoteFetcher,
}

impl ColorSampler {
    /// Combines a local cache and a remote fetcher.
    #[must_use]
    pub const fn new(cache: ImageCache, remote: RemoteFetcher) -> Self {
        Self { cache, remote }
    }

    /// Samples `location` for pointer `slot`.
    ///
    /// Local lookups resolve immediately. Remote lookups return
    /// [`SampleOutcome::Pending`]; their results come out of
    /// [`ColorSampler::poll`] on a later frame.
    pub fn sample(&mut self, slot: usize, location: Coordinate, mode: SampleMode) -> SampleOutcome {
        match mode {
            SampleMode::Local => self.cache.sample(location),
            SampleMode::Remote => {
                self.remote.request(slot, location);
                SampleOutcome::Pending
            }
        }
    }

    /// Drains finished remote fetches without blocking.
    pub fn poll(&mut self) -> Vec<Completion> {
        self.remote.poll()
    }

    /// The local image cache.
    #[must_use]
    pub const fn cache(&self) -> &ImageCache {
        &self.cache
    }

    /// The remote fetcher.
    #[must_use]
    pub const fn remote(&self) -> &RemoteFetcher {
        &self.remote
    }
}
