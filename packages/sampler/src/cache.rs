//! Precomputed street-level images for offline sampling.
//!
//! The cache directory holds one image per location, named after the
//! location's coordinate key (`<lon>,<lat>.<ext>`). Files whose stem is not
//! a coordinate are skipped.

use std::collections::HashMap;
use std::path::Path;

use color_world_geo_index::progress::ProgressCallback;
use color_world_models::{Coordinate, CoordinateKey, SampledColor};
use image::RgbImage;

use crate::{LOCAL_PIXEL, SampleError, SampleOutcome, classify, pixel_at};

/// Longitude half-width of the local match box.
pub const LOCAL_TOLERANCE_LON: f64 = 0.0004;

/// Latitude half-height of the local match box.
pub const LOCAL_TOLERANCE_LAT: f64 = 0.0005;

/// Decoded images keyed by coordinate.
#[derive(Debug, Clone, Default)]
pub struct ImageCache {
    coordinates: Vec<Coordinate>,
    images: HashMap<CoordinateKey, RgbImage>,
}

impl ImageCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads every decodable image in `dir`.
    ///
    /// Files are visited in file-name order so the scan order, and with it
    /// tie-breaking in [`ImageCache::nearest_within_tolerance`], does not
    /// depend on the filesystem.
    ///
    /// # Errors
    ///
    /// Returns [`SampleError`] if the directory cannot be read or an image
    /// with a coordinate name fails to decode.
    pub fn load_dir(dir: &Path, progress: &dyn ProgressCallback) -> Result<Self, SampleError> {
        let mut paths = std::fs::read_dir(dir)?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<Result<Vec<_>, _>>()?;
        paths.sort();

        progress.set_message(format!("Decoding images from {}", dir.display()));
        progress.set_total(paths.len() as u64);

        let mut cache = Self::new();
        for path in paths {
            if !path.is_file() {
                progress.inc(1);
                continue;
            }
            let Some(key) = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| s.parse::<CoordinateKey>().ok())
            else {
                log::debug!("Skipping {}: not a coordinate file name", path.display());
                progress.inc(1);
                continue;
            };

            let image = image::open(&path)?.to_rgb8();
            cache.insert(key, image);
            progress.inc(1);
        }

        progress.finish(format!("Loaded {} cached images", cache.len()));
        log::info!("Image cache: {} images from {}", cache.len(), dir.display());

        Ok(cache)
    }

    /// Adds or replaces the image for `key`.
    pub fn insert(&mut self, key: CoordinateKey, image: RgbImage) {
        if self.images.insert(key.clone(), image).is_none() {
            self.coordinates.push(key.coordinate());
        }
    }

    /// Number of cached images.
    #[must_use]
    pub fn len(&self) -> usize {
        self.images.len()
    }

    /// `true` if nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// The image stored for `key`.
    #[must_use]
    pub fn image(&self, key: &CoordinateKey) -> Option<&RgbImage> {
        self.images.get(key)
    }

    /// The cached color of `key`: the local sample pixel of its image.
    #[must_use]
    pub fn color_for(&self, key: &CoordinateKey) -> Option<SampledColor> {
        self.image(key).and_then(|image| pixel_at(image, LOCAL_PIXEL))
    }

    /// The cached coordinate closest to `location` whose offset is strictly
    /// inside the tolerance box on both axes.
    ///
    /// Ties keep the first coordinate in load order.
    #[must_use]
    pub fn nearest_within_tolerance(&self, location: Coordinate) -> Option<Coordinate> {
        let mut best: Option<(f64, Coordinate)> = None;

        for &candidate in &self.coordinates {
            let d_lon = (candidate.longitude - location.longitude).abs();
            let d_lat = (candidate.latitude - location.latitude).abs();
            if d_lon >= LOCAL_TOLERANCE_LON || d_lat >= LOCAL_TOLERANCE_LAT {
                continue;
            }

            let distance = d_lon.hypot(d_lat);
            if best.is_none_or(|(best_distance, _)| distance < best_distance) {
                best = Some((distance, candidate));
            }
        }

        best.map(|(_, coordinate)| coordinate)
    }

    /// Samples the nearest cached image around `location`.
    #[must_use]
    pub fn sample(&self, location: Coordinate) -> SampleOutcome {
        let Some(nearest) = self.nearest_within_tolerance(location) else {
            return SampleOutcome::Miss;
        };

        match self.color_for(&nearest.key()) {
            Some(pixel) => classify(pixel),
            None => SampleOutcome::Miss,
        }
    }
}
