#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! One frame of the color world installation.
//!
//! [`Session::step`] runs the whole per-frame pipeline in a fixed order:
//!
//! 1. drain finished remote fetches into the palette history
//! 2. pan the viewport from pointer or hand input (unless collecting or in
//!    the playback view)
//! 3. recenter the projection and select the visible points
//! 4. compute each visible point's display color
//! 5. sample a color under every finger while collecting
//! 6. advance the playback cursor while the playback view is on
//!
//! Mode flags are passed in per frame as a [`SessionConfig`]; the session
//! itself only holds the data and the state that has to survive between
//! frames.

pub mod config;
pub mod modes;
pub mod paths;

use std::sync::Arc;

use color_world_geo_index::cities::City;
use color_world_geo_index::progress::ProgressCallback;
use color_world_geo_index::{DataLoadError, GeoIndex};
use color_world_history::{PlaceHistory, playback_frame};
use color_world_models::tween::Remap;
use color_world_models::{
    Coordinate, HistoryEntry, InputMode, PlaceId, SampledColor, ScreenPoint, Viewport,
};
use color_world_navigation::{NavigationController, PALM_OFFSET_X, PALM_OFFSET_Z};
use color_world_sampler::synth::synthesize;
use color_world_sampler::{ColorSampler, HttpImageSource, ImageCache, RemoteFetcher, SampleError};
use color_world_viewport::{FalloffCurves, MapProjection, Selection, VisiblePoint, WebMercator};
use tokio::runtime::Handle;

pub use color_world_sampler::SampleOutcome;
pub use config::{AppConfig, ConfigError};
pub use modes::{Gesture, KeyAction, SessionConfig};

/// Where "reset to origin" returns the viewport.
pub const ORIGIN: Coordinate = Coordinate::new(-122.41942, 37.77493);

/// Fingers are drawn this far above the palm's depth line.
const FINGER_DEPTH_SHIFT: f64 = 180.0;

/// Points within this many pixels of a finger report their elevation
/// height.
pub const FINGER_PICK_RADIUS: f64 = 7.0;

/// Palm depth (offset) → recorded height metric. Linear, unclamped.
pub const HEIGHT_METRIC: Remap = Remap::new(220.0, 385.0, 10.0, 100.0);

/// Playback loudness → position in the playback track. Linear, unclamped.
pub const PLAYBACK_POSITION: Remap = Remap::new(50.0, 200.0, 0.13, 0.86);

/// Saturation of map point colors.
pub const DISPLAY_SATURATION: f32 = 320.0;

/// Brightness of map point colors.
pub const DISPLAY_BRIGHTNESS: f32 = 200.0;

/// Errors that stop a session from starting.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Sample or elevation data could not be loaded.
    #[error(transparent)]
    Data(#[from] DataLoadError),

    /// The image cache or HTTP client could not be set up.
    #[error(transparent)]
    Sample(#[from] SampleError),

    /// The configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Input gathered for one frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameInput {
    /// Seconds since the session started.
    pub elapsed_secs: f64,
    /// Pointer position in window pixels (`z` unused). `None` when no
    /// pointer is over the window, which holds the map still in pointer mode.
    pub pointer: Option<[f64; 3]>,
    /// Palm of the first tracked hand, if any.
    pub palm: Option<[f64; 3]>,
    /// Tips of every tracked finger, all hands flattened.
    pub fingers: Vec<[f64; 3]>,
}

/// A visible point with its display color.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayPoint {
    pub point: VisiblePoint,
    pub color: SampledColor,
}

/// What happened under one finger this frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FingerSample {
    /// Fetch slot (finger index).
    pub slot: usize,
    /// Finger position on the map surface.
    pub screen: ScreenPoint,
    /// Finger position on the map.
    pub location: Coordinate,
    /// Sampling result.
    pub outcome: SampleOutcome,
    /// The palette color in effect after this sample.
    pub color: Option<SampledColor>,
    /// Elevation height of a visible point under the finger.
    pub height: Option<f64>,
}

/// Playback cursor position and the values derived from it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackState {
    /// Entry under the cursor.
    pub frame: usize,
    /// Entries in the place's history.
    pub len: usize,
    /// Color of the entry under the cursor.
    pub color: SampledColor,
    /// `(r + g + b) * 0.3` of that color.
    pub loudness: f32,
    /// Loudness remapped to a track position.
    pub position: f64,
    /// Height metric recorded with the entry.
    pub height_metric: f32,
}

/// Everything a renderer needs from one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameOutput {
    /// Viewport center after navigation.
    pub center: Coordinate,
    /// Where the center projects on the map surface.
    pub center_screen: ScreenPoint,
    /// Visible points in index order.
    pub points: Vec<DisplayPoint>,
    /// City label for the current view.
    pub city_label: Option<String>,
    /// Street names drawn over the map, one per label stride of visible
    /// points. Points without a street are skipped.
    pub street_labels: Vec<String>,
    /// Per-finger results while collecting.
    pub fingers: Vec<FingerSample>,
    /// Entries appended to the history this frame.
    pub recorded: usize,
    /// Playback cursor while the playback view is on.
    pub playback: Option<PlaybackState>,
}

/// The running installation state.
pub struct Session {
    index: GeoIndex,
    sampler: ColorSampler,
    history: PlaceHistory,
    navigation: NavigationController,
    projection: Box<dyn MapProjection + Send>,
    viewport: Viewport,
    curves: FalloffCurves,
    city: City,
    window: (f64, f64),
    palm: [f64; 3],
    retained: Option<SampledColor>,
    reset_pending: bool,
}

impl Session {
    /// Loads the configured data files and builds a session spawning its
    /// fetches onto `runtime`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] if the sample data, elevation table or
    /// image cache cannot be loaded, or the HTTP client cannot be built.
    pub fn load(
        app: &AppConfig,
        runtime: Handle,
        progress: &dyn ProgressCallback,
    ) -> Result<Self, SessionError> {
        let samples = app.samples_path();
        log::info!("Loading sample points from {}", samples.display());
        let mut index = GeoIndex::load_path(&samples, progress)?;

        match app.elevations_path() {
            Some(path) if path.is_file() => {
                index = index.with_elevations_path(&path)?;
            }
            Some(path) => log::warn!("Elevation table {} not found, using 0 m", path.display()),
            None => {}
        }

        let cache = match app.image_cache_path() {
            Some(dir) if dir.is_dir() => ImageCache::load_dir(&dir, progress)?,
            Some(dir) => {
                log::warn!("Image cache {} not found, offline sampling disabled", dir.display());
                ImageCache::new()
            }
            None => ImageCache::new(),
        };

        let source = HttpImageSource::new(app.remote.timeout(), app.remote.max_retries)?;
        let fetcher = RemoteFetcher::new(
            Arc::new(source),
            runtime,
            app.remote.url_template.clone(),
            app.remote.api_key.clone().unwrap_or_default(),
        );

        Ok(Self::new(
            index,
            ColorSampler::new(cache, fetcher),
            app.start_city(),
            app,
        ))
    }

    /// Builds a session from loaded parts, centered on `city`.
    #[must_use]
    pub fn new(index: GeoIndex, sampler: ColorSampler, city: City, app: &AppConfig) -> Self {
        let (map_width, map_height) = app.display.map_size();
        let mut projection = WebMercator::new(map_width, map_height);
        projection.set_zoom(app.display.zoom);
        projection.set_center(city.center());

        let window = (app.display.window_width, app.display.window_height);
        log::info!("Starting in {} ({})", city.name, city.center());

        Self {
            index,
            sampler,
            history: PlaceHistory::new(app.history.capacity),
            navigation: NavigationController::new(app.navigation, window.0, window.1),
            projection: Box::new(projection),
            viewport: Viewport::centered_on(city.center()),
            curves: FalloffCurves::default(),
            city,
            window,
            palm: [0.0; 3],
            retained: None,
            reset_pending: false,
        }
    }

    /// Replaces the map projection.
    #[must_use]
    pub fn with_projection(mut self, mut projection: Box<dyn MapProjection + Send>) -> Self {
        projection.set_center(self.viewport.center);
        self.projection = projection;
        self
    }

    /// Runs one frame.
    pub fn step(&mut self, input: &FrameInput, config: &SessionConfig) -> FrameOutput {
        if let Some(palm) = input.palm {
            self.palm = palm;
        }

        let mut recorded = self.drain_completions();

        self.navigate(input, config);

        self.projection.set_center(self.viewport.center);
        let selection =
            color_world_viewport::select(&self.index, &self.viewport, &*self.projection, &self.curves);
        let city_label = selection.city_label(&self.index).map(str::to_string);
        let street_labels = selection
            .labeled_points()
            .map(|p| self.index.street_or_empty(&p.key))
            .filter(|street| !street.is_empty())
            .map(str::to_string)
            .collect();
        let fingers = if config.collection_enabled() {
            self.collect(input, config, &selection, &mut recorded)
        } else {
            Vec::new()
        };
        let points = self.display_points(selection.points, config);

        let playback = if config.music_visualization {
            self.playback(input.elapsed_secs, config.music_speed)
        } else {
            None
        };

        FrameOutput {
            center: self.viewport.center,
            center_screen: selection.center,
            points,
            city_label,
            street_labels,
            fingers,
            recorded,
            playback,
        }
    }

    fn drain_completions(&mut self) -> usize {
        let mut recorded = 0;
        for completion in self.sampler.poll() {
            if self.apply_outcome(completion.outcome, completion.location) {
                recorded += 1;
            }
        }
        recorded
    }

    fn navigate(&mut self, input: &FrameInput, config: &SessionConfig) {
        if config.collecting {
            return;
        }
        if self.reset_pending {
            log::info!("Returning to origin {ORIGIN}");
            self.viewport = Viewport::centered_on(ORIGIN);
            self.reset_pending = false;
            return;
        }
        if !config.navigation_enabled() {
            return;
        }

        let device = match config.input_mode {
            InputMode::Pointer => {
                let Some(pointer) = input.pointer else {
                    return;
                };
                pointer
            }
            InputMode::Hand => self.palm,
        };
        let (d_lat, d_lon) = self.navigation.step(device, config.input_mode);
        self.viewport.pan(d_lat, d_lon);
    }

    fn display_points(&self, points: Vec<VisiblePoint>, config: &SessionConfig) -> Vec<DisplayPoint> {
        points
            .into_iter()
            .map(|point| {
                let base = self
                    .sampler
                    .cache()
                    .color_for(&point.key)
                    .unwrap_or(SampledColor::EMPTY);
                let tinted = if config.cache_synthesis {
                    synthesize(self.index.street_or_empty(&point.key).len(), base)
                } else {
                    base
                };
                let color = tinted
                    .with_saturation(DISPLAY_SATURATION)
                    .with_brightness(DISPLAY_BRIGHTNESS);
                DisplayPoint { point, color }
            })
            .collect()
    }

    fn collect(
        &mut self,
        input: &FrameInput,
        config: &SessionConfig,
        selection: &Selection,
        recorded: &mut usize,
    ) -> Vec<FingerSample> {
        let mut samples = Vec::with_capacity(input.fingers.len());

        for (slot, finger) in input.fingers.iter().enumerate() {
            let screen = self.finger_screen(*finger);
            let location = self.projection.screen_to_geo(screen);

            let outcome = self.sampler.sample(slot, location, config.sample_mode);
            if self.apply_outcome(outcome, location) {
                *recorded += 1;
            }

            samples.push(FingerSample {
                slot,
                screen,
                location,
                outcome,
                color: self.retained,
                height: selection.height_near(screen, FINGER_PICK_RADIUS, &self.curves),
            });
        }

        samples
    }

    /// Records an accepted color; returns `true` if the history grew.
    fn apply_outcome(&mut self, outcome: SampleOutcome, location: Coordinate) -> bool {
        match outcome {
            SampleOutcome::Accepted(color) => {
                let entry = HistoryEntry {
                    color,
                    location,
                    height_metric: self.height_metric(),
                };
                self.history.append(self.place(), entry);
                self.retained = Some(color);
                true
            }
            SampleOutcome::Rejected => {
                log::trace!("Rejected near-white sample at {location}");
                false
            }
            SampleOutcome::Miss | SampleOutcome::Pending => false,
        }
    }

    fn playback(&self, elapsed_secs: f64, speed: f64) -> Option<PlaybackState> {
        let place = self.place();
        let len = self.history.len(place);
        let frame = playback_frame(elapsed_secs, speed, len)?;
        let entry = self.history.get(place, frame)?;
        let loudness = entry.color.channel_sum_scaled();

        Some(PlaybackState {
            frame,
            len,
            color: entry.color,
            loudness,
            position: PLAYBACK_POSITION.linear(f64::from(loudness)),
            height_metric: entry.height_metric,
        })
    }

    /// Converts a raw finger position to map surface pixels.
    #[must_use]
    pub fn finger_screen(&self, finger: [f64; 3]) -> ScreenPoint {
        let (width, height) = self.window;
        ScreenPoint::new(
            finger[0] + width * 0.5 + PALM_OFFSET_X,
            finger[2] + height * 0.5 + PALM_OFFSET_Z - FINGER_DEPTH_SHIFT,
        )
    }

    /// Height metric for the current palm depth.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn height_metric(&self) -> f32 {
        HEIGHT_METRIC.linear(self.palm[2] + PALM_OFFSET_Z) as f32
    }

    /// Queues a return to [`ORIGIN`] for the next frame that may navigate.
    pub const fn request_reset(&mut self) {
        self.reset_pending = true;
    }

    /// Moves the viewport to `city` and files future samples under it.
    pub fn switch_city(&mut self, city: City) {
        log::info!("Switching to {}", city.name);
        self.viewport = Viewport::centered_on(city.center());
        self.city = city;
    }

    /// Updates the window size used for pointer zones and finger mapping.
    pub fn resize(&mut self, width: f64, height: f64) {
        self.window = (width, height);
        self.navigation.resize(width, height);
    }

    /// Current viewport center.
    #[must_use]
    pub const fn center(&self) -> Coordinate {
        self.viewport.center
    }

    /// Active city.
    #[must_use]
    pub const fn city(&self) -> &City {
        &self.city
    }

    /// Place the active city's samples are filed under.
    #[must_use]
    pub const fn place(&self) -> PlaceId {
        self.city.place_id()
    }

    /// Collected palettes.
    #[must_use]
    pub const fn history(&self) -> &PlaceHistory {
        &self.history
    }

    /// The loaded sample index.
    #[must_use]
    pub const fn index(&self) -> &GeoIndex {
        &self.index
    }

    /// The color sampler.
    #[must_use]
    pub const fn sampler(&self) -> &ColorSampler {
        &self.sampler
    }

    /// The current projection.
    #[must_use]
    pub fn projection(&self) -> &dyn MapProjection {
        &*self.projection
    }

    /// The palette color currently in effect.
    #[must_use]
    pub const fn retained_color(&self) -> Option<SampledColor> {
        self.retained
    }
}
