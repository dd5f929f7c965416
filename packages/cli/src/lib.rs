#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Headless driver for the color world installation.
//!
//! Loads the configured dataset, runs a scripted session (explore, collect,
//! play back) and reports the palette that was gathered. There is no
//! renderer; everything a renderer would draw is summarized in the log and
//! the final report.

pub mod interactive;
pub mod report;
pub mod script;

use std::time::Duration;

use color_world_cli_utils::{IndicatifProgress, MultiProgress};
use color_world_geo_index::cities::{self, City};
use color_world_models::{InputMode, SampleMode};
use color_world_session::{AppConfig, FrameInput, KeyAction, Session, SessionConfig};
use tokio::runtime::Handle;
use tokio::time::MissedTickBehavior;

use crate::report::{RunReport, hex};
use crate::script::Script;

/// Settings for a scripted run.
#[derive(Debug, Clone, PartialEq)]
#[allow(clippy::struct_excessive_bools)]
pub struct RunOptions {
    /// Frames to run.
    pub frames: u64,
    /// Frame rate of the script (and of the pacing in real time mode).
    pub fps: f64,
    /// City to start in instead of the configured one.
    pub city: Option<String>,
    /// Sample from the local image cache instead of the image service.
    pub offline: bool,
    /// Tint map points with the per-street synthesis.
    pub synthesis: bool,
    /// Navigate with the pointer instead of the hand.
    pub pointer: bool,
    /// Pace frames at `fps` instead of running them back to back.
    pub realtime: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            frames: 600,
            fps: 60.0,
            city: None,
            offline: false,
            synthesis: true,
            pointer: false,
            realtime: false,
        }
    }
}

/// Looks up a city by name, ignoring case.
///
/// # Errors
///
/// Returns an error naming the city if it is not in the registry.
pub fn find_city(name: &str) -> Result<City, Box<dyn std::error::Error>> {
    cities::all_cities()
        .into_iter()
        .find(|city| city.name.eq_ignore_ascii_case(name))
        .ok_or_else(|| format!("Unknown city: {name}").into())
}

/// Loads the session described by `app`, showing load progress on
/// `multi`.
///
/// Must be called from within a tokio runtime; remote fetches are spawned
/// onto it.
///
/// # Errors
///
/// Returns an error if the dataset cannot be loaded or `city` is unknown.
pub fn load_session(
    app: &AppConfig,
    city: Option<&str>,
    multi: &MultiProgress,
) -> Result<Session, Box<dyn std::error::Error>> {
    let progress = IndicatifProgress::loading_bar(multi, "Loading dataset");
    let mut session = Session::load(app, Handle::current(), progress.as_ref())?;

    if let Some(name) = city {
        session.switch_city(find_city(name)?);
    }

    Ok(session)
}

/// Runs a scripted session and returns its report.
///
/// # Errors
///
/// Returns an error if the session cannot be loaded.
pub async fn run(
    app: &AppConfig,
    options: &RunOptions,
    multi: &MultiProgress,
) -> Result<RunReport, Box<dyn std::error::Error>> {
    if options.fps <= 0.0 {
        return Err(format!("fps must be positive, got {}", options.fps).into());
    }

    let mut session = load_session(app, options.city.as_deref(), multi)?;
    let script = Script::new(
        options.frames,
        options.fps,
        (app.display.window_width, app.display.window_height),
    );

    let mut config = SessionConfig {
        input_mode: if options.pointer {
            InputMode::Pointer
        } else {
            InputMode::Hand
        },
        sample_mode: if options.offline {
            SampleMode::Local
        } else {
            SampleMode::Remote
        },
        cache_synthesis: options.synthesis,
        ..SessionConfig::default()
    };

    let mut ticker = options.realtime.then(|| {
        let mut interval = tokio::time::interval(Duration::from_secs_f64(1.0 / options.fps));
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        interval
    });

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let log_every = (options.fps.round() as u64).max(1);

    log::info!(
        "Running {} frames in {} ({} input, {} sampling)",
        script.len(),
        session.city().name,
        config.input_mode,
        config.sample_mode
    );

    let mut report = RunReport::default();

    for frame in script.frames() {
        match ticker.as_mut() {
            Some(interval) => {
                interval.tick().await;
            }
            // Lets spawned fetches make progress between frames.
            None => tokio::task::yield_now().await,
        }

        if let Some(gesture) = frame.gesture {
            log::info!("Gesture: {gesture}");
            config.apply_gesture(gesture);
        }
        if let Some(key) = frame.key
            && config.handle_key(key) == Some(KeyAction::ResetToOrigin)
        {
            session.request_reset();
        }

        let output = session.step(&frame.input, &config);

        if frame.index % log_every == 0 {
            log::debug!(
                "frame {} {:?}: center {} visible {} label {:?} palette {}",
                frame.index,
                frame.phase,
                output.center,
                output.points.len(),
                output.city_label,
                session.history().len(session.place()),
            );
        }
        if let Some(playback) = &output.playback {
            log::trace!(
                "playback {}/{} {} position {:.2} height {:.1}",
                playback.frame,
                playback.len,
                hex(playback.color),
                playback.position,
                playback.height_metric,
            );
        }

        report.observe(&output);
    }

    report.finish(session.place(), session.history());
    log::info!(
        "Run finished: {} colors recorded, {} stale fetches discarded",
        report.recorded,
        session.sampler().remote().stale_discarded()
    );

    Ok(report)
}

/// Prints what is visible around a city without moving.
///
/// # Errors
///
/// Returns an error if the session cannot be loaded or `city` is unknown.
pub fn inspect(
    app: &AppConfig,
    city: Option<&str>,
    limit: usize,
    multi: &MultiProgress,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = load_session(app, city, multi)?;

    let (width, height) = (app.display.window_width, app.display.window_height);
    let config = SessionConfig {
        input_mode: InputMode::Pointer,
        ..SessionConfig::default()
    };
    let input = FrameInput {
        pointer: Some([width * 0.5, height * 0.5, 0.0]),
        ..FrameInput::default()
    };
    let output = session.step(&input, &config);
    let index = session.index();

    println!("Sample points:   {}", index.len());
    println!("Cached images:   {}", session.sampler().cache().len());
    println!("City:            {} ({})", session.city().name, session.place());
    println!("Center:          {}", output.center);
    println!("Visible points:  {}", output.points.len());
    println!(
        "City label:      {}",
        output.city_label.as_deref().unwrap_or("-")
    );

    if !output.street_labels.is_empty() {
        println!("Street labels:   {}", output.street_labels.join(", "));
    }

    if !output.points.is_empty() {
        println!();
        println!(
            "{:<24} {:>9} {:>9} {:>8}  STREET",
            "KEY", "ELEV (m)", "DIST", "COLOR"
        );
        println!("{}", "-".repeat(72));
        for point in output.points.iter().take(limit) {
            println!(
                "{:<24} {:>9.1} {:>9.1} {:>8}  {}",
                point.point.key.as_str(),
                point.point.elevation,
                point.point.distance,
                hex(point.color),
                index.street_or_empty(&point.point.key),
            );
        }
    }

    Ok(())
}

/// Prints the city registry.
pub fn list_cities() {
    println!("{:<4} {:<16} {:>11} {:>11}", "ID", "NAME", "LAT", "LON");
    println!("{}", "-".repeat(45));
    for city in cities::all_cities() {
        println!(
            "{:<4} {:<16} {:>11.6} {:>11.6}",
            city.id, city.name, city.latitude, city.longitude
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn city_lookup_ignores_case() {
        assert_eq!(find_city("seoul").unwrap().name, "Seoul");
        assert!(find_city("Atlantis").is_err());
    }

    #[test]
    fn default_run_is_ten_seconds_at_sixty_fps() {
        let options = RunOptions::default();
        assert_eq!(options.frames, 600);
        assert!((options.fps - 60.0).abs() < f64::EPSILON);
        assert!(options.synthesis);
        assert!(!options.offline);
    }
}
