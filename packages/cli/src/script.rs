//! Synthetic input for headless runs.
//!
//! A run is split into three phases by frame count: the palm circles
//! around its rest position to pan the map, then five fingers sweep over
//! the map surface while colors are collected, and finally the playback
//! view replays what was gathered.

use color_world_session::{FrameInput, Gesture};

/// Fraction of the run spent exploring.
const EXPLORE_END: f64 = 0.45;

/// Fraction of the run after which collection stops.
const COLLECT_END: f64 = 0.8;

/// Palm orbit radius while exploring. Past the dead zone and the ramp, so
/// the map pans at full speed on the outer part of the circle.
const ORBIT_RADIUS: f64 = 120.0;

/// Palm height above the controller.
const PALM_HEIGHT: f64 = 200.0;

const FINGER_COUNT: usize = 5;
const FINGER_SPACING: f64 = 40.0;

/// Finger position that lands on the middle of the map surface of a
/// 1024x768 window.
const FINGER_CENTER: (f64, f64) = (18.0, -148.0);

/// Which part of the run a frame belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Explore,
    Collect,
    Playback,
}

/// Input for one scripted frame, plus the mode events fired on it.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptedFrame {
    pub index: u64,
    pub phase: Phase,
    pub input: FrameInput,
    pub gesture: Option<Gesture>,
    pub key: Option<char>,
}

/// A fixed-length scripted run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Script {
    frames: u64,
    fps: f64,
    window: (f64, f64),
}

impl Script {
    /// # Panics
    ///
    /// Panics if `fps` is not positive.
    #[must_use]
    pub fn new(frames: u64, fps: f64, window: (f64, f64)) -> Self {
        assert!(fps > 0.0, "fps must be positive");
        Self {
            frames,
            fps,
            window,
        }
    }

    #[must_use]
    pub const fn len(&self) -> u64 {
        self.frames
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.frames == 0
    }

    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn phase(&self, frame: u64) -> Phase {
        let progress = frame as f64 / self.frames.max(1) as f64;
        if progress < EXPLORE_END {
            Phase::Explore
        } else if progress < COLLECT_END {
            Phase::Collect
        } else {
            Phase::Playback
        }
    }

    /// Builds frame `frame`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn frame(&self, frame: u64) -> ScriptedFrame {
        let t = frame as f64 / self.fps;
        let phase = self.phase(frame);
        let entering = frame == 0 || self.phase(frame - 1) != phase;
        let (width, height) = self.window;

        let mut input = FrameInput {
            elapsed_secs: t,
            pointer: Some([width * 0.5, height * 0.5, 0.0]),
            palm: Some([0.0, PALM_HEIGHT, 0.0]),
            fingers: Vec::new(),
        };
        let mut gesture = None;
        let mut key = None;

        match phase {
            Phase::Explore => {
                let angle = t * 0.4;
                input.palm = Some([
                    ORBIT_RADIUS * angle.cos(),
                    PALM_HEIGHT,
                    ORBIT_RADIUS * angle.sin(),
                ]);
                input.pointer = Some([
                    width * 0.35f64.mul_add(angle.cos(), 0.5),
                    height * 0.35f64.mul_add(angle.sin(), 0.5),
                    0.0,
                ]);
            }
            Phase::Collect => {
                if entering {
                    gesture = Some(Gesture::CircleLeft);
                }
                input.palm = Some([0.0, PALM_HEIGHT, 60.0f64.mul_add(t.sin(), 100.0)]);
                input.fingers = (0..FINGER_COUNT)
                    .map(|i| {
                        #[allow(clippy::cast_precision_loss)]
                        let spread = (i as f64 - 2.0) * FINGER_SPACING;
                        [
                            80.0f64.mul_add((t * 0.7).sin(), FINGER_CENTER.0 + spread),
                            PALM_HEIGHT,
                            60.0f64.mul_add(0.9f64.mul_add(t, spread).cos(), FINGER_CENTER.1),
                        ]
                    })
                    .collect();
            }
            Phase::Playback => {
                if entering {
                    gesture = Some(Gesture::CircleRight);
                    key = Some('r');
                }
            }
        }

        ScriptedFrame {
            index: frame,
            phase,
            input,
            gesture,
            key,
        }
    }

    /// Every frame in order.
    pub fn frames(&self) -> impl Iterator<Item = ScriptedFrame> + '_ {
        (0..self.frames).map(|frame| self.frame(frame))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use color_world_navigation::{HAND_ACTIVATION, HAND_THRESHOLD};

    fn script() -> Script {
        Script::new(100, 60.0, (1024.0, 768.0))
    }

    #[test]
    fn phases_split_the_run() {
        let script = script();
        assert_eq!(script.phase(0), Phase::Explore);
        assert_eq!(script.phase(44), Phase::Explore);
        assert_eq!(script.phase(45), Phase::Collect);
        assert_eq!(script.phase(79), Phase::Collect);
        assert_eq!(script.phase(80), Phase::Playback);
        assert_eq!(script.frames().count(), 100);
    }

    #[test]
    fn gestures_fire_once_on_phase_changes() {
        let frames: Vec<ScriptedFrame> = script().frames().collect();

        let gestures: Vec<(u64, Gesture)> = frames
            .iter()
            .filter_map(|f| f.gesture.map(|g| (f.index, g)))
            .collect();
        assert_eq!(
            gestures,
            vec![(45, Gesture::CircleLeft), (80, Gesture::CircleRight)]
        );

        let keys: Vec<(u64, char)> = frames
            .iter()
            .filter_map(|f| f.key.map(|k| (f.index, k)))
            .collect();
        assert_eq!(keys, vec![(80, 'r')]);
    }

    #[test]
    fn fingers_only_while_collecting() {
        for frame in script().frames() {
            let expected = if frame.phase == Phase::Collect {
                FINGER_COUNT
            } else {
                0
            };
            assert_eq!(frame.input.fingers.len(), expected, "frame {}", frame.index);
        }
    }

    #[test]
    fn exploring_palm_leaves_the_dead_zone() {
        let palm = script().frame(0).input.palm.unwrap();
        assert!(palm[0].abs() > HAND_THRESHOLD + HAND_ACTIVATION);
    }

    #[test]
    fn elapsed_time_follows_fps() {
        let frame = script().frame(30);
        assert!((frame.input.elapsed_secs - 0.5).abs() < 1e-12);
    }

    #[test]
    #[should_panic(expected = "fps must be positive")]
    fn zero_fps_is_rejected() {
        let _ = Script::new(10, 0.0, (1024.0, 768.0));
    }
}
