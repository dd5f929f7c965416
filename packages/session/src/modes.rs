//! Runtime mode flags and the inputs that flip them.
//!
//! Nothing here is global: the frame loop owns one [`SessionConfig`] and
//! passes it into every [`crate::Session::step`].

use color_world_models::{InputMode, SampleMode};
use strum_macros::{AsRefStr, Display, EnumIter};

/// Step applied to the playback speed by the speed keys.
pub const MUSIC_SPEED_STEP: f64 = 0.1;

/// Mode flags read by the frame step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionConfig {
    /// Device driving navigation.
    pub input_mode: InputMode,
    /// Online (remote) or offline (local cache) sampling.
    pub sample_mode: SampleMode,
    /// Tint map points with the per-street synthesis.
    pub cache_synthesis: bool,
    /// Playback view instead of the map.
    pub music_visualization: bool,
    /// Fingers collect colors; navigation is frozen.
    pub collecting: bool,
    /// Playback speed adjustment.
    pub music_speed: f64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            input_mode: InputMode::Hand,
            sample_mode: SampleMode::Remote,
            cache_synthesis: true,
            music_visualization: false,
            collecting: false,
            music_speed: 0.0,
        }
    }
}

/// Something the caller must do in response to a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    /// Return the viewport to the origin.
    ResetToOrigin,
}

impl SessionConfig {
    /// `true` when the frame step may pan the map.
    #[must_use]
    pub const fn navigation_enabled(&self) -> bool {
        !self.collecting && !self.music_visualization
    }

    /// `true` when fingers sample colors this frame.
    #[must_use]
    pub const fn collection_enabled(&self) -> bool {
        self.collecting && !self.music_visualization
    }

    /// Applies a keyboard shortcut.
    ///
    /// `l` input device, `e` online/offline, `c` cache synthesis, `r`
    /// playback view, `+`/`-` playback speed, `o` reset to origin.
    pub fn handle_key(&mut self, key: char) -> Option<KeyAction> {
        match key.to_ascii_lowercase() {
            'l' => {
                self.input_mode = match self.input_mode {
                    InputMode::Hand => InputMode::Pointer,
                    InputMode::Pointer => InputMode::Hand,
                };
            }
            'e' => {
                self.sample_mode = match self.sample_mode {
                    SampleMode::Remote => SampleMode::Local,
                    SampleMode::Local => SampleMode::Remote,
                };
            }
            'c' => self.cache_synthesis = !self.cache_synthesis,
            'r' => self.music_visualization = !self.music_visualization,
            '+' => self.music_speed += MUSIC_SPEED_STEP,
            '-' => self.music_speed -= MUSIC_SPEED_STEP,
            'o' => return Some(KeyAction::ResetToOrigin),
            other => log::trace!("Unbound key {other:?}"),
        }
        None
    }

    /// Applies a recognized hand gesture.
    pub fn apply_gesture(&mut self, gesture: Gesture) {
        match gesture {
            Gesture::CircleLeft => self.collecting = true,
            Gesture::CircleRight => self.collecting = false,
            _ => {}
        }
    }
}

/// Gestures reported by the hand-tracking controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr, EnumIter)]
#[strum(serialize_all = "title_case")]
pub enum Gesture {
    ScreenTap,
    KeyTap,
    SwipeRight,
    SwipeLeft,
    SwipeDown,
    SwipeUp,
    SwipeForward,
    SwipeBackwards,
    /// Starts color collection.
    CircleLeft,
    /// Stops color collection.
    CircleRight,
}

impl Gesture {
    /// Maps the controller's numeric gesture code (1–10).
    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        Some(match code {
            1 => Self::ScreenTap,
            2 => Self::KeyTap,
            3 => Self::SwipeRight,
            4 => Self::SwipeLeft,
            5 => Self::SwipeDown,
            6 => Self::SwipeUp,
            7 => Self::SwipeForward,
            8 => Self::SwipeBackwards,
            9 => Self::CircleLeft,
            10 => Self::CircleRight,
            _ => return None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn defaults_match_installation_startup() {
        let config = SessionConfig::default();
        assert_eq!(config.input_mode, InputMode::Hand);
        assert_eq!(config.sample_mode, SampleMode::Remote);
        assert!(config.cache_synthesis);
        assert!(config.navigation_enabled());
        assert!(!config.collection_enabled());
    }

    #[test]
    fn circle_gestures_toggle_collection() {
        let mut config = SessionConfig::default();
        config.apply_gesture(Gesture::CircleLeft);
        assert!(config.collecting);
        assert!(!config.navigation_enabled());

        config.apply_gesture(Gesture::SwipeUp);
        assert!(config.collecting);

        config.apply_gesture(Gesture::CircleRight);
        assert!(!config.collecting);
    }

    #[test]
    fn music_view_freezes_navigation_and_collection() {
        let mut config = SessionConfig::default();
        config.apply_gesture(Gesture::CircleLeft);
        config.handle_key('r');
        assert!(!config.navigation_enabled());
        assert!(!config.collection_enabled());
    }

    #[test]
    fn keys_toggle_modes() {
        let mut config = SessionConfig::default();
        assert!(config.handle_key('l').is_none());
        assert_eq!(config.input_mode, InputMode::Pointer);
        config.handle_key('E');
        assert_eq!(config.sample_mode, SampleMode::Local);
        config.handle_key('c');
        assert!(!config.cache_synthesis);
        assert_eq!(config.handle_key('o'), Some(KeyAction::ResetToOrigin));
        assert!(config.handle_key('z').is_none());
    }

    #[test]
    fn speed_keys_step_by_a_tenth() {
        let mut config = SessionConfig::default();
        config.handle_key('+');
        config.handle_key('+');
        config.handle_key('-');
        assert!((config.music_speed - 0.1).abs() < 1e-12);
    }

    #[test]
    fn gesture_codes_cover_all_gestures() {
        let decoded: Vec<Gesture> = (1..=10).filter_map(Gesture::from_code).collect();
        assert_eq!(decoded, Gesture::iter().collect::<Vec<_>>());
        assert!(Gesture::from_code(0).is_none());
        assert!(Gesture::from_code(11).is_none());
        assert_eq!(Gesture::CircleLeft.to_string(), "Circle Left");
    }
}
