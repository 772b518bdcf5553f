use serde::Deserialize;
use std::path::Path;

use crate::view::{MAX_SCALE, MIN_SCALE};

#[derive(Debug, Clone, Deserialize)]
pub struct GameConfig {
    #[serde(default = "default_tile_pitch")]
    pub tile_pitch: f64,
    #[serde(default = "default_tile_size")]
    pub tile_size: f64,
    #[serde(default = "default_min_scale")]
    pub min_scale: f64,
    #[serde(default = "default_max_scale")]
    pub max_scale: f64,
    #[serde(default = "default_deck_size")]
    pub deck_size: usize,
    #[serde(default = "default_focus_offset")]
    pub focus_offset: f64,
    #[serde(default = "default_option_reveal_delay_ms")]
    pub option_reveal_delay_ms: u64,
    #[serde(default = "default_refill_stagger_ms")]
    pub refill_stagger_ms: u64,
    #[serde(default = "default_drag_probe_offset")]
    pub drag_probe_offset: f64,
    #[serde(default = "default_drag_probe_size")]
    pub drag_probe_size: f64,
    #[serde(default = "default_screen_width")]
    pub screen_width: f64,
    #[serde(default = "default_screen_height")]
    pub screen_height: f64,
    #[serde(default)]
    pub tap_to_place: bool,
    #[serde(default)]
    pub seed: u64,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_tile_pitch() -> f64 {
    100.0
}
fn default_tile_size() -> f64 {
    100.0
}
fn default_min_scale() -> f64 {
    MIN_SCALE
}
fn default_max_scale() -> f64 {
    MAX_SCALE
}
fn default_deck_size() -> usize {
    5
}
fn default_focus_offset() -> f64 {
    100.0
}
fn default_option_reveal_delay_ms() -> u64 {
    400
}
fn default_refill_stagger_ms() -> u64 {
    150
}
fn default_drag_probe_offset() -> f64 {
    50.0
}
fn default_drag_probe_size() -> f64 {
    5.0
}
fn default_screen_width() -> f64 {
    400.0
}
fn default_screen_height() -> f64 {
    800.0
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            tile_pitch: default_tile_pitch(),
            tile_size: default_tile_size(),
            min_scale: default_min_scale(),
            max_scale: default_max_scale(),
            deck_size: default_deck_size(),
            focus_offset: default_focus_offset(),
            option_reveal_delay_ms: default_option_reveal_delay_ms(),
            refill_stagger_ms: default_refill_stagger_ms(),
            drag_probe_offset: default_drag_probe_offset(),
            drag_probe_size: default_drag_probe_size(),
            screen_width: default_screen_width(),
            screen_height: default_screen_height(),
            tap_to_place: false,
            seed: 0,
            log_level: default_log_level(),
        }
    }
}

impl GameConfig {
    pub fn from_file(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Cannot read {}: {}", path.display(), e))?;
        Self::from_toml_str(&content, path)
    }

    /// Like [`GameConfig::from_file`], but a missing file yields the defaults.
    pub fn from_file_or_default(path: &Path) -> Result<Self, String> {
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn from_toml_str(content: &str, source_path: &Path) -> Result<Self, String> {
        let config: GameConfig =
            toml::from_str(content).map_err(|e| format!("{}: {}", source_path.display(), e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), String> {
        let mut errors = Vec::new();

        if !self.tile_pitch.is_finite() || self.tile_pitch < 1.0 || self.tile_pitch.fract() != 0.0 {
            errors.push(format!(
                "tile_pitch must be a whole number >= 1, got {}. Example: tile_pitch = 100.0",
                self.tile_pitch
            ));
        }

        if !self.tile_size.is_finite()
            || self.tile_size <= 0.0
            || (self.tile_pitch.is_finite() && self.tile_size > self.tile_pitch * 4.0)
        {
            errors.push(format!(
                "tile_size must be > 0 and <= 4 * tile_pitch, got {}. Example: tile_size = 100.0",
                self.tile_size
            ));
        }

        if !(self.min_scale >= MIN_SCALE
            && self.max_scale <= MAX_SCALE
            && self.min_scale < self.max_scale)
        {
            errors.push(format!(
                "min_scale and max_scale must satisfy {} <= min_scale < max_scale <= {}, got {} and {}. Example: min_scale = 0.1, max_scale = 5.0",
                MIN_SCALE, MAX_SCALE, self.min_scale, self.max_scale
            ));
        }

        if !(1..=20).contains(&self.deck_size) {
            errors.push(format!(
                "deck_size must be 1-20, got {}. Example: deck_size = 5",
                self.deck_size
            ));
        }

        if !self.focus_offset.is_finite() {
            errors.push(format!(
                "focus_offset must be finite, got {}. Example: focus_offset = 100.0",
                self.focus_offset
            ));
        }

        if !self.drag_probe_offset.is_finite() {
            errors.push(format!(
                "drag_probe_offset must be finite, got {}. Example: drag_probe_offset = 50.0",
                self.drag_probe_offset
            ));
        }

        if !self.drag_probe_size.is_finite() || self.drag_probe_size <= 0.0 {
            errors.push(format!(
                "drag_probe_size must be > 0, got {}. Example: drag_probe_size = 5.0",
                self.drag_probe_size
            ));
        }

        if !(self.screen_width > 0.0 && self.screen_width.is_finite())
            || !(self.screen_height > 0.0 && self.screen_height.is_finite())
        {
            errors.push(format!(
                "screen_width and screen_height must be > 0, got {}x{}. Example: screen_width = 400.0",
                self.screen_width, self.screen_height
            ));
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            errors.push(format!(
                "log_level must be one of {:?}, got \"{}\". Example: log_level = \"info\"",
                valid_levels, self.log_level
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors.join("\n"))
        }
    }
}
