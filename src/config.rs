//! Configuration loading and management

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::annotation::DrawStyle;
use crate::dispatch::ActionSpec;
use crate::gesture::{ClassificationPolicy, GestureLabel};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV: &str = "HUSHHANDS_CONFIG";

/// Configuration problems that must stop the daemon before the frame loop
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cooldown_seconds must be a non-negative number of seconds a Duration can hold (got {0})")]
    InvalidCooldown(f64),

    #[error("pinch_threshold must be a finite, positive number (got {0})")]
    InvalidPinchThreshold(f32),
}

/// Daemon configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to the Unix domain socket for IPC
    pub socket_path: PathBuf,

    /// Directory for runtime data
    pub data_dir: PathBuf,

    /// Everything the gesture session reads
    pub pipeline: PipelineConfig,
}

/// Smoothing, debounce and classifier thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureSettings {
    pub policy: ClassificationPolicy,
    /// Majority-vote window size, also the pointer smoothing window
    pub min_frames_for_gesture: usize,
    pub cooldown_seconds: f64,
    /// Thumb-index tip distance, in palm lengths, below which a pinch holds
    pub pinch_threshold: f32,
    /// Multi-label predicates to evaluate
    pub labels: Vec<GestureLabel>,
}

impl Default for GestureSettings {
    fn default() -> Self {
        Self {
            policy: ClassificationPolicy::Exclusive,
            min_frames_for_gesture: 5,
            cooldown_seconds: 1.0,
            pinch_threshold: 0.06,
            labels: GestureLabel::MULTI_LABEL.to_vec(),
        }
    }
}

impl GestureSettings {
    /// Cooldown as a `Duration`, or an error for negative, NaN or
    /// unrepresentably large values
    pub fn checked_cooldown(&self) -> Result<Duration, ConfigError> {
        Duration::try_from_secs_f64(self.cooldown_seconds)
            .map_err(|_| ConfigError::InvalidCooldown(self.cooldown_seconds))
    }

    /// Cooldown of a validated config. Out-of-range values saturate.
    pub fn cooldown(&self) -> Duration {
        self.checked_cooldown().unwrap_or(Duration::MAX)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrawingSettings {
    /// Label that drives strokes and the pass-through pointer button
    pub draw_gesture: GestureLabel,
    pub color: [u8; 3],
    pub thickness: u32,
}

impl Default for DrawingSettings {
    fn default() -> Self {
        let style = DrawStyle::default();
        Self {
            draw_gesture: GestureLabel::IndexOnly,
            color: style.color,
            thickness: style.thickness,
        }
    }
}

impl DrawingSettings {
    pub fn style(&self) -> DrawStyle {
        DrawStyle {
            color: self.color,
            thickness: self.thickness,
        }
    }
}

/// The JSON-loadable part of the configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    #[serde(rename = "gesture_settings")]
    pub gestures: GestureSettings,
    pub gesture_to_action: HashMap<String, String>,
    pub actions: HashMap<String, ActionSpec>,
    pub drawing: DrawingSettings,
    pub quick_messages: Vec<String>,
    /// Overrides the default socket location
    pub socket_path: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let key = |k: &str| ActionSpec::Key {
            keys: vec![k.to_string()],
        };

        let gesture_to_action = [
            ("open_palm", "next_slide"),
            ("fist", "prev_slide"),
            ("point", "click"),
            ("ok", "quick_message"),
            ("thumb_only", "next_slide"),
            ("pinky_only", "prev_slide"),
            ("index_middle", "quick_message"),
            ("pinch_thumb_index", "click"),
            ("middle_ring_pinky", "undo_stroke"),
            ("thumb_pinky", "clear_strokes"),
        ]
        .into_iter()
        .map(|(g, a)| (g.to_string(), a.to_string()))
        .collect();

        let actions = [
            ("next_slide", key("right")),
            ("prev_slide", key("left")),
            ("click", ActionSpec::Click { pos: None }),
            ("quick_message", ActionSpec::QuickMessage),
            ("undo_stroke", ActionSpec::UndoStroke),
            ("clear_strokes", ActionSpec::ClearStrokes),
        ]
        .into_iter()
        .map(|(a, s)| (a.to_string(), s))
        .collect();

        Self {
            gestures: GestureSettings::default(),
            gesture_to_action,
            actions,
            drawing: DrawingSettings::default(),
            quick_messages: vec![
                "Be right back".to_string(),
                "Can you hear me?".to_string(),
                "Thanks!".to_string(),
            ],
            socket_path: None,
        }
    }
}

impl PipelineConfig {
    /// Parse a JSON config document
    pub fn from_json(contents: &str) -> serde_json::Result<Self> {
        serde_json::from_str(contents)
    }

    /// Check invariants, clamping the recoverable ones.
    ///
    /// Window size and pen thickness of zero are raised to one. Negative
    /// cooldowns and non-positive pinch thresholds are fatal.
    pub fn validate(&mut self) -> Result<(), ConfigError> {
        let g = &mut self.gestures;

        g.checked_cooldown()?;
        if !g.pinch_threshold.is_finite() || g.pinch_threshold <= 0.0 {
            return Err(ConfigError::InvalidPinchThreshold(g.pinch_threshold));
        }
        if g.min_frames_for_gesture == 0 {
            warn!("min_frames_for_gesture is 0, using 1");
            g.min_frames_for_gesture = 1;
        }
        if self.drawing.thickness == 0 {
            warn!("drawing thickness is 0, using 1");
            self.drawing.thickness = 1;
        }

        for (gesture, action) in &self.gesture_to_action {
            if !self.actions.contains_key(action) {
                warn!(gesture = %gesture, action = %action, "mapping refers to an undefined action");
            }
        }

        Ok(())
    }
}

impl Config {
    /// Load configuration from environment, config file and defaults
    pub fn load() -> Result<Self> {
        let home = std::env::var("HOME")?;
        let home = PathBuf::from(home);

        let explicit = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
        let default_file = home.join(".config").join("hushhands").join("config.json");

        let pipeline = match explicit {
            Some(path) => Self::read_file(&path)?,
            None if default_file.exists() => Self::read_file(&default_file)?,
            None => PipelineConfig::default(),
        };

        Self::resolve(&home, pipeline)
    }

    /// Validate `pipeline` and fill in paths relative to `home`
    pub fn resolve(home: &Path, mut pipeline: PipelineConfig) -> Result<Self> {
        pipeline.validate()?;

        let data_dir = home.join(".local").join("share").join("hushhands");
        let socket_path = pipeline
            .socket_path
            .clone()
            .unwrap_or_else(|| data_dir.join("daemon.sock"));

        Ok(Self {
            socket_path,
            data_dir,
            pipeline,
        })
    }

    /// Ensure data directory exists
    pub fn ensure_dirs(&self) -> Result<()> {
        std::fs::create_dir_all(&self.data_dir)?;
        Ok(())
    }

    fn read_file(path: &Path) -> Result<PipelineConfig> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let pipeline = PipelineConfig::from_json(&contents)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        info!(path = %path.display(), "config file loaded");
        Ok(pipeline)
    }
}
