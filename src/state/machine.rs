//! Mode state machine implementation
//!
//! Flips between GestureControl and PassThrough on each toggle edge.

use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::events::PipelineEvent;

/// Operating mode of a session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Gestures map to actions and annotation strokes
    #[default]
    GestureControl,
    /// Pointer moves the cursor, draw gesture holds the button
    PassThrough,
}

impl Mode {
    fn flipped(self) -> Self {
        match self {
            Mode::GestureControl => Mode::PassThrough,
            Mode::PassThrough => Mode::GestureControl,
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::GestureControl => write!(f, "GestureControl"),
            Mode::PassThrough => write!(f, "PassThrough"),
        }
    }
}

/// Owns the current mode and when it was entered
#[derive(Debug, Clone)]
pub struct ModeMachine {
    mode: Mode,
    entered_at: Option<Instant>,
}

impl ModeMachine {
    /// Start in GestureControl
    pub fn new() -> Self {
        Self {
            mode: Mode::GestureControl,
            entered_at: None,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Handle a toggle that already passed its debounce check.
    ///
    /// Returns the transition event to publish.
    pub fn toggle(&mut self, now: Instant) -> PipelineEvent {
        let previous = self.mode;
        let mode = previous.flipped();
        let duration_ms = self
            .entered_at
            .map(|t| now.saturating_duration_since(t).as_millis() as u64)
            .unwrap_or(0);

        info!(
            from = %previous,
            to = %mode,
            duration_ms = duration_ms,
            "mode transition"
        );

        self.mode = mode;
        self.entered_at = Some(now);

        PipelineEvent::ModeChanged {
            mode,
            previous,
            duration_ms,
        }
    }
}

impl Default for ModeMachine {
    fn default() -> Self {
        Self::new()
    }
}
