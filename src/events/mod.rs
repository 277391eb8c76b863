//! Events published by the gesture pipeline
//!
//! Every externally visible outcome of a frame is one of these. They are
//! broadcast to IPC subscribers, the action injector among them.

use serde::{Deserialize, Serialize};

use crate::dispatch::ActionSpec;
use crate::gesture::GestureLabel;
use crate::landmarks::Point;
use crate::state::Mode;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PipelineEvent {
    /// A gesture passed stabilization
    GestureConfirmed { gesture: GestureLabel },

    /// An OS action should be performed by the injector
    ActionTriggered {
        gesture: GestureLabel,
        action: String,
        spec: ActionSpec,
    },

    /// Operating mode flipped
    ModeChanged {
        mode: Mode,
        previous: Mode,
        /// How long the previous mode was active
        duration_ms: u64,
    },

    /// Pass-through cursor position (normalized)
    PointerMoved { x: f32, y: f32 },

    /// Draw gesture began in pass-through mode
    PointerPressed,

    /// Draw gesture ended in pass-through mode
    PointerReleased,

    StrokeStarted,

    StrokeCommitted {
        /// Points in the committed stroke
        points: usize,
        /// Committed strokes after this one
        strokes: usize,
    },

    StrokeUndone { strokes: usize },

    StrokesCleared,

    /// Per-frame summary, published after the frame's other events
    FrameProcessed {
        frame: u64,
        mode: Mode,
        /// Raw index-fingertip position, in either mode
        pointer: Option<Point>,
        confirmed: Vec<GestureLabel>,
    },
}

impl std::fmt::Display for PipelineEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineEvent::GestureConfirmed { gesture } => {
                write!(f, "GESTURE_CONFIRMED ({})", gesture)
            }
            PipelineEvent::ActionTriggered {
                gesture, action, ..
            } => write!(f, "ACTION_TRIGGERED ({} -> {})", gesture, action),
            PipelineEvent::ModeChanged { mode, previous, .. } => {
                write!(f, "MODE_CHANGED ({} -> {})", previous, mode)
            }
            PipelineEvent::PointerMoved { x, y } => write!(f, "POINTER_MOVED ({:.3}, {:.3})", x, y),
            PipelineEvent::PointerPressed => write!(f, "POINTER_PRESSED"),
            PipelineEvent::PointerReleased => write!(f, "POINTER_RELEASED"),
            PipelineEvent::StrokeStarted => write!(f, "STROKE_STARTED"),
            PipelineEvent::StrokeCommitted { points, .. } => {
                write!(f, "STROKE_COMMITTED ({} points)", points)
            }
            PipelineEvent::StrokeUndone { strokes } => {
                write!(f, "STROKE_UNDONE ({} left)", strokes)
            }
            PipelineEvent::StrokesCleared => write!(f, "STROKES_CLEARED"),
            PipelineEvent::FrameProcessed { frame, mode, .. } => {
                write!(f, "FRAME_PROCESSED (#{} in {})", frame, mode)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization() {
        let event = PipelineEvent::ActionTriggered {
            gesture: GestureLabel::OpenPalm,
            action: "next_slide".into(),
            spec: ActionSpec::Key {
                keys: vec!["right".into()],
            },
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("action_triggered"));
        assert!(json.contains("open_palm"));
        assert!(json.contains("next_slide"));
    }

    #[test]
    fn test_event_deserialization() {
        let json = r#"{"type":"mode_changed","mode":"pass_through","previous":"gesture_control","duration_ms":10}"#;
        let event: PipelineEvent = serde_json::from_str(json).unwrap();
        assert!(matches!(
            event,
            PipelineEvent::ModeChanged {
                mode: Mode::PassThrough,
                ..
            }
        ));
    }

    #[test]
    fn test_frame_summary_serialization() {
        let event = PipelineEvent::FrameProcessed {
            frame: 7,
            mode: Mode::GestureControl,
            pointer: Some(Point::new(0.25, 0.5)),
            confirmed: vec![GestureLabel::Fist],
        };
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(
            json,
            r#"{"type":"frame_processed","frame":7,"mode":"gesture_control","pointer":{"x":0.25,"y":0.5},"confirmed":["fist"]}"#
        );
    }

    #[test]
    fn test_display() {
        let event = PipelineEvent::StrokeCommitted {
            points: 12,
            strokes: 3,
        };
        assert_eq!(event.to_string(), "STROKE_COMMITTED (12 points)");
    }
}
