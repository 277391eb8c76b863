//! IPC message protocol definitions
//!
//! All messages are JSON-encoded, prefixed with a 4-byte little-endian length.

use serde::{Deserialize, Serialize};

use crate::annotation::AnnotationSnapshot;
use crate::events::PipelineEvent;
use crate::gesture::{ClassificationPolicy, GestureLabel};
use crate::landmarks::HandObservation;
use crate::state::Mode;

/// Largest accepted message body
pub const MAX_MESSAGE_LEN: usize = 1024 * 1024;

/// Requests from clients to the daemon
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    /// Request current daemon status
    GetStatus,

    /// Ping to check connectivity
    Ping,

    /// Subscribe to pipeline event notifications
    Subscribe,

    /// Hands detected in one captured frame (may be empty)
    SubmitFrame {
        #[serde(default)]
        hands: Vec<HandObservation>,
    },

    /// Remove the most recent annotation stroke
    UndoStroke,

    /// Remove every annotation stroke
    ClearStrokes,

    /// Fetch the annotation layer and its rendered segments
    GetAnnotations,
}

/// Messages from daemon to clients
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    /// Current daemon status
    Status(DaemonStatus),

    /// Pong response to ping
    Pong,

    /// Subscription confirmed
    Subscribed,

    /// Frame or command queued for the pipeline
    Accepted,

    /// Annotation layer copy
    Annotations(AnnotationSnapshot),

    /// Pushed to subscribed clients for every pipeline event
    Notification { event: PipelineEvent },

    /// Error response
    Error { code: String, message: String },
}

impl Response {
    pub fn error(code: &str, message: impl Into<String>) -> Self {
        Self::Error {
            code: code.to_string(),
            message: message.into(),
        }
    }
}

/// Full daemon status snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonStatus {
    /// Daemon version
    pub version: String,

    /// Current mode
    pub mode: Mode,

    pub policy: ClassificationPolicy,

    /// Most recent gesture that passed stabilization
    pub last_gesture: Option<GestureLabel>,

    /// Frames submitted by trackers
    pub frames_received: u64,

    /// Uptime in seconds
    pub uptime_secs: u64,
}

impl Default for DaemonStatus {
    fn default() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            mode: Mode::default(),
            policy: ClassificationPolicy::default(),
            last_gesture: None,
            frames_received: 0,
            uptime_secs: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serialization() {
        let req = Request::SubmitFrame {
            hands: vec![HandObservation::default()],
        };
        let json = serde_json::to_string(&req).unwrap();
        assert!(json.contains("submit_frame"));
        assert!(json.contains("Right"));
    }

    #[test]
    fn test_empty_frame_deserialization() {
        let req: Request = serde_json::from_str(r#"{"type":"submit_frame"}"#).unwrap();
        assert!(matches!(req, Request::SubmitFrame { hands } if hands.is_empty()));
    }

    #[test]
    fn test_badly_shaped_point_still_decodes() {
        let json = r#"{"type":"submit_frame","hands":[{"landmarks":[[0.1,0.2]],"handedness":"Right"}]}"#;
        let req: Request = serde_json::from_str(json).unwrap();
        match req {
            Request::SubmitFrame { hands } => assert_eq!(hands[0].landmarks[0], vec![0.1, 0.2]),
            other => panic!("unexpected request: {:?}", other),
        }
    }

    #[test]
    fn test_response_serialization() {
        let resp = Response::Status(DaemonStatus::default());
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("status"));
        assert!(json.contains("gesture_control"));
    }

    #[test]
    fn test_notification_nests_event_tag() {
        let resp = Response::Notification {
            event: PipelineEvent::PointerPressed,
        };
        let json = serde_json::to_string(&resp).unwrap();
        assert_eq!(
            json,
            r#"{"type":"notification","event":{"type":"pointer_pressed"}}"#
        );
    }
}
