//! Gesture vocabulary

use serde::{Deserialize, Serialize};

/// Every label the classifier can produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GestureLabel {
    /// All five fingers extended
    OpenPalm,
    /// No finger extended
    Fist,
    /// Only the index finger extended
    Point,
    /// Thumb and index tips touching
    Ok,

    ThumbOnly,
    PinkyOnly,
    IndexMiddle,
    /// Index extended, thumb and the rest curled
    IndexOnly,
    MiddleRingPinky,
    AllFive,
    PinchThumbIndex,
    ThumbPinky,

    /// Two hands, one fully open and one fully closed
    ToggleMode,
}

impl GestureLabel {
    /// First-match order of the exclusive policy
    pub const EXCLUSIVE_PRIORITY: [GestureLabel; 4] = [
        GestureLabel::OpenPalm,
        GestureLabel::Fist,
        GestureLabel::Point,
        GestureLabel::Ok,
    ];

    /// Single-hand labels of the multi-label policy
    pub const MULTI_LABEL: [GestureLabel; 8] = [
        GestureLabel::ThumbOnly,
        GestureLabel::PinkyOnly,
        GestureLabel::IndexMiddle,
        GestureLabel::IndexOnly,
        GestureLabel::MiddleRingPinky,
        GestureLabel::AllFive,
        GestureLabel::PinchThumbIndex,
        GestureLabel::ThumbPinky,
    ];

    /// Name used in configuration and on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenPalm => "open_palm",
            Self::Fist => "fist",
            Self::Point => "point",
            Self::Ok => "ok",
            Self::ThumbOnly => "thumb_only",
            Self::PinkyOnly => "pinky_only",
            Self::IndexMiddle => "index_middle",
            Self::IndexOnly => "index_only",
            Self::MiddleRingPinky => "middle_ring_pinky",
            Self::AllFive => "all_five",
            Self::PinchThumbIndex => "pinch_thumb_index",
            Self::ThumbPinky => "thumb_pinky",
            Self::ToggleMode => "toggle_mode",
        }
    }
}

impl std::fmt::Display for GestureLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which of the two classification behaviours drives a session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationPolicy {
    /// One label per frame, majority-vote smoothed
    #[default]
    Exclusive,
    /// Every matching label per frame, per-action debounced
    MultiLabel,
}

impl std::fmt::Display for ClassificationPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Exclusive => write!(f, "exclusive"),
            Self::MultiLabel => write!(f, "multi_label"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_name_matches_as_str() {
        for label in GestureLabel::MULTI_LABEL
            .iter()
            .chain(GestureLabel::EXCLUSIVE_PRIORITY.iter())
        {
            let json = serde_json::to_string(label).unwrap();
            assert_eq!(json, format!("\"{}\"", label.as_str()));
        }
    }

    #[test]
    fn test_policy_deserialization() {
        let policy: ClassificationPolicy = serde_json::from_str("\"multi_label\"").unwrap();
        assert_eq!(policy, ClassificationPolicy::MultiLabel);
        assert_eq!(ClassificationPolicy::default(), ClassificationPolicy::Exclusive);
    }
}
