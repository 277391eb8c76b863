//! Action table and dispatcher

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::gesture::GestureLabel;

/// What an action does, as configured
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionSpec {
    /// Press keys one after another
    Key { keys: Vec<String> },
    /// Press keys together
    Hotkey { keys: Vec<String> },
    TypeText { text: String },
    /// Click at `pos`, or wherever the cursor is
    Click {
        #[serde(default)]
        pos: Option<(i32, i32)>,
    },
    /// Type the next entry of the quick-message list
    QuickMessage,
    /// Remove the most recent annotation stroke
    UndoStroke,
    /// Remove every annotation stroke
    ClearStrokes,
}

/// Outcome of resolving a confirmed gesture
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatch {
    /// Hand to the injector
    Inject { action: String, spec: ActionSpec },
    UndoStroke,
    ClearStrokes,
}

/// Resolves confirmed gestures through the configured mapping
#[derive(Debug, Clone)]
pub struct Dispatcher {
    gesture_to_action: HashMap<String, String>,
    actions: HashMap<String, ActionSpec>,
    quick_messages: Vec<String>,
    next_message: usize,
}

impl Dispatcher {
    pub fn new(
        gesture_to_action: HashMap<String, String>,
        actions: HashMap<String, ActionSpec>,
        quick_messages: Vec<String>,
    ) -> Self {
        Self {
            gesture_to_action,
            actions,
            quick_messages,
            next_message: 0,
        }
    }

    /// Action name mapped to `gesture`, if any
    pub fn action_for(&self, gesture: GestureLabel) -> Option<&str> {
        self.gesture_to_action
            .get(gesture.as_str())
            .map(String::as_str)
    }

    /// Resolve `gesture` into something to do.
    ///
    /// Unmapped gestures and undefined actions are reported and yield `None`.
    pub fn resolve(&mut self, gesture: GestureLabel) -> Option<Dispatch> {
        let Some(action) = self.gesture_to_action.get(gesture.as_str()) else {
            warn!(%gesture, "no action mapped for gesture");
            return None;
        };

        let Some(spec) = self.actions.get(action) else {
            warn!(%gesture, action = %action, "unknown action");
            return None;
        };

        info!(%gesture, action = %action, "dispatching action");

        match spec {
            ActionSpec::UndoStroke => Some(Dispatch::UndoStroke),
            ActionSpec::ClearStrokes => Some(Dispatch::ClearStrokes),
            ActionSpec::QuickMessage => {
                if self.quick_messages.is_empty() {
                    warn!(action = %action, "quick message requested but none configured");
                    return None;
                }
                let text = self.quick_messages[self.next_message].clone();
                self.next_message = (self.next_message + 1) % self.quick_messages.len();
                Some(Dispatch::Inject {
                    action: action.clone(),
                    spec: ActionSpec::TypeText { text },
                })
            }
            other => Some(Dispatch::Inject {
                action: action.clone(),
                spec: other.clone(),
            }),
        }
    }
}
