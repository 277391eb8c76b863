//! Per-frame gesture session
//!
//! Owns every piece of mutable pipeline state: the stabilization window,
//! debounce table, mode, strokes and pointer smoothing. One call to
//! `process_frame` runs a full classify, stabilize, route cycle.

use std::time::Instant;

use tracing::{debug, info};

use crate::annotation::{AnnotationLayer, AnnotationSnapshot, MovingAverage};
use crate::config::PipelineConfig;
use crate::dispatch::{Dispatch, Dispatcher};
use crate::events::PipelineEvent;
use crate::gesture::{ClassificationPolicy, Classifier, FrameGestures, GestureLabel};
use crate::landmarks::{HandObservation, Point};
use crate::stabilizer::{Debouncer, Stabilizer};
use crate::state::{Mode, ModeMachine};

/// What one frame produced
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameOutput {
    /// Gestures confirmed this frame, in routing order
    pub confirmed: Vec<GestureLabel>,
    /// Raw index-fingertip position, if the index finger is extended
    pub pointer: Option<Point>,
    /// Mode after this frame
    pub mode: Mode,
    /// Everything to publish, in order
    pub events: Vec<PipelineEvent>,
}

pub struct Session {
    policy: ClassificationPolicy,
    classifier: Classifier,
    stabilizer: Stabilizer<GestureLabel>,
    debouncer: Debouncer,
    mode: ModeMachine,
    dispatcher: Dispatcher,
    annotations: AnnotationLayer,
    smoother: MovingAverage,
    draw_gesture: GestureLabel,
    /// Pass-through pointer button state
    pointer_held: bool,
    frames: u64,
}

impl Session {
    /// Build a session from validated configuration
    pub fn new(config: &PipelineConfig) -> Self {
        let g = &config.gestures;
        Self {
            policy: g.policy,
            classifier: Classifier::new(g.pinch_threshold, g.labels.clone()),
            stabilizer: Stabilizer::new(g.min_frames_for_gesture, g.cooldown()),
            debouncer: Debouncer::new(g.cooldown()),
            mode: ModeMachine::new(),
            dispatcher: Dispatcher::new(
                config.gesture_to_action.clone(),
                config.actions.clone(),
                config.quick_messages.clone(),
            ),
            annotations: AnnotationLayer::new(config.drawing.style()),
            smoother: MovingAverage::new(g.min_frames_for_gesture),
            draw_gesture: config.drawing.draw_gesture,
            pointer_held: false,
            frames: 0,
        }
    }

    pub fn policy(&self) -> ClassificationPolicy {
        self.policy
    }

    pub fn mode(&self) -> Mode {
        self.mode.mode()
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn annotations(&self) -> &AnnotationLayer {
        &self.annotations
    }

    pub fn snapshot(&self) -> AnnotationSnapshot {
        self.annotations.snapshot()
    }

    /// Run one classify, stabilize, route cycle.
    ///
    /// `now` must come from a monotonic clock. A frame with no hands is a
    /// valid "no gesture" observation.
    pub fn process_frame(&mut self, hands: &[HandObservation], now: Instant) -> FrameOutput {
        self.frames += 1;

        let gestures = self.classifier.classify(hands);
        let mut out = FrameOutput {
            pointer: gestures.pointer(),
            ..FrameOutput::default()
        };

        match self.policy {
            ClassificationPolicy::Exclusive => self.route_exclusive(&gestures, now, &mut out),
            ClassificationPolicy::MultiLabel => self.route_multi_label(&gestures, now, &mut out),
        }

        out.mode = self.mode.mode();
        out
    }

    /// Remove the most recent stroke
    pub fn undo(&mut self) -> Vec<PipelineEvent> {
        let mut events = Vec::new();
        self.undo_into(&mut events);
        events
    }

    /// Remove every stroke, including one being drawn
    pub fn clear(&mut self) -> Vec<PipelineEvent> {
        let mut events = Vec::new();
        self.clear_into(&mut events);
        events
    }

    fn route_exclusive(&mut self, gestures: &FrameGestures, now: Instant, out: &mut FrameOutput) {
        if let Some(label) = self.stabilizer.observe(gestures.exclusive(), now) {
            self.confirm(label, out);
        }
    }

    fn route_multi_label(&mut self, gestures: &FrameGestures, now: Instant, out: &mut FrameOutput) {
        let labels: Vec<GestureLabel> = gestures.multi_label().collect();

        if labels.contains(&GestureLabel::ToggleMode)
            && self.debouncer.try_fire(GestureLabel::ToggleMode.as_str(), now)
        {
            out.confirmed.push(GestureLabel::ToggleMode);
            self.toggle_mode(now, &mut out.events);
        }

        let drawing = labels.contains(&self.draw_gesture);

        match self.mode.mode() {
            Mode::GestureControl => {
                for label in labels {
                    if label == GestureLabel::ToggleMode || label == self.draw_gesture {
                        continue;
                    }
                    // debounce per action; unmapped labels fall back to their own name
                    let key = self
                        .dispatcher
                        .action_for(label)
                        .unwrap_or(label.as_str())
                        .to_owned();
                    if self.debouncer.try_fire(&key, now) {
                        self.confirm(label, out);
                    }
                }
                self.drive_strokes(drawing, gestures.pointer(), &mut out.events);
            }
            Mode::PassThrough => {
                self.drive_pointer(drawing, gestures.pointer(), &mut out.events);
            }
        }
    }

    fn confirm(&mut self, label: GestureLabel, out: &mut FrameOutput) {
        info!(gesture = %label, frame = self.frames, "gesture confirmed");
        out.confirmed.push(label);
        out.events.push(PipelineEvent::GestureConfirmed { gesture: label });

        match self.dispatcher.resolve(label) {
            Some(Dispatch::Inject { action, spec }) => {
                out.events.push(PipelineEvent::ActionTriggered {
                    gesture: label,
                    action,
                    spec,
                });
            }
            Some(Dispatch::UndoStroke) => self.undo_into(&mut out.events),
            Some(Dispatch::ClearStrokes) => self.clear_into(&mut out.events),
            None => {}
        }
    }

    fn toggle_mode(&mut self, now: Instant, events: &mut Vec<PipelineEvent>) {
        match self.mode.mode() {
            Mode::GestureControl => self.finish_stroke(events),
            Mode::PassThrough => {
                if self.pointer_held {
                    self.pointer_held = false;
                    events.push(PipelineEvent::PointerReleased);
                }
            }
        }
        self.smoother.reset();
        events.push(self.mode.toggle(now));
    }

    /// Start, extend or end a stroke depending on draw-gesture presence
    fn drive_strokes(
        &mut self,
        drawing: bool,
        pointer: Option<Point>,
        events: &mut Vec<PipelineEvent>,
    ) {
        match (drawing, pointer) {
            (true, Some(raw)) => {
                let point = self.smoother.push(raw);
                if self.annotations.is_drawing() {
                    self.annotations.add_point(point);
                } else {
                    debug!(x = point.x, y = point.y, "stroke started");
                    self.annotations.start_stroke(point);
                    events.push(PipelineEvent::StrokeStarted);
                }
            }
            _ => self.finish_stroke(events),
        }
    }

    /// Move the cursor and press or release the pointer button on edges
    fn drive_pointer(
        &mut self,
        pressed: bool,
        pointer: Option<Point>,
        events: &mut Vec<PipelineEvent>,
    ) {
        match pointer {
            Some(raw) => {
                let p = self.smoother.push(raw);
                events.push(PipelineEvent::PointerMoved { x: p.x, y: p.y });
            }
            None => self.smoother.reset(),
        }

        if pressed != self.pointer_held {
            self.pointer_held = pressed;
            events.push(if pressed {
                PipelineEvent::PointerPressed
            } else {
                PipelineEvent::PointerReleased
            });
        }
    }

    fn finish_stroke(&mut self, events: &mut Vec<PipelineEvent>) {
        if let Some(points) = self.annotations.end_stroke() {
            let strokes = self.annotations.committed().len();
            info!(points, strokes, "stroke committed");
            events.push(PipelineEvent::StrokeCommitted { points, strokes });
            self.smoother.reset();
        }
    }

    fn undo_into(&mut self, events: &mut Vec<PipelineEvent>) {
        if self.annotations.undo().is_some() {
            events.push(PipelineEvent::StrokeUndone {
                strokes: self.annotations.committed().len(),
            });
        }
    }

    fn clear_into(&mut self, events: &mut Vec<PipelineEvent>) {
        self.annotations.clear();
        self.smoother.reset();
        events.push(PipelineEvent::StrokesCleared);
    }
}
