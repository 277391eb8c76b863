//! Pipeline task
//!
//! All session state is mutated from this one task. Frames and commands
//! arrive over an mpsc channel in submission order; outcomes are published
//! on the broadcast event bus.

use std::time::Instant;

use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, info};

use crate::annotation::AnnotationSnapshot;
use crate::events::PipelineEvent;
use crate::landmarks::HandObservation;

use super::session::Session;

/// Messages accepted by the pipeline task
#[derive(Debug)]
pub enum PipelineInput {
    /// Hands seen in one captured frame
    Frame(Vec<HandObservation>),
    UndoStroke,
    ClearStrokes,
    /// Request a copy of the annotation layer
    Snapshot(oneshot::Sender<AnnotationSnapshot>),
}

/// Owns the session and publishes what it produces
pub struct Pipeline {
    session: Session,
    event_tx: broadcast::Sender<PipelineEvent>,
}

impl Pipeline {
    pub fn new(session: Session, event_tx: broadcast::Sender<PipelineEvent>) -> Self {
        Self { session, event_tx }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Run the pipeline until every input sender is dropped
    pub async fn run(&mut self, mut input_rx: mpsc::Receiver<PipelineInput>) {
        info!(
            policy = %self.session.policy(),
            mode = %self.session.mode(),
            "gesture pipeline started"
        );

        while let Some(input) = input_rx.recv().await {
            self.handle_input(input);
        }

        info!(frames = self.session.frames(), "gesture pipeline stopped");
    }

    fn handle_input(&mut self, input: PipelineInput) {
        let events = match input {
            PipelineInput::Frame(hands) => {
                let out = self.session.process_frame(&hands, Instant::now());
                let summary = PipelineEvent::FrameProcessed {
                    frame: self.session.frames(),
                    mode: out.mode,
                    pointer: out.pointer,
                    confirmed: out.confirmed,
                };
                let mut events = out.events;
                events.push(summary);
                events
            }
            PipelineInput::UndoStroke => self.session.undo(),
            PipelineInput::ClearStrokes => self.session.clear(),
            PipelineInput::Snapshot(reply) => {
                if reply.send(self.session.snapshot()).is_err() {
                    debug!("snapshot requester went away");
                }
                return;
            }
        };

        for event in events {
            debug!(%event, "publishing event");
            // no subscribers is fine
            let _ = self.event_tx.send(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineConfig;
    use crate::gesture::{synthetic_hand as hand, ClassificationPolicy};
    use crate::landmarks::Finger;
    use crate::state::Mode;

    fn create_pipeline() -> (Pipeline, broadcast::Receiver<PipelineEvent>) {
        let mut config = PipelineConfig::default();
        config.gestures.policy = ClassificationPolicy::MultiLabel;
        let (tx, rx) = broadcast::channel(64);
        (Pipeline::new(Session::new(&config), tx), rx)
    }

    #[test]
    fn test_pipeline_creation() {
        let (pipeline, _) = create_pipeline();
        assert_eq!(pipeline.session().frames(), 0);
    }

    #[test]
    fn test_events_published_in_order() {
        let (mut pipeline, mut rx) = create_pipeline();
        let (input_tx, input_rx) = mpsc::channel(8);

        tokio_test::block_on(async {
            input_tx
                .send(PipelineInput::Frame(vec![hand(&[Finger::Index], 1.0)]))
                .await
                .unwrap();
            input_tx.send(PipelineInput::Frame(vec![])).await.unwrap();
            input_tx.send(PipelineInput::UndoStroke).await.unwrap();
            drop(input_tx);

            pipeline.run(input_rx).await;
        });

        assert_eq!(rx.try_recv().unwrap(), PipelineEvent::StrokeStarted);
        assert!(matches!(
            rx.try_recv().unwrap(),
            PipelineEvent::FrameProcessed { frame: 1, pointer: Some(_), .. }
        ));
        assert!(matches!(
            rx.try_recv().unwrap(),
            PipelineEvent::StrokeCommitted { points: 1, .. }
        ));
        assert!(matches!(
            rx.try_recv().unwrap(),
            PipelineEvent::FrameProcessed { frame: 2, pointer: None, .. }
        ));
        assert_eq!(
            rx.try_recv().unwrap(),
            PipelineEvent::StrokeUndone { strokes: 0 }
        );
        assert_eq!(pipeline.session().frames(), 2);
    }

    #[test]
    fn test_frame_summary_carries_gesture_control_pointer() {
        let (mut pipeline, mut rx) = create_pipeline();
        let (input_tx, input_rx) = mpsc::channel(8);

        tokio_test::block_on(async {
            input_tx
                .send(PipelineInput::Frame(vec![hand(&[Finger::Index], 1.0)]))
                .await
                .unwrap();
            drop(input_tx);
            pipeline.run(input_rx).await;
        });

        let summary = std::iter::from_fn(|| rx.try_recv().ok())
            .find(|e| matches!(e, PipelineEvent::FrameProcessed { .. }))
            .unwrap();
        match summary {
            PipelineEvent::FrameProcessed { mode, pointer, .. } => {
                assert_eq!(mode, Mode::GestureControl);
                let pointer = pointer.unwrap();
                assert!((0.0..=1.0).contains(&pointer.x));
                assert!((0.0..=1.0).contains(&pointer.y));
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_snapshot_round_trip() {
        let (mut pipeline, _rx) = create_pipeline();
        let (input_tx, input_rx) = mpsc::channel(8);
        let (reply_tx, reply_rx) = oneshot::channel();

        input_tx
            .send(PipelineInput::Frame(vec![hand(&[Finger::Index], 1.0)]))
            .await
            .unwrap();
        input_tx
            .send(PipelineInput::Snapshot(reply_tx))
            .await
            .unwrap();
        drop(input_tx);

        pipeline.run(input_rx).await;

        let snapshot = reply_rx.await.unwrap();
        assert!(snapshot.committed.is_empty());
        assert_eq!(snapshot.in_progress.map(|s| s.points.len()), Some(1));
    }
}
