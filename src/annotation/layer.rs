//! Stroke store and rendering

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::landmarks::Point;

/// One continuous freehand path
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    pub points: Vec<Point>,
}

impl Stroke {
    fn starting_at(point: Point) -> Self {
        Self {
            points: vec![point],
        }
    }

    /// Consecutive point pairs forming the drawn path
    pub fn segments(&self) -> impl Iterator<Item = (Point, Point)> + '_ {
        self.points.windows(2).map(|pair| (pair[0], pair[1]))
    }
}

/// Pen color and width used when rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawStyle {
    /// RGB
    pub color: [u8; 3],
    pub thickness: u32,
}

impl Default for DrawStyle {
    fn default() -> Self {
        Self {
            color: [255, 0, 0],
            thickness: 4,
        }
    }
}

/// Anything annotation strokes can be drawn onto
pub trait Surface {
    fn draw_line(&mut self, from: Point, to: Point, style: &DrawStyle);
}

/// A line segment as drawn, for clients that render remotely
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RenderedSegment {
    pub from: Point,
    pub to: Point,
    pub style: DrawStyle,
}

impl Surface for Vec<RenderedSegment> {
    fn draw_line(&mut self, from: Point, to: Point, style: &DrawStyle) {
        self.push(RenderedSegment {
            from,
            to,
            style: *style,
        });
    }
}

/// Serializable copy of the layer's state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnnotationSnapshot {
    pub committed: Vec<Stroke>,
    pub in_progress: Option<Stroke>,
    /// Output of `render`
    pub segments: Vec<RenderedSegment>,
}

/// Committed strokes plus at most one stroke being drawn
#[derive(Debug, Clone, Default)]
pub struct AnnotationLayer {
    committed: Vec<Stroke>,
    in_progress: Option<Stroke>,
    style: DrawStyle,
}

impl AnnotationLayer {
    pub fn new(style: DrawStyle) -> Self {
        Self {
            committed: Vec::new(),
            in_progress: None,
            style,
        }
    }

    /// Begin a new stroke at `point`.
    ///
    /// A stroke already in progress is discarded without being committed.
    pub fn start_stroke(&mut self, point: Point) {
        if self.in_progress.is_some() {
            debug!("replacing in-progress stroke");
        }
        self.in_progress = Some(Stroke::starting_at(point));
    }

    /// Extend the in-progress stroke; no-op when nothing is being drawn
    pub fn add_point(&mut self, point: Point) {
        if let Some(stroke) = self.in_progress.as_mut() {
            stroke.points.push(point);
        }
    }

    /// Commit the in-progress stroke, returning its point count
    pub fn end_stroke(&mut self) -> Option<usize> {
        let stroke = self.in_progress.take()?;
        let points = stroke.points.len();
        self.committed.push(stroke);
        Some(points)
    }

    /// Drop the most recently committed stroke
    pub fn undo(&mut self) -> Option<Stroke> {
        self.committed.pop()
    }

    pub fn clear(&mut self) {
        self.committed.clear();
        self.in_progress = None;
    }

    pub fn is_drawing(&self) -> bool {
        self.in_progress.is_some()
    }

    pub fn committed(&self) -> &[Stroke] {
        &self.committed
    }

    #[cfg(test)]
    pub fn in_progress(&self) -> Option<&Stroke> {
        self.in_progress.as_ref()
    }

    /// Draw every committed stroke, then the in-progress one
    pub fn render<S: Surface + ?Sized>(&self, surface: &mut S) {
        for stroke in self.committed.iter().chain(self.in_progress.iter()) {
            for (from, to) in stroke.segments() {
                surface.draw_line(from, to, &self.style);
            }
        }
    }

    pub fn snapshot(&self) -> AnnotationSnapshot {
        let mut segments: Vec<RenderedSegment> = Vec::new();
        self.render(&mut segments);
        AnnotationSnapshot {
            committed: self.committed.clone(),
            in_progress: self.in_progress.clone(),
            segments,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingSurface {
        lines: Vec<(Point, Point)>,
    }

    impl Surface for RecordingSurface {
        fn draw_line(&mut self, from: Point, to: Point, _style: &DrawStyle) {
            self.lines.push((from, to));
        }
    }

    fn p(x: f32, y: f32) -> Point {
        Point::new(x, y)
    }

    #[test]
    fn test_stroke_round_trip_and_undo() {
        let mut layer = AnnotationLayer::default();
        layer.start_stroke(p(0.1, 0.1));
        layer.add_point(p(0.2, 0.2));
        assert_eq!(layer.end_stroke(), Some(2));

        assert_eq!(
            layer.committed(),
            &[Stroke {
                points: vec![p(0.1, 0.1), p(0.2, 0.2)]
            }]
        );
        assert!(!layer.is_drawing());

        layer.undo();
        assert!(layer.committed().is_empty());
    }

    #[test]
    fn test_add_point_without_stroke_is_noop() {
        let mut layer = AnnotationLayer::default();
        layer.add_point(p(0.5, 0.5));
        assert_eq!(layer.end_stroke(), None);
        assert!(layer.committed().is_empty());
    }

    #[test]
    fn test_start_replaces_in_progress() {
        let mut layer = AnnotationLayer::default();
        layer.start_stroke(p(0.1, 0.1));
        layer.add_point(p(0.2, 0.2));
        layer.start_stroke(p(0.9, 0.9));
        layer.end_stroke();

        assert_eq!(layer.committed().len(), 1);
        assert_eq!(layer.committed()[0].points, vec![p(0.9, 0.9)]);
    }

    #[test]
    fn test_undo_on_empty_is_noop() {
        let mut layer = AnnotationLayer::default();
        assert_eq!(layer.undo(), None);
    }

    #[test]
    fn test_clear_after_anything() {
        let mut layer = AnnotationLayer::default();
        layer.start_stroke(p(0.1, 0.1));
        layer.end_stroke();
        layer.start_stroke(p(0.3, 0.3));
        layer.add_point(p(0.4, 0.4));

        layer.clear();
        assert!(layer.committed().is_empty());
        assert!(layer.in_progress().is_none());
    }

    #[test]
    fn test_render_draws_committed_and_in_progress() {
        let mut layer = AnnotationLayer::default();
        layer.start_stroke(p(0.0, 0.0));
        layer.add_point(p(0.1, 0.0));
        layer.add_point(p(0.2, 0.0));
        layer.end_stroke();
        layer.start_stroke(p(0.5, 0.5));
        layer.add_point(p(0.6, 0.6));

        let mut surface = RecordingSurface::default();
        layer.render(&mut surface);

        assert_eq!(
            surface.lines,
            vec![
                (p(0.0, 0.0), p(0.1, 0.0)),
                (p(0.1, 0.0), p(0.2, 0.0)),
                (p(0.5, 0.5), p(0.6, 0.6)),
            ]
        );
        // rendering leaves state untouched
        assert!(layer.is_drawing());
        assert_eq!(layer.committed().len(), 1);
    }

    #[test]
    fn test_snapshot_carries_rendered_segments() {
        let style = DrawStyle {
            color: [0, 255, 0],
            thickness: 2,
        };
        let mut layer = AnnotationLayer::new(style);
        layer.start_stroke(p(0.0, 0.0));
        layer.add_point(p(0.3, 0.4));

        let snapshot = layer.snapshot();
        assert!(snapshot.committed.is_empty());
        assert_eq!(snapshot.segments.len(), 1);
        assert_eq!(snapshot.segments[0].style, style);
    }
}
