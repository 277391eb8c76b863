//! Freehand annotation strokes driven by the draw gesture

mod layer;
mod smoothing;

pub use layer::{AnnotationLayer, AnnotationSnapshot, DrawStyle};
pub use smoothing::MovingAverage;
