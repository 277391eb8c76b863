//! Hand landmark model and geometry helpers
//!
//! Landmark sets arrive from the external hand tracker once per detected
//! hand per frame. Everything here is pure computation over those points.

mod geometry;
mod points;

pub use geometry::{palm_distance, Finger, FingerState};
pub use points::{HandObservation, LandmarkSet, Point, INDEX_TIP, THUMB_TIP};

#[cfg(test)]
pub use points::{Handedness, LANDMARK_COUNT};
