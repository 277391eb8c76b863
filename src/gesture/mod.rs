//! Per-frame gesture classification
//!
//! Every predicate is evaluated once per frame. The exclusive
//! (first-match) policy is a post-filter over the same result the
//! multi-label policy consumes.

mod classifier;
mod labels;

pub use classifier::{Classifier, FrameGestures};
pub use labels::{ClassificationPolicy, GestureLabel};

#[cfg(test)]
pub(crate) use classifier::tests::hand as synthetic_hand;
