//! Gesture to action resolution
//!
//! The daemon does not inject input itself. Resolved actions are published
//! as events and performed by whichever injector is subscribed.

mod actions;

pub use actions::{ActionSpec, Dispatch, Dispatcher};
