//! Operating mode state machine
//!
//! Two states:
//! - GestureControl: discrete gesture routing, annotation drawing
//! - PassThrough: the pointer drives the cursor directly
//!
//! Transitions happen only on a confirmed two-hand toggle gesture.

mod machine;

pub use machine::{Mode, ModeMachine};
