//! Gesture pipeline: the per-frame session and the task that drives it

mod runner;
mod session;

pub use runner::{Pipeline, PipelineInput};
pub use session::Session;
