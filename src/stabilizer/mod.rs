//! Temporal stabilization of per-frame classifications
//!
//! Two strategies:
//! - `Stabilizer`: majority vote over a sliding window, then a transition
//!   gate (new label and cooldown elapsed). Rejects single-frame flicker.
//! - `Debouncer`: per-key cooldown only. Any frame whose predicate holds is
//!   eligible, so continuous gestures stay responsive.

mod debounce;
mod window;

pub use debounce::Debouncer;

use debounce::TransitionGate;
use window::MajorityWindow;

use std::time::{Duration, Instant};

/// Majority window followed by a transition gate
#[derive(Debug, Clone)]
pub struct Stabilizer<T> {
    window: MajorityWindow<T>,
    gate: TransitionGate<T>,
    confirmed: Option<T>,
}

impl<T: Copy + Eq> Stabilizer<T> {
    pub fn new(window_size: usize, cooldown: Duration) -> Self {
        Self {
            window: MajorityWindow::new(window_size),
            gate: TransitionGate::new(cooldown),
            confirmed: None,
        }
    }

    /// Feed one frame's label (or its absence).
    ///
    /// Returns the label only when it is confirmed by the window and passes
    /// the transition gate.
    pub fn observe(&mut self, label: Option<T>, now: Instant) -> Option<T> {
        self.confirmed = self.window.observe(label);
        let confirmed = self.confirmed?;
        self.gate.admit(confirmed, now).then_some(confirmed)
    }

    /// Majority label as of the last observation
    #[cfg(test)]
    pub fn confirmed(&self) -> Option<T> {
        self.confirmed
    }

    /// Last label that passed the gate
    #[cfg(test)]
    pub fn last_emitted(&self) -> Option<T> {
        self.gate.last_label()
    }
}
