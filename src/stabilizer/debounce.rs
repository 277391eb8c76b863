//! Cooldown bookkeeping
//!
//! All timestamps are `Instant`s, so wall-clock adjustments cannot shorten
//! a cooldown. Stored times only ever move forward.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tracing::debug;

/// Per-key rate limiter: each key may fire at most once per cooldown,
/// measured from that key's own last fire
#[derive(Debug, Clone)]
pub struct Debouncer {
    cooldown: Duration,
    last_fired: HashMap<String, Instant>,
}

impl Debouncer {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last_fired: HashMap::new(),
        }
    }

    /// Record a fire of `key` at `now` if its cooldown has elapsed
    pub fn try_fire(&mut self, key: &str, now: Instant) -> bool {
        if let Some(last) = self.last_fired.get(key) {
            let elapsed = now.saturating_duration_since(*last);
            if elapsed <= self.cooldown {
                debug!(key, elapsed_ms = elapsed.as_millis() as u64, "debounced");
                return false;
            }
        }

        self.last_fired.insert(key.to_owned(), now);
        true
    }

    #[cfg(test)]
    pub fn last_fired(&self, key: &str) -> Option<Instant> {
        self.last_fired.get(key).copied()
    }
}

/// Edge gate for a single stream of confirmed labels.
///
/// A label passes when it differs from the last label that passed and the
/// cooldown since that pass has elapsed.
#[derive(Debug, Clone)]
pub struct TransitionGate<T> {
    cooldown: Duration,
    last: Option<(T, Instant)>,
}

impl<T: Copy + Eq> TransitionGate<T> {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last: None,
        }
    }

    pub fn admit(&mut self, label: T, now: Instant) -> bool {
        if let Some((last_label, at)) = self.last {
            if last_label == label || now.saturating_duration_since(at) <= self.cooldown {
                return false;
            }
        }

        self.last = Some((label, now));
        true
    }

    #[cfg(test)]
    pub fn last_label(&self) -> Option<T> {
        self.last.map(|(label, _)| label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_within_cooldown_fires_once() {
        let t0 = Instant::now();
        let mut d = Debouncer::new(Duration::from_secs(1));

        assert!(d.try_fire("next_slide", t0));
        assert!(!d.try_fire("next_slide", t0 + Duration::from_millis(400)));
    }

    #[test]
    fn test_after_cooldown_fires_again() {
        let t0 = Instant::now();
        let mut d = Debouncer::new(Duration::from_secs(1));

        assert!(d.try_fire("next_slide", t0));
        assert!(d.try_fire("next_slide", t0 + Duration::from_millis(1100)));
    }

    #[test]
    fn test_keys_are_independent() {
        let t0 = Instant::now();
        let mut d = Debouncer::new(Duration::from_secs(1));

        assert!(d.try_fire("next_slide", t0));
        assert!(d.try_fire("prev_slide", t0));
        assert!(!d.try_fire("prev_slide", t0));
    }

    #[test]
    fn test_earlier_time_never_rewinds() {
        let t0 = Instant::now();
        let later = t0 + Duration::from_secs(10);
        let mut d = Debouncer::new(Duration::from_secs(1));

        assert!(d.try_fire("toggle", later));
        assert!(!d.try_fire("toggle", t0));
        assert_eq!(d.last_fired("toggle"), Some(later));
    }

    #[test]
    fn test_gate_requires_new_label() {
        let t0 = Instant::now();
        let mut gate = TransitionGate::new(Duration::from_secs(1));

        assert!(gate.admit("fist", t0));
        assert!(!gate.admit("fist", t0 + Duration::from_secs(5)));
        assert!(gate.admit("palm", t0 + Duration::from_secs(5)));
        assert_eq!(gate.last_label(), Some("palm"));
    }

    #[test]
    fn test_gate_requires_cooldown() {
        let t0 = Instant::now();
        let mut gate = TransitionGate::new(Duration::from_secs(1));

        assert!(gate.admit("fist", t0));
        assert!(!gate.admit("palm", t0 + Duration::from_millis(999)));
        assert_eq!(gate.last_label(), Some("fist"));
    }
}
