//! Fixed-capacity majority-vote window

use std::collections::VecDeque;

/// Sliding window over the last N per-frame classifications.
///
/// A label is confirmed when it occupies at least `floor(N/2) + 1` slots,
/// where N is the window capacity. A window that is not yet full can still
/// confirm once a label reaches that count.
#[derive(Debug, Clone)]
pub struct MajorityWindow<T> {
    frames: VecDeque<Option<T>>,
    capacity: usize,
}

impl<T: Copy + Eq> MajorityWindow<T> {
    /// A capacity of zero is clamped to one
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            frames: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    #[cfg(test)]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Minimum occurrences for a label to be confirmed
    pub fn threshold(&self) -> usize {
        self.capacity / 2 + 1
    }

    /// Push one observation, evicting the oldest on overflow, and return
    /// the confirmed label if any
    pub fn observe(&mut self, label: Option<T>) -> Option<T> {
        if self.frames.len() == self.capacity {
            self.frames.pop_front();
        }
        self.frames.push_back(label);
        self.majority()
    }

    /// Most frequent label in the window if it meets the threshold.
    ///
    /// Ties go to the label encountered first, scanning oldest to newest.
    pub fn majority(&self) -> Option<T> {
        let mut tally: Vec<(T, usize)> = Vec::new();
        for label in self.frames.iter().flatten() {
            match tally.iter_mut().find(|(seen, _)| seen == label) {
                Some((_, count)) => *count += 1,
                None => tally.push((*label, 1)),
            }
        }

        let mut best: Option<(T, usize)> = None;
        for (label, count) in tally {
            if best.map_or(true, |(_, top)| count > top) {
                best = Some((label, count));
            }
        }

        best.filter(|(_, count)| *count >= self.threshold())
            .map(|(label, _)| label)
    }
}
