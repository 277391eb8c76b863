//! Moving-average smoothing for pointer coordinates

use std::collections::VecDeque;

use crate::landmarks::Point;

/// Mean of the last N points
#[derive(Debug, Clone)]
pub struct MovingAverage {
    samples: VecDeque<Point>,
    size: usize,
}

impl MovingAverage {
    /// A size of zero is clamped to one (no smoothing)
    pub fn new(size: usize) -> Self {
        let size = size.max(1);
        Self {
            samples: VecDeque::with_capacity(size),
            size,
        }
    }

    /// Add a raw sample and return the smoothed point
    pub fn push(&mut self, point: Point) -> Point {
        if self.samples.len() == self.size {
            self.samples.pop_front();
        }
        self.samples.push_back(point);

        let n = self.samples.len() as f32;
        let (sx, sy) = self
            .samples
            .iter()
            .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
        Point::new(sx / n, sy / n)
    }

    /// Forget history, e.g. when a stroke ends
    pub fn reset(&mut self) {
        self.samples.clear();
    }
}
