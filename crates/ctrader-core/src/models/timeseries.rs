//! Bounded price history of one ticker channel

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// One recorded price; `time` is in Unix seconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    pub time: i64,
    pub value: f64,
}

/// The most recent `capacity` prices of a channel, oldest first
#[derive(Debug, Clone)]
pub struct Timeseries {
    capacity: usize,
    points: VecDeque<DataPoint>,
}

impl Timeseries {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            points: VecDeque::with_capacity(capacity.min(1024)),
        }
    }

    /// Record a price, evicting the oldest one when full
    pub fn add(&mut self, time: i64, value: f64) {
        if self.capacity == 0 {
            return;
        }
        if self.points.len() == self.capacity {
            self.points.pop_front();
        }
        self.points.push_back(DataPoint { time, value });
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// All recorded points, oldest first
    pub fn all(&self) -> Vec<DataPoint> {
        self.points.iter().copied().collect()
    }
}
