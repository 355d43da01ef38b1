// Experience replay

use std::collections::VecDeque;

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::encoder::StateVector;
use crate::error::{Error, Result};
use crate::game::Action;

/// Default number of transitions kept before the oldest are dropped
pub const DEFAULT_CAPACITY: usize = 100_000;

/// One recorded step of experience
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    pub state: StateVector,
    pub action: Action,
    pub reward: f32,
    pub next_state: StateVector,
    pub terminal: bool,
}

/// Bounded FIFO store of transitions with uniform sampling
#[derive(Debug, Clone)]
pub struct ReplayMemory {
    buffer: VecDeque<Transition>,
    capacity: usize,
}

impl ReplayMemory {
    /// A capacity of zero is treated as one; the config layer rejects it earlier.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            // Grow on demand; the full 100k is rarely reached in short runs
            buffer: VecDeque::with_capacity(capacity.min(4096)),
            capacity,
        }
    }

    /// Append, evicting the oldest transition first when full
    pub fn push(&mut self, transition: Transition) {
        if self.buffer.len() == self.capacity {
            self.buffer.pop_front();
        }
        self.buffer.push_back(transition);
    }

    /// Up to `batch_size` distinct transitions chosen uniformly at random.
    ///
    /// Returns everything stored when `batch_size` covers the whole memory,
    /// and an empty batch when nothing has been stored yet.
    pub fn sample(&self, batch_size: usize, rng: &mut impl Rng) -> Result<Vec<Transition>> {
        if batch_size == 0 {
            return Err(Error::invalid("sample batch size must be at least 1"));
        }

        if batch_size >= self.buffer.len() {
            return Ok(self.buffer.iter().copied().collect());
        }

        Ok(rand::seq::index::sample(rng, self.buffer.len(), batch_size)
            .into_iter()
            .map(|i| self.buffer[i])
            .collect())
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn iter(&self) -> impl Iterator<Item = &Transition> {
        self.buffer.iter()
    }
}

impl Default for ReplayMemory {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
