//! Persistence history of recently displayed point sets.

use super::channels::ChannelPair;
use std::collections::VecDeque;
use std::ops::Deref;
use std::sync::Arc;

/// Immutable `(left, right)` scatter points.
///
/// Clones share the same allocation; the points are never written after
/// construction, so a clone handed to a renderer cannot observe later blocks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointSet(Arc<[(f32, f32)]>);

impl PointSet {
    pub fn from_pair(pair: &ChannelPair) -> Self {
        Self(pair.iter().collect())
    }

    pub fn as_slice(&self) -> &[(f32, f32)] {
        &self.0
    }
}

impl Deref for PointSet {
    type Target = [(f32, f32)];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Vec<(f32, f32)>> for PointSet {
    fn from(points: Vec<(f32, f32)>) -> Self {
        Self(points.into())
    }
}

impl From<&[(f32, f32)]> for PointSet {
    fn from(points: &[(f32, f32)]) -> Self {
        Self(points.into())
    }
}

/// Index was past the number of stored frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("trail frame {index} requested but only {len} stored")]
pub struct TrailIndexError {
    pub index: usize,
    pub len: usize,
}

/// Bounded FIFO of point sets; index 0 is the most recent push.
#[derive(Debug, Clone)]
pub struct TrailBuffer {
    frames: VecDeque<PointSet>,
    capacity: usize,
}

impl TrailBuffer {
    /// `capacity` must be non-zero; the engine validates it before getting here.
    pub fn new(capacity: usize) -> Self {
        debug_assert!(capacity > 0, "trail capacity must be at least 1");
        Self {
            frames: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn push(&mut self, points: PointSet) {
        self.frames.push_front(points);
        self.frames.truncate(self.capacity);
    }

    pub fn get(&self, index: usize) -> Result<&PointSet, TrailIndexError> {
        self.frames.get(index).ok_or(TrailIndexError {
            index,
            len: self.frames.len(),
        })
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }

    /// Changes the depth, dropping the oldest frames if it shrinks.
    pub fn set_capacity(&mut self, capacity: usize) {
        debug_assert!(capacity > 0, "trail capacity must be at least 1");
        self.capacity = capacity;
        self.frames.truncate(capacity);
    }

    /// Frames newest first.
    pub fn iter(&self) -> impl Iterator<Item = &PointSet> + '_ {
        self.frames.iter()
    }

    pub fn to_vec(&self) -> Vec<PointSet> {
        self.frames.iter().cloned().collect()
    }
}
