//! Stereo channel extraction, stride decimation and peak normalization.

use super::{AudioBlock, SampleLayout};
use crate::util::audio::{MONO_RIGHT_GAIN, div_in_place, peak_abs, scale_in_place};

/// Left/right sample sequences of equal length.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChannelPair {
    left: Vec<f32>,
    right: Vec<f32>,
}

impl ChannelPair {
    /// Pairs two channels, truncating the longer one so both have equal length.
    pub fn new(mut left: Vec<f32>, mut right: Vec<f32>) -> Self {
        let len = left.len().min(right.len());
        left.truncate(len);
        right.truncate(len);
        Self { left, right }
    }

    pub fn left(&self) -> &[f32] {
        &self.left
    }

    pub fn right(&self) -> &[f32] {
        &self.right
    }

    pub fn len(&self) -> usize {
        self.left.len()
    }

    pub fn is_empty(&self) -> bool {
        self.left.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (f32, f32)> + '_ {
        self.left.iter().copied().zip(self.right.iter().copied())
    }

    /// Splits an [`AudioBlock`] into left/right.
    ///
    /// Mono blocks get a right channel attenuated by [`MONO_RIGHT_GAIN`]; blocks
    /// with more than two channels keep only the first two. A zero channel count
    /// is read as mono and a trailing partial frame is dropped.
    pub fn extract(block: &AudioBlock<'_>) -> Self {
        let ch = block.channels.max(1);
        let frames = block.frame_count();
        if frames == 0 {
            return Self::default();
        }

        if ch == 1 {
            let left = block.samples[..frames].to_vec();
            let mut right = left.clone();
            scale_in_place(&mut right, MONO_RIGHT_GAIN);
            return Self { left, right };
        }

        match block.layout {
            SampleLayout::Interleaved => {
                let (left, right) = block.samples[..frames * ch]
                    .chunks_exact(ch)
                    .map(|frame| (frame[0], frame[1]))
                    .unzip();
                Self { left, right }
            }
            SampleLayout::Planar => Self {
                left: block.samples[..frames].to_vec(),
                right: block.samples[frames..frames * 2].to_vec(),
            },
        }
    }

    /// Keeps every `len / max_points`-th sample when the pair exceeds `max_points`.
    ///
    /// Plain stride selection starting at index 0, without filtering.
    pub fn decimate(self, max_points: usize) -> Self {
        let len = self.len();
        if len <= max_points || max_points == 0 {
            return self;
        }

        let stride = len / max_points;
        Self {
            left: self.left.into_iter().step_by(stride).collect(),
            right: self.right.into_iter().step_by(stride).collect(),
        }
    }

    /// Divides both channels by the larger channel peak.
    ///
    /// A single divisor keeps the L/R ratio intact. Silence is returned as is.
    pub fn normalize(mut self) -> Self {
        let peak = self.peak();
        if peak > 0.0 {
            div_in_place(&mut self.left, peak);
            div_in_place(&mut self.right, peak);
        }
        self
    }

    /// Largest finite absolute sample across both channels.
    pub fn peak(&self) -> f32 {
        peak_abs(&self.left).max(peak_abs(&self.right))
    }
}
