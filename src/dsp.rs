pub mod channels;
pub mod correlation;
pub mod goniometer;
pub mod trail;

use std::time::Instant;

/// How the channels of an [`AudioBlock`] are arranged in its sample buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SampleLayout {
    /// `L0 R0 L1 R1 ...`, as delivered by audio devices.
    #[default]
    Interleaved,
    /// `L0 L1 ... R0 R1 ...`, one contiguous plane per channel.
    Planar,
}

#[derive(Debug, Clone, Copy)]
pub struct AudioBlock<'a> {
    pub samples: &'a [f32],
    pub channels: usize,
    pub layout: SampleLayout,
    pub sample_rate: f32,
    pub timestamp: Instant,
}

impl<'a> AudioBlock<'a> {
    pub fn new(samples: &'a [f32], channels: usize, sample_rate: f32, timestamp: Instant) -> Self {
        Self {
            samples,
            channels,
            layout: SampleLayout::Interleaved,
            sample_rate,
            timestamp,
        }
    }

    pub fn planar(samples: &'a [f32], channels: usize, sample_rate: f32, timestamp: Instant) -> Self {
        Self {
            layout: SampleLayout::Planar,
            ..Self::new(samples, channels, sample_rate, timestamp)
        }
    }

    pub fn now(samples: &'a [f32], channels: usize, sample_rate: f32) -> Self {
        Self::new(samples, channels, sample_rate, Instant::now())
    }

    pub fn frame_count(&self) -> usize {
        self.samples.len() / self.channels.max(1)
    }
}

pub trait AudioProcessor {
    type Output;

    fn process_block(&mut self, block: &AudioBlock<'_>) -> Self::Output;
    fn reset(&mut self);
}

pub trait Reconfigurable<Cfg> {
    type Error;

    fn update_config(&mut self, config: Cfg) -> Result<(), Self::Error>;
}
