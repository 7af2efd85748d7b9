//! Goniometer (vectorscope) engine: scatter points, trail and phase correlation.

use super::channels::ChannelPair;
use super::correlation::{self, Correlation, CorrelationThresholds};
use super::trail::{PointSet, TrailBuffer};
use super::{AudioBlock, AudioProcessor, Reconfigurable};
use crate::util::audio::DEFAULT_SAMPLE_RATE;

pub const DEFAULT_MAX_POINTS: usize = 800;
pub const DEFAULT_TRAIL_FRAMES: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GoniometerConfig {
    /// Target number of scatter points per block. Blocks longer than this are
    /// decimated with stride `len / max_points`, which yields `ceil(len / stride)`
    /// points: up to `2 * max_points - 1` when `len` is just under twice the limit.
    pub max_points: usize,
    /// Number of past point sets kept for persistence rendering.
    pub trail_max_frames: usize,
    pub thresholds: CorrelationThresholds,
}

impl Default for GoniometerConfig {
    fn default() -> Self {
        Self {
            max_points: DEFAULT_MAX_POINTS,
            trail_max_frames: DEFAULT_TRAIL_FRAMES,
            thresholds: CorrelationThresholds::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("max_points must be at least 1")]
    ZeroMaxPoints,
    #[error("trail_max_frames must be at least 1")]
    ZeroTrailFrames,
    #[error("correlation threshold {name} = {value} is outside [-1, 1]")]
    ThresholdOutOfRange { name: &'static str, value: f32 },
    #[error("moderate threshold {moderate} exceeds good threshold {good}")]
    ThresholdOrder { good: f32, moderate: f32 },
}

impl GoniometerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_points == 0 {
            return Err(ConfigError::ZeroMaxPoints);
        }
        if self.trail_max_frames == 0 {
            return Err(ConfigError::ZeroTrailFrames);
        }
        let CorrelationThresholds { good, moderate } = self.thresholds;
        for (name, value) in [("good", good), ("moderate", moderate)] {
            // NaN fails the range check as well.
            if !(-1.0..=1.0).contains(&value) {
                return Err(ConfigError::ThresholdOutOfRange { name, value });
            }
        }
        if moderate > good {
            return Err(ConfigError::ThresholdOrder { good, moderate });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EngineState {
    /// Nothing processed since construction or reset, or the last block was empty.
    #[default]
    Idle,
    Active,
}

/// Result of one block, safe to hand to a renderer on another thread.
#[derive(Debug, Clone, PartialEq)]
pub struct GoniometerSnapshot {
    pub points: PointSet,
    /// Stored point sets, newest first; entry 0 is `points`.
    pub trail: Vec<PointSet>,
    pub correlation: Correlation,
    pub sample_rate: f32,
}

impl Default for GoniometerSnapshot {
    fn default() -> Self {
        Self {
            points: PointSet::default(),
            trail: Vec::new(),
            correlation: Correlation::UNDEFINED,
            sample_rate: DEFAULT_SAMPLE_RATE,
        }
    }
}

impl GoniometerSnapshot {
    pub fn has_data(&self) -> bool {
        !self.points.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct GoniometerProcessor {
    config: GoniometerConfig,
    state: EngineState,
    trail: TrailBuffer,
    snapshot: GoniometerSnapshot,
}

impl GoniometerProcessor {
    pub fn new(config: GoniometerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            state: EngineState::Idle,
            trail: TrailBuffer::new(config.trail_max_frames),
            snapshot: GoniometerSnapshot::default(),
        })
    }

    pub fn config(&self) -> GoniometerConfig {
        self.config
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn trail(&self) -> &TrailBuffer {
        &self.trail
    }

    pub fn correlation(&self) -> Correlation {
        self.snapshot.correlation
    }

    pub fn snapshot(&self) -> &GoniometerSnapshot {
        &self.snapshot
    }

    /// Runs extract, decimate, normalize, correlate and trail update for one block.
    ///
    /// Empty blocks produce a "no data" snapshot and leave the stored trail alone.
    pub fn update_audio(&mut self, block: &AudioBlock<'_>) -> GoniometerSnapshot {
        let sample_rate = if block.sample_rate.is_finite() && block.sample_rate > 0.0 {
            block.sample_rate
        } else {
            self.snapshot.sample_rate
        };

        let pair = ChannelPair::extract(block)
            .decimate(self.config.max_points)
            .normalize();

        if pair.is_empty() {
            self.state = EngineState::Idle;
            self.snapshot = GoniometerSnapshot {
                sample_rate,
                ..GoniometerSnapshot::default()
            };
            return self.snapshot.clone();
        }

        let correlation = correlation::analyze(&pair, &self.config.thresholds);
        let points = PointSet::from_pair(&pair);
        self.trail.push(points.clone());
        self.state = EngineState::Active;

        self.snapshot = GoniometerSnapshot {
            points,
            trail: self.trail.to_vec(),
            correlation,
            sample_rate,
        };
        self.snapshot.clone()
    }
}

impl AudioProcessor for GoniometerProcessor {
    type Output = GoniometerSnapshot;

    fn process_block(&mut self, block: &AudioBlock<'_>) -> Self::Output {
        self.update_audio(block)
    }

    fn reset(&mut self) {
        self.trail.clear();
        self.state = EngineState::Idle;
        self.snapshot = GoniometerSnapshot {
            sample_rate: self.snapshot.sample_rate,
            ..GoniometerSnapshot::default()
        };
    }
}

impl Reconfigurable<GoniometerConfig> for GoniometerProcessor {
    type Error = ConfigError;

    fn update_config(&mut self, config: GoniometerConfig) -> Result<(), ConfigError> {
        config.validate()?;
        if config.trail_max_frames != self.config.trail_max_frames {
            self.trail.set_capacity(config.trail_max_frames);
        }
        self.config = config;
        Ok(())
    }
}
