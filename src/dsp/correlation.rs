//! Block phase correlation (Pearson coefficient between left and right).

use super::channels::ChannelPair;
use std::fmt;

pub const DEFAULT_GOOD_THRESHOLD: f32 = 0.8;
pub const DEFAULT_MODERATE_THRESHOLD: f32 = 0.3;

/// Tier boundaries: `r >= good` is good, `r >= moderate` is moderate, the rest poor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CorrelationThresholds {
    pub good: f32,
    pub moderate: f32,
}

impl Default for CorrelationThresholds {
    fn default() -> Self {
        Self {
            good: DEFAULT_GOOD_THRESHOLD,
            moderate: DEFAULT_MODERATE_THRESHOLD,
        }
    }
}

impl CorrelationThresholds {
    pub fn classify(&self, value: f32) -> CorrelationTier {
        if value >= self.good {
            CorrelationTier::Good
        } else if value >= self.moderate {
            CorrelationTier::Moderate
        } else {
            CorrelationTier::Poor
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CorrelationTier {
    Good,
    Moderate,
    Poor,
    /// Fewer than two samples, silence, or a flat channel.
    #[default]
    Undefined,
    /// The coefficient could not be computed from the samples (non-finite input).
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Correlation {
    pub value: Option<f32>,
    pub tier: CorrelationTier,
}

impl Correlation {
    pub const UNDEFINED: Self = Self {
        value: None,
        tier: CorrelationTier::Undefined,
    };
    pub const ERROR: Self = Self {
        value: None,
        tier: CorrelationTier::Error,
    };
}

impl fmt::Display for Correlation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.tier, self.value) {
            (CorrelationTier::Error, _) => f.write_str("Phase: ERR"),
            (_, Some(value)) => write!(f, "Phase: {value:+.3}"),
            (_, None) => f.write_str("Phase: ---"),
        }
    }
}

/// Computes and classifies the correlation of a (decimated) pair.
pub fn analyze(pair: &ChannelPair, thresholds: &CorrelationThresholds) -> Correlation {
    match coefficient(pair.left(), pair.right()) {
        Coefficient::Value(r) => Correlation {
            value: Some(r),
            tier: thresholds.classify(r),
        },
        Coefficient::Undefined => Correlation::UNDEFINED,
        Coefficient::NonFinite => Correlation::ERROR,
    }
}

enum Coefficient {
    Value(f32),
    Undefined,
    NonFinite,
}

fn coefficient(left: &[f32], right: &[f32]) -> Coefficient {
    debug_assert_eq!(left.len(), right.len());
    if left.len() < 2 {
        return Coefficient::Undefined;
    }
    if !left.iter().chain(right).all(|s| s.is_finite()) {
        return Coefficient::NonFinite;
    }

    let r = match (is_flat(left), is_flat(right)) {
        (false, false) => pearson(left, right),
        // Pure DC on both sides: centred variance is zero, so fall back to the
        // uncentred coefficient, which for two constants is the sign of their product.
        (true, true) => match (left[0] as f64) * (right[0] as f64) {
            p if p == 0.0 => return Coefficient::Undefined,
            p => p.signum(),
        },
        _ => return Coefficient::Undefined,
    };

    if r.is_finite() {
        Coefficient::Value(r.clamp(-1.0, 1.0) as f32)
    } else {
        Coefficient::NonFinite
    }
}

fn is_flat(samples: &[f32]) -> bool {
    samples.iter().all(|&s| s == samples[0])
}

fn pearson(left: &[f32], right: &[f32]) -> f64 {
    let n = left.len() as f64;
    let mean_l = left.iter().map(|&s| s as f64).sum::<f64>() / n;
    let mean_r = right.iter().map(|&s| s as f64).sum::<f64>() / n;

    let (mut lr, mut l2, mut r2) = (0.0f64, 0.0f64, 0.0f64);
    for (&l, &r) in left.iter().zip(right) {
        let (dl, dr) = (l as f64 - mean_l, r as f64 - mean_r);
        lr += dl * dr;
        l2 += dl * dl;
        r2 += dr * dr;
    }
    lr / (l2 * r2).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::TAU;

    fn pair(left: Vec<f32>, right: Vec<f32>) -> ChannelPair {
        ChannelPair::new(left, right)
    }

    fn sine(len: usize, cycles: f32, phase: f32) -> Vec<f32> {
        (0..len)
            .map(|i| (TAU * cycles * i as f32 / len as f32 + phase).sin())
            .collect()
    }

    fn run(left: Vec<f32>, right: Vec<f32>) -> Correlation {
        analyze(&pair(left, right), &CorrelationThresholds::default())
    }

    #[test]
    fn identical_channels_correlate_fully() {
        let s = sine(256, 3.0, 0.0);
        let c = run(s.clone(), s);
        assert_eq!(c.value, Some(1.0));
        assert_eq!(c.tier, CorrelationTier::Good);
    }

    #[test]
    fn inverted_channels_anticorrelate_fully() {
        let s = sine(256, 3.0, 0.0);
        let inv = s.iter().map(|v| -v).collect();
        let c = run(s, inv);
        assert_eq!(c.value, Some(-1.0));
        assert_eq!(c.tier, CorrelationTier::Poor);
    }

    #[test]
    fn quadrature_is_uncorrelated() {
        let c = run(sine(1_000, 5.0, 0.0), sine(1_000, 5.0, TAU / 4.0));
        let r = c.value.expect("coefficient defined");
        assert!(r.abs() < 1e-3, "r = {r}");
        assert_eq!(c.tier, CorrelationTier::Poor);
    }

    #[test]
    fn coefficient_stays_in_range() {
        for seed in 1..20u32 {
            let noise: Vec<f32> = (0..128u32)
                .map(|i| {
                    let h = i.wrapping_mul(2_654_435_761) ^ seed.wrapping_mul(40_503);
                    (h % 1_000) as f32 / 500.0 - 1.0
                })
                .collect();
            let mixed = noise
                .iter()
                .enumerate()
                .map(|(i, v)| v * 0.5 + (i as f32).sin() * 0.5)
                .collect();
            let r = run(noise, mixed).value.expect("defined");
            assert!((-1.0..=1.0).contains(&r), "r = {r}");
        }
    }

    #[test]
    fn degenerate_inputs_are_undefined() {
        assert_eq!(run(vec![], vec![]), Correlation::UNDEFINED);
        assert_eq!(run(vec![0.5], vec![0.5]), Correlation::UNDEFINED);
        assert_eq!(run(vec![0.0; 64], vec![0.0; 64]), Correlation::UNDEFINED);
        assert_eq!(run(vec![0.3; 64], sine(64, 2.0, 0.0)), Correlation::UNDEFINED);
        assert_eq!(run(sine(64, 2.0, 0.0), vec![0.0; 64]), Correlation::UNDEFINED);
    }

    #[test]
    fn constant_offsets_compare_by_sign() {
        assert_eq!(run(vec![1.0; 10], vec![0.8; 10]).value, Some(1.0));
        assert_eq!(run(vec![1.0; 10], vec![-0.8; 10]).value, Some(-1.0));
    }

    #[test]
    fn non_finite_samples_report_error() {
        let mut left = sine(32, 1.0, 0.0);
        left[7] = f32::NAN;
        assert_eq!(run(left, sine(32, 1.0, 0.0)).tier, CorrelationTier::Error);
        let mut right = sine(32, 1.0, 0.0);
        right[3] = f32::INFINITY;
        assert_eq!(run(sine(32, 1.0, 0.0), right), Correlation::ERROR);
    }

    #[test]
    fn tiers_follow_thresholds() {
        let t = CorrelationThresholds::default();
        assert_eq!(t.classify(0.8), CorrelationTier::Good);
        assert_eq!(t.classify(0.79), CorrelationTier::Moderate);
        assert_eq!(t.classify(0.3), CorrelationTier::Moderate);
        assert_eq!(t.classify(0.29), CorrelationTier::Poor);

        let strict = CorrelationThresholds {
            good: 0.95,
            moderate: 0.0,
        };
        assert_eq!(strict.classify(0.9), CorrelationTier::Moderate);
        assert_eq!(strict.classify(-0.1), CorrelationTier::Poor);
    }

    #[test]
    fn readout_matches_display_states() {
        let good = Correlation {
            value: Some(0.97251),
            tier: CorrelationTier::Good,
        };
        assert_eq!(good.to_string(), "Phase: +0.973");
        assert_eq!(Correlation::UNDEFINED.to_string(), "Phase: ---");
        assert_eq!(Correlation::ERROR.to_string(), "Phase: ERR");
    }
}
