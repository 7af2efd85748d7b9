// Default sample rate (Hz) reported before the host tells us the real one.
pub const DEFAULT_SAMPLE_RATE: f32 = 44_100.0;

// Gain applied to a mono signal to synthesise the right channel. Keeps mono
// material off the L=R diagonal so it reads differently from true dual-mono.
pub const MONO_RIGHT_GAIN: f32 = 0.8;

// Largest finite absolute value in `samples`, or 0.0 if there is none.
#[inline]
pub fn peak_abs(samples: &[f32]) -> f32 {
    samples
        .iter()
        .map(|s| s.abs())
        .filter(|s| s.is_finite())
        .fold(0.0, f32::max)
}

#[inline]
pub fn scale_in_place(buffer: &mut [f32], gain: f32) {
    for sample in buffer.iter_mut() {
        *sample *= gain;
    }
}

// Divides rather than multiplying by the reciprocal: `1.0 / divisor`
// overflows to inf for subnormal divisors.
#[inline]
pub fn div_in_place(buffer: &mut [f32], divisor: f32) {
    for sample in buffer.iter_mut() {
        *sample /= divisor;
    }
}
