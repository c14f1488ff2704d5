//! Deterministic parameter initialization.
//!
//! A small xorshift generator plus the fill routines used by the KAN layers,
//! so that the same seed always builds the same parameters.

/// Xorshift PRNG for reproducible initialization without external crates.
#[derive(Debug, Clone)]
pub struct SimpleRng {
    state: u64,
}

impl SimpleRng {
    /// Create a new RNG with explicit seed (if zero, use a fixed value).
    pub fn new(seed: u64) -> Self {
        let state = if seed == 0 { 0x9e3779b97f4a7c15 } else { seed };
        Self { state }
    }

    pub fn next_u32(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        (x >> 32) as u32
    }

    /// Convert to [0, 1).
    pub fn next_f32(&mut self) -> f32 {
        (self.next_u32() >> 8) as f32 / (1u32 << 24) as f32
    }

    /// Uniform sample in [low, high).
    pub fn gen_range_f32(&mut self, low: f32, high: f32) -> f32 {
        low + (high - low) * self.next_f32()
    }
}

/// Xavier/Glorot uniform weights: U(-limit, limit), limit = sqrt(6 / (fan_in + fan_out)).
pub fn xavier_uniform(rng: &mut SimpleRng, fan_in: usize, fan_out: usize, len: usize) -> Vec<f32> {
    let denom = fan_in.saturating_add(fan_out).max(1) as f32;
    let limit = (6.0f32 / denom).sqrt();
    (0..len).map(|_| rng.gen_range_f32(-limit, limit)).collect()
}

/// Uniform noise in [-scale, scale).
pub fn uniform_noise(rng: &mut SimpleRng, scale: f32, len: usize) -> Vec<f32> {
    (0..len).map(|_| rng.gen_range_f32(-scale, scale)).collect()
}

/// Element count of an `f32` buffer with the given dimensions.
///
/// `None` when the product overflows or the buffer would exceed `isize::MAX` bytes.
pub fn buffer_len(dims: &[usize]) -> Option<usize> {
    let len = dims.iter().try_fold(1usize, |acc, &dim| acc.checked_mul(dim))?;
    let bytes = len.checked_mul(std::mem::size_of::<f32>())?;
    (bytes <= isize::MAX as usize).then_some(len)
}

/// `count` evenly spaced points from `start` to `end` inclusive.
pub fn linspace(start: f32, end: f32, count: usize) -> Vec<f32> {
    match count {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (count - 1) as f32;
            (0..count).map(|i| start + step * i as f32).collect()
        }
    }
}
