//! Deterministic noise helpers for synthetic point clouds.
//!
//! The functions here avoid `thread_rng` and do not depend on the internal
//! algorithm of `rand` RNGs. This keeps synthetic scenes stable across
//! versions and platforms.

use crate::{Real, Vec3};

/// Deterministic uniform 3D noise in `[-max_abs, +max_abs]` per axis.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct UniformPointNoise {
    /// Base seed controlling the pseudo-random sequence.
    pub seed: u64,
    /// Maximum absolute per-axis offset.
    pub max_abs: Real,
}

impl UniformPointNoise {
    pub fn new(seed: u64, max_abs: Real) -> Self {
        Self { seed, max_abs }
    }

    /// Sample a deterministic offset for a given `(stream, index)` key.
    #[inline]
    pub fn sample(&self, stream: usize, index: usize) -> Vec3 {
        let max_abs = self.max_abs.abs();
        if max_abs == 0.0 {
            return Vec3::zeros();
        }
        let key = mix_key(self.seed, stream, index);
        Vec3::new(
            signed_unit(splitmix64(key)),
            signed_unit(splitmix64(key ^ 0x94D0_49BB_1331_11EB)),
            signed_unit(splitmix64(key ^ 0xD6E8_FEB8_6659_FD93)),
        ) * max_abs
    }
}

/// Deterministic value in `[0, 1)` for a `(seed, stream, index)` key.
#[inline]
pub fn unit_sample(seed: u64, stream: usize, index: usize) -> Real {
    u64_to_unit_f64(splitmix64(mix_key(seed, stream, index)))
}

#[inline]
fn mix_key(seed: u64, stream: usize, index: usize) -> u64 {
    seed ^ (stream as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)
        ^ (index as u64).wrapping_mul(0xBF58_476D_1CE4_E5B9)
}

#[inline]
fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = x;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

#[inline]
fn u64_to_unit_f64(x: u64) -> Real {
    // Top 53 bits mapped to [0, 1).
    (x >> 11) as Real * (1.0 / ((1u64 << 53) as Real))
}

#[inline]
fn signed_unit(x: u64) -> Real {
    (u64_to_unit_f64(x) - 0.5) * 2.0
}
