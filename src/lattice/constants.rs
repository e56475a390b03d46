// SPDX-License-Identifier: AGPL-3.0-only

//! Centralized constants for the fifth-dimension kernels.
//!
//! Collects the site-value shape, the LCG PRNG used to fill test and
//! benchmark fields, and the numerical guard applied by the setup phase
//! (`coefficients.rs`, `eofa.rs`).

/// Number of colors in QCD (SU(3)).
pub const N_COLORS: usize = 3;

/// Number of Dirac spin components.
pub const N_SPINS: usize = 4;

/// Spin components kept by the positive-chirality projector (chiral basis).
pub const PLUS_SPINS: [usize; 2] = [0, 1];

/// Spin components kept by the negative-chirality projector (chiral basis).
pub const MINUS_SPINS: [usize; 2] = [2, 3];

/// LCG multiplier (Knuth MMIX).
pub const LCG_MULTIPLIER: u64 = 6_364_136_223_846_793_005;

/// LCG increment (Knuth MMIX).
pub const LCG_INCREMENT: u64 = 1_442_695_040_888_963_407;

/// Divisor for the 53-bit LCG → uniform [0, 1) conversion.
pub const LCG_53_DIVISOR: f64 = (1u64 << 53) as f64;

/// Division guard for LDU pivots.
///
/// Factor tables whose pivots fall below this are rejected at construction;
/// the kernels themselves divide unguarded. The EOFA Sherman-Morrison
/// denominator has its own threshold, `tolerances::SHIFT_DENOMINATOR_MIN`.
pub const LATTICE_DIVISION_GUARD: f64 = 1e-30;

/// Advance the LCG state by one step.
#[inline]
pub fn lcg_step(seed: &mut u64) {
    *seed = seed
        .wrapping_mul(LCG_MULTIPLIER)
        .wrapping_add(LCG_INCREMENT);
}

/// Generate a uniform f64 in [0, 1) from 53 bits of LCG state.
#[inline]
pub fn lcg_uniform_f64(seed: &mut u64) -> f64 {
    lcg_step(seed);
    (*seed >> 11) as f64 / LCG_53_DIVISOR
}

/// Uniform f64 in [-0.5, 0.5), the range used for random field components.
#[inline]
pub fn lcg_centered_f64(seed: &mut u64) -> f64 {
    lcg_uniform_f64(seed) - 0.5
}
