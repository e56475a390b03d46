// SPDX-License-Identifier: AGPL-3.0-only

//! Chiral site values: the local object stored at each (site, s) slot.
//!
//! The kernels only need a handful of operations on a site value: add,
//! subtract, real scaling and the two chirality projections
//!
//!   P± = (1 ± γ5) / 2
//!
//! which satisfy P+ x + P- x = x and P± P± = P±. These are captured by
//! [`ChiralSite`], so the kernels are generic over the value type.
//! [`Spinor`] is the Dirac spinor used in practice: 4 spins × 3 colors in
//! the chiral basis, where γ5 = diag(1, 1, -1, -1).

use std::ops::{Add, Mul, Neg, Sub};

use serde::{Deserialize, Serialize};

use super::complex_f64::Complex64;
use super::constants::{lcg_centered_f64, MINUS_SPINS, N_COLORS, N_SPINS, PLUS_SPINS};
use crate::error::KernelError;

/// Which chirality a projection keeps.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Chirality {
    Plus,
    Minus,
}

impl Chirality {
    /// Decode the EOFA `pm` selector (+1 or -1).
    pub fn from_pm(pm: i32) -> Result<Self, KernelError> {
        match pm {
            1 => Ok(Self::Plus),
            -1 => Ok(Self::Minus),
            other => Err(KernelError::InvalidChirality(other)),
        }
    }

    #[must_use]
    pub const fn pm(self) -> i32 {
        match self {
            Self::Plus => 1,
            Self::Minus => -1,
        }
    }

    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Plus => Self::Minus,
            Self::Minus => Self::Plus,
        }
    }

    /// Slice the EOFA boundary term couples to: Ls-1 for `Plus`, 0 for `Minus`.
    #[must_use]
    pub const fn boundary_slice(self, ls: usize) -> usize {
        match self {
            Self::Plus => ls - 1,
            Self::Minus => 0,
        }
    }
}

/// A local field value with chirality projections.
pub trait ChiralSite:
    Copy + Send + Sync + Add<Output = Self> + Sub<Output = Self> + Mul<f64, Output = Self>
{
    const ZERO: Self;

    /// P+ x
    fn project_plus(&self) -> Self;

    /// P- x
    fn project_minus(&self) -> Self;

    /// Local inner product ⟨self|other⟩ (antilinear in `self`).
    fn inner(&self, other: &Self) -> Complex64;

    #[inline]
    fn project(&self, chirality: Chirality) -> Self {
        match chirality {
            Chirality::Plus => self.project_plus(),
            Chirality::Minus => self.project_minus(),
        }
    }
}

/// Color vector: 3 complex components.
pub type ColorVector = [Complex64; N_COLORS];

/// Dirac spinor in the chiral basis.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Spinor {
    pub s: [ColorVector; N_SPINS],
}

impl Spinor {
    pub const ZERO: Self = Self {
        s: [[Complex64::ZERO; N_COLORS]; N_SPINS],
    };

    /// Random spinor with components uniform in [-0.5, 0.5).
    pub fn random(seed: &mut u64) -> Self {
        let mut out = Self::ZERO;
        for spin in &mut out.s {
            for c in spin.iter_mut() {
                let re = lcg_centered_f64(seed);
                let im = lcg_centered_f64(seed);
                *c = Complex64::new(re, im);
            }
        }
        out
    }

    /// Spinor with a single nonzero component.
    #[must_use]
    pub fn unit(spin: usize, color: usize) -> Self {
        let mut out = Self::ZERO;
        out.s[spin][color] = Complex64::ONE;
        out
    }

    pub fn norm_sq(&self) -> f64 {
        self.s.iter().flatten().map(|c| c.abs_sq()).sum()
    }

    fn keep(&self, spins: [usize; 2]) -> Self {
        let mut out = Self::ZERO;
        for sp in spins {
            out.s[sp] = self.s[sp];
        }
        out
    }

    fn zip_with(self, rhs: Self, f: impl Fn(Complex64, Complex64) -> Complex64) -> Self {
        let mut out = self;
        for (a, b) in out.s.iter_mut().flatten().zip(rhs.s.iter().flatten()) {
            *a = f(*a, *b);
        }
        out
    }
}

impl Default for Spinor {
    fn default() -> Self {
        Self::ZERO
    }
}

impl Add for Spinor {
    type Output = Self;
    #[inline]
    fn add(self, rhs: Self) -> Self {
        self.zip_with(rhs, |a, b| a + b)
    }
}

impl Sub for Spinor {
    type Output = Self;
    #[inline]
    fn sub(self, rhs: Self) -> Self {
        self.zip_with(rhs, |a, b| a - b)
    }
}

impl Mul<f64> for Spinor {
    type Output = Self;
    #[inline]
    fn mul(self, rhs: f64) -> Self {
        let mut out = self;
        for c in out.s.iter_mut().flatten() {
            *c = c.scale(rhs);
        }
        out
    }
}

impl Neg for Spinor {
    type Output = Self;
    #[inline]
    fn neg(self) -> Self {
        self * -1.0
    }
}

impl ChiralSite for Spinor {
    const ZERO: Self = Spinor::ZERO;

    #[inline]
    fn project_plus(&self) -> Self {
        self.keep(PLUS_SPINS)
    }

    #[inline]
    fn project_minus(&self) -> Self {
        self.keep(MINUS_SPINS)
    }

    fn inner(&self, other: &Self) -> Complex64 {
        self.s
            .iter()
            .flatten()
            .zip(other.s.iter().flatten())
            .map(|(a, b)| a.conj() * *b)
            .sum()
    }
}
