// SPDX-License-Identifier: AGPL-3.0-only

//! Fifth-dimension band coefficients and their LDU factorization.
//!
//! The even-even block of a Möbius domain-wall operator couples the Ls
//! slices of one site through a chirally projected band:
//!
//!   (M ψ)[s] = diag[s] ψ[s] + upper[s] P- ψ[s+1] + lower[s] P+ ψ[s-1]
//!
//! with indices taken mod Ls. In each chirality sector this is a cyclic
//! bidiagonal matrix: P+ sees the lower band plus the corner (0, Ls-1),
//! P- sees the upper band plus the corner (Ls-1, 0). Both sectors share
//! one set of pivots `dee` when Π lower = Π upper, which holds for every
//! Möbius/Shamir/Cayley parameter set.
//!
//! # References
//!
//! - Brower, Neff, Orginos, "Möbius fermions", Nucl. Phys. Proc. Suppl. 153 (2006)
//! - Chen et al., "Exact one flavor algorithm", PRD 95, 054507 (2017)

use log::debug;
use serde::{Deserialize, Serialize};

use super::constants::LATTICE_DIVISION_GUARD;
use crate::error::KernelError;
use crate::tolerances::CORNER_BALANCE_REL;

/// Smallest Ls the LDU factorization supports.
pub const MIN_LS_FACTORIZED: usize = 2;

pub(crate) fn check_len(table: &'static str, values: &[f64], ls: usize) -> Result<(), KernelError> {
    if values.len() == ls {
        Ok(())
    } else {
        Err(KernelError::TableLength {
            table,
            expected: ls,
            found: values.len(),
        })
    }
}

/// Band tables of the forward fifth-dimension operator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BandCoefficients {
    pub lower: Vec<f64>,
    pub diag: Vec<f64>,
    pub upper: Vec<f64>,
}

impl BandCoefficients {
    /// Build from explicit tables; all three must share one length Ls ≥ 1.
    pub fn new(lower: Vec<f64>, diag: Vec<f64>, upper: Vec<f64>) -> Result<Self, KernelError> {
        let ls = diag.len();
        if ls == 0 {
            return Err(KernelError::LsTooSmall { ls, min: 1 });
        }
        check_len("lower", &lower, ls)?;
        check_len("upper", &upper, ls)?;
        Ok(Self { lower, diag, upper })
    }

    /// Möbius domain-wall even-even band.
    ///
    /// bee = b(4 - M5) + 1, cee = 1 - c(4 - M5). The hopping between
    /// neighbouring slices is -cee; the wrap-around links carry the quark
    /// mass instead: upper[Ls-1] = lower[0] = mass × cee.
    pub fn mobius(ls: usize, b: f64, c: f64, m5: f64, mass: f64) -> Result<Self, KernelError> {
        if ls < MIN_LS_FACTORIZED {
            return Err(KernelError::LsTooSmall {
                ls,
                min: MIN_LS_FACTORIZED,
            });
        }
        let bee = b * (4.0 - m5) + 1.0;
        let cee = 1.0 - c * (4.0 - m5);
        let diag = vec![bee; ls];
        let mut lower = vec![-cee; ls];
        let mut upper = vec![-cee; ls];
        lower[0] = mass * cee;
        upper[ls - 1] = mass * cee;
        debug!("mobius band: Ls={ls} b={b} c={c} M5={m5} mass={mass} bee={bee} cee={cee}");
        Ok(Self { lower, diag, upper })
    }

    #[must_use]
    pub fn ls(&self) -> usize {
        self.diag.len()
    }

    /// Tables for the adjoint apply.
    ///
    /// The adjoint kernel swaps which projector goes with which neighbour,
    /// so the conjugate transpose needs upper'[s] = lower[s+1] and
    /// lower'[s] = upper[s-1] (mod Ls). Coefficients are real.
    #[must_use]
    pub fn adjoint(&self) -> Self {
        let ls = self.ls();
        let upper = (0..ls).map(|s| self.lower[(s + 1) % ls]).collect();
        let lower = (0..ls).map(|s| self.upper[(s + ls - 1) % ls]).collect();
        Self {
            lower,
            diag: self.diag.clone(),
            upper,
        }
    }

    pub(crate) fn check(&self, ls: usize) -> Result<(), KernelError> {
        if ls == 0 {
            return Err(KernelError::LsTooSmall { ls, min: 1 });
        }
        check_len("lower", &self.lower, ls)?;
        check_len("diag", &self.diag, ls)?;
        check_len("upper", &self.upper, ls)
    }
}

/// Precomputed LDU factors for the exact Ls-banded inverse.
///
/// `lee`/`uee` are the off-diagonals of the unit lower/upper factors,
/// `leem`/`ueem` the corner corrections into/out of slice Ls-1, `dee` the
/// pivots. The last entry of each off-diagonal table is unused and zero.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LduFactors {
    pub lee: Vec<f64>,
    pub leem: Vec<f64>,
    pub uee: Vec<f64>,
    pub ueem: Vec<f64>,
    pub dee: Vec<f64>,
}

impl LduFactors {
    /// Factorize a band.
    pub fn from_band(band: &BandCoefficients) -> Result<Self, KernelError> {
        let ls = band.ls();
        band.check(ls)?;
        if ls < MIN_LS_FACTORIZED {
            return Err(KernelError::LsTooSmall {
                ls,
                min: MIN_LS_FACTORIZED,
            });
        }
        let BandCoefficients { lower, diag, upper } = band;
        let last = ls - 1;

        let mut dee = vec![0.0; ls];
        let mut lee = vec![0.0; ls];
        let mut uee = vec![0.0; ls];
        let mut leem = vec![0.0; ls];
        let mut ueem = vec![0.0; ls];

        for s in 0..last {
            check_pivot(s, diag[s])?;
            dee[s] = diag[s];
            lee[s] = lower[s + 1] / diag[s];
            uee[s] = upper[s] / diag[s];
            if s == 0 {
                ueem[0] = lower[0] / diag[0];
                leem[0] = upper[last] / diag[0];
            } else {
                ueem[s] = -lower[s] * ueem[s - 1] / diag[s];
                leem[s] = -upper[s - 1] * leem[s - 1] / diag[s];
            }
        }

        let lower_corner = lower[last] * ueem[last - 1];
        let upper_corner = upper[last - 1] * leem[last - 1];
        let scale = lower_corner.abs().max(upper_corner.abs()).max(1.0);
        if (lower_corner - upper_corner).abs() > CORNER_BALANCE_REL * scale {
            return Err(KernelError::UnbalancedCorners {
                lower: lower.iter().product(),
                upper: upper.iter().product(),
            });
        }
        dee[last] = diag[last] - lower_corner;
        check_pivot(last, dee[last])?;

        debug!("LDU factorization: Ls={ls}, dee[Ls-1]={:.6e}", dee[last]);
        Ok(Self {
            lee,
            leem,
            uee,
            ueem,
            dee,
        })
    }

    /// Accept externally precomputed tables, checking lengths and pivots.
    pub fn from_tables(
        lee: Vec<f64>,
        leem: Vec<f64>,
        uee: Vec<f64>,
        ueem: Vec<f64>,
        dee: Vec<f64>,
    ) -> Result<Self, KernelError> {
        let ls = dee.len();
        if ls < MIN_LS_FACTORIZED {
            return Err(KernelError::LsTooSmall {
                ls,
                min: MIN_LS_FACTORIZED,
            });
        }
        let out = Self {
            lee,
            leem,
            uee,
            ueem,
            dee,
        };
        out.check(ls)?;
        for (s, &d) in out.dee.iter().enumerate() {
            check_pivot(s, d)?;
        }
        Ok(out)
    }

    #[must_use]
    pub fn ls(&self) -> usize {
        self.dee.len()
    }

    pub(crate) fn check(&self, ls: usize) -> Result<(), KernelError> {
        check_len("lee", &self.lee, ls)?;
        check_len("leem", &self.leem, ls)?;
        check_len("uee", &self.uee, ls)?;
        check_len("ueem", &self.ueem, ls)?;
        check_len("dee", &self.dee, ls)
    }
}

fn check_pivot(slice: usize, value: f64) -> Result<(), KernelError> {
    if value.is_finite() && value.abs() > LATTICE_DIVISION_GUARD {
        Ok(())
    } else {
        Err(KernelError::SingularPivot { slice, value })
    }
}
