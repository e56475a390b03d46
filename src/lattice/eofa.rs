// SPDX-License-Identifier: AGPL-3.0-only

//! Exact one flavor algorithm (EOFA) rank-one boundary correction.
//!
//! The EOFA operator adds to the band a Pauli-Villars-like coupling that
//! reads one boundary slice and writes every slice:
//!
//!   (M_shift ψ)[s] = (M ψ)[s] + shift_coeffs[s] Pσ ψ[shift_s]
//!
//! with σ = + and shift_s = Ls-1 for pm = +1, σ = - and shift_s = 0 for
//! pm = -1. Restricted to the σ sector this is A + c eᵀ with A the scalar
//! sector matrix, c = shift_coeffs and e the unit vector at shift_s, so
//! Sherman-Morrison gives the inverse without refactorizing:
//!
//!   (A + c eᵀ)⁻¹ = A⁻¹ - (A⁻¹c)(eᵀA⁻¹) / (1 + eᵀA⁻¹c)
//!
//! The kernels apply the base inverse, then add
//! `norm[s] · Pσ(Σ_j lc[j] ψ[j])`. For the forward inverse lc = eᵀA⁻¹ and
//! norm = -A⁻¹c / den; the adjoint swaps the two vectors.

use faer::prelude::Solve;
use faer::Mat;
use log::debug;
use serde::{Deserialize, Serialize};

use super::coefficients::{check_len, BandCoefficients};
use super::spinor::Chirality;
use crate::error::KernelError;
use crate::tolerances::SHIFT_DENOMINATOR_MIN;

/// EOFA shift parameters and the derived rank-one correction tables.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EofaShift {
    pm: Chirality,
    shift: f64,
    shift_coeffs: Vec<f64>,
    inv_lc: Vec<f64>,
    inv_norm: Vec<f64>,
    inv_dag_lc: Vec<f64>,
    inv_dag_norm: Vec<f64>,
}

impl EofaShift {
    /// Derive the inverse-correction tables for `band` plus the shift term.
    pub fn compute(
        band: &BandCoefficients,
        pm: Chirality,
        shift: f64,
        shift_coeffs: Vec<f64>,
    ) -> Result<Self, KernelError> {
        let ls = band.ls();
        band.check(ls)?;
        check_len("shift_coeffs", &shift_coeffs, ls)?;
        let shift_s = pm.boundary_slice(ls);

        let a = sector_matrix(band, pm);
        let a_t = Mat::from_fn(ls, ls, |i, j| a[(j, i)]);
        let c = Mat::from_fn(ls, 1, |i, _| shift_coeffs[i]);
        let e = Mat::from_fn(ls, 1, |i, _| if i == shift_s { 1.0 } else { 0.0 });

        // u = A⁻¹ c, w = A⁻ᵀ e (row shift_s of A⁻¹)
        let u = a.partial_piv_lu().solve(&c);
        let w = a_t.partial_piv_lu().solve(&e);

        let den = 1.0 + u[(shift_s, 0)];
        if !den.is_finite() || den.abs() < SHIFT_DENOMINATOR_MIN {
            return Err(KernelError::SingularShift(den));
        }

        let inv_lc: Vec<f64> = (0..ls).map(|j| w[(j, 0)]).collect();
        let inv_dag_lc: Vec<f64> = (0..ls).map(|j| u[(j, 0)]).collect();
        let inv_norm = inv_dag_lc.iter().map(|x| -x / den).collect();
        let inv_dag_norm = inv_lc.iter().map(|x| -x / den).collect();

        debug!(
            "EOFA correction: Ls={ls} pm={} shift={shift} shift_s={shift_s} denominator={den:.6e}",
            pm.pm()
        );
        Ok(Self {
            pm,
            shift,
            shift_coeffs,
            inv_lc,
            inv_norm,
            inv_dag_lc,
            inv_dag_norm,
        })
    }

    /// Accept externally precomputed correction tables.
    pub fn from_tables(
        pm: Chirality,
        shift: f64,
        shift_coeffs: Vec<f64>,
        inv_lc: Vec<f64>,
        inv_norm: Vec<f64>,
        inv_dag_lc: Vec<f64>,
        inv_dag_norm: Vec<f64>,
    ) -> Result<Self, KernelError> {
        let out = Self {
            pm,
            shift,
            shift_coeffs,
            inv_lc,
            inv_norm,
            inv_dag_lc,
            inv_dag_norm,
        };
        out.check(out.shift_coeffs.len())?;
        Ok(out)
    }

    #[must_use]
    pub const fn pm(&self) -> Chirality {
        self.pm
    }

    #[must_use]
    pub const fn shift(&self) -> f64 {
        self.shift
    }

    #[must_use]
    pub fn shift_coeffs(&self) -> &[f64] {
        &self.shift_coeffs
    }

    #[must_use]
    pub fn inv_lc(&self) -> &[f64] {
        &self.inv_lc
    }

    #[must_use]
    pub fn inv_norm(&self) -> &[f64] {
        &self.inv_norm
    }

    #[must_use]
    pub fn inv_dag_lc(&self) -> &[f64] {
        &self.inv_dag_lc
    }

    #[must_use]
    pub fn inv_dag_norm(&self) -> &[f64] {
        &self.inv_dag_norm
    }

    #[must_use]
    pub fn ls(&self) -> usize {
        self.shift_coeffs.len()
    }

    pub(crate) fn check(&self, ls: usize) -> Result<(), KernelError> {
        if ls == 0 {
            return Err(KernelError::LsTooSmall { ls, min: 1 });
        }
        check_len("shift_coeffs", &self.shift_coeffs, ls)?;
        check_len("MooeeInv_shift_lc", &self.inv_lc, ls)?;
        check_len("MooeeInv_shift_norm", &self.inv_norm, ls)?;
        check_len("MooeeInvDag_shift_lc", &self.inv_dag_lc, ls)?;
        check_len("MooeeInvDag_shift_norm", &self.inv_dag_norm, ls)
    }
}

/// Dense scalar matrix of the `chirality` sector of the band operator.
fn sector_matrix(band: &BandCoefficients, chirality: Chirality) -> Mat<f64> {
    let ls = band.ls();
    let mut a = Mat::<f64>::zeros(ls, ls);
    for s in 0..ls {
        a[(s, s)] += band.diag[s];
        match chirality {
            Chirality::Plus => a[(s, (s + ls - 1) % ls)] += band.lower[s],
            Chirality::Minus => a[(s, (s + 1) % ls)] += band.upper[s],
        }
    }
    a
}

#[cfg(test)]
mod tests {
    use super::*;

    fn band() -> BandCoefficients {
        BandCoefficients::mobius(4, 1.5, 0.5, 1.8, 0.1).unwrap()
    }

    /// Dense (A + c eᵀ) x for checking the corrected inverse.
    fn shifted_apply(band: &BandCoefficients, pm: Chirality, c: &[f64], x: &[f64]) -> Vec<f64> {
        let ls = band.ls();
        let a = sector_matrix(band, pm);
        let shift_s = pm.boundary_slice(ls);
        (0..ls)
            .map(|s| (0..ls).map(|j| a[(s, j)] * x[j]).sum::<f64>() + c[s] * x[shift_s])
            .collect()
    }

    #[test]
    fn zero_coefficients_give_zero_correction() {
        let eofa = EofaShift::compute(&band(), Chirality::Plus, 0.0, vec![0.0; 4]).unwrap();
        assert!(eofa.inv_norm().iter().all(|x| x.abs() < 1e-15));
        assert!(eofa.inv_dag_lc().iter().all(|x| x.abs() < 1e-15));
    }

    #[test]
    fn lc_is_boundary_row_of_sector_inverse() {
        // lcᵀ A = eᵀ
        let b = band();
        for pm in [Chirality::Plus, Chirality::Minus] {
            let eofa = EofaShift::compute(&b, pm, 0.3, vec![0.1, -0.2, 0.05, 0.3]).unwrap();
            let a = sector_matrix(&b, pm);
            let shift_s = pm.boundary_slice(4);
            for k in 0..4 {
                let v: f64 = (0..4).map(|j| eofa.inv_lc()[j] * a[(j, k)]).sum();
                let expected = if k == shift_s { 1.0 } else { 0.0 };
                assert!((v - expected).abs() < 1e-12, "pm={pm:?} k={k}: {v}");
            }
        }
    }

    #[test]
    fn sherman_morrison_inverts_shifted_sector() {
        let b = band();
        let c = vec![0.1, -0.2, 0.05, 0.3];
        for pm in [Chirality::Plus, Chirality::Minus] {
            let eofa = EofaShift::compute(&b, pm, 0.3, c.clone()).unwrap();
            // x = A⁻¹ r + norm · (lc · r), with A⁻¹ r from a dense solve
            let r = [1.0, 0.5, -0.25, 2.0];
            let a = sector_matrix(&b, pm);
            let base = a
                .partial_piv_lu()
                .solve(&Mat::from_fn(4, 1, |i, _| r[i]));
            let proj: f64 = (0..4).map(|j| eofa.inv_lc()[j] * r[j]).sum();
            let x: Vec<f64> = (0..4).map(|s| base[(s, 0)] + eofa.inv_norm()[s] * proj).collect();
            let back = shifted_apply(&b, pm, &c, &x);
            for s in 0..4 {
                assert!((back[s] - r[s]).abs() < 1e-12, "pm={pm:?} s={s}");
            }
        }
    }

    #[test]
    fn empty_band_is_rejected() {
        let empty = BandCoefficients {
            lower: vec![],
            diag: vec![],
            upper: vec![],
        };
        assert_eq!(
            EofaShift::compute(&empty, Chirality::Plus, 0.3, vec![]).unwrap_err(),
            KernelError::LsTooSmall { ls: 0, min: 1 }
        );
    }

    #[test]
    fn singular_shift_is_rejected() {
        // Choose c so that 1 + (A⁻¹c)[shift_s] = 0: c = -A e_shift.
        let b = band();
        let pm = Chirality::Plus;
        let a = sector_matrix(&b, pm);
        let c: Vec<f64> = (0..4).map(|s| -a[(s, 3)]).collect();
        assert!(matches!(
            EofaShift::compute(&b, pm, 1.0, c),
            Err(KernelError::SingularShift(_))
        ));
    }

    #[test]
    fn from_tables_checks_lengths() {
        let err = EofaShift::from_tables(
            Chirality::Minus,
            0.5,
            vec![0.0; 3],
            vec![0.0; 3],
            vec![0.0; 2],
            vec![0.0; 3],
            vec![0.0; 3],
        )
        .unwrap_err();
        assert_eq!(
            err,
            KernelError::TableLength {
                table: "MooeeInv_shift_norm",
                expected: 3,
                found: 2
            }
        );
    }

    #[test]
    fn compute_checks_coefficient_length() {
        assert!(matches!(
            EofaShift::compute(&band(), Chirality::Plus, 0.1, vec![0.0; 3]),
            Err(KernelError::TableLength { table: "shift_coeffs", .. })
        ));
    }
}
