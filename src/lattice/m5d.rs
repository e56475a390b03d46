// SPDX-License-Identifier: AGPL-3.0-only

//! Fifth-dimension band apply: M5D, its adjoint, and the EOFA-shifted forms.
//!
//! For every lattice site and slice s (indices mod Ls):
//!
//!   M5D:     χ[s] = diag[s] φ[s] + upper[s] P- ψ[s+1] + lower[s] P+ ψ[s-1]
//!   M5Ddag:  χ[s] = diag[s] φ[s] + upper[s] P+ ψ[s+1] + lower[s] P- ψ[s-1]
//!
//! The shifted forward operator broadcasts the boundary slice into every
//! output slice, χ[s] += c[s] Pσ ψ[shift_s]; its adjoint gathers every
//! slice into the boundary, χ[shift_s] += Σ_s c[s] Pσ ψ[s].
//!
//! Sites are independent: the field is split into per-site blocks of Ls
//! values and the blocks are processed in parallel with rayon.

use std::time::Instant;

use log::trace;
use rayon::prelude::*;

use super::coefficients::{check_len, BandCoefficients};
use super::eofa::EofaShift;
use super::field::FiveDimField;
use super::spinor::{ChiralSite, Chirality};
use super::stats::KernelStats;
use crate::error::KernelError;

/// Check that `phi` (when given) and `chi` match `psi` before any write.
pub(crate) fn check_fields<T: ChiralSite>(
    psi: &FiveDimField<T>,
    phi: Option<&FiveDimField<T>>,
    chi: &FiveDimField<T>,
) -> Result<(), KernelError> {
    if let Some(phi) = phi {
        if phi.parity() != psi.parity() {
            return Err(KernelError::ParityMismatch {
                psi: psi.parity(),
                phi: phi.parity(),
            });
        }
        psi.check_shape(phi, "phi")?;
    }
    psi.check_shape(chi, "chi")
}

/// Run `kernel(psi, phi, chi)` on every site block in parallel.
fn for_each_block<T, F>(
    psi: &FiveDimField<T>,
    phi: &FiveDimField<T>,
    chi: &mut FiveDimField<T>,
    kernel: F,
) where
    T: ChiralSite,
    F: Fn(&[T], &[T], &mut [T]) + Sync,
{
    let ls = psi.ls();
    chi.data_mut()
        .par_chunks_mut(ls)
        .zip(psi.data().par_chunks(ls))
        .zip(phi.data().par_chunks(ls))
        .for_each(|((chi, psi), phi)| kernel(psi, phi, chi));
}

/// Banded recurrence on one site block. `up` is the projector applied to
/// the s+1 neighbour; the s-1 neighbour gets the opposite one.
#[inline]
fn band_block<T: ChiralSite>(
    psi: &[T],
    phi: &[T],
    chi: &mut [T],
    band: &BandCoefficients,
    up: Chirality,
) {
    let ls = psi.len();
    let down = up.opposite();
    for s in 0..ls {
        let next = (s + 1) % ls;
        let prev = (s + ls - 1) % ls;
        chi[s] = phi[s] * band.diag[s]
            + psi[next].project(up) * band.upper[s]
            + psi[prev].project(down) * band.lower[s];
    }
}

/// Forward boundary injection: every slice receives c[s] Pσ ψ[shift_s].
#[inline]
fn shift_broadcast<T: ChiralSite>(psi: &[T], chi: &mut [T], coeffs: &[f64], pm: Chirality) {
    let src = psi[pm.boundary_slice(psi.len())].project(pm);
    for (c, &w) in chi.iter_mut().zip(coeffs) {
        *c = *c + src * w;
    }
}

/// Adjoint boundary injection: slice shift_s receives Σ_s c[s] Pσ ψ[s].
#[inline]
fn shift_gather<T: ChiralSite>(psi: &[T], chi: &mut [T], coeffs: &[f64], pm: Chirality) {
    let acc = psi
        .iter()
        .zip(coeffs)
        .fold(T::ZERO, |acc, (p, &w)| acc + p.project(pm) * w);
    let shift_s = pm.boundary_slice(psi.len());
    chi[shift_s] = chi[shift_s] + acc;
}

fn run<T, F>(
    name: &str,
    psi: &FiveDimField<T>,
    phi: &FiveDimField<T>,
    chi: &mut FiveDimField<T>,
    stats: &mut KernelStats,
    kernel: F,
) where
    T: ChiralSite,
    F: Fn(&[T], &[T], &mut [T]) + Sync,
{
    let start = Instant::now();
    trace!("{name}: {} sites x Ls={}", psi.sites(), psi.ls());
    for_each_block(psi, phi, chi, kernel);
    chi.set_parity(psi.parity());
    stats.m5d.record(start);
}

/// χ = M5D(ψ, φ) with band tables `band`.
pub fn m5d<T: ChiralSite>(
    psi: &FiveDimField<T>,
    phi: &FiveDimField<T>,
    chi: &mut FiveDimField<T>,
    band: &BandCoefficients,
    stats: &mut KernelStats,
) -> Result<(), KernelError> {
    check_fields(psi, Some(phi), chi)?;
    band.check(psi.ls())?;
    run("M5D", psi, phi, chi, stats, |psi, phi, chi| {
        band_block(psi, phi, chi, band, Chirality::Minus);
    });
    Ok(())
}

/// χ = M5D(ψ, φ) + shift_coeffs[s] Pσ ψ[shift_s].
pub fn m5d_shift<T: ChiralSite>(
    psi: &FiveDimField<T>,
    phi: &FiveDimField<T>,
    chi: &mut FiveDimField<T>,
    band: &BandCoefficients,
    shift: &EofaShift,
    stats: &mut KernelStats,
) -> Result<(), KernelError> {
    check_fields(psi, Some(phi), chi)?;
    band.check(psi.ls())?;
    check_len("shift_coeffs", shift.shift_coeffs(), psi.ls())?;
    let (coeffs, pm) = (shift.shift_coeffs(), shift.pm());
    run("M5D_shift", psi, phi, chi, stats, |psi, phi, chi| {
        band_block(psi, phi, chi, band, Chirality::Minus);
        shift_broadcast(psi, chi, coeffs, pm);
    });
    Ok(())
}

/// χ = M5Ddag(ψ, φ): the band recurrence with projector roles swapped.
pub fn m5d_dag<T: ChiralSite>(
    psi: &FiveDimField<T>,
    phi: &FiveDimField<T>,
    chi: &mut FiveDimField<T>,
    band: &BandCoefficients,
    stats: &mut KernelStats,
) -> Result<(), KernelError> {
    check_fields(psi, Some(phi), chi)?;
    band.check(psi.ls())?;
    run("M5Ddag", psi, phi, chi, stats, |psi, phi, chi| {
        band_block(psi, phi, chi, band, Chirality::Plus);
    });
    Ok(())
}

/// χ = M5Ddag(ψ, φ) with the transposed boundary injection.
pub fn m5d_dag_shift<T: ChiralSite>(
    psi: &FiveDimField<T>,
    phi: &FiveDimField<T>,
    chi: &mut FiveDimField<T>,
    band: &BandCoefficients,
    shift: &EofaShift,
    stats: &mut KernelStats,
) -> Result<(), KernelError> {
    check_fields(psi, Some(phi), chi)?;
    band.check(psi.ls())?;
    check_len("shift_coeffs", shift.shift_coeffs(), psi.ls())?;
    let (coeffs, pm) = (shift.shift_coeffs(), shift.pm());
    run("M5Ddag_shift", psi, phi, chi, stats, |psi, phi, chi| {
        band_block(psi, phi, chi, band, Chirality::Plus);
        shift_gather(psi, chi, coeffs, pm);
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lattice::field::Parity;
    use crate::lattice::spinor::Spinor;

    fn wrap_band() -> BandCoefficients {
        BandCoefficients::new(vec![0.5; 4], vec![1.0; 4], vec![0.5; 4]).unwrap()
    }

    fn both_chiralities() -> Spinor {
        Spinor::unit(0, 0) + Spinor::unit(2, 1)
    }

    fn close(a: &Spinor, b: &Spinor) -> bool {
        (*a - *b).norm_sq() < 1e-28
    }

    fn shift_tables(pm: Chirality, coeffs: Vec<f64>) -> EofaShift {
        let n = coeffs.len();
        EofaShift::from_tables(
            pm,
            1.0,
            coeffs,
            vec![0.0; n],
            vec![0.0; n],
            vec![0.0; n],
            vec![0.0; n],
        )
        .unwrap()
    }

    #[test]
    fn slice_three_pulls_from_slice_zero() {
        let v = both_chiralities();
        let psi = FiveDimField::from_fn(1, 4, Parity::Even, |_, s| {
            if s == 0 { v } else { Spinor::ZERO }
        })
        .unwrap();
        let phi = FiveDimField::zeros(1, 4, Parity::Even).unwrap();
        let mut chi = FiveDimField::zeros(1, 4, Parity::Even).unwrap();
        let mut stats = KernelStats::new();
        m5d(&psi, &phi, &mut chi, &wrap_band(), &mut stats).unwrap();

        assert!(close(chi.at(0, 3), &(v.project_minus() * 0.5)));
        assert!(close(chi.at(0, 1), &(v.project_plus() * 0.5)));
        assert_eq!(*chi.at(0, 0), Spinor::ZERO);
        assert_eq!(*chi.at(0, 2), Spinor::ZERO);
    }

    #[test]
    fn slice_zero_pulls_from_slice_three() {
        let v = both_chiralities();
        let psi = FiveDimField::from_fn(1, 4, Parity::Even, |_, s| {
            if s == 3 { v } else { Spinor::ZERO }
        })
        .unwrap();
        let phi = FiveDimField::zeros(1, 4, Parity::Even).unwrap();
        let mut chi = FiveDimField::zeros(1, 4, Parity::Even).unwrap();
        let mut stats = KernelStats::new();
        m5d(&psi, &phi, &mut chi, &wrap_band(), &mut stats).unwrap();

        assert!(close(chi.at(0, 0), &(v.project_plus() * 0.5)));
        assert!(close(chi.at(0, 2), &(v.project_minus() * 0.5)));
    }

    #[test]
    fn dag_swaps_projectors() {
        let v = both_chiralities();
        let psi = FiveDimField::from_fn(1, 4, Parity::Odd, |_, s| {
            if s == 0 { v } else { Spinor::ZERO }
        })
        .unwrap();
        let phi = FiveDimField::zeros(1, 4, Parity::Odd).unwrap();
        let mut chi = FiveDimField::zeros(1, 4, Parity::Odd).unwrap();
        let mut stats = KernelStats::new();
        m5d_dag(&psi, &phi, &mut chi, &wrap_band(), &mut stats).unwrap();

        assert!(close(chi.at(0, 3), &(v.project_plus() * 0.5)));
        assert!(close(chi.at(0, 1), &(v.project_minus() * 0.5)));
    }

    #[test]
    fn diag_term_seeds_every_slice() {
        let phi = FiveDimField::random(3, 5, Parity::Even, 42).unwrap();
        let psi = FiveDimField::zeros(3, 5, Parity::Even).unwrap();
        let mut chi = FiveDimField::zeros(3, 5, Parity::Even).unwrap();
        let band = BandCoefficients::new(vec![0.1; 5], vec![2.0; 5], vec![0.3; 5]).unwrap();
        let mut stats = KernelStats::new();
        m5d(&psi, &phi, &mut chi, &band, &mut stats).unwrap();
        assert!(chi.sub(&phi.scaled(2.0)).norm_sq() < 1e-28);
    }

    #[test]
    fn shift_broadcasts_boundary_slice() {
        let v = both_chiralities();
        let coeffs = vec![0.1, 0.2, 0.3, 0.4];
        for pm in [Chirality::Plus, Chirality::Minus] {
            let shift_s = pm.boundary_slice(4);
            let psi = FiveDimField::from_fn(2, 4, Parity::Even, |_, s| {
                if s == shift_s { v } else { Spinor::ZERO }
            })
            .unwrap();
            let phi = FiveDimField::zeros(2, 4, Parity::Even).unwrap();
            let band = BandCoefficients::new(vec![0.0; 4], vec![1.0; 4], vec![0.0; 4]).unwrap();
            let mut chi = FiveDimField::zeros(2, 4, Parity::Even).unwrap();
            let mut stats = KernelStats::new();
            let shift = shift_tables(pm, coeffs.clone());
            m5d_shift(&psi, &phi, &mut chi, &band, &shift, &mut stats).unwrap();
            for site in 0..2 {
                for s in 0..4 {
                    let expected = v.project(pm) * coeffs[s];
                    assert!(close(chi.at(site, s), &expected), "pm={pm:?} s={s}");
                }
            }
        }
    }

    #[test]
    fn dag_shift_gathers_into_boundary_slice() {
        let coeffs = vec![0.1, 0.2, 0.3, 0.4];
        let psi = FiveDimField::random(1, 4, Parity::Even, 5).unwrap();
        let phi = FiveDimField::zeros(1, 4, Parity::Even).unwrap();
        let band = BandCoefficients::new(vec![0.0; 4], vec![0.0; 4], vec![0.0; 4]).unwrap();
        for pm in [Chirality::Plus, Chirality::Minus] {
            let mut chi = FiveDimField::random(1, 4, Parity::Even, 77).unwrap();
            let mut stats = KernelStats::new();
            let shift = shift_tables(pm, coeffs.clone());
            m5d_dag_shift(&psi, &phi, &mut chi, &band, &shift, &mut stats).unwrap();
            let shift_s = pm.boundary_slice(4);
            let mut expected = Spinor::ZERO;
            for s in 0..4 {
                expected = expected + psi.at(0, s).project(pm) * coeffs[s];
            }
            for s in 0..4 {
                let want = if s == shift_s { expected } else { Spinor::ZERO };
                assert!(close(chi.at(0, s), &want), "pm={pm:?} s={s}");
            }
        }
    }

    #[test]
    fn zero_shift_coefficients_reduce_to_plain_apply() {
        let psi = FiveDimField::random(4, 6, Parity::Even, 1).unwrap();
        let phi = FiveDimField::random(4, 6, Parity::Even, 2).unwrap();
        let band = BandCoefficients::mobius(6, 1.5, 0.5, 1.8, 0.1).unwrap();
        let shift = shift_tables(Chirality::Plus, vec![0.0; 6]);
        let mut stats = KernelStats::new();
        let mut plain = FiveDimField::zeros(4, 6, Parity::Even).unwrap();
        let mut shifted = FiveDimField::zeros(4, 6, Parity::Even).unwrap();
        m5d(&psi, &phi, &mut plain, &band, &mut stats).unwrap();
        m5d_shift(&psi, &phi, &mut shifted, &band, &shift, &mut stats).unwrap();
        assert_eq!(plain, shifted);

        m5d_dag(&psi, &phi, &mut plain, &band, &mut stats).unwrap();
        m5d_dag_shift(&psi, &phi, &mut shifted, &band, &shift, &mut stats).unwrap();
        assert_eq!(plain, shifted);
    }

    #[test]
    fn parity_mismatch_leaves_output_untouched() {
        let psi = FiveDimField::random(2, 4, Parity::Even, 1).unwrap();
        let phi = FiveDimField::random(2, 4, Parity::Odd, 2).unwrap();
        let mut chi = FiveDimField::random(2, 4, Parity::Odd, 3).unwrap();
        let before = chi.clone();
        let mut stats = KernelStats::new();
        let err = m5d(&psi, &phi, &mut chi, &wrap_band(), &mut stats).unwrap_err();
        assert_eq!(
            err,
            KernelError::ParityMismatch {
                psi: Parity::Even,
                phi: Parity::Odd
            }
        );
        assert_eq!(chi, before);
        assert_eq!(stats.m5d.calls, 0);
    }

    #[test]
    fn table_length_is_checked_against_ls() {
        let psi = FiveDimField::random(2, 5, Parity::Even, 1).unwrap();
        let mut chi = FiveDimField::zeros(2, 5, Parity::Even).unwrap();
        let mut stats = KernelStats::new();
        let err = m5d(&psi, &psi, &mut chi, &wrap_band(), &mut stats).unwrap_err();
        assert!(matches!(err, KernelError::TableLength { expected: 5, found: 4, .. }));
    }

    #[test]
    fn output_inherits_input_parity() {
        let psi = FiveDimField::random(2, 4, Parity::Odd, 1).unwrap();
        let mut chi = FiveDimField::zeros(2, 4, Parity::Even).unwrap();
        let mut stats = KernelStats::new();
        m5d(&psi, &psi, &mut chi, &wrap_band(), &mut stats).unwrap();
        assert_eq!(chi.parity(), Parity::Odd);
    }

    #[test]
    fn each_call_counts_once() {
        let psi = FiveDimField::random(8, 4, Parity::Even, 1).unwrap();
        let mut chi = FiveDimField::zeros(8, 4, Parity::Even).unwrap();
        let mut stats = KernelStats::new();
        for n in 1..=7u64 {
            m5d_dag(&psi, &psi, &mut chi, &wrap_band(), &mut stats).unwrap();
            assert_eq!(stats.m5d.calls, n);
        }
        assert_eq!(stats.mooee_inv.calls, 0);
    }
}
