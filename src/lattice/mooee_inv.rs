// SPDX-License-Identifier: AGPL-3.0-only

//! Exact inverse of the even-even fifth-dimension block.
//!
//! Per site, the band operator is solved with the precomputed LDU factors
//! in four sweeps over the Ls slices:
//!
//! 1. forward substitution with `lee` on the P+ part,
//! 2. corner elimination into slice Ls-1 with `leem` on the P- part,
//! 3. pivot division, folding the P+ part of slice Ls-1 back through `ueem`,
//! 4. backward substitution with `uee` on the P- part.
//!
//! The adjoint inverse runs the same sweeps with lee↔uee, leem↔ueem and
//! P+↔P- exchanged. The two chirality sectors never mix, so each sweep
//! touches only its own projection.
//!
//! The EOFA-shifted inverses run the base solve unchanged and then add the
//! Sherman-Morrison term `norm[s] · Pσ(Σ_j lc[j] ψ[j])` to every slice.

use std::time::Instant;

use log::trace;
use rayon::prelude::*;

use super::coefficients::{LduFactors, MIN_LS_FACTORIZED};
use super::eofa::EofaShift;
use super::field::FiveDimField;
use super::m5d::check_fields;
use super::spinor::{ChiralSite, Chirality};
use super::stats::KernelStats;
use crate::error::KernelError;

/// Factor tables arranged for one direction of the solve.
struct Sweep<'a> {
    /// Projector of the forward sweep and of the corner tail.
    forward: Chirality,
    lower: &'a [f64],
    corner_in: &'a [f64],
    corner_out: &'a [f64],
    upper: &'a [f64],
    dee: &'a [f64],
}

impl<'a> Sweep<'a> {
    fn normal(ldu: &'a LduFactors) -> Self {
        Self {
            forward: Chirality::Plus,
            lower: &ldu.lee,
            corner_in: &ldu.leem,
            corner_out: &ldu.ueem,
            upper: &ldu.uee,
            dee: &ldu.dee,
        }
    }

    fn dagger(ldu: &'a LduFactors) -> Self {
        Self {
            forward: Chirality::Minus,
            lower: &ldu.uee,
            corner_in: &ldu.ueem,
            corner_out: &ldu.leem,
            upper: &ldu.lee,
            dee: &ldu.dee,
        }
    }

    /// Solve one site block: chi = M⁻¹ psi (or M⁻† psi).
    #[inline]
    fn solve<T: ChiralSite>(&self, psi: &[T], chi: &mut [T]) {
        let ls = psi.len();
        let last = ls - 1;
        let back = self.forward.opposite();

        chi[0] = psi[0];
        for s in 1..ls {
            chi[s] = psi[s] - chi[s - 1].project(self.forward) * self.lower[s - 1];
        }

        let corner = chi[..last]
            .iter()
            .zip(self.corner_in)
            .fold(T::ZERO, |acc, (c, &w)| acc + c.project(back) * w);
        chi[last] = chi[last] - corner;

        let tail = chi[last].project(self.forward);
        let inv_last = 1.0 / self.dee[last];
        for s in 0..last {
            chi[s] = chi[s] * (1.0 / self.dee[s]) - tail * (self.corner_out[s] * inv_last);
        }
        chi[last] = chi[last] * inv_last;

        for s in (0..last).rev() {
            chi[s] = chi[s] - chi[s + 1].project(back) * self.upper[s];
        }
    }
}

/// Add norm[s] · Pσ(Σ_j lc[j] ψ[j]) to every slice of one block.
#[inline]
fn add_rank_one<T: ChiralSite>(psi: &[T], chi: &mut [T], lc: &[f64], norm: &[f64], pm: Chirality) {
    let proj = psi
        .iter()
        .zip(lc)
        .fold(T::ZERO, |acc, (p, &w)| acc + *p * w)
        .project(pm);
    for (c, &n) in chi.iter_mut().zip(norm) {
        *c = *c + proj * n;
    }
}

fn check_inverse<T: ChiralSite>(
    psi: &FiveDimField<T>,
    chi: &FiveDimField<T>,
    ldu: &LduFactors,
) -> Result<(), KernelError> {
    check_fields(psi, None, chi)?;
    if psi.ls() < MIN_LS_FACTORIZED {
        return Err(KernelError::LsTooSmall {
            ls: psi.ls(),
            min: MIN_LS_FACTORIZED,
        });
    }
    ldu.check(psi.ls())
}

fn run<T, F>(
    name: &str,
    psi: &FiveDimField<T>,
    chi: &mut FiveDimField<T>,
    stats: &mut KernelStats,
    kernel: F,
) where
    T: ChiralSite,
    F: Fn(&[T], &mut [T]) + Sync,
{
    let start = Instant::now();
    let ls = psi.ls();
    trace!("{name}: {} sites x Ls={ls}", psi.sites());
    chi.data_mut()
        .par_chunks_mut(ls)
        .zip(psi.data().par_chunks(ls))
        .for_each(|(chi, psi)| kernel(psi, chi));
    chi.set_parity(psi.parity());
    stats.mooee_inv.record(start);
}

/// χ = M⁻¹ ψ for the unshifted band.
pub fn mooee_inv<T: ChiralSite>(
    psi: &FiveDimField<T>,
    chi: &mut FiveDimField<T>,
    ldu: &LduFactors,
    stats: &mut KernelStats,
) -> Result<(), KernelError> {
    check_inverse(psi, chi, ldu)?;
    let sweep = Sweep::normal(ldu);
    run("MooeeInv", psi, chi, stats, |psi, chi| sweep.solve(psi, chi));
    Ok(())
}

/// χ = (M†)⁻¹ ψ for the unshifted band.
pub fn mooee_inv_dag<T: ChiralSite>(
    psi: &FiveDimField<T>,
    chi: &mut FiveDimField<T>,
    ldu: &LduFactors,
    stats: &mut KernelStats,
) -> Result<(), KernelError> {
    check_inverse(psi, chi, ldu)?;
    let sweep = Sweep::dagger(ldu);
    run("MooeeInvDag", psi, chi, stats, |psi, chi| sweep.solve(psi, chi));
    Ok(())
}

/// χ = (M + shift)⁻¹ ψ: base solve plus the rank-one correction.
pub fn mooee_inv_shift<T: ChiralSite>(
    psi: &FiveDimField<T>,
    chi: &mut FiveDimField<T>,
    ldu: &LduFactors,
    shift: &EofaShift,
    stats: &mut KernelStats,
) -> Result<(), KernelError> {
    check_inverse(psi, chi, ldu)?;
    shift.check(psi.ls())?;
    let sweep = Sweep::normal(ldu);
    let (lc, norm, pm) = (shift.inv_lc(), shift.inv_norm(), shift.pm());
    run("MooeeInv_shift", psi, chi, stats, |psi, chi| {
        sweep.solve(psi, chi);
        add_rank_one(psi, chi, lc, norm, pm);
    });
    Ok(())
}

/// χ = (M + shift)⁻† ψ: adjoint base solve plus the transposed correction.
pub fn mooee_inv_dag_shift<T: ChiralSite>(
    psi: &FiveDimField<T>,
    chi: &mut FiveDimField<T>,
    ldu: &LduFactors,
    shift: &EofaShift,
    stats: &mut KernelStats,
) -> Result<(), KernelError> {
    check_inverse(psi, chi, ldu)?;
    shift.check(psi.ls())?;
    let sweep = Sweep::dagger(ldu);
    let (lc, norm, pm) = (shift.inv_dag_lc(), shift.inv_dag_norm(), shift.pm());
    run("MooeeInvDag_shift", psi, chi, stats, |psi, chi| {
        sweep.solve(psi, chi);
        add_rank_one(psi, chi, lc, norm, pm);
    });
    Ok(())
}
