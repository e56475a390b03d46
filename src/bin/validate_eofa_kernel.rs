// SPDX-License-Identifier: AGPL-3.0-only

//! Möbius/EOFA fifth-dimension kernel validation.
//!
//! Applies the band operator, its adjoint and the exact inverses on random
//! spinor fields and checks the algebraic identities that any correct
//! implementation must satisfy.
//!
//! # Validation targets
//!
//! | Property | Expected | Tolerance | Basis |
//! |----------|----------|-----------|-------|
//! | Wrap-around coupling | slices 0 and Ls-1 couple | exact | Definition |
//! | ⟨x, M y⟩ = ⟨M† x, y⟩ | equal | 1e-12 rel | Adjoint |
//! | M M⁻¹ ψ = ψ | ψ | 1e-12 rel | LDU direct solve |
//! | Linearity | equal | 1e-13 rel | Linear operator |
//! | Zero shift coefficients | plain result | 1e-14 | Definition |
//! | Rank-one correction | base + norm·Pσ(lc·ψ) | 1e-12 rel | Sherman-Morrison |
//! | Call counters | +1 per call | exact | Diagnostics contract |
//!
//! # Provenance
//!
//! Möbius band: Brower, Neff, Orginos (2006).
//! EOFA boundary term: Chen et al., PRD 95, 054507 (2017).

use hotspring_eofa::lattice::field::{FiveDimField, Parity};
use hotspring_eofa::lattice::m5d::{m5d, m5d_dag, m5d_dag_shift, m5d_shift};
use hotspring_eofa::lattice::mooee_inv::{mooee_inv, mooee_inv_shift};
use hotspring_eofa::lattice::spinor::{ChiralSite, Chirality, Spinor};
use hotspring_eofa::tolerances;
use hotspring_eofa::validation::ValidationHarness;
use hotspring_eofa::{
    BandCoefficients, EofaOperator, EofaShift, FifthDimVariant, KernelError, KernelStats,
    LduFactors,
};

const SITES: usize = 32;
const LS: usize = 8;

fn mobius_band() -> Result<BandCoefficients, KernelError> {
    BandCoefficients::mobius(LS, 1.5, 0.5, 1.8, 0.05)
}

fn shift_coeffs() -> Vec<f64> {
    (0..LS).map(|s| 0.02 * (s as f64 + 1.0) - 0.07).collect()
}

/// |⟨x, M y⟩ - ⟨M† x, y⟩| / |⟨x, M y⟩|
fn adjoint_mismatch(
    x: &FiveDimField<Spinor>,
    my: &FiveDimField<Spinor>,
    mdag_x: &FiveDimField<Spinor>,
    y: &FiveDimField<Spinor>,
) -> f64 {
    let lhs = x.dot(my);
    let rhs = mdag_x.dot(y);
    (lhs - rhs).abs() / lhs.abs().max(f64::EPSILON)
}

fn check_wrap(harness: &mut ValidationHarness) -> Result<(), KernelError> {
    println!("═══ Boundary wrap (Ls=4, diag=1, upper=lower=0.5) ═══");
    let band = BandCoefficients::new(vec![0.5; 4], vec![1.0; 4], vec![0.5; 4])?;
    let unit = Spinor::unit(0, 0) + Spinor::unit(3, 2);
    let mut stats = KernelStats::new();
    let phi = FiveDimField::zeros(1, 4, Parity::Even)?;
    let mut chi = FiveDimField::zeros(1, 4, Parity::Even)?;

    for (src, dst, projected) in [
        (0, 3, unit.project_minus()),
        (3, 0, unit.project_plus()),
    ] {
        let psi = FiveDimField::from_fn(1, 4, Parity::Even, |_, s| {
            if s == src { unit } else { Spinor::ZERO }
        })?;
        m5d(&psi, &phi, &mut chi, &band, &mut stats)?;
        let expected = FiveDimField::from_fn(1, 4, Parity::Even, |_, s| {
            if s == dst { projected * 0.5 } else { Spinor::ZERO }
        })?;
        let observed = FiveDimField::from_fn(1, 4, Parity::Even, |_, s| {
            if s == dst { *chi.at(0, s) } else { Spinor::ZERO }
        })?;
        println!("  |chi[{dst}]|² = {:.6}", chi.at(0, dst).norm_sq());
        harness.check_field(
            &format!("wrap: slice {dst} pulls from slice {src}"),
            &observed,
            &expected,
            tolerances::LINEARITY_REL,
        );
    }
    println!();
    Ok(())
}

fn check_adjoint(harness: &mut ValidationHarness) -> Result<(), KernelError> {
    println!("═══ Adjoint identity ⟨x, M y⟩ = ⟨M† x, y⟩ ═══");
    let band = mobius_band()?;
    let adj = band.adjoint();
    let x = FiveDimField::random(SITES, LS, Parity::Even, 11)?;
    let y = FiveDimField::random(SITES, LS, Parity::Even, 12)?;
    let mut my = FiveDimField::zeros(SITES, LS, Parity::Even)?;
    let mut mdag_x = FiveDimField::zeros(SITES, LS, Parity::Even)?;
    let mut stats = KernelStats::new();

    m5d(&y, &y, &mut my, &band, &mut stats)?;
    m5d_dag(&x, &x, &mut mdag_x, &adj, &mut stats)?;
    let err = adjoint_mismatch(&x, &my, &mdag_x, &y);
    println!("  plain:          rel mismatch {err:.2e}");
    harness.check_upper("adjoint: M5D vs M5Ddag", err, tolerances::ADJOINT_REL);

    for pm in [Chirality::Plus, Chirality::Minus] {
        let shift = EofaShift::compute(&band, pm, -0.3, shift_coeffs())?;
        m5d_shift(&y, &y, &mut my, &band, &shift, &mut stats)?;
        m5d_dag_shift(&x, &x, &mut mdag_x, &adj, &shift, &mut stats)?;
        let err = adjoint_mismatch(&x, &my, &mdag_x, &y);
        println!("  shifted pm={:+}: rel mismatch {err:.2e}", pm.pm());
        harness.check_upper(
            &format!("adjoint: M5D_shift vs M5Ddag_shift (pm={:+})", pm.pm()),
            err,
            tolerances::ADJOINT_REL,
        );
    }
    println!();
    Ok(())
}

fn check_inverse(harness: &mut ValidationHarness) -> Result<(), KernelError> {
    println!("═══ Inverse identity M M⁻¹ ψ = ψ ═══");
    let band = mobius_band()?;
    let psi = FiveDimField::random(SITES, LS, Parity::Odd, 21)?;
    let mut x = FiveDimField::zeros(SITES, LS, Parity::Odd)?;
    let mut back = FiveDimField::zeros(SITES, LS, Parity::Odd)?;

    let ops = [
        ("plain", EofaOperator::plain(band.clone())?),
        (
            "EOFA pm=+1",
            EofaOperator::with_shift(band.clone(), Chirality::Plus, -0.3, shift_coeffs())?,
        ),
        (
            "EOFA pm=-1",
            EofaOperator::with_shift(band, Chirality::Minus, 0.4, shift_coeffs())?,
        ),
    ];
    for (name, op) in &ops {
        let mut stats = KernelStats::new();
        op.mooee_inv(&psi, &mut x, &mut stats)?;
        op.mooee(&x, &mut back, &mut stats)?;
        harness.check_field(
            &format!("inverse: M MooeeInv ({name})"),
            &back,
            &psi,
            tolerances::INVERSE_IDENTITY_REL,
        );
        op.mooee_inv_dag(&psi, &mut x, &mut stats)?;
        op.mooee_dag(&x, &mut back, &mut stats)?;
        harness.check_field(
            &format!("inverse: M† MooeeInvDag ({name})"),
            &back,
            &psi,
            tolerances::INVERSE_IDENTITY_REL,
        );
        println!(
            "  {name}: {} applies, {} inverses",
            stats.m5d.calls, stats.mooee_inv.calls
        );
    }
    println!();
    Ok(())
}

fn check_linearity(harness: &mut ValidationHarness) -> Result<(), KernelError> {
    println!("═══ Linearity Op(aψ₁ + bψ₂) = a Op(ψ₁) + b Op(ψ₂) ═══");
    let (a, b) = (0.7, -1.3);
    let op = EofaOperator::with_shift(mobius_band()?, Chirality::Plus, -0.3, shift_coeffs())?;
    let psi1 = FiveDimField::random(SITES, LS, Parity::Even, 31)?;
    let psi2 = FiveDimField::random(SITES, LS, Parity::Even, 32)?;
    let mut combo = psi1.scaled(a);
    combo.axpy(b, &psi2);

    let mut stats = KernelStats::new();
    let mut out1 = FiveDimField::zeros(SITES, LS, Parity::Even)?;
    let mut out2 = FiveDimField::zeros(SITES, LS, Parity::Even)?;
    let mut out_combo = FiveDimField::zeros(SITES, LS, Parity::Even)?;

    type Entry = fn(
        &EofaOperator,
        &FiveDimField<Spinor>,
        &mut FiveDimField<Spinor>,
        &mut KernelStats,
    ) -> Result<(), KernelError>;
    let entries: [(&str, Entry); 4] = [
        ("M5D_shift", EofaOperator::mooee),
        ("M5Ddag_shift", EofaOperator::mooee_dag),
        ("MooeeInv_shift", EofaOperator::mooee_inv),
        ("MooeeInvDag_shift", EofaOperator::mooee_inv_dag),
    ];
    for (name, entry) in entries {
        entry(&op, &psi1, &mut out1, &mut stats)?;
        entry(&op, &psi2, &mut out2, &mut stats)?;
        entry(&op, &combo, &mut out_combo, &mut stats)?;
        let mut expected = out1.scaled(a);
        expected.axpy(b, &out2);
        harness.check_field(
            &format!("linearity: {name}"),
            &out_combo,
            &expected,
            tolerances::LINEARITY_REL,
        );
    }
    println!("  4 operators checked");
    println!();
    Ok(())
}

fn check_zero_shift(harness: &mut ValidationHarness) -> Result<(), KernelError> {
    println!("═══ Zero shift degrades to the plain operator ═══");
    let band = mobius_band()?;
    let op = EofaOperator::with_shift(band.clone(), Chirality::Plus, 0.0, Vec::new())?;
    harness.check_bool(
        "shift=0 selects plain variant",
        *op.variant() == FifthDimVariant::Plain,
    );

    let ldu = LduFactors::from_band(&band)?;
    let zero = EofaShift::from_tables(
        Chirality::Plus,
        0.0,
        vec![0.0; LS],
        vec![0.0; LS],
        vec![0.0; LS],
        vec![0.0; LS],
        vec![0.0; LS],
    )?;
    let psi = FiveDimField::random(SITES, LS, Parity::Even, 41)?;
    let phi = FiveDimField::random(SITES, LS, Parity::Even, 42)?;
    let mut plain = FiveDimField::zeros(SITES, LS, Parity::Even)?;
    let mut shifted = FiveDimField::zeros(SITES, LS, Parity::Even)?;
    let mut stats = KernelStats::new();

    m5d(&psi, &phi, &mut plain, &band, &mut stats)?;
    m5d_shift(&psi, &phi, &mut shifted, &band, &zero, &mut stats)?;
    harness.check_field(
        "zero coefficients: M5D_shift = M5D",
        &shifted,
        &plain,
        tolerances::ZERO_SHIFT_ABS,
    );
    mooee_inv(&psi, &mut plain, &ldu, &mut stats)?;
    mooee_inv_shift(&psi, &mut shifted, &ldu, &zero, &mut stats)?;
    harness.check_field(
        "zero coefficients: MooeeInv_shift = MooeeInv",
        &shifted,
        &plain,
        tolerances::ZERO_SHIFT_ABS,
    );
    println!();
    Ok(())
}

fn check_rank_one(harness: &mut ValidationHarness) -> Result<(), KernelError> {
    println!("═══ Rank-one correction (Ls=3) ═══");
    let band = BandCoefficients::mobius(3, 1.5, 0.5, 1.8, 0.1)?;
    let ldu = LduFactors::from_band(&band)?;
    let lc = [0.3, -0.1, 0.7];
    let norm = [0.05, 0.2, -0.4];
    let shift = EofaShift::from_tables(
        Chirality::Plus,
        0.25,
        vec![0.1, 0.2, 0.3],
        lc.to_vec(),
        norm.to_vec(),
        vec![0.0; 3],
        vec![0.0; 3],
    )?;
    let psi = FiveDimField::random(SITES, 3, Parity::Even, 51)?;
    let mut base = FiveDimField::zeros(SITES, 3, Parity::Even)?;
    let mut shifted = FiveDimField::zeros(SITES, 3, Parity::Even)?;
    let mut stats = KernelStats::new();
    mooee_inv(&psi, &mut base, &ldu, &mut stats)?;
    mooee_inv_shift(&psi, &mut shifted, &ldu, &shift, &mut stats)?;

    let expected = FiveDimField::from_fn(SITES, 3, Parity::Even, |site, s| {
        let mut acc = Spinor::ZERO;
        for (j, w) in lc.iter().enumerate() {
            acc = acc + *psi.at(site, j) * *w;
        }
        *base.at(site, s) + acc.project_plus() * norm[s]
    })?;
    harness.check_field(
        "MooeeInv_shift = MooeeInv + norm·P+(lc·ψ)",
        &shifted,
        &expected,
        tolerances::SHIFT_CORRECTION_REL,
    );
    println!();
    Ok(())
}

fn check_counters(harness: &mut ValidationHarness) -> Result<(), KernelError> {
    println!("═══ Call counters ═══");
    let op = EofaOperator::with_shift(mobius_band()?, Chirality::Minus, 0.4, shift_coeffs())?;
    let psi = FiveDimField::random(SITES, LS, Parity::Even, 61)?;
    let mut chi = FiveDimField::zeros(SITES, LS, Parity::Even)?;
    let mut stats = KernelStats::new();
    let mut monotone = true;
    for n in 1..=10_u64 {
        op.mooee(&psi, &mut chi, &mut stats)?;
        op.mooee_inv(&psi, &mut chi, &mut stats)?;
        monotone &= stats.m5d.calls == n && stats.mooee_inv.calls == n;
    }
    stats.log_summary();
    println!(
        "  M5D {} calls, MooeeInv {} calls",
        stats.m5d.calls, stats.mooee_inv.calls
    );
    harness.check_bool("counters: one increment per call", monotone);
    println!();
    Ok(())
}

fn run(harness: &mut ValidationHarness) -> Result<(), KernelError> {
    check_wrap(harness)?;
    check_adjoint(harness)?;
    check_inverse(harness)?;
    check_linearity(harness)?;
    check_zero_shift(harness)?;
    check_rank_one(harness)?;
    check_counters(harness)
}

fn main() {
    env_logger::init();

    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║  Möbius / EOFA Fifth-Dimension Kernel Validation           ║");
    println!("║  M5D, M5Ddag, MooeeInv, MooeeInvDag + EOFA shift           ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();

    let mut harness = ValidationHarness::new("eofa_kernel");
    if let Err(e) = run(&mut harness) {
        eprintln!("kernel error: {e}");
        std::process::exit(1);
    }
    harness.finish();
}
