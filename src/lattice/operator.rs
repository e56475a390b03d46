// SPDX-License-Identifier: AGPL-3.0-only

//! Even-even fifth-dimension operator with its inverse.
//!
//! [`EofaOperator`] bundles the forward band, the adjoint band, the LDU
//! factors and the EOFA variant. The variant is fixed at construction:
//! a zero shift yields [`FifthDimVariant::Plain`] and every entry point
//! runs the plain kernel, otherwise the shifted kernels run with the
//! Sherman-Morrison tables.

use log::debug;

use super::coefficients::{BandCoefficients, LduFactors};
use super::eofa::EofaShift;
use super::field::FiveDimField;
use super::m5d::{m5d, m5d_dag, m5d_dag_shift, m5d_shift};
use super::mooee_inv::{mooee_inv, mooee_inv_dag, mooee_inv_dag_shift, mooee_inv_shift};
use super::spinor::{ChiralSite, Chirality};
use super::stats::KernelStats;
use crate::error::KernelError;

/// Whether the operator carries the EOFA boundary correction.
#[derive(Clone, Debug, PartialEq)]
pub enum FifthDimVariant {
    Plain,
    EofaCorrected(EofaShift),
}

/// Banded fifth-dimension operator ready for apply and exact inverse.
#[derive(Clone, Debug, PartialEq)]
pub struct EofaOperator {
    band: BandCoefficients,
    band_dag: BandCoefficients,
    ldu: LduFactors,
    variant: FifthDimVariant,
}

impl EofaOperator {
    /// Assemble from precomputed parts; all tables must share one Ls.
    pub fn new(
        band: BandCoefficients,
        ldu: LduFactors,
        variant: FifthDimVariant,
    ) -> Result<Self, KernelError> {
        let ls = band.ls();
        band.check(ls)?;
        ldu.check(ls)?;
        if let FifthDimVariant::EofaCorrected(shift) = &variant {
            shift.check(ls)?;
        }
        let band_dag = band.adjoint();
        debug!(
            "fifth-dim operator: Ls={ls}, {}",
            match &variant {
                FifthDimVariant::Plain => "plain".to_string(),
                FifthDimVariant::EofaCorrected(s) =>
                    format!("EOFA pm={} shift={}", s.pm().pm(), s.shift()),
            }
        );
        Ok(Self {
            band,
            band_dag,
            ldu,
            variant,
        })
    }

    /// Factorize `band` with no EOFA correction.
    pub fn plain(band: BandCoefficients) -> Result<Self, KernelError> {
        let ldu = LduFactors::from_band(&band)?;
        Self::new(band, ldu, FifthDimVariant::Plain)
    }

    /// Factorize `band` and derive the EOFA tables; `shift == 0` is plain.
    pub fn with_shift(
        band: BandCoefficients,
        pm: Chirality,
        shift: f64,
        shift_coeffs: Vec<f64>,
    ) -> Result<Self, KernelError> {
        if shift == 0.0 {
            return Self::plain(band);
        }
        let ldu = LduFactors::from_band(&band)?;
        let eofa = EofaShift::compute(&band, pm, shift, shift_coeffs)?;
        Self::new(band, ldu, FifthDimVariant::EofaCorrected(eofa))
    }

    #[must_use]
    pub fn ls(&self) -> usize {
        self.band.ls()
    }

    #[must_use]
    pub const fn band(&self) -> &BandCoefficients {
        &self.band
    }

    #[must_use]
    pub const fn band_dag(&self) -> &BandCoefficients {
        &self.band_dag
    }

    #[must_use]
    pub const fn ldu(&self) -> &LduFactors {
        &self.ldu
    }

    #[must_use]
    pub const fn variant(&self) -> &FifthDimVariant {
        &self.variant
    }

    #[must_use]
    pub const fn is_shifted(&self) -> bool {
        matches!(self.variant, FifthDimVariant::EofaCorrected(_))
    }

    /// χ = M ψ.
    pub fn mooee<T: ChiralSite>(
        &self,
        psi: &FiveDimField<T>,
        chi: &mut FiveDimField<T>,
        stats: &mut KernelStats,
    ) -> Result<(), KernelError> {
        match &self.variant {
            FifthDimVariant::Plain => m5d(psi, psi, chi, &self.band, stats),
            FifthDimVariant::EofaCorrected(s) => m5d_shift(psi, psi, chi, &self.band, s, stats),
        }
    }

    /// χ = M† ψ.
    pub fn mooee_dag<T: ChiralSite>(
        &self,
        psi: &FiveDimField<T>,
        chi: &mut FiveDimField<T>,
        stats: &mut KernelStats,
    ) -> Result<(), KernelError> {
        match &self.variant {
            FifthDimVariant::Plain => m5d_dag(psi, psi, chi, &self.band_dag, stats),
            FifthDimVariant::EofaCorrected(s) => {
                m5d_dag_shift(psi, psi, chi, &self.band_dag, s, stats)
            }
        }
    }

    /// χ = M⁻¹ ψ.
    pub fn mooee_inv<T: ChiralSite>(
        &self,
        psi: &FiveDimField<T>,
        chi: &mut FiveDimField<T>,
        stats: &mut KernelStats,
    ) -> Result<(), KernelError> {
        match &self.variant {
            FifthDimVariant::Plain => mooee_inv(psi, chi, &self.ldu, stats),
            FifthDimVariant::EofaCorrected(s) => mooee_inv_shift(psi, chi, &self.ldu, s, stats),
        }
    }

    /// χ = (M†)⁻¹ ψ.
    pub fn mooee_inv_dag<T: ChiralSite>(
        &self,
        psi: &FiveDimField<T>,
        chi: &mut FiveDimField<T>,
        stats: &mut KernelStats,
    ) -> Result<(), KernelError> {
        match &self.variant {
            FifthDimVariant::Plain => mooee_inv_dag(psi, chi, &self.ldu, stats),
            FifthDimVariant::EofaCorrected(s) => {
                mooee_inv_dag_shift(psi, chi, &self.ldu, s, stats)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lattice::field::Parity;

    fn band() -> BandCoefficients {
        BandCoefficients::mobius(6, 1.5, 0.5, 1.8, 0.05).unwrap()
    }

    #[test]
    fn zero_shift_selects_plain_variant() {
        let op = EofaOperator::with_shift(band(), Chirality::Plus, 0.0, vec![]).unwrap();
        assert_eq!(op.variant(), &FifthDimVariant::Plain);
        assert!(!op.is_shifted());
    }

    #[test]
    fn nonzero_shift_selects_corrected_variant() {
        let op = EofaOperator::with_shift(band(), Chirality::Minus, 0.3, vec![0.01; 6]).unwrap();
        assert!(op.is_shifted());
        assert_eq!(op.ls(), 6);
    }

    #[test]
    fn each_entry_point_counts_once() {
        let op = EofaOperator::with_shift(band(), Chirality::Plus, 0.3, vec![0.01; 6]).unwrap();
        let psi = FiveDimField::random(4, 6, Parity::Even, 8).unwrap();
        let mut chi = FiveDimField::zeros(4, 6, Parity::Even).unwrap();
        let mut stats = KernelStats::new();
        op.mooee(&psi, &mut chi, &mut stats).unwrap();
        op.mooee_dag(&psi, &mut chi, &mut stats).unwrap();
        op.mooee_inv(&psi, &mut chi, &mut stats).unwrap();
        op.mooee_inv_dag(&psi, &mut chi, &mut stats).unwrap();
        assert_eq!(stats.m5d.calls, 2);
        assert_eq!(stats.mooee_inv.calls, 2);
    }

    #[test]
    fn inverse_round_trip_for_both_variants() {
        let psi = FiveDimField::random(3, 6, Parity::Odd, 21).unwrap();
        let ops = [
            EofaOperator::plain(band()).unwrap(),
            EofaOperator::with_shift(band(), Chirality::Plus, 0.3, vec![0.02; 6]).unwrap(),
            EofaOperator::with_shift(band(), Chirality::Minus, -0.2, vec![0.04; 6]).unwrap(),
        ];
        for op in &ops {
            let mut stats = KernelStats::new();
            let mut x = FiveDimField::zeros(3, 6, Parity::Odd).unwrap();
            let mut back = FiveDimField::zeros(3, 6, Parity::Odd).unwrap();
            op.mooee_inv(&psi, &mut x, &mut stats).unwrap();
            op.mooee(&x, &mut back, &mut stats).unwrap();
            assert!(back.sub(&psi).norm_sq() / psi.norm_sq() < 1e-24);

            op.mooee_inv_dag(&psi, &mut x, &mut stats).unwrap();
            op.mooee_dag(&x, &mut back, &mut stats).unwrap();
            assert!(back.sub(&psi).norm_sq() / psi.norm_sq() < 1e-24);
        }
    }

    #[test]
    fn new_rejects_mismatched_factors() {
        let ldu = LduFactors::from_band(&BandCoefficients::mobius(4, 1.5, 0.5, 1.8, 0.05).unwrap())
            .unwrap();
        assert!(matches!(
            EofaOperator::new(band(), ldu, FifthDimVariant::Plain),
            Err(KernelError::TableLength { .. })
        ));
    }

    #[test]
    fn new_rejects_short_band_tables() {
        let ldu = LduFactors::from_band(&BandCoefficients::mobius(4, 1.5, 0.5, 1.8, 0.05).unwrap())
            .unwrap();
        let band = BandCoefficients {
            lower: vec![0.1; 2],
            diag: vec![1.2; 4],
            upper: vec![0.1; 4],
        };
        assert!(matches!(
            EofaOperator::new(band, ldu, FifthDimVariant::Plain),
            Err(KernelError::TableLength { table: "lower", .. })
        ));
    }

    #[test]
    fn stored_tables_match_band() {
        let op = EofaOperator::plain(band()).unwrap();
        assert_eq!(op.band(), &band());
        assert_eq!(op.band_dag(), &band().adjoint());
        assert_eq!(op.ldu(), &LduFactors::from_band(&band()).unwrap());
    }
}
