// SPDX-License-Identifier: AGPL-3.0-only

//! Run parameters for the Möbius/EOFA fifth-dimension operator.
//!
//! Loaded from JSON with streaming `from_reader`:
//!
//! ```json
//! { "ls": 12, "b": 1.5, "c": 0.5, "m5": 1.8, "mass": 0.01,
//!   "pm": 1, "shift": -0.3, "shift_coeffs": [ ... Ls values ... ] }
//! ```
//!
//! `pm`, `shift`, `shift_coeffs`, `sites` and `seed` are optional.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::KernelError;
use crate::lattice::coefficients::{BandCoefficients, MIN_LS_FACTORIZED};
use crate::lattice::operator::EofaOperator;
use crate::lattice::spinor::Chirality;

const fn default_pm() -> i32 {
    1
}

const fn default_sites() -> usize {
    16
}

const fn default_seed() -> u64 {
    42
}

/// Möbius domain-wall and EOFA parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EofaParams {
    /// Fifth-dimension extent.
    pub ls: usize,
    /// Möbius scale b.
    pub b: f64,
    /// Möbius scale c.
    pub c: f64,
    /// Domain-wall height M5.
    pub m5: f64,
    /// Quark mass on the wrap-around links.
    pub mass: f64,
    /// EOFA chirality selector, +1 or -1.
    #[serde(default = "default_pm")]
    pub pm: i32,
    /// EOFA shift; 0 disables the correction.
    #[serde(default)]
    pub shift: f64,
    /// Per-slice EOFA boundary coefficients (length Ls when `shift != 0`).
    #[serde(default)]
    pub shift_coeffs: Vec<f64>,
    /// Lattice sites per parity, for benchmarks and validation fields.
    #[serde(default = "default_sites")]
    pub sites: usize,
    /// LCG seed for random test fields.
    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl Default for EofaParams {
    fn default() -> Self {
        Self {
            ls: 8,
            b: 1.5,
            c: 0.5,
            m5: 1.8,
            mass: 0.05,
            pm: default_pm(),
            shift: 0.0,
            shift_coeffs: Vec::new(),
            sites: default_sites(),
            seed: default_seed(),
        }
    }
}

impl EofaParams {
    /// Parse and validate from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns [`KernelError::DataLoad`] on malformed JSON, or the
    /// validation error of [`Self::validate`].
    pub fn from_json_str(json: &str) -> Result<Self, KernelError> {
        let params: Self = serde_json::from_str(json)?;
        params.validate()?;
        Ok(params)
    }

    /// Load and validate from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`KernelError::DataLoad`] if the file cannot be opened or
    /// parsed, or the validation error of [`Self::validate`].
    pub fn load(path: &Path) -> Result<Self, KernelError> {
        let reader = std::io::BufReader::new(std::fs::File::open(path)?);
        let params: Self = serde_json::from_reader(reader)?;
        params.validate()?;
        Ok(params)
    }

    /// Check `pm`, `ls`, `sites` and the shift coefficient length.
    pub fn validate(&self) -> Result<(), KernelError> {
        self.chirality()?;
        if self.ls < MIN_LS_FACTORIZED {
            return Err(KernelError::LsTooSmall {
                ls: self.ls,
                min: MIN_LS_FACTORIZED,
            });
        }
        if self.sites == 0 {
            return Err(KernelError::EmptyLattice);
        }
        if self.shift != 0.0 && self.shift_coeffs.len() != self.ls {
            return Err(KernelError::TableLength {
                table: "shift_coeffs",
                expected: self.ls,
                found: self.shift_coeffs.len(),
            });
        }
        Ok(())
    }

    pub fn chirality(&self) -> Result<Chirality, KernelError> {
        Chirality::from_pm(self.pm)
    }

    /// Möbius even-even band for these parameters.
    pub fn band(&self) -> Result<BandCoefficients, KernelError> {
        BandCoefficients::mobius(self.ls, self.b, self.c, self.m5, self.mass)
    }

    /// Factorized operator, EOFA-corrected when `shift != 0`.
    pub fn build_operator(&self) -> Result<EofaOperator, KernelError> {
        self.validate()?;
        EofaOperator::with_shift(
            self.band()?,
            self.chirality()?,
            self.shift,
            self.shift_coeffs.clone(),
        )
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn optional_fields_take_defaults() {
        let p = EofaParams::from_json_str(r#"{"ls": 6, "b": 1.5, "c": 0.5, "m5": 1.8, "mass": 0.1}"#)
            .unwrap();
        assert_eq!(p.pm, 1);
        assert!(p.shift.abs() < f64::EPSILON);
        assert!(p.shift_coeffs.is_empty());
        assert_eq!(p.sites, 16);
        assert!(!p.build_operator().unwrap().is_shifted());
    }

    #[test]
    fn shifted_params_build_corrected_operator() {
        let json = r#"{"ls": 4, "b": 1.5, "c": 0.5, "m5": 1.8, "mass": 0.1,
                       "pm": -1, "shift": 0.25, "shift_coeffs": [0.1, 0.2, 0.3, 0.4]}"#;
        let p = EofaParams::from_json_str(json).unwrap();
        assert_eq!(p.chirality().unwrap(), Chirality::Minus);
        let op = p.build_operator().unwrap();
        assert!(op.is_shifted());
        assert_eq!(op.ls(), 4);
    }

    #[test]
    fn shift_coefficients_must_match_ls() {
        let json = r#"{"ls": 4, "b": 1.5, "c": 0.5, "m5": 1.8, "mass": 0.1,
                       "shift": 0.25, "shift_coeffs": [0.1, 0.2]}"#;
        assert_eq!(
            EofaParams::from_json_str(json).unwrap_err(),
            KernelError::TableLength {
                table: "shift_coeffs",
                expected: 4,
                found: 2
            }
        );
    }

    #[test]
    fn invalid_pm_is_rejected() {
        let json = r#"{"ls": 4, "b": 1.5, "c": 0.5, "m5": 1.8, "mass": 0.1, "pm": 0}"#;
        assert_eq!(
            EofaParams::from_json_str(json).unwrap_err(),
            KernelError::InvalidChirality(0)
        );
    }

    #[test]
    fn malformed_json_is_a_load_error() {
        assert!(matches!(
            EofaParams::from_json_str("{broken"),
            Err(KernelError::DataLoad(_))
        ));
    }

    #[test]
    fn load_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let p = EofaParams {
            ls: 5,
            shift: -0.3,
            shift_coeffs: vec![0.01; 5],
            ..EofaParams::default()
        };
        write!(file, "{}", serde_json::to_string(&p).unwrap()).unwrap();
        let loaded = EofaParams::load(file.path()).unwrap();
        assert_eq!(loaded, p);
    }

    #[test]
    fn load_missing_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("eofa_params.json");
        assert!(matches!(
            EofaParams::load(&missing),
            Err(KernelError::DataLoad(_))
        ));
    }
}
