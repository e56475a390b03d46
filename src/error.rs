// SPDX-License-Identifier: AGPL-3.0-only

//! Typed errors for the fifth-dimension kernels and their setup phase.
//!
//! Every kernel validates its arguments before touching the output field,
//! so an `Err` always leaves `chi` exactly as the caller passed it in.

use thiserror::Error;

use crate::lattice::field::Parity;

/// Contract violations and setup failures.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum KernelError {
    /// Paired input fields carry different checkerboards.
    #[error("parity mismatch: psi is {psi:?} but phi is {phi:?}")]
    ParityMismatch { psi: Parity, phi: Parity },

    /// A field's (sites, Ls) shape differs from the reference field.
    #[error(
        "shape mismatch for {field}: expected {expected_sites} sites x Ls={expected_ls}, \
         found {found_sites} sites x Ls={found_ls}"
    )]
    ShapeMismatch {
        field: &'static str,
        expected_sites: usize,
        expected_ls: usize,
        found_sites: usize,
        found_ls: usize,
    },

    /// A coefficient table length differs from Ls.
    #[error("coefficient table `{table}` has length {found}, expected Ls={expected}")]
    TableLength {
        table: &'static str,
        expected: usize,
        found: usize,
    },

    /// Ls is below what the operation supports.
    #[error("Ls={ls} is too small: need at least {min}")]
    LsTooSmall { ls: usize, min: usize },

    /// A field must cover at least one lattice site.
    #[error("field has no lattice sites")]
    EmptyLattice,

    /// The EOFA `pm` selector must be +1 or -1.
    #[error("invalid chirality selector pm={0}: expected +1 or -1")]
    InvalidChirality(i32),

    /// A diagonal pivot of the LDU factorization vanishes.
    #[error("singular pivot at slice {slice}: dee={value:e}")]
    SingularPivot { slice: usize, value: f64 },

    /// The two chirality sectors need a shared last pivot, which requires
    /// equal products of the lower and upper band coefficients.
    #[error("band corners do not balance: prod(lower)={lower:e}, prod(upper)={upper:e}")]
    UnbalancedCorners { lower: f64, upper: f64 },

    /// The Sherman-Morrison denominator of the EOFA correction vanishes.
    #[error("EOFA shift makes the operator singular: denominator={0:e}")]
    SingularShift(f64),

    /// Parameter file loading or parsing failed.
    #[error("data loading failed: {0}")]
    DataLoad(String),
}

impl From<std::io::Error> for KernelError {
    fn from(e: std::io::Error) -> Self {
        Self::DataLoad(e.to_string())
    }
}

impl From<serde_json::Error> for KernelError {
    fn from(e: serde_json::Error) -> Self {
        Self::DataLoad(e.to_string())
    }
}
