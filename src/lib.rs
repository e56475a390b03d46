// SPDX-License-Identifier: AGPL-3.0-only

//! hotSpring EOFA: fifth-dimension kernels for Möbius domain-wall fermions
//!
//! Forward apply, adjoint and exact inverse of the Ls-banded even-even
//! block, with and without the exact one flavor algorithm boundary shift.
//! Kernels are generic over the site value ([`lattice::spinor::ChiralSite`]),
//! parallel over lattice sites (rayon), and validated against dense
//! reference solves.
//!
//! ## Modules
//!   - `lattice`: fields, band tables, kernels, operator bundle
//!   - `params`: JSON run parameters
//!   - `tolerances`: documented numerical thresholds
//!   - `validation`: pass/fail harness for validation binaries
//!   - `error`: typed kernel errors
//!
//! ## Binaries
//!   - `validate_eofa_kernel`: inverse, adjoint, linearity and EOFA checks
//!   - `bench_m5d`: kernel timings with call statistics

pub mod error;
pub mod lattice;
pub mod params;
pub mod tolerances;
pub mod validation;

pub use error::KernelError;
pub use lattice::coefficients::{BandCoefficients, LduFactors};
pub use lattice::eofa::EofaShift;
pub use lattice::field::{FiveDimField, Parity};
pub use lattice::operator::{EofaOperator, FifthDimVariant};
pub use lattice::spinor::{ChiralSite, Chirality, Spinor};
pub use lattice::stats::KernelStats;
