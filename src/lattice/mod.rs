// SPDX-License-Identifier: AGPL-3.0-only

//! Fifth-dimension kernels for Möbius domain-wall fermions with the exact
//! one flavor algorithm (EOFA) boundary correction.
//!
//! A domain-wall fermion carries Ls copies of a 4-D Dirac field. The
//! even-even block of the operator couples the copies at each site through
//! a chirally projected band; it is applied and inverted here, site by site.
//!
//! | Kernel | Operation |
//! |--------|-----------|
//! | `m5d` / `m5d_dag` | Band apply and its adjoint |
//! | `m5d_shift` / `m5d_dag_shift` | Band apply plus EOFA boundary term |
//! | `mooee_inv` / `mooee_inv_dag` | Exact LDU inverse and its adjoint |
//! | `mooee_inv_shift` / `mooee_inv_dag_shift` | Inverse plus rank-one correction |
//!
//! # Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | `complex_f64` | Complex f64 arithmetic |
//! | `constants` | Spin/color extents, LCG PRNG, division guard |
//! | `spinor` | Chiral site values and projectors P± |
//! | `field` | Site-major five-dimensional fields |
//! | `coefficients` | Band tables and LDU factorization |
//! | `eofa` | Sherman-Morrison tables for the EOFA shift |
//! | `stats` | Caller-owned call counters and timers |
//! | `m5d` | Band apply kernels |
//! | `mooee_inv` | Exact inverse kernels |
//! | `operator` | Band, factors and variant bundled at construction |
//!
//! # References
//!
//! - Brower, Neff, Orginos, "Möbius fermions", Nucl. Phys. Proc. Suppl. 153 (2006)
//! - Chen et al., "Exact one flavor algorithm", PRD 95, 054507 (2017)

/// Band tables, Möbius band builder, LDU factorization.
pub mod coefficients;
/// Complex f64 arithmetic (re, im).
pub mod complex_f64;
/// LCG PRNG, lattice constants, and shared numerical guards.
pub mod constants;
/// EOFA rank-one correction tables (Sherman-Morrison).
pub mod eofa;
/// Five-dimensional fields with parity.
pub mod field;
/// Forward and adjoint band apply, with and without the EOFA shift.
pub mod m5d;
/// Exact inverse of the band, with and without the EOFA shift.
pub mod mooee_inv;
/// Operator bundle with construction-time variant selection.
pub mod operator;
/// Chirality projectors and the Dirac spinor site value.
pub mod spinor;
/// Per-kernel call counters and wall time.
pub mod stats;
