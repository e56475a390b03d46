// SPDX-License-Identifier: AGPL-3.0-only

//! Centralized numerical tolerances with justification.
//!
//! Every threshold used by the kernels, the validation binary and the
//! tests is defined here with a note on its origin. No ad-hoc magic
//! numbers in kernel or check code.
//!
//! # Tolerance categories
//!
//! | Category | Basis | Example |
//! |----------|-------|---------|
//! | Factorization guard | Conditioning of the band | 1e-10 corner balance |
//! | Machine precision | IEEE 754 f64, O(Ls) flops per value | 1e-12 inverse identity |
//! | Exact arithmetic | Terms that must vanish identically | 1e-14 zero-shift parity |

/// Fifth-dimension kernel guards and check thresholds.
pub mod fifth_dim;

pub use fifth_dim::{
    ADJOINT_REL, CORNER_BALANCE_REL, INVERSE_IDENTITY_REL, LINEARITY_REL, SHIFT_CORRECTION_REL,
    SHIFT_DENOMINATOR_MIN, ZERO_SHIFT_ABS,
};
