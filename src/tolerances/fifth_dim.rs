// SPDX-License-Identifier: AGPL-3.0-only

//! Fifth-dimension band apply, LDU inverse and EOFA correction tolerances.

// ═══════════════════════════════════════════════════════════════════
// Construction guards
// ═══════════════════════════════════════════════════════════════════

/// LDU factorization: relative mismatch allowed between the two corners.
///
/// The P+ and P- sectors share one last pivot only when
/// lower[Ls-1]·ueem[Ls-2] equals upper[Ls-2]·leem[Ls-2], i.e. when the
/// products of the lower and upper bands agree. For Möbius parameters the
/// two differ only by rounding of an Ls-term product (~Ls × 1e-16).
pub const CORNER_BALANCE_REL: f64 = 1e-10;

/// EOFA Sherman-Morrison denominator: smallest |1 + eᵀA⁻¹c| accepted.
///
/// Below this the rank-one corrected sector is numerically singular and
/// the correction tables would amplify rounding by more than 1e12.
pub const SHIFT_DENOMINATOR_MIN: f64 = 1e-12;

// ═══════════════════════════════════════════════════════════════════
// Kernel checks
// ═══════════════════════════════════════════════════════════════════

/// Adjoint identity ⟨x, M y⟩ = ⟨M† x, y⟩: relative error.
///
/// Both sides are global sums over sites × Ls × 12 products of O(1)
/// values. Summation order differs, so agreement is to ~1e-14 relative.
pub const ADJOINT_REL: f64 = 1e-12;

/// Exact inverse: ||M M⁻¹ ψ - ψ|| / ||ψ||.
///
/// The LDU sweep is a direct solve with O(Ls) dependent operations per
/// value. With diagonally dominant Möbius bands the residual is ~1e-15.
pub const INVERSE_IDENTITY_REL: f64 = 1e-12;

/// Linearity M(aψ₁ + bψ₂) = a Mψ₁ + b Mψ₂: relative error.
pub const LINEARITY_REL: f64 = 1e-13;

/// Shifted inverse = unshifted inverse + rank-one correction: relative error.
///
/// The correction is applied after the base inverse by the same code path,
/// so the difference is a single fused accumulation per value.
pub const SHIFT_CORRECTION_REL: f64 = 1e-12;

/// Zero shift coefficients: shifted and plain kernels must agree exactly.
///
/// Adding c·x with c = 0 leaves every value unchanged; 1e-14 allows for
/// a signed-zero or denormal difference only.
pub const ZERO_SHIFT_ABS: f64 = 1e-14;
