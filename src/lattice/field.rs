// SPDX-License-Identifier: AGPL-3.0-only

//! Five-dimensional fermion fields.
//!
//! A field stores one value per (4-D site, fifth-dimension slice) pair.
//! Storage is site-major: the `ls` slices of one lattice site form a
//! contiguous block, so a kernel can hand each worker whole blocks via
//! `par_chunks_mut(ls)` and run the sequential Ls recurrence inside it.
//!
//!   data[site * ls + s]   for site in 0..sites, s in 0..ls

use serde::{Deserialize, Serialize};

use super::complex_f64::Complex64;
use super::spinor::{ChiralSite, Spinor};
use crate::error::KernelError;

/// Checkerboard of the sites a field lives on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Parity {
    Even,
    Odd,
}

/// Field over `sites` lattice sites, each carrying `ls` slices.
#[derive(Clone, Debug, PartialEq)]
pub struct FiveDimField<T> {
    data: Vec<T>,
    sites: usize,
    ls: usize,
    parity: Parity,
}

impl<T: ChiralSite> FiveDimField<T> {
    /// Create a zero field.
    pub fn zeros(sites: usize, ls: usize, parity: Parity) -> Result<Self, KernelError> {
        Self::from_fn(sites, ls, parity, |_, _| T::ZERO)
    }

    /// Create a field from `f(site, s)`.
    pub fn from_fn(
        sites: usize,
        ls: usize,
        parity: Parity,
        mut f: impl FnMut(usize, usize) -> T,
    ) -> Result<Self, KernelError> {
        if ls == 0 {
            return Err(KernelError::LsTooSmall { ls, min: 1 });
        }
        if sites == 0 {
            return Err(KernelError::EmptyLattice);
        }
        let mut data = Vec::with_capacity(sites * ls);
        for site in 0..sites {
            for s in 0..ls {
                data.push(f(site, s));
            }
        }
        Ok(Self {
            data,
            sites,
            ls,
            parity,
        })
    }

    #[must_use]
    pub const fn sites(&self) -> usize {
        self.sites
    }

    #[must_use]
    pub const fn ls(&self) -> usize {
        self.ls
    }

    #[must_use]
    pub const fn parity(&self) -> Parity {
        self.parity
    }

    pub fn set_parity(&mut self, parity: Parity) {
        self.parity = parity;
    }

    #[must_use]
    pub fn data(&self) -> &[T] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    #[must_use]
    pub fn at(&self, site: usize, s: usize) -> &T {
        &self.data[site * self.ls + s]
    }

    pub fn at_mut(&mut self, site: usize, s: usize) -> &mut T {
        &mut self.data[site * self.ls + s]
    }

    /// The `ls` contiguous slices of one site.
    #[must_use]
    pub fn site_block(&self, site: usize) -> &[T] {
        &self.data[site * self.ls..(site + 1) * self.ls]
    }

    /// True when both fields have the same (sites, ls) shape.
    #[must_use]
    pub fn same_shape(&self, other: &Self) -> bool {
        self.sites == other.sites && self.ls == other.ls
    }

    /// Check that `other` has this field's shape.
    pub(crate) fn check_shape(&self, other: &Self, field: &'static str) -> Result<(), KernelError> {
        if self.same_shape(other) {
            Ok(())
        } else {
            Err(KernelError::ShapeMismatch {
                field,
                expected_sites: self.sites,
                expected_ls: self.ls,
                found_sites: other.sites,
                found_ls: other.ls,
            })
        }
    }

    /// Dot product: ⟨self|other⟩ = Σ_x Σ_s self(x,s)† other(x,s)
    pub fn dot(&self, other: &Self) -> Complex64 {
        self.data
            .iter()
            .zip(other.data.iter())
            .map(|(a, b)| a.inner(b))
            .sum()
    }

    /// Squared norm: ||self||² = ⟨self|self⟩.re
    pub fn norm_sq(&self) -> f64 {
        self.dot(self).re
    }

    /// axpy: self = a × x + self
    pub fn axpy(&mut self, a: f64, x: &Self) {
        for (si, xi) in self.data.iter_mut().zip(x.data.iter()) {
            *si = *si + *xi * a;
        }
    }

    /// Copy of `self` scaled by `a`.
    #[must_use]
    pub fn scaled(&self, a: f64) -> Self {
        let mut out = self.clone();
        for v in &mut out.data {
            *v = *v * a;
        }
        out
    }

    /// Elementwise difference `self - other`.
    #[must_use]
    pub fn sub(&self, other: &Self) -> Self {
        let mut out = self.clone();
        for (o, b) in out.data.iter_mut().zip(other.data.iter()) {
            *o = *o - *b;
        }
        out
    }
}

impl FiveDimField<Spinor> {
    /// Create a random spinor field for kernel testing.
    pub fn random(sites: usize, ls: usize, parity: Parity, seed: u64) -> Result<Self, KernelError> {
        let mut rng = seed;
        Self::from_fn(sites, ls, parity, |_, _| Spinor::random(&mut rng))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zeros_has_requested_shape() {
        let f = FiveDimField::<Spinor>::zeros(6, 4, Parity::Odd).unwrap();
        assert_eq!(f.sites(), 6);
        assert_eq!(f.ls(), 4);
        assert_eq!(f.parity(), Parity::Odd);
        assert_eq!(f.data().len(), 24);
        assert!(f.norm_sq() < 1e-30);
    }

    #[test]
    fn empty_shape_is_rejected() {
        let err = FiveDimField::<Spinor>::zeros(4, 0, Parity::Even).unwrap_err();
        assert_eq!(err, KernelError::LsTooSmall { ls: 0, min: 1 });
        let err = FiveDimField::<Spinor>::zeros(0, 4, Parity::Even).unwrap_err();
        assert_eq!(err, KernelError::EmptyLattice);
    }

    #[test]
    fn site_blocks_are_contiguous() {
        let f = FiveDimField::from_fn(3, 4, Parity::Even, |site, s| {
            Spinor::unit(0, 0) * (10 * site + s) as f64
        })
        .unwrap();
        let block = f.site_block(2);
        assert_eq!(block.len(), 4);
        for (s, v) in block.iter().enumerate() {
            assert!((v.s[0][0].re - (20 + s) as f64).abs() < 1e-15);
        }
        assert_eq!(f.at(1, 3), &f.data()[7]);
    }

    #[test]
    fn at_mut_writes_one_slice() {
        let mut f = FiveDimField::<Spinor>::zeros(3, 4, Parity::Even).unwrap();
        *f.at_mut(2, 1) = Spinor::unit(1, 2) * 3.0;
        assert_eq!(f.data()[9], Spinor::unit(1, 2) * 3.0);
        assert!((f.norm_sq() - 9.0).abs() < 1e-12);
    }

    #[test]
    fn dot_is_hermitian() {
        let a = FiveDimField::random(4, 5, Parity::Even, 42).unwrap();
        let b = FiveDimField::random(4, 5, Parity::Even, 43).unwrap();
        let ab = a.dot(&b);
        let ba = b.dot(&a);
        assert!((ab - ba.conj()).abs() < 1e-12);
        assert!(a.norm_sq() > 0.0);
    }

    #[test]
    fn axpy_and_sub_cancel() {
        let a = FiveDimField::random(2, 3, Parity::Odd, 1).unwrap();
        let mut b = FiveDimField::zeros(2, 3, Parity::Odd).unwrap();
        b.axpy(2.0, &a);
        let diff = b.sub(&a.scaled(2.0));
        assert!(diff.norm_sq() < 1e-28);
    }

    #[test]
    fn shape_check_reports_both_shapes() {
        let a = FiveDimField::<Spinor>::zeros(2, 4, Parity::Even).unwrap();
        let b = FiveDimField::<Spinor>::zeros(2, 5, Parity::Even).unwrap();
        let err = a.check_shape(&b, "phi").unwrap_err();
        assert_eq!(
            err,
            KernelError::ShapeMismatch {
                field: "phi",
                expected_sites: 2,
                expected_ls: 4,
                found_sites: 2,
                found_ls: 5,
            }
        );
    }
}
