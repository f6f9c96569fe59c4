//! Kernel trait definition

use crate::core::SparseVector;
use std::sync::Arc;

/// Kernel function trait
///
/// A kernel function K(x, y) must satisfy Mercer's condition to be valid for SVM.
pub trait Kernel: Send + Sync {
    /// Compute kernel value K(x, y)
    fn compute(&self, x: &SparseVector, y: &SparseVector) -> f64;

    /// Compute K(x, y) using precomputed squared norms
    ///
    /// `SampleKernel` keeps the norms of every training example, so kernels
    /// that depend on distances can skip recomputing them.
    fn compute_with_norms(
        &self,
        x: &SparseVector,
        y: &SparseVector,
        x_norm_sq: f64,
        y_norm_sq: f64,
    ) -> f64 {
        let _ = (x_norm_sq, y_norm_sq);
        self.compute(x, y)
    }
}

impl<K: Kernel + ?Sized> Kernel for Arc<K> {
    fn compute(&self, x: &SparseVector, y: &SparseVector) -> f64 {
        (**self).compute(x, y)
    }

    fn compute_with_norms(
        &self,
        x: &SparseVector,
        y: &SparseVector,
        x_norm_sq: f64,
        y_norm_sq: f64,
    ) -> f64 {
        (**self).compute_with_norms(x, y, x_norm_sq, y_norm_sq)
    }
}
