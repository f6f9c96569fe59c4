//! RBF (Radial Basis Function) kernel implementation
//!
//! K(x, y) = exp(-γ * ||x - y||²)

use crate::core::SparseVector;
use crate::kernel::linear::dot_product_sparse;
use crate::kernel::Kernel;

/// Gaussian kernel with width parameter `gamma`
#[derive(Debug, Clone, Copy)]
pub struct RBFKernel {
    gamma: f64,
}

impl RBFKernel {
    /// Create a new RBF kernel
    ///
    /// # Panics
    /// Panics if gamma is not positive
    pub fn new(gamma: f64) -> Self {
        assert!(gamma > 0.0, "Gamma must be positive, got: {}", gamma);
        Self { gamma }
    }

    /// Create RBF kernel with gamma = 1.0 / n_features
    pub fn with_auto_gamma(n_features: usize) -> Self {
        assert!(n_features > 0, "Number of features must be positive");
        Self::new(1.0 / n_features as f64)
    }

    pub fn gamma(&self) -> f64 {
        self.gamma
    }
}

impl Default for RBFKernel {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl Kernel for RBFKernel {
    fn compute(&self, x: &SparseVector, y: &SparseVector) -> f64 {
        self.compute_with_norms(x, y, x.norm_squared(), y.norm_squared())
    }

    fn compute_with_norms(
        &self,
        x: &SparseVector,
        y: &SparseVector,
        x_norm_sq: f64,
        y_norm_sq: f64,
    ) -> f64 {
        // ||x - y||² = ||x||² + ||y||² - 2*x^T*y, clamped against rounding
        let squared_distance = (x_norm_sq + y_norm_sq - 2.0 * dot_product_sparse(x, y)).max(0.0);
        (-self.gamma * squared_distance).exp()
    }
}
