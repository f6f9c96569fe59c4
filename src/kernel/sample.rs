//! Kernel evaluator over an in-memory set of training examples

use crate::core::{Dataset, KernelEvaluator, SparseVector};
use crate::kernel::Kernel;

/// Binds a [`Kernel`] to the feature vectors of a training set so that the
/// solver can query the Gram matrix by example index.
pub struct SampleKernel<K: Kernel> {
    kernel: K,
    features: Vec<SparseVector>,
    norms: Vec<f64>,
}

impl<K: Kernel> SampleKernel<K> {
    pub fn new(kernel: K, features: Vec<SparseVector>) -> Self {
        let norms = features.iter().map(SparseVector::norm_squared).collect();
        Self {
            kernel,
            features,
            norms,
        }
    }

    /// Collect the feature vectors of every sample in `dataset`
    pub fn from_dataset<D: Dataset + ?Sized>(kernel: K, dataset: &D) -> Self {
        let features = (0..dataset.len())
            .map(|i| dataset.get_sample(i).features)
            .collect();
        Self::new(kernel, features)
    }

    pub fn kernel(&self) -> &K {
        &self.kernel
    }

    pub fn features(&self, i: usize) -> &SparseVector {
        &self.features[i]
    }

    /// Kernel value between training example `i` and an arbitrary vector
    pub fn evaluate_against(&self, i: usize, x: &SparseVector) -> f64 {
        self.kernel
            .compute_with_norms(&self.features[i], x, self.norms[i], x.norm_squared())
    }
}

impl<K: Kernel> KernelEvaluator for SampleKernel<K> {
    fn evaluate(&self, i: usize, j: usize) -> f64 {
        self.kernel.compute_with_norms(
            &self.features[i],
            &self.features[j],
            self.norms[i],
            self.norms[j],
        )
    }

    fn num_examples(&self) -> usize {
        self.features.len()
    }
}
