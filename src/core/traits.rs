//! Core traits for LaRank

use crate::core::Sample;

/// Dataset abstraction for efficient data access
pub trait Dataset: Send + Sync {
    /// Number of samples in the dataset
    fn len(&self) -> usize;

    /// Number of features (dimensionality)
    fn dim(&self) -> usize;

    /// Get a single sample by index
    ///
    /// # Panics
    /// Panics if index >= len()
    fn get_sample(&self, i: usize) -> Sample;

    /// Get all labels as a vector
    fn get_labels(&self) -> Vec<i32>;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Gram matrix access by training example index
///
/// This is the only way the solver sees the data: the kernel value between
/// examples `i` and `j`. Implementations must be symmetric, deterministic and
/// free of side effects, otherwise caching values is unsound.
pub trait KernelEvaluator: Send + Sync {
    /// Kernel value between training examples `i` and `j`
    fn evaluate(&self, i: usize, j: usize) -> f64;

    /// Number of training examples the evaluator is defined for
    fn num_examples(&self) -> usize;
}
