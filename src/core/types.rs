//! Core type definitions for LaRank

use crate::core::{LaRankError, Result};
use serde::{Deserialize, Serialize};

/// Prediction result containing the winning class and its score
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    /// Predicted class label
    pub label: i32,
    /// Output of the winning class, `sum_i beta_i * K(x_i, x)`
    pub score: f64,
}

impl Prediction {
    pub fn new(label: i32, score: f64) -> Self {
        Self { label, score }
    }
}

/// Sparse vector representation with sorted indices
#[derive(Clone, Debug, PartialEq)]
pub struct SparseVector {
    /// Sorted indices of non-zero elements
    pub indices: Vec<usize>,
    /// Values corresponding to indices
    pub values: Vec<f64>,
}

impl SparseVector {
    /// Create a new sparse vector, ensuring indices are sorted
    pub fn new(indices: Vec<usize>, values: Vec<f64>) -> Self {
        assert_eq!(
            indices.len(),
            values.len(),
            "Indices and values must have same length"
        );

        let mut pairs: Vec<_> = indices.into_iter().zip(values).collect();
        pairs.sort_by_key(|&(idx, _)| idx);

        let (indices, values): (Vec<_>, Vec<_>) = pairs.into_iter().unzip();
        Self { indices, values }
    }

    /// Build a sparse vector from a dense slice, dropping zeros
    pub fn from_dense(values: &[f64]) -> Self {
        let (indices, values) = values
            .iter()
            .enumerate()
            .filter(|(_, &v)| v != 0.0)
            .map(|(i, &v)| (i, v))
            .unzip();
        Self { indices, values }
    }

    pub fn empty() -> Self {
        Self {
            indices: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Get the value at a specific index (0 if not present)
    pub fn get(&self, index: usize) -> f64 {
        match self.indices.binary_search(&index) {
            Ok(pos) => self.values[pos],
            Err(_) => 0.0,
        }
    }

    pub fn norm_squared(&self) -> f64 {
        self.values.iter().map(|&v| v * v).sum()
    }

    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Training example with features and an integer class label
#[derive(Clone, Debug)]
pub struct Sample {
    pub features: SparseVector,
    /// Class label; labels need not be contiguous
    pub label: i32,
}

impl Sample {
    pub fn new(features: SparseVector, label: i32) -> Self {
        Self { features, label }
    }
}

/// Configuration for the LaRank solver and its training driver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LaRankConfig {
    /// Box constraint on the dual coefficients
    pub c: f64,
    /// Minimum gradient gap for a step to be taken
    pub tau: f64,
    /// Kernel cache budget in bytes, per class
    pub cache_size: usize,
    /// Check the duality gap after every sweep; online mode stops after one sweep
    pub batch_mode: bool,
    /// Upper bound on the number of sweeps, `None` for no bound
    pub max_epochs: Option<usize>,
    /// Seed of the solver's pseudo-random generator
    pub seed: u64,
    /// Number of `add` calls between two support vector cleanups
    pub cleanup_interval: usize,
    /// Emit a progress line every `progress_step` examples, 0 disables it
    pub progress_step: usize,
}

impl Default for LaRankConfig {
    fn default() -> Self {
        Self {
            c: 1.0,
            tau: 1e-4,
            cache_size: 64 * 1024 * 1024, // 64MB
            batch_mode: true,
            max_epochs: None,
            seed: 0,
            cleanup_interval: 100,
            progress_step: 0,
        }
    }
}

impl LaRankConfig {
    /// Reject parameter values the solver cannot work with
    pub fn validate(&self) -> Result<()> {
        if !self.c.is_finite() || self.c <= 0.0 {
            return Err(LaRankError::InvalidParameter(format!(
                "C must be positive and finite, got: {}",
                self.c
            )));
        }
        if !self.tau.is_finite() || self.tau <= 0.0 {
            return Err(LaRankError::InvalidParameter(format!(
                "tau must be positive, got: {}",
                self.tau
            )));
        }
        if self.cache_size == 0 {
            return Err(LaRankError::InvalidParameter(
                "cache size must be positive".to_string(),
            ));
        }
        if self.cleanup_interval == 0 {
            return Err(LaRankError::InvalidParameter(
                "cleanup interval must be positive".to_string(),
            ));
        }
        if self.max_epochs == Some(0) {
            return Err(LaRankError::InvalidParameter(
                "max epochs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sparse_vector_creation() {
        let sv = SparseVector::new(vec![2, 0, 4], vec![2.0, 1.0, 3.0]);

        assert_eq!(sv.indices, vec![0, 2, 4]);
        assert_eq!(sv.values, vec![1.0, 2.0, 3.0]);
        assert_eq!(sv.get(2), 2.0);
        assert_eq!(sv.get(3), 0.0);
    }

    #[test]
    fn test_sparse_vector_from_dense() {
        let sv = SparseVector::from_dense(&[0.0, 3.0, 0.0, 4.0]);
        assert_eq!(sv.indices, vec![1, 3]);
        assert_eq!(sv.norm_squared(), 25.0);
        assert_eq!(sv.nnz(), 2);
        assert!(SparseVector::from_dense(&[0.0, 0.0]).is_empty());
    }

    #[test]
    #[should_panic(expected = "Indices and values must have same length")]
    fn test_sparse_vector_length_mismatch() {
        SparseVector::new(vec![0, 1], vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_config_default() {
        let config = LaRankConfig::default();
        assert_eq!(config.c, 1.0);
        assert_eq!(config.tau, 1e-4);
        assert_eq!(config.cache_size, 64 * 1024 * 1024);
        assert!(config.batch_mode);
        assert_eq!(config.max_epochs, None);
        assert_eq!(config.cleanup_interval, 100);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let bad_c = LaRankConfig {
            c: 0.0,
            ..LaRankConfig::default()
        };
        assert!(matches!(
            bad_c.validate(),
            Err(LaRankError::InvalidParameter(_))
        ));

        let bad_tau = LaRankConfig {
            tau: -1.0,
            ..LaRankConfig::default()
        };
        assert!(bad_tau.validate().is_err());

        // zero tau would accept zero-length steps
        let zero_tau = LaRankConfig {
            tau: 0.0,
            ..LaRankConfig::default()
        };
        assert!(matches!(
            zero_tau.validate(),
            Err(LaRankError::InvalidParameter(_))
        ));

        let bad_cache = LaRankConfig {
            cache_size: 0,
            ..LaRankConfig::default()
        };
        assert!(bad_cache.validate().is_err());
    }

    #[test]
    fn test_config_partial_json() {
        let config: LaRankConfig =
            serde_json::from_str(r#"{ "c": 10.0, "batch_mode": false }"#).unwrap();
        assert_eq!(config.c, 10.0);
        assert!(!config.batch_mode);
        assert_eq!(config.tau, 1e-4);
    }
}
