//! High-level API for LaRank training and prediction
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use larank::api::LaRank;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let model = LaRank::new()
//!     .with_c(1.0)
//!     .with_max_epochs(20)
//!     .train_from_file("train.libsvm")?;
//!
//! let predictions = model.predict_from_file("test.libsvm")?;
//! println!("Accuracy: {:.2}%", model.evaluate_from_file("test.libsvm")? * 100.0);
//! # let _ = predictions;
//! # Ok(())
//! # }
//! ```

use crate::core::{Dataset, LaRankConfig, LaRankError, Prediction, Result, Sample};
use crate::data::LibSVMDataset;
use crate::kernel::{Kernel, LinearKernel};
use crate::optimizer::{LaRankOptimizer, TrainedLaRank, TrainingSummary};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

/// LaRank front end with builder pattern
pub struct LaRank<K: Kernel = LinearKernel> {
    kernel: K,
    config: LaRankConfig,
    cancel: Arc<AtomicBool>,
}

impl LaRank<LinearKernel> {
    /// Linear kernel with default parameters
    pub fn new() -> Self {
        Self::with_kernel(LinearKernel::new())
    }
}

impl Default for LaRank<LinearKernel> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Kernel + 'static> LaRank<K> {
    pub fn with_kernel(kernel: K) -> Self {
        Self {
            kernel,
            config: LaRankConfig::default(),
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Replace the whole configuration
    pub fn with_config(mut self, config: LaRankConfig) -> Self {
        self.config = config;
        self
    }

    /// Set regularization parameter C
    pub fn with_c(mut self, c: f64) -> Self {
        self.config.c = c;
        self
    }

    /// Set the minimum gradient gap for a step
    pub fn with_tau(mut self, tau: f64) -> Self {
        self.config.tau = tau;
        self
    }

    /// Set the kernel cache budget per class, in bytes
    pub fn with_cache_size(mut self, cache_size: usize) -> Self {
        self.config.cache_size = cache_size;
        self
    }

    pub fn with_batch_mode(mut self, batch_mode: bool) -> Self {
        self.config.batch_mode = batch_mode;
        self
    }

    pub fn with_max_epochs(mut self, max_epochs: usize) -> Self {
        self.config.max_epochs = Some(max_epochs);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.config.seed = seed;
        self
    }

    pub fn config(&self) -> &LaRankConfig {
        &self.config
    }

    /// Flag that stops a running training at the next sweep once set
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    fn optimizer(self) -> LaRankOptimizer<K> {
        LaRankOptimizer::new(self.kernel, self.config).with_cancel_flag(self.cancel)
    }

    /// Train on a dataset
    pub fn train<D: Dataset + ?Sized>(self, dataset: &D) -> Result<TrainedModel<K>> {
        let model = self.optimizer().train(dataset)?;
        Ok(TrainedModel { model })
    }

    /// Train on samples
    pub fn train_samples(self, samples: &[Sample]) -> Result<TrainedModel<K>> {
        let model = self.optimizer().train_samples(samples)?;
        Ok(TrainedModel { model })
    }

    /// Train from a LibSVM format file
    pub fn train_from_file<P: AsRef<Path>>(self, path: P) -> Result<TrainedModel<K>> {
        let dataset = LibSVMDataset::from_file(path)?;
        self.train(&dataset)
    }
}

/// Trained multiclass model with a high-level prediction interface
pub struct TrainedModel<K: Kernel> {
    model: TrainedLaRank<K>,
}

impl<K: Kernel> TrainedModel<K> {
    pub fn predict(&self, sample: &Sample) -> Prediction {
        self.model.predict(sample)
    }

    pub fn predict_batch(&self, samples: &[Sample]) -> Vec<Prediction> {
        self.model.predict_batch(samples)
    }

    pub fn predict_dataset<D: Dataset + ?Sized>(&self, dataset: &D) -> Vec<Prediction> {
        (0..dataset.len())
            .map(|i| self.predict(&dataset.get_sample(i)))
            .collect()
    }

    pub fn predict_from_file<P: AsRef<Path>>(&self, path: P) -> Result<Vec<Prediction>> {
        let dataset = LibSVMDataset::from_file(path)?;
        Ok(self.predict_dataset(&dataset))
    }

    /// Fraction of correctly predicted samples
    pub fn evaluate<D: Dataset + ?Sized>(&self, dataset: &D) -> f64 {
        self.evaluate_detailed(dataset).accuracy()
    }

    pub fn evaluate_from_file<P: AsRef<Path>>(&self, path: P) -> Result<f64> {
        let dataset = LibSVMDataset::from_file(path)?;
        Ok(self.evaluate(&dataset))
    }

    /// Confusion counts over `dataset`
    pub fn evaluate_detailed<D: Dataset + ?Sized>(&self, dataset: &D) -> EvaluationMetrics {
        let mut metrics = EvaluationMetrics::default();
        for (prediction, actual) in self
            .predict_dataset(dataset)
            .iter()
            .zip(dataset.get_labels())
        {
            metrics.record(actual, prediction.label);
        }
        metrics
    }

    pub fn info(&self) -> ModelInfo {
        ModelInfo {
            n_classes: self.model.classes().len(),
            n_support_vectors: self.model.n_support_vectors(),
            bias: self.model.bias(),
            support_vectors_per_class: self
                .model
                .classes()
                .iter()
                .map(|c| (c.label, c.support_vector_indices.len()))
                .collect(),
        }
    }

    pub fn summary(&self) -> &TrainingSummary {
        self.model.summary()
    }

    pub fn inner(&self) -> &TrainedLaRank<K> {
        &self.model
    }
}

/// Multiclass confusion counts
#[derive(Debug, Clone, Default)]
pub struct EvaluationMetrics {
    /// `(actual, predicted)` -> count
    confusion: BTreeMap<(i32, i32), usize>,
    labels: BTreeSet<i32>,
    total: usize,
    correct: usize,
}

impl EvaluationMetrics {
    fn record(&mut self, actual: i32, predicted: i32) {
        *self.confusion.entry((actual, predicted)).or_insert(0) += 1;
        self.labels.insert(actual);
        self.labels.insert(predicted);
        self.total += 1;
        if actual == predicted {
            self.correct += 1;
        }
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// Labels seen either as truth or as prediction
    pub fn labels(&self) -> Vec<i32> {
        self.labels.iter().copied().collect()
    }

    /// Number of samples of class `actual` predicted as `predicted`
    pub fn count(&self, actual: i32, predicted: i32) -> usize {
        self.confusion
            .get(&(actual, predicted))
            .copied()
            .unwrap_or(0)
    }

    pub fn accuracy(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.correct as f64 / self.total as f64
        }
    }

    /// Share of predictions of `label` that were right
    pub fn precision(&self, label: i32) -> f64 {
        let predicted: usize = self
            .confusion
            .iter()
            .filter(|((_, p), _)| *p == label)
            .map(|(_, n)| n)
            .sum();
        if predicted == 0 {
            0.0
        } else {
            self.count(label, label) as f64 / predicted as f64
        }
    }

    /// Share of samples of `label` that were found
    pub fn recall(&self, label: i32) -> f64 {
        let actual: usize = self
            .confusion
            .iter()
            .filter(|((a, _), _)| *a == label)
            .map(|(_, n)| n)
            .sum();
        if actual == 0 {
            0.0
        } else {
            self.count(label, label) as f64 / actual as f64
        }
    }

    pub fn f1_score(&self, label: i32) -> f64 {
        let p = self.precision(label);
        let r = self.recall(label);
        if p + r == 0.0 {
            0.0
        } else {
            2.0 * (p * r) / (p + r)
        }
    }

    /// Unweighted mean of the per-class F1 scores
    pub fn macro_f1(&self) -> f64 {
        if self.labels.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.labels.iter().map(|&l| self.f1_score(l)).sum();
        sum / self.labels.len() as f64
    }
}

/// Model information
#[derive(Debug, Clone)]
pub struct ModelInfo {
    pub n_classes: usize,
    pub n_support_vectors: usize,
    pub bias: f64,
    pub support_vectors_per_class: Vec<(i32, usize)>,
}

/// Convenience functions for quick operations
pub mod quick {
    use super::*;

    /// Train a linear model on LibSVM data with default parameters
    pub fn train_libsvm<P: AsRef<Path>>(path: P) -> Result<TrainedModel<LinearKernel>> {
        LaRank::new().train_from_file(path)
    }

    pub fn train_libsvm_with_c<P: AsRef<Path>>(
        path: P,
        c: f64,
    ) -> Result<TrainedModel<LinearKernel>> {
        LaRank::new().with_c(c).train_from_file(path)
    }

    /// Train on one file, return the accuracy on another
    pub fn evaluate_split<P1: AsRef<Path>, P2: AsRef<Path>>(
        train_path: P1,
        test_path: P2,
    ) -> Result<f64> {
        let model = train_libsvm(train_path)?;
        model.evaluate_from_file(test_path)
    }

    /// Sequential train/test split, returns the test accuracy
    pub fn simple_validation<D: Dataset + ?Sized>(
        dataset: &D,
        train_ratio: f64,
        c: f64,
    ) -> Result<f64> {
        if train_ratio <= 0.0 || train_ratio >= 1.0 {
            return Err(LaRankError::InvalidParameter(format!(
                "Train ratio must be between 0 and 1, got: {train_ratio}"
            )));
        }

        let n = dataset.len();
        let train_size = (n as f64 * train_ratio) as usize;
        if train_size == 0 || train_size == n {
            return Err(LaRankError::InvalidDataset(format!(
                "Cannot split {n} samples with ratio {train_ratio}"
            )));
        }

        let train_samples: Vec<Sample> = (0..train_size).map(|i| dataset.get_sample(i)).collect();
        let test_samples: Vec<Sample> = (train_size..n).map(|i| dataset.get_sample(i)).collect();

        let model = LaRank::new().with_c(c).train_samples(&train_samples)?;

        let correct = test_samples
            .iter()
            .filter(|sample| model.predict(sample).label == sample.label)
            .count();

        Ok(correct as f64 / test_samples.len() as f64)
    }
}
