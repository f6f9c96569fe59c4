//! Training driver
//!
//! Feeds every training example to a [`LaRankSolver`] in sweeps until the
//! duality gap drops to `C` (batch mode) or after one sweep (online mode),
//! then extracts the per-class support vectors into a model that predicts
//! on new feature vectors.

use crate::core::{
    Dataset, KernelEvaluator, LaRankConfig, LaRankError, Prediction, Result, Sample, SparseVector,
};
use crate::kernel::{Kernel, SampleKernel};
use crate::solver::{LaRankSolver, SolverStats};
use log::{debug, info, warn};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Support vectors of one class, as training example indices
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassModel {
    pub label: i32,
    pub support_vector_indices: Vec<usize>,
    pub coefficients: Vec<f64>,
}

/// How a training run ended
#[derive(Debug, Clone, Serialize)]
pub struct TrainingSummary {
    pub n_examples: usize,
    pub n_classes: usize,
    pub n_support_vectors: usize,
    /// Completed sweeps over the training set
    pub epochs: usize,
    /// Duality gap measured after the last sweep
    pub gap: f64,
    /// Running dual objective
    pub dual: f64,
    /// Fraction of examples mispredicted during the last sweep
    pub online_error: f64,
    pub converged: bool,
    pub cancelled: bool,
    pub training_time_secs: f64,
    pub solver: SolverStats,
}

/// Result of training against a kernel evaluator
#[derive(Debug, Clone)]
pub struct DualSolution {
    /// One entry per class, in increasing label order
    pub classes: Vec<ClassModel>,
    pub summary: TrainingSummary,
}

impl DualSolution {
    /// LaRank has no bias term
    pub fn bias(&self) -> f64 {
        0.0
    }
}

/// Run LaRank sweeps over examples `0..labels.len()` of `evaluator`
///
/// `cancel` is checked before every sweep; a cancelled run still returns the
/// solution reached so far, or `LaRankError::Cancelled` if no sweep ran.
pub fn train_indexed(
    evaluator: Arc<dyn KernelEvaluator>,
    labels: &[i32],
    config: &LaRankConfig,
    cancel: &AtomicBool,
) -> Result<DualSolution> {
    config.validate()?;
    if labels.is_empty() {
        return Err(LaRankError::EmptyDataset);
    }
    let n = evaluator.num_examples();
    if n != labels.len() {
        return Err(LaRankError::DimensionMismatch {
            expected: n,
            actual: labels.len(),
        });
    }

    info!(
        "Training LaRank on {} examples (C={}, tau={}, batch={})",
        n, config.c, config.tau, config.batch_mode
    );
    let start = Instant::now();
    let mut solver = LaRankSolver::new(evaluator, config.clone());

    let mut gap = f64::MAX;
    let mut measured_gap = f64::MAX;
    let mut epochs = 0;
    let mut online_error = 0.0;
    let mut cancelled = false;

    // NOTE: the tolerance is C itself, not a separate epsilon. Suspect, kept for compatibility.
    while gap > config.c {
        if cancel.load(Ordering::Relaxed) {
            warn!("Training cancelled after {} sweeps", epochs);
            if epochs == 0 {
                return Err(LaRankError::Cancelled);
            }
            cancelled = true;
            break;
        }
        if config.max_epochs.is_some_and(|max| epochs >= max) {
            warn!(
                "Stopping after {} sweeps with gap {:.6} above C={}",
                epochs, measured_gap, config.c
            );
            break;
        }

        let mut errors = 0;
        for (i, &y) in labels.iter().enumerate() {
            if solver.add(i, y) != y {
                errors += 1;
            }
            if config.progress_step > 0 && (i + 1) % config.progress_step == 0 {
                debug!(
                    "Sweep {}: {}/{} examples, online error {:.4}",
                    epochs + 1,
                    i + 1,
                    n,
                    errors as f64 / (i + 1) as f64
                );
            }
        }
        epochs += 1;
        online_error = errors as f64 / n as f64;
        debug!("End of sweep {}, online error {:.4}", epochs, online_error);

        measured_gap = solver.compute_gap();
        debug!(
            "Duality gap {:.6}, dual {:.6}, {} support vectors",
            measured_gap,
            solver.dual(),
            solver.n_sv()
        );
        gap = if config.batch_mode { measured_gap } else { 0.0 };
    }

    let classes: Vec<ClassModel> = solver
        .labels()
        .into_iter()
        .filter_map(|label| {
            let (indices, coefficients) = solver.support_vectors(label)?;
            debug!("Class {} has {} support vectors", label, indices.len());
            Some(ClassModel {
                label,
                support_vector_indices: indices,
                coefficients,
            })
        })
        .collect();

    let summary = TrainingSummary {
        n_examples: n,
        n_classes: classes.len(),
        n_support_vectors: solver.n_sv(),
        epochs,
        gap: measured_gap,
        dual: solver.dual(),
        online_error,
        converged: !cancelled && gap <= config.c,
        cancelled,
        training_time_secs: start.elapsed().as_secs_f64(),
        solver: solver.stats(),
    };
    info!(
        "Trained {} classes with {} support vectors in {} sweeps (gap {:.6}, dual {:.6})",
        summary.n_classes, summary.n_support_vectors, epochs, summary.gap, summary.dual
    );

    Ok(DualSolution { classes, summary })
}

/// Trains LaRank models with a fixed kernel and configuration
pub struct LaRankOptimizer<K: Kernel> {
    kernel: Arc<K>,
    config: LaRankConfig,
    cancel: Arc<AtomicBool>,
}

impl<K: Kernel + 'static> LaRankOptimizer<K> {
    pub fn new(kernel: K, config: LaRankConfig) -> Self {
        Self {
            kernel: Arc::new(kernel),
            config,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Create an optimizer with default configuration
    pub fn with_kernel(kernel: K) -> Self {
        Self::new(kernel, LaRankConfig::default())
    }

    /// Share an existing cancellation flag
    pub fn with_cancel_flag(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = cancel;
        self
    }

    /// Flag that stops training at the next sweep boundary once set
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    pub fn config(&self) -> &LaRankConfig {
        &self.config
    }

    pub fn kernel(&self) -> &K {
        &self.kernel
    }

    /// Train on every sample of `dataset`
    pub fn train<D: Dataset + ?Sized>(&self, dataset: &D) -> Result<TrainedLaRank<K>> {
        if dataset.is_empty() {
            return Err(LaRankError::EmptyDataset);
        }
        let evaluator = Arc::new(SampleKernel::from_dataset(
            Arc::clone(&self.kernel),
            dataset,
        ));
        self.fit(evaluator, &dataset.get_labels())
    }

    /// Train on a slice of samples
    pub fn train_samples(&self, samples: &[Sample]) -> Result<TrainedLaRank<K>> {
        if samples.is_empty() {
            return Err(LaRankError::EmptyDataset);
        }
        let features = samples.iter().map(|s| s.features.clone()).collect();
        let labels: Vec<i32> = samples.iter().map(|s| s.label).collect();
        let evaluator = Arc::new(SampleKernel::new(Arc::clone(&self.kernel), features));
        self.fit(evaluator, &labels)
    }

    fn fit(
        &self,
        evaluator: Arc<SampleKernel<Arc<K>>>,
        labels: &[i32],
    ) -> Result<TrainedLaRank<K>> {
        let solution = train_indexed(evaluator.clone(), labels, &self.config, &self.cancel)?;
        Ok(TrainedLaRank::new(
            Arc::clone(&self.kernel),
            &evaluator,
            solution,
        ))
    }
}

struct SupportVector {
    features: SparseVector,
    norm_squared: f64,
}

/// Multiclass model predicting on arbitrary feature vectors
pub struct TrainedLaRank<K: Kernel> {
    kernel: Arc<K>,
    classes: Vec<ClassModel>,
    vectors: Vec<Vec<SupportVector>>,
    summary: TrainingSummary,
}

impl<K: Kernel> TrainedLaRank<K> {
    pub(crate) fn new(
        kernel: Arc<K>,
        evaluator: &SampleKernel<Arc<K>>,
        solution: DualSolution,
    ) -> Self {
        let vectors = solution
            .classes
            .iter()
            .map(|class| {
                class
                    .support_vector_indices
                    .iter()
                    .map(|&i| {
                        let features = evaluator.features(i).clone();
                        SupportVector {
                            norm_squared: features.norm_squared(),
                            features,
                        }
                    })
                    .collect()
            })
            .collect();

        Self {
            kernel,
            classes: solution.classes,
            vectors,
            summary: solution.summary,
        }
    }

    /// Class outputs `f_y(x)` in increasing label order
    pub fn decision_values(&self, x: &SparseVector) -> Vec<(i32, f64)> {
        let x_norm = x.norm_squared();
        self.classes
            .iter()
            .zip(&self.vectors)
            .map(|(class, vectors)| {
                let score = vectors
                    .iter()
                    .zip(&class.coefficients)
                    .map(|(sv, beta)| {
                        beta * self.kernel.compute_with_norms(
                            &sv.features,
                            x,
                            sv.norm_squared,
                            x_norm,
                        )
                    })
                    .sum();
                (class.label, score)
            })
            .collect()
    }

    /// Label with the highest class output; ties go to the smaller label
    ///
    /// Trained models always hold at least one class: training cancelled
    /// before the first sweep fails with `LaRankError::Cancelled`.
    pub fn predict(&self, sample: &Sample) -> Prediction {
        let mut best = Prediction::new(0, f64::NEG_INFINITY);
        for (label, score) in self.decision_values(&sample.features) {
            if score > best.score {
                best = Prediction::new(label, score);
            }
        }
        best
    }

    pub fn predict_batch(&self, samples: &[Sample]) -> Vec<Prediction> {
        samples.iter().map(|s| self.predict(s)).collect()
    }

    pub fn classes(&self) -> &[ClassModel] {
        &self.classes
    }

    pub fn labels(&self) -> Vec<i32> {
        self.classes.iter().map(|c| c.label).collect()
    }

    /// Total number of support vector rows over all classes
    pub fn n_support_vectors(&self) -> usize {
        self.classes
            .iter()
            .map(|c| c.support_vector_indices.len())
            .sum()
    }

    pub fn bias(&self) -> f64 {
        0.0
    }

    pub fn summary(&self) -> &TrainingSummary {
        &self.summary
    }
}
