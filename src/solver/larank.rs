//! LaRank online multiclass SVM solver
//!
//! Crammer-Singer multiclass SVM trained by sequential minimal steps on
//! pairs of class coefficients of a single example. Each call to
//! [`LaRankSolver::add`] processes the new example and then spends time on
//! reprocessing stored patterns, picked by an adaptive scheduler that favors
//! the step type with the best recent dual increase per second.
//!
//! Bordes, Bottou, Gallinari, Weston: "Solving MultiClass Support Vector
//! Machines with LaRank", ICML 2007.

use crate::cache::{CacheStats, KernelCachePool};
use crate::core::{KernelEvaluator, LaRankConfig};
use crate::solver::output::PerClassOutput;
use crate::solver::patterns::{Pattern, PatternStore};
use log::debug;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Weight given to the newest measurement in the scheduler averages
const RATE_DECAY: f64 = 0.05;
/// Added to elapsed seconds so that instant steps do not divide by zero
const TIME_EPSILON: f64 = 1e-5;
/// Patterns drawn by one reprocess step before giving up
const REPROCESS_TRIES: usize = 10;
/// Patterns optimized by one optimize step
const OPTIMIZE_PASSES: usize = 10;

/// Kind of step performed by [`LaRankSolver::process`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessType {
    /// A freshly presented example; stored as a pattern when a step is taken
    New,
    /// A stored pattern; only classes where it has a row may gain it
    Old,
    /// A stored pattern restricted to the classes where it has a row
    Optimize,
}

/// Outcome of one step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcessResult {
    /// Increase of the dual objective, never negative
    pub dual_increase: f64,
    /// Label with the highest score before the step
    pub predicted: i32,
}

impl ProcessResult {
    fn unchanged(predicted: i32) -> Self {
        Self {
            dual_increase: 0.0,
            predicted,
        }
    }
}

/// Snapshot of the solver counters
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SolverStats {
    pub nb_seen_examples: u64,
    pub nb_removed: u64,
    pub n_pro: u64,
    pub n_rep: u64,
    pub n_opt: u64,
    pub w_pro: f64,
    pub w_rep: f64,
    pub w_opt: f64,
    pub dual: f64,
    pub patterns: usize,
    pub support_vectors: usize,
    pub classes: usize,
}

/// Exponential moving average of the dual increase per second
fn update_rate(weight: f64, dual_increase: f64, elapsed: Duration) -> f64 {
    let coeff = dual_increase / (TIME_EPSILON + elapsed.as_secs_f64());
    RATE_DECAY * coeff + (1.0 - RATE_DECAY) * weight
}

/// Order `(label, value)` pairs by decreasing value, ties by increasing label
fn rank(pairs: &mut [(i32, f64)]) {
    pairs.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(Ordering::Equal)
            .then(a.0.cmp(&b.0))
    });
}

/// LaRank solver state
///
/// Examples are identified by their index in the kernel evaluator. Classes
/// are created lazily when a label is first seen; every class owns a kernel
/// cache, and all caches are linked into one buddy ring so that kernel
/// values computed for one class are reused by the others.
pub struct LaRankSolver {
    config: LaRankConfig,
    caches: KernelCachePool,
    outputs: BTreeMap<i32, PerClassOutput>,
    first_label: Option<i32>,
    patterns: PatternStore,
    rng: ChaCha8Rng,
    w_pro: f64,
    w_rep: f64,
    w_opt: f64,
    n_pro: u64,
    n_rep: u64,
    n_opt: u64,
    nb_seen_examples: u64,
    nb_removed: u64,
    dual: f64,
}

impl LaRankSolver {
    /// Create an empty solver
    ///
    /// `config` is expected to have passed [`LaRankConfig::validate`].
    pub fn new(evaluator: Arc<dyn KernelEvaluator>, config: LaRankConfig) -> Self {
        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        Self {
            config,
            caches: KernelCachePool::new(evaluator),
            outputs: BTreeMap::new(),
            first_label: None,
            patterns: PatternStore::new(),
            rng,
            w_pro: 1.0,
            w_rep: 1.0,
            w_opt: 1.0,
            n_pro: 0,
            n_rep: 0,
            n_opt: 0,
            nb_seen_examples: 0,
            nb_removed: 0,
            dual: 0.0,
        }
    }

    pub fn config(&self) -> &LaRankConfig {
        &self.config
    }

    /// Present example `x_id` with label `y`, returning the label predicted
    /// for it before it was learned
    pub fn add(&mut self, x_id: usize, y: i32) -> i32 {
        self.nb_seen_examples += 1;
        if !self.outputs.contains_key(&y) {
            self.create_output(y);
        }
        let pattern = self
            .patterns
            .get_pattern(x_id)
            .unwrap_or_else(|| Pattern::new(x_id, y));

        let start = Instant::now();
        let result = self.process(pattern, ProcessType::New);
        self.dual += result.dual_increase;
        self.n_pro += 1;
        self.w_pro = update_rate(self.w_pro, result.dual_increase, start.elapsed());

        loop {
            let w_sum = self.w_pro + self.w_rep + self.w_opt;
            let floor = w_sum / 20.0;
            self.w_pro = self.w_pro.max(floor);
            self.w_rep = self.w_rep.max(floor);
            self.w_opt = self.w_opt.max(floor);
            let w_sum = self.w_pro + self.w_rep + self.w_opt;

            let r = self.rng.gen::<f64>() * w_sum;
            if r <= self.w_pro {
                break;
            }

            let start = Instant::now();
            if r <= self.w_pro + self.w_rep {
                let increase = self.reprocess();
                self.dual += increase;
                self.n_rep += 1;
                self.w_rep = update_rate(self.w_rep, increase, start.elapsed());
            } else {
                let increase = self.optimize();
                self.dual += increase;
                self.n_opt += 1;
                self.w_opt = update_rate(self.w_opt, increase, start.elapsed());
            }
        }

        if self.nb_seen_examples % self.config.cleanup_interval as u64 == 0 {
            self.nb_removed += self.cleanup() as u64;
        }

        result.predicted
    }

    fn create_output(&mut self, label: i32) {
        let output = PerClassOutput::new(&mut self.caches, self.config.cache_size);
        match self.first_label.and_then(|first| self.outputs.get(&first)) {
            Some(first) => self.caches.set_buddy(first.cache_id(), output.cache_id()),
            None => self.first_label = Some(label),
        }
        debug!("New class {} (cache {})", label, output.cache_id());
        self.outputs.insert(label, output);
    }

    /// One pair step on `pattern`
    ///
    /// Picks the class with the largest gradient that may still grow its
    /// coefficient and the class with the smallest gradient that may shrink
    /// it, then moves weight between them along the direction of steepest
    /// dual ascent, clipped to the box constraints.
    pub fn process(&mut self, pattern: Pattern, ptype: ProcessType) -> ProcessResult {
        let x = pattern.x_id;
        let c = self.config.c;
        let optimize = ptype == ProcessType::Optimize;

        let mut gradients = Vec::with_capacity(self.outputs.len());
        let mut scores = Vec::with_capacity(self.outputs.len());
        for (&label, output) in &self.outputs {
            if optimize && !output.is_support_vector(&self.caches, x) {
                continue;
            }
            let g = output.compute_gradient(&mut self.caches, x, pattern.y, label);
            gradients.push((label, g));
            scores.push((label, if label == pattern.y { 1.0 - g } else { -g }));
        }
        if gradients.is_empty() {
            return ProcessResult::unchanged(pattern.y);
        }

        rank(&mut gradients);
        rank(&mut scores);
        let predicted = scores[0].0;

        let yp = gradients.iter().copied().find(|&(label, _)| {
            let output = &self.outputs[&label];
            let good = label == pattern.y;
            let support = optimize || output.is_support_vector(&self.caches, x);
            if !support {
                return good;
            }
            let bound = if good { c } else { 0.0 };
            output.get_beta(&self.caches, x) < bound
        });
        let Some((yp, gp)) = yp else {
            return ProcessResult::unchanged(predicted);
        };

        let ym = gradients.iter().rev().copied().find(|&(label, _)| {
            let output = &self.outputs[&label];
            let support = optimize || output.is_support_vector(&self.caches, x);
            label != pattern.y || (support && output.get_beta(&self.caches, x) > 0.0)
        });
        let Some((ym, gm)) = ym else {
            return ProcessResult::unchanged(predicted);
        };

        if gp - gm < self.config.tau {
            return ProcessResult::unchanged(predicted);
        }

        if ptype == ProcessType::New {
            self.patterns.insert(pattern);
        }

        let output_p = &self.outputs[&yp];
        let kii = output_p.get_kii(&mut self.caches, x);
        let mut lambda = (gp - gm) / (2.0 * kii);
        if optimize || output_p.is_support_vector(&self.caches, x) {
            let beta = output_p.get_beta(&self.caches, x);
            lambda = if yp == pattern.y {
                lambda.min(c - beta)
            } else {
                lambda.min(beta.abs())
            };
        } else {
            lambda = lambda.min(c);
        }

        if let Some(output) = self.outputs.get_mut(&yp) {
            output.update(&mut self.caches, x, lambda, gp);
        }
        if let Some(output) = self.outputs.get_mut(&ym) {
            output.update(&mut self.caches, x, -lambda, gm);
        }

        ProcessResult {
            dual_increase: lambda * ((gp - gm) - lambda * kii),
            predicted,
        }
    }

    /// Process up to ten random stored patterns, stopping at the first one
    /// that improves the dual
    pub fn reprocess(&mut self) -> f64 {
        for _ in 0..REPROCESS_TRIES {
            let Some(pattern) = self.patterns.sample(&mut self.rng) else {
                return 0.0;
            };
            let result = self.process(pattern, ProcessType::Old);
            if result.dual_increase != 0.0 {
                return result.dual_increase;
            }
        }
        0.0
    }

    /// Optimize ten random stored patterns, returning the total dual increase
    pub fn optimize(&mut self) -> f64 {
        let mut increase = 0.0;
        for _ in 0..OPTIMIZE_PASSES {
            let Some(pattern) = self.patterns.sample(&mut self.rng) else {
                break;
            };
            increase += self.process(pattern, ProcessType::Optimize).dual_increase;
        }
        increase
    }

    /// Remove zero coefficients from every class, then forget the patterns
    /// that no longer have a row in their own class
    ///
    /// Returns the number of patterns removed.
    pub fn cleanup(&mut self) -> usize {
        let mut rows = 0;
        for output in self.outputs.values_mut() {
            rows += output.cleanup(&mut self.caches);
        }

        let mut removed = 0;
        for slot in 0..self.patterns.maxcount() {
            let Some(pattern) = self.patterns.get(slot) else {
                continue;
            };
            let active = self
                .outputs
                .get(&pattern.y)
                .is_some_and(|output| output.is_support_vector(&self.caches, pattern.x_id));
            if !active {
                self.patterns.remove(slot);
                removed += 1;
            }
        }

        debug!(
            "Cleanup removed {} rows and {} patterns, {} patterns left",
            rows,
            removed,
            self.patterns.len()
        );
        removed
    }

    /// Duality gap estimate over the stored patterns
    pub fn compute_gap(&mut self) -> f64 {
        let mut sum_sl = 0.0;
        let mut sum_bi = 0.0;
        for (_, pattern) in self.patterns.iter() {
            let Some(own) = self.outputs.get(&pattern.y) else {
                continue;
            };
            sum_bi += own.get_beta(&self.caches, pattern.x_id);
            let gi = own.compute_gradient(&mut self.caches, pattern.x_id, pattern.y, pattern.y);

            let mut gmin = f64::MAX;
            for (&label, output) in &self.outputs {
                if label != pattern.y && output.is_support_vector(&self.caches, pattern.x_id) {
                    let g = output.compute_gradient(&mut self.caches, pattern.x_id, pattern.y, label);
                    gmin = gmin.min(g);
                }
            }
            sum_sl += (gi - gmin).max(0.0);
        }
        (self.compute_w2() + self.config.c * sum_sl - sum_bi).max(0.0)
    }

    /// Squared norm of the weight vectors of all classes, summed over the
    /// stored patterns
    pub fn compute_w2(&mut self) -> f64 {
        let mut w2 = 0.0;
        for (_, pattern) in self.patterns.iter() {
            for output in self.outputs.values() {
                let beta = output.get_beta(&self.caches, pattern.x_id);
                if beta != 0.0 {
                    w2 += beta * output.compute_score(&mut self.caches, pattern.x_id);
                }
            }
        }
        w2
    }

    /// Dual objective recomputed from the stored patterns
    pub fn compute_dual(&mut self) -> f64 {
        let mut sum_bi = 0.0;
        for (_, pattern) in self.patterns.iter() {
            if let Some(output) = self.outputs.get(&pattern.y) {
                sum_bi += output.get_beta(&self.caches, pattern.x_id);
            }
        }
        sum_bi - self.compute_w2() / 2.0
    }

    /// Dual objective accumulated from the step increases
    pub fn dual(&self) -> f64 {
        self.dual
    }

    /// Label with the highest score for training example `x_id`, `None`
    /// before any class exists
    pub fn predict(&mut self, x_id: usize) -> Option<i32> {
        let mut best: Option<(i32, f64)> = None;
        for (&label, output) in &self.outputs {
            let score = output.compute_score(&mut self.caches, x_id);
            if best.map_or(true, |(_, s)| score > s) {
                best = Some((label, score));
            }
        }
        best.map(|(label, _)| label)
    }

    /// Total number of rows over all classes
    pub fn n_sv(&self) -> usize {
        self.outputs.values().map(PerClassOutput::len).sum()
    }

    pub fn num_outputs(&self) -> usize {
        self.outputs.len()
    }

    /// Known labels in increasing order
    pub fn labels(&self) -> Vec<i32> {
        self.outputs.keys().copied().collect()
    }

    pub fn output(&self, label: i32) -> Option<&PerClassOutput> {
        self.outputs.get(&label)
    }

    pub fn patterns(&self) -> &PatternStore {
        &self.patterns
    }

    pub fn caches(&self) -> &KernelCachePool {
        &self.caches
    }

    /// Example ids and coefficients of one class
    pub fn support_vectors(&self, label: i32) -> Option<(Vec<usize>, Vec<f64>)> {
        let output = self.outputs.get(&label)?;
        Some((
            output.support_vectors(&self.caches),
            output.betas().to_vec(),
        ))
    }

    pub fn cache_stats(&self, label: i32) -> Option<CacheStats> {
        let output = self.outputs.get(&label)?;
        Some(self.caches.stats(output.cache_id()))
    }

    pub fn stats(&self) -> SolverStats {
        SolverStats {
            nb_seen_examples: self.nb_seen_examples,
            nb_removed: self.nb_removed,
            n_pro: self.n_pro,
            n_rep: self.n_rep,
            n_opt: self.n_opt,
            w_pro: self.w_pro,
            w_rep: self.w_rep,
            w_opt: self.w_opt,
            dual: self.dual,
            patterns: self.patterns.len(),
            support_vectors: self.n_sv(),
            classes: self.outputs.len(),
        }
    }

    /// Destroy every class and its cache, and forget all patterns
    pub fn reset(&mut self) {
        for (_, output) in std::mem::take(&mut self.outputs) {
            output.destroy(&mut self.caches);
        }
        self.first_label = None;
        self.patterns.clear();
        self.w_pro = 1.0;
        self.w_rep = 1.0;
        self.w_opt = 1.0;
        self.n_pro = 0;
        self.n_rep = 0;
        self.n_opt = 0;
        self.nb_seen_examples = 0;
        self.nb_removed = 0;
        self.dual = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SparseVector;
    use crate::kernel::{LinearKernel, RBFKernel, SampleKernel};
    use approx::assert_relative_eq;

    fn linear(points: &[[f64; 2]]) -> Arc<dyn KernelEvaluator> {
        Arc::new(SampleKernel::new(
            LinearKernel::new(),
            points.iter().map(|p| SparseVector::from_dense(p)).collect(),
        ))
    }

    /// Three noisy blobs around (0, 3), (3, -2) and (-3, -2)
    fn blobs(n_per_class: usize, seed: u64) -> (Arc<dyn KernelEvaluator>, Vec<i32>) {
        let centers = [(0.0, 3.0), (3.0, -2.0), (-3.0, -2.0)];
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut features = Vec::new();
        let mut labels = Vec::new();
        for i in 0..n_per_class * 3 {
            let class = i % 3;
            let (cx, cy) = centers[class];
            let x = cx + rng.gen_range(-1.5..1.5);
            let y = cy + rng.gen_range(-1.5..1.5);
            features.push(SparseVector::from_dense(&[x, y]));
            labels.push(class as i32 + 1);
        }
        let evaluator = Arc::new(SampleKernel::new(RBFKernel::new(0.5), features));
        (evaluator, labels)
    }

    fn assert_box_constraint(solver: &LaRankSolver) {
        let c = solver.config().c;
        for label in solver.labels() {
            let (_, betas) = solver.support_vectors(label).unwrap();
            for beta in betas {
                assert!(beta <= c + 1e-9, "beta {} above C", beta);
                assert!(beta >= -c - 1e-9, "beta {} below -C", beta);
            }
        }
    }

    #[test]
    fn test_first_call_creates_class() {
        let mut solver = LaRankSolver::new(linear(&[[1.0, 0.0]]), LaRankConfig::default());

        assert_eq!(solver.predict(0), None);
        assert_eq!(solver.add(0, 4), 4);
        assert_eq!(solver.num_outputs(), 1);
        assert_eq!(solver.dual(), 0.0);
        // a single class has no pair to optimize
        assert!(solver.patterns().is_empty());
        assert_eq!(solver.n_sv(), 0);
        assert_eq!(solver.predict(0), Some(4));
    }

    #[test]
    fn test_first_pair_step() {
        let points = [[2.0, 0.0], [-2.0, 0.0]];
        let mut solver = LaRankSolver::new(linear(&points), LaRankConfig::default());

        solver.add(0, 0);
        // both classes score 0, ties go to the smaller label
        assert_eq!(solver.add(1, 1), 0);

        assert_eq!(solver.output(1).unwrap().get_beta(solver.caches(), 1), 0.125);
        assert_eq!(solver.output(0).unwrap().get_beta(solver.caches(), 1), -0.125);
        assert_relative_eq!(solver.dual(), 0.0625);
        assert_relative_eq!(solver.compute_dual(), 0.0625);
        assert_eq!(solver.predict(0), Some(0));
        assert_eq!(solver.predict(1), Some(1));
        assert_relative_eq!(solver.compute_gap(), 0.0);
    }

    #[test]
    fn test_dual_is_monotone_and_box_holds() {
        let (evaluator, labels) = blobs(20, 11);
        let config = LaRankConfig {
            c: 0.5,
            cleanup_interval: 7,
            ..LaRankConfig::default()
        };
        let mut solver = LaRankSolver::new(evaluator, config);

        let mut previous = solver.dual();
        for _ in 0..3 {
            for (i, &y) in labels.iter().enumerate() {
                solver.add(i, y);
                assert!(solver.dual() >= previous);
                previous = solver.dual();
                assert_box_constraint(&solver);
            }
        }
        assert!(solver.dual() > 0.0);
    }

    #[test]
    fn test_process_never_decreases_dual() {
        let (evaluator, labels) = blobs(10, 5);
        let mut solver = LaRankSolver::new(evaluator, LaRankConfig::default());
        for (i, &y) in labels.iter().enumerate() {
            solver.add(i, y);
        }

        let stored: Vec<Pattern> = solver.patterns().iter().map(|(_, p)| p).collect();
        for pattern in stored {
            for ptype in [ProcessType::Old, ProcessType::Optimize] {
                assert!(solver.process(pattern, ptype).dual_increase >= 0.0);
            }
        }
        assert!(solver.reprocess() >= 0.0);
        assert!(solver.optimize() >= 0.0);
    }

    fn betas_of(solver: &LaRankSolver, x_id: usize) -> Vec<(i32, f64)> {
        solver
            .labels()
            .into_iter()
            .map(|label| {
                let beta = solver.output(label).unwrap().get_beta(solver.caches(), x_id);
                (label, beta)
            })
            .collect()
    }

    #[test]
    fn test_each_step_moves_one_class_up_and_one_down() {
        let (evaluator, labels) = blobs(10, 17);
        let config = LaRankConfig {
            c: 0.5,
            cleanup_interval: 1_000_000,
            ..LaRankConfig::default()
        };
        let c = config.c;
        let mut solver = LaRankSolver::new(evaluator, config);
        for (i, &y) in labels.iter().enumerate() {
            solver.add(i, y);
        }

        let stored: Vec<Pattern> = solver.patterns().iter().map(|(_, p)| p).collect();
        let mut steps = 0;
        for pattern in stored {
            for ptype in [ProcessType::Old, ProcessType::Optimize] {
                let before = betas_of(&solver, pattern.x_id);
                let result = solver.process(pattern, ptype);
                let after = betas_of(&solver, pattern.x_id);

                let deltas: Vec<f64> = before
                    .iter()
                    .zip(&after)
                    .map(|(&(_, b), &(_, a))| a - b)
                    .filter(|&d| d != 0.0)
                    .collect();
                if result.dual_increase > 0.0 {
                    steps += 1;
                    assert_eq!(deltas.len(), 2, "pair step on {:?}", pattern);
                    assert!(deltas.iter().any(|&d| d > 0.0));
                    assert!(deltas.iter().any(|&d| d < 0.0));
                    assert_relative_eq!(deltas[0], -deltas[1], epsilon = 1e-12);
                } else {
                    assert!(deltas.is_empty());
                }

                // the true class holds the only non-negative coefficient
                let mut sum = 0.0;
                for &(label, beta) in &after {
                    sum += beta;
                    if label == pattern.y {
                        assert!((-1e-9..=c + 1e-9).contains(&beta), "beta {}", beta);
                    } else {
                        assert!((-c - 1e-9..=1e-9).contains(&beta), "beta {}", beta);
                    }
                }
                assert_relative_eq!(sum, 0.0, epsilon = 1e-9);
            }
        }
        assert!(steps > 0);
    }

    #[test]
    fn test_running_dual_matches_recomputed() {
        let (evaluator, labels) = blobs(15, 3);
        let config = LaRankConfig {
            cleanup_interval: 1_000_000,
            ..LaRankConfig::default()
        };
        let mut solver = LaRankSolver::new(evaluator, config);
        for _ in 0..2 {
            for (i, &y) in labels.iter().enumerate() {
                solver.add(i, y);
            }
        }

        let running = solver.dual();
        assert_relative_eq!(solver.compute_dual(), running, epsilon = 1e-6);
    }

    #[test]
    fn test_prediction_is_idempotent() {
        let (evaluator, labels) = blobs(10, 9);
        let mut solver = LaRankSolver::new(evaluator, LaRankConfig::default());
        for (i, &y) in labels.iter().enumerate() {
            solver.add(i, y);
        }

        let dual = solver.dual();
        let stats = solver.stats();
        for i in 0..labels.len() {
            let first = solver.predict(i);
            assert_eq!(solver.predict(i), first);
        }
        assert_eq!(solver.dual(), dual);
        assert_eq!(solver.n_sv(), stats.support_vectors);
        assert_eq!(solver.patterns().len(), stats.patterns);
    }

    #[test]
    fn test_cleanup_keeps_active_support_vectors() {
        let (evaluator, labels) = blobs(12, 21);
        let config = LaRankConfig {
            cleanup_interval: 1_000_000,
            ..LaRankConfig::default()
        };
        let mut solver = LaRankSolver::new(evaluator, config);
        for (i, &y) in labels.iter().enumerate() {
            solver.add(i, y);
        }

        let active: Vec<(Pattern, f64)> = solver
            .patterns()
            .iter()
            .filter_map(|(_, p)| {
                let beta = solver.output(p.y)?.get_beta(solver.caches(), p.x_id);
                (beta.abs() >= 1e-6).then_some((p, beta))
            })
            .collect();
        assert!(!active.is_empty());

        solver.cleanup();

        for (pattern, beta) in active {
            assert!(solver.patterns().is_pattern(pattern.x_id));
            let output = solver.output(pattern.y).unwrap();
            assert!(output.is_support_vector(solver.caches(), pattern.x_id));
            assert_eq!(output.get_beta(solver.caches(), pattern.x_id), beta);
        }
        for (_, pattern) in solver.patterns().iter() {
            let output = solver.output(pattern.y).unwrap();
            assert!(output.is_support_vector(solver.caches(), pattern.x_id));
        }
    }

    #[test]
    fn test_classes_share_one_buddy_ring() {
        let (evaluator, labels) = blobs(5, 1);
        let mut solver = LaRankSolver::new(evaluator, LaRankConfig::default());
        for (i, &y) in labels.iter().enumerate() {
            solver.add(i, y);
        }

        assert_eq!(solver.labels(), vec![1, 2, 3]);
        let first = solver.output(1).unwrap().cache_id();
        assert_eq!(solver.caches().buddies(first).len(), 3);
        let hits: u64 = solver
            .labels()
            .into_iter()
            .map(|label| solver.cache_stats(label).unwrap().hits)
            .sum();
        assert!(hits > 0);
    }

    #[test]
    fn test_large_tau_blocks_every_step() {
        let (evaluator, labels) = blobs(5, 2);
        let config = LaRankConfig {
            tau: 1e9,
            ..LaRankConfig::default()
        };
        let mut solver = LaRankSolver::new(evaluator, config);
        for (i, &y) in labels.iter().enumerate() {
            solver.add(i, y);
        }

        assert_eq!(solver.dual(), 0.0);
        assert!(solver.patterns().is_empty());
        assert_eq!(solver.n_sv(), 0);
        assert_eq!(solver.stats().nb_seen_examples, labels.len() as u64);
    }

    #[test]
    fn test_reset() {
        let (evaluator, labels) = blobs(5, 4);
        let mut solver = LaRankSolver::new(evaluator, LaRankConfig::default());
        for (i, &y) in labels.iter().enumerate() {
            solver.add(i, y);
        }
        assert!(solver.n_sv() > 0);

        solver.reset();
        assert_eq!(solver.num_outputs(), 0);
        assert!(solver.caches().is_empty());
        assert!(solver.patterns().is_empty());
        let expected = SolverStats {
            w_pro: 1.0,
            w_rep: 1.0,
            w_opt: 1.0,
            ..SolverStats::default()
        };
        assert_eq!(solver.stats(), expected);

        assert_eq!(solver.add(0, labels[0]), labels[0]);
        assert_eq!(solver.num_outputs(), 1);
    }
}
