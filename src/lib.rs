//! LaRank: online multiclass support vector machine
//!
//! Crammer-Singer multiclass SVM solved with the LaRank algorithm of Bordes,
//! Bottou, Gallinari and Weston, "Solving MultiClass Support Vector Machines
//! with LaRank" (ICML 2007). Kernel values are memoized in per-class row
//! caches that look each other up before calling the kernel.

pub mod api;
pub mod cache;
pub mod core;
pub mod data;
pub mod kernel;
pub mod optimizer;
pub mod solver;

// Re-export main types for convenience
pub use crate::api::{EvaluationMetrics, LaRank, ModelInfo, TrainedModel};
pub use crate::cache::{CacheStats, KernelCache, KernelCachePool};
pub use crate::core::error::*;
pub use crate::core::traits::*;
pub use crate::core::types::*;
pub use crate::data::LibSVMDataset;
pub use crate::kernel::{Kernel, LinearKernel, RBFKernel, SampleKernel};
pub use crate::optimizer::{
    train_indexed, ClassModel, DualSolution, LaRankOptimizer, TrainedLaRank, TrainingSummary,
};
pub use crate::solver::{LaRankSolver, PerClassOutput, ProcessResult, ProcessType, SolverStats};

// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
