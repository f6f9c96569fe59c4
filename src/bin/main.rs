//! LaRank Command Line Interface
//!
//! Trains multiclass models on LibSVM format data and reports accuracy.

use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use env_logger::Env;
use log::{error, info};
use larank::api::{quick, LaRank};
use larank::core::{LaRankConfig, LaRankError, Result};
use larank::{Dataset, Kernel, LibSVMDataset, LinearKernel, RBFKernel, TrainingSummary};
use serde::Serialize;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::process;

#[derive(Parser)]
#[command(name = "larank")]
#[command(about = "Online multiclass SVM trained with LaRank")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Train a model and report its accuracy
    Train(TrainArgs),
    /// Train on the first part of a file and test on the rest
    Cv(CvArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq)]
enum CliKernel {
    Linear,
    Rbf,
}

#[derive(Args)]
struct TrainArgs {
    /// Training data file (LibSVM format, integer labels)
    #[arg(long)]
    data: PathBuf,

    /// Test data file
    #[arg(long)]
    test: Option<PathBuf>,

    /// JSON configuration file; flags override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Regularization parameter C
    #[arg(short = 'C', long)]
    c: Option<f64>,

    /// Minimum gradient gap for a step
    #[arg(long)]
    tau: Option<f64>,

    /// Kernel function
    #[arg(long, value_enum, default_value = "linear")]
    kernel: CliKernel,

    /// RBF width, defaults to 1 / number of features
    #[arg(long)]
    gamma: Option<f64>,

    /// Kernel cache size per class in MB
    #[arg(long)]
    cache_size: Option<usize>,

    /// Maximum number of sweeps over the training data
    #[arg(long)]
    max_epochs: Option<usize>,

    /// Stop after a single sweep
    #[arg(long)]
    online: bool,

    /// Seed of the pseudo-random generator
    #[arg(long)]
    seed: Option<u64>,

    /// Log progress every N examples
    #[arg(long)]
    progress_step: Option<usize>,

    /// Write a JSON training report to this file
    #[arg(long)]
    report: Option<PathBuf>,
}

#[derive(Args)]
struct CvArgs {
    /// Data file
    data: PathBuf,

    /// Training ratio (0.0-1.0)
    #[arg(short, long, default_value = "0.8")]
    ratio: f64,

    /// Regularization parameter C
    #[arg(short = 'C', long, default_value = "1.0")]
    c: f64,
}

#[derive(Serialize)]
struct ClassReport {
    label: i32,
    support_vectors: usize,
}

#[derive(Serialize)]
struct TrainingReport {
    created_at: DateTime<Utc>,
    data: String,
    kernel: String,
    gamma: Option<f64>,
    config: LaRankConfig,
    classes: Vec<ClassReport>,
    summary: TrainingSummary,
    training_accuracy: f64,
    test_accuracy: Option<f64>,
}

fn main() {
    let cli = Cli::parse();

    let log_level = if cli.debug {
        "debug"
    } else if cli.verbose {
        "info"
    } else {
        "warn"
    };

    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    let result = match cli.command {
        Commands::Train(args) => train_command(args),
        Commands::Cv(args) => cv_command(args),
    };

    if let Err(e) = result {
        error!("Error: {e}");
        process::exit(1);
    }
}

/// Configuration file values overridden by explicit flags
fn build_config(args: &TrainArgs) -> Result<LaRankConfig> {
    let mut config = match &args.config {
        Some(path) => {
            info!("Loading configuration from {path:?}");
            serde_json::from_reader(BufReader::new(File::open(path)?))?
        }
        None => LaRankConfig::default(),
    };

    if let Some(c) = args.c {
        config.c = c;
    }
    if let Some(tau) = args.tau {
        config.tau = tau;
    }
    if let Some(mb) = args.cache_size {
        config.cache_size = mb.checked_mul(1024 * 1024).ok_or_else(|| {
            LaRankError::InvalidParameter(format!("Cache size of {mb} MB is too large"))
        })?;
    }
    if let Some(max_epochs) = args.max_epochs {
        config.max_epochs = Some(max_epochs);
    }
    if args.online {
        config.batch_mode = false;
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(step) = args.progress_step {
        config.progress_step = step;
    }

    config.validate()?;
    Ok(config)
}

fn train_command(args: TrainArgs) -> Result<()> {
    let config = build_config(&args)?;
    info!("Data file: {:?}", args.data);
    info!(
        "Parameters: C={}, tau={}, batch={}",
        config.c, config.tau, config.batch_mode
    );

    let dataset = LibSVMDataset::from_file(&args.data)?;
    info!(
        "Loaded {} samples with {} dimensions and {} classes",
        dataset.len(),
        dataset.dim(),
        dataset.classes().len()
    );
    let test = match &args.test {
        Some(path) => Some(LibSVMDataset::from_file(path)?),
        None => None,
    };

    let report = match args.kernel {
        CliKernel::Linear => {
            train_with_kernel(&args, LinearKernel::new(), config, &dataset, test.as_ref())?
        }
        CliKernel::Rbf => {
            let gamma = match args.gamma {
                Some(gamma) if gamma > 0.0 && gamma.is_finite() => gamma,
                Some(gamma) => {
                    return Err(LaRankError::InvalidParameter(format!(
                        "Gamma must be positive, got: {gamma}"
                    )))
                }
                None => RBFKernel::with_auto_gamma(dataset.dim().max(1)).gamma(),
            };
            info!("Using RBF kernel with gamma={gamma}");
            let mut report =
                train_with_kernel(&args, RBFKernel::new(gamma), config, &dataset, test.as_ref())?;
            report.gamma = Some(gamma);
            report
        }
    };

    println!("Training accuracy: {:.2}%", report.training_accuracy * 100.0);
    if let Some(accuracy) = report.test_accuracy {
        println!("Test accuracy: {:.2}%", accuracy * 100.0);
    }

    if let Some(path) = &args.report {
        write_report(path, &report)?;
        info!("Report saved to: {path:?}");
    }

    Ok(())
}

fn train_with_kernel<K: Kernel + 'static>(
    args: &TrainArgs,
    kernel: K,
    config: LaRankConfig,
    dataset: &LibSVMDataset,
    test: Option<&LibSVMDataset>,
) -> Result<TrainingReport> {
    let model = LaRank::with_kernel(kernel)
        .with_config(config.clone())
        .train(dataset)?;

    let info = model.info();
    info!(
        "Training completed: {} classes, {} support vectors",
        info.n_classes, info.n_support_vectors
    );

    let training_accuracy = model.evaluate(dataset);
    let test_accuracy = test.map(|t| model.evaluate(t));

    Ok(TrainingReport {
        created_at: Utc::now(),
        data: args.data.display().to_string(),
        kernel: format!("{:?}", args.kernel).to_lowercase(),
        gamma: None,
        config,
        classes: info
            .support_vectors_per_class
            .iter()
            .map(|&(label, support_vectors)| ClassReport {
                label,
                support_vectors,
            })
            .collect(),
        summary: model.summary().clone(),
        training_accuracy,
        test_accuracy,
    })
}

fn write_report(path: &Path, report: &TrainingReport) -> Result<()> {
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(writer, report)?;
    Ok(())
}

fn cv_command(args: CvArgs) -> Result<()> {
    info!("Validation on {:?} with ratio {}", args.data, args.ratio);

    let dataset = LibSVMDataset::from_file(&args.data)?;
    let accuracy = quick::simple_validation(&dataset, args.ratio, args.c)?;

    println!("=== Validation Results ===");
    println!("Data file: {:?}", args.data);
    println!("Train/test ratio: {:.1}/{:.1}", args.ratio, 1.0 - args.ratio);
    println!("C parameter: {}", args.c);
    println!("Test accuracy: {:.2}%", accuracy * 100.0);

    Ok(())
}
