//! LibSVM format dataset with multiclass labels
//!
//! One example per line:
//! label index:value index:value ...
//!
//! Labels are integer class ids. Feature indices are 1-based in the file
//! and 0-based in memory.
//!
//! Example:
//! 3 1:0.5 3:1.2 7:0.8
//! 1 2:0.3 5:2.1

use crate::core::{Dataset, LaRankError, Result, Sample, SparseVector};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Dataset implementation for LibSVM format files
#[derive(Debug, Clone)]
pub struct LibSVMDataset {
    samples: Vec<Sample>,
    dimensions: usize,
}

impl LibSVMDataset {
    /// Load a dataset from a LibSVM format file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    /// Load a dataset from any buffered reader
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut samples = Vec::new();
        let mut dimensions = 0;

        for (line_num, line) in reader.lines().enumerate() {
            let line = line?;
            let line = line.trim();

            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let (sample, dim) = Self::parse_line(line).map_err(|e| {
                LaRankError::ParseError(format!("Error parsing line {}: {}", line_num + 1, e))
            })?;
            dimensions = dimensions.max(dim);
            samples.push(sample);
        }

        if samples.is_empty() {
            return Err(LaRankError::EmptyDataset);
        }

        Ok(LibSVMDataset {
            samples,
            dimensions,
        })
    }

    /// Build a dataset from samples already in memory
    pub fn from_samples(samples: Vec<Sample>) -> Result<Self> {
        if samples.is_empty() {
            return Err(LaRankError::EmptyDataset);
        }
        let dimensions = samples
            .iter()
            .filter_map(|s| s.features.indices.last().map(|&i| i + 1))
            .max()
            .unwrap_or(0);
        Ok(LibSVMDataset {
            samples,
            dimensions,
        })
    }

    /// Distinct labels in increasing order
    pub fn classes(&self) -> Vec<i32> {
        let mut labels = self.get_labels();
        labels.sort_unstable();
        labels.dedup();
        labels
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    fn parse_label(token: &str) -> Result<i32> {
        if let Ok(label) = token.parse::<i32>() {
            return Ok(label);
        }
        // "2.0" style labels written by some tools
        match token.parse::<f64>() {
            Ok(value) if value.fract() == 0.0 && value.abs() <= i32::MAX as f64 => {
                Ok(value as i32)
            }
            _ => Err(LaRankError::ParseError(format!("Invalid label: {}", token))),
        }
    }

    /// Parse one line, returning the sample and the dimension it needs
    fn parse_line(line: &str) -> Result<(Sample, usize)> {
        let mut parts = line.split_whitespace();
        let label = match parts.next() {
            Some(token) => Self::parse_label(token)?,
            None => return Err(LaRankError::ParseError("Empty line".to_string())),
        };

        let mut indices = Vec::new();
        let mut values = Vec::new();
        let mut dimension = 0;

        for feature in parts {
            let (index, value) = feature.split_once(':').ok_or_else(|| {
                LaRankError::ParseError(format!("Invalid feature format: {}", feature))
            })?;

            let index = index.parse::<usize>().map_err(|_| {
                LaRankError::ParseError(format!("Invalid feature index: {}", index))
            })?;
            if index == 0 {
                return Err(LaRankError::ParseError(
                    "Feature index must be positive: 0".to_string(),
                ));
            }

            let value = value.parse::<f64>().map_err(|_| {
                LaRankError::ParseError(format!("Invalid feature value: {}", value))
            })?;

            indices.push(index - 1);
            values.push(value);
            dimension = dimension.max(index);
        }

        Ok((Sample::new(SparseVector::new(indices, values), label), dimension))
    }
}

impl Dataset for LibSVMDataset {
    fn len(&self) -> usize {
        self.samples.len()
    }

    fn dim(&self) -> usize {
        self.dimensions
    }

    fn get_sample(&self, i: usize) -> Sample {
        self.samples[i].clone()
    }

    fn get_labels(&self) -> Vec<i32> {
        self.samples.iter().map(|s| s.label).collect()
    }
}
