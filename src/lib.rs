//! # polydose - Polyploid Allele Dosage Inference
//!
//! Infers the allele-dosage genotype of a tetraploid or hexaploid organism from the
//! reference and alternate read counts at a marker, and simulates how the accuracy of
//! that call scales with sequencing depth.

pub mod evaluate;
pub mod likelihood;
pub mod ploidy;
pub mod report;
pub mod simulate;
pub mod utils;

use serde::{Deserialize, Serialize};

/// Reference and alternate read counts observed at one marker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReadObservation {
    pub ref_count: u32,
    pub alt_count: u32,
}

impl ReadObservation {
    pub fn new(ref_count: u32, alt_count: u32) -> Self {
        Self {
            ref_count,
            alt_count,
        }
    }

    /// Total read depth at the marker, widened so two `u32` counts never overflow
    pub fn total(&self) -> u64 {
        self.ref_count as u64 + self.alt_count as u64
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Same depth with the two alleles swapped
    pub fn swapped(&self) -> Self {
        Self::new(self.alt_count, self.ref_count)
    }
}

/// One point of an accuracy curve
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub coverage: u32,
    pub genotype: u32,
    pub metric: f64,
}

impl SimulationResult {
    pub fn new(coverage: u32, genotype: u32, metric: f64) -> Self {
        Self {
            coverage,
            genotype,
            metric,
        }
    }
}

/// How the assumed sequencing error biases a class's ideal reference fraction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ErrorModel {
    /// `p = f(1-e) + (1-f)e`, error flips a read in either direction
    #[default]
    Symmetric,
    /// `p = f + e`, with the all-reference class pinned to `1 - e`
    Additive,
}

impl ErrorModel {
    /// Error-adjusted probability that a read carries the reference allele
    pub fn adjust(&self, ideal_fraction: f64, error_rate: f64) -> f64 {
        match self {
            ErrorModel::Symmetric => {
                ideal_fraction * (1.0 - error_rate) + (1.0 - ideal_fraction) * error_rate
            }
            ErrorModel::Additive => {
                if ideal_fraction >= 1.0 {
                    1.0 - error_rate
                } else {
                    ideal_fraction + error_rate
                }
            }
        }
    }
}

impl std::str::FromStr for ErrorModel {
    type Err = DosageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "symmetric" => Ok(ErrorModel::Symmetric),
            "additive" => Ok(ErrorModel::Additive),
            other => Err(DosageError::InvalidConfig(format!(
                "unknown error model '{}', expected 'symmetric' or 'additive'",
                other
            ))),
        }
    }
}

/// Configuration parameters for dosage inference
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelConfig {
    pub error_rate: f64,
    pub error_model: ErrorModel,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            error_rate: 0.001,
            error_model: ErrorModel::Symmetric,
        }
    }
}

impl ModelConfig {
    pub fn new(error_rate: f64, error_model: ErrorModel) -> DosageResult<Self> {
        let config = Self {
            error_rate,
            error_model,
        };
        validate_model_config(&config)?;
        Ok(config)
    }

    /// Reference-read probability for a class with the given ideal fraction
    pub fn success_probability(&self, ideal_fraction: f64) -> f64 {
        self.error_model.adjust(ideal_fraction, self.error_rate)
    }
}

/// Validate the error rate of a model configuration
pub fn validate_model_config(config: &ModelConfig) -> DosageResult<()> {
    if !config.error_rate.is_finite() || config.error_rate < 0.0 || config.error_rate >= 0.5 {
        return Err(DosageError::InvalidConfig(format!(
            "error rate must be in [0, 0.5), got {}",
            config.error_rate
        )));
    }
    Ok(())
}

/// Error types for the polydose library
#[derive(Debug, thiserror::Error)]
pub enum DosageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid observation: {0}")]
    InvalidObservation(String),
}

pub type DosageResult<T> = Result<T, DosageError>;

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_read_observation() {
        let obs = ReadObservation::new(3, 7);
        assert_eq!(obs.total(), 10);
        assert!(!obs.is_empty());
        assert_eq!(obs.swapped(), ReadObservation::new(7, 3));
        assert!(ReadObservation::new(0, 0).is_empty());

        let deep = ReadObservation::new(u32::MAX, 1);
        assert_eq!(deep.total(), u32::MAX as u64 + 1);
        assert!(!deep.is_empty());
    }

    #[test]
    fn test_symmetric_adjustment() {
        let model = ErrorModel::Symmetric;
        assert_relative_eq!(model.adjust(1.0, 0.001), 0.999, epsilon = 1e-12);
        assert_relative_eq!(model.adjust(0.0, 0.001), 0.001, epsilon = 1e-12);
        assert_relative_eq!(model.adjust(0.5, 0.001), 0.5, epsilon = 1e-12);
        assert_relative_eq!(model.adjust(0.75, 0.0), 0.75, epsilon = 1e-12);
    }

    #[test]
    fn test_additive_adjustment() {
        let model = ErrorModel::Additive;
        assert_relative_eq!(model.adjust(1.0, 0.001), 0.999, epsilon = 1e-12);
        assert_relative_eq!(model.adjust(0.75, 0.001), 0.751, epsilon = 1e-12);
        assert_relative_eq!(model.adjust(0.0, 0.001), 0.001, epsilon = 1e-12);
    }

    #[test]
    fn test_error_model_from_str() {
        assert_eq!("symmetric".parse::<ErrorModel>().unwrap(), ErrorModel::Symmetric);
        assert_eq!("Additive".parse::<ErrorModel>().unwrap(), ErrorModel::Additive);
        assert!("binomial".parse::<ErrorModel>().is_err());
    }

    #[test]
    fn test_validate_model_config() {
        assert!(validate_model_config(&ModelConfig::default()).is_ok());
        assert!(ModelConfig::new(0.0, ErrorModel::Symmetric).is_ok());
        assert!(ModelConfig::new(-0.01, ErrorModel::Symmetric).is_err());
        assert!(ModelConfig::new(0.5, ErrorModel::Additive).is_err());
        assert!(ModelConfig::new(f64::NAN, ErrorModel::Symmetric).is_err());
    }
}
