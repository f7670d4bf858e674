//! Synthetic read counts for a known dosage class

use crate::{ploidy::PloidySpec, DosageError, DosageResult, ErrorModel, ReadObservation};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// How synthetic reads are drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GenerationMode {
    /// Reference reads are the rounded ideal share of the coverage
    Deterministic,
    /// One Bernoulli trial per read at the error-adjusted reference probability
    Stochastic,
}

/// Noiseless read counts: `round(coverage * ideal_fraction)` reference reads.
///
/// Halves round to even, so a depth-1 duplex draw yields one alternate read.
pub fn generate_deterministic(
    spec: &PloidySpec,
    true_class: u32,
    coverage: u32,
) -> DosageResult<ReadObservation> {
    spec.validate_class(true_class)?;
    let expected = coverage as f64 * spec.ideal_fraction(true_class);
    let ref_count = (expected.round_ties_even() as u32).min(coverage);
    Ok(ReadObservation::new(ref_count, coverage - ref_count))
}

/// Noisy read counts drawn from the injected generator
pub fn generate_stochastic<R: Rng + ?Sized>(
    spec: &PloidySpec,
    true_class: u32,
    coverage: u32,
    error_rate: f64,
    rng: &mut R,
) -> DosageResult<ReadObservation> {
    spec.validate_class(true_class)?;
    if !(0.0..0.5).contains(&error_rate) {
        return Err(DosageError::InvalidConfig(format!(
            "error rate must be in [0, 0.5), got {}",
            error_rate
        )));
    }

    let p = ErrorModel::Symmetric.adjust(spec.ideal_fraction(true_class), error_rate);
    let ref_count = (0..coverage).filter(|_| rng.gen_bool(p)).count() as u32;
    Ok(ReadObservation::new(ref_count, coverage - ref_count))
}

/// Generate one observation in the given mode
pub fn generate<R: Rng + ?Sized>(
    spec: &PloidySpec,
    true_class: u32,
    coverage: u32,
    error_rate: f64,
    mode: GenerationMode,
    rng: &mut R,
) -> DosageResult<ReadObservation> {
    match mode {
        GenerationMode::Deterministic => generate_deterministic(spec, true_class, coverage),
        GenerationMode::Stochastic => {
            generate_stochastic(spec, true_class, coverage, error_rate, rng)
        }
    }
}
