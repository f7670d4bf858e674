//! Accuracy of dosage calls as a function of sequencing depth

use crate::{
    likelihood::{infer, DosageDistribution, Inference},
    ploidy::PloidySpec,
    simulate::{generate, GenerationMode},
    DosageError, DosageResult, ModelConfig, SimulationResult,
};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::RangeInclusive;

/// What each curve point measures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Metric {
    /// Probability given to the true class for one noiseless draw
    ProbabilityOfTruth,
    /// Share of stochastic draws whose MAP call is the true class
    CallAccuracy,
}

impl Metric {
    pub fn generation_mode(&self) -> GenerationMode {
        match self {
            Metric::ProbabilityOfTruth => GenerationMode::Deterministic,
            Metric::CallAccuracy => GenerationMode::Stochastic,
        }
    }
}

impl std::str::FromStr for Metric {
    type Err = DosageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "probability" | "probability-of-truth" => Ok(Metric::ProbabilityOfTruth),
            "accuracy" | "call-accuracy" => Ok(Metric::CallAccuracy),
            other => Err(DosageError::InvalidConfig(format!(
                "unknown metric '{}', expected 'probability' or 'accuracy'",
                other
            ))),
        }
    }
}

/// Parameters of a depth sweep
#[derive(Debug, Clone)]
pub struct EvaluationConfig {
    pub coverages: RangeInclusive<u32>,
    pub repetitions: u32,
    pub metric: Metric,
    pub genotypes: Vec<u32>,
    pub threshold: f64,
    pub seed: u64,
}

impl EvaluationConfig {
    /// Depths 1..=100 over every class but the all-alternate one, which mirrors class 0
    pub fn for_spec(spec: &PloidySpec) -> Self {
        Self {
            coverages: 1..=100,
            repetitions: 100,
            metric: Metric::ProbabilityOfTruth,
            genotypes: (0..spec.ploidy()).collect(),
            threshold: 0.99,
            seed: 0,
        }
    }
}

/// Validate a sweep against the ploidy it will run on
pub fn validate_evaluation_config(spec: &PloidySpec, config: &EvaluationConfig) -> DosageResult<()> {
    if config.coverages.is_empty() {
        return Err(DosageError::InvalidConfig(format!(
            "coverage range {}..={} is empty",
            config.coverages.start(),
            config.coverages.end()
        )));
    }

    if config.repetitions == 0 {
        return Err(DosageError::InvalidConfig(
            "repetitions must be greater than 0".to_string(),
        ));
    }

    if config.genotypes.is_empty() {
        return Err(DosageError::InvalidConfig(
            "at least one genotype must be evaluated".to_string(),
        ));
    }

    for (i, &genotype) in config.genotypes.iter().enumerate() {
        spec.validate_class(genotype)?;
        if config.genotypes[..i].contains(&genotype) {
            return Err(DosageError::InvalidConfig(format!(
                "genotype {} listed more than once",
                genotype
            )));
        }
    }

    if !(config.threshold > 0.0 && config.threshold <= 1.0) {
        return Err(DosageError::InvalidConfig(format!(
            "reliability threshold must be in (0, 1], got {}",
            config.threshold
        )));
    }

    Ok(())
}

/// Per-genotype accuracy curves and the depth at which all of them become reliable
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationReport {
    pub coverages: Vec<u32>,
    /// Metric values per genotype, aligned with `coverages`
    pub curves: BTreeMap<u32, Vec<f64>>,
    pub min_reliable_coverage: Option<u32>,
}

impl EvaluationReport {
    /// Flatten the curves into points, grouped by genotype and ordered by coverage
    pub fn results(&self) -> Vec<SimulationResult> {
        self.curves
            .iter()
            .flat_map(|(&genotype, curve)| {
                self.coverages
                    .iter()
                    .zip(curve)
                    .map(move |(&coverage, &metric)| SimulationResult::new(coverage, genotype, metric))
            })
            .collect()
    }

    pub fn curve(&self, genotype: u32) -> Option<&[f64]> {
        self.curves.get(&genotype).map(|c| c.as_slice())
    }
}

/// Smallest coverage, scanned in increasing order, at which every curve reaches `threshold`
pub fn min_reliable_coverage(
    coverages: &[u32],
    curves: &BTreeMap<u32, Vec<f64>>,
    threshold: f64,
) -> Option<u32> {
    coverages.iter().enumerate().find_map(|(i, &coverage)| {
        curves
            .values()
            .all(|curve| curve.get(i).is_some_and(|&v| v >= threshold))
            .then_some(coverage)
    })
}

/// Distribution of a simulated inference; degenerate results are logged and count as misses
fn simulated_distribution(
    inference: &Inference,
    genotype: u32,
    coverage: u32,
) -> Option<&DosageDistribution> {
    match inference {
        Inference::Distribution(dist) => Some(dist),
        Inference::NoReads => {
            log::warn!(
                "No reads simulated for genotype {} at coverage {}, counted as a miss",
                genotype,
                coverage
            );
            None
        }
        Inference::ZeroLikelihood => {
            log::warn!(
                "No class explains the reads simulated for genotype {} at coverage {}",
                genotype,
                coverage
            );
            None
        }
    }
}

/// Metric value of a single `(genotype, coverage)` cell
pub fn evaluate_cell<R: Rng + ?Sized>(
    spec: &PloidySpec,
    model: &ModelConfig,
    config: &EvaluationConfig,
    genotype: u32,
    coverage: u32,
    rng: &mut R,
) -> DosageResult<f64> {
    let mode = config.metric.generation_mode();
    match config.metric {
        Metric::ProbabilityOfTruth => {
            let observation = generate(spec, genotype, coverage, model.error_rate, mode, rng)?;
            let inference = infer(&observation, spec, model);
            Ok(simulated_distribution(&inference, genotype, coverage)
                .map_or(0.0, |dist| dist.probability(genotype)))
        }
        Metric::CallAccuracy => {
            let mut correct = 0u32;
            for _ in 0..config.repetitions {
                let observation = generate(spec, genotype, coverage, model.error_rate, mode, rng)?;
                let inference = infer(&observation, spec, model);
                let called = simulated_distribution(&inference, genotype, coverage)
                    .map(|dist| dist.map_call());
                if called == Some(genotype) {
                    correct += 1;
                }
            }
            Ok(correct as f64 / config.repetitions as f64)
        }
    }
}

fn assemble_report(
    config: &EvaluationConfig,
    cells: impl IntoIterator<Item = (u32, f64)>,
) -> EvaluationReport {
    let coverages: Vec<u32> = config.coverages.clone().collect();
    let mut curves: BTreeMap<u32, Vec<f64>> = config
        .genotypes
        .iter()
        .map(|&g| (g, Vec::with_capacity(coverages.len())))
        .collect();

    for (genotype, metric) in cells {
        if let Some(curve) = curves.get_mut(&genotype) {
            curve.push(metric);
        }
    }

    let min_reliable_coverage = min_reliable_coverage(&coverages, &curves, config.threshold);
    EvaluationReport {
        coverages,
        curves,
        min_reliable_coverage,
    }
}

/// Sweep coverages and genotypes sequentially, drawing from the given generator
pub fn evaluate<R: Rng + ?Sized>(
    spec: &PloidySpec,
    model: &ModelConfig,
    config: &EvaluationConfig,
    rng: &mut R,
) -> DosageResult<EvaluationReport> {
    validate_evaluation_config(spec, config)?;
    log::info!(
        "Evaluating ploidy {} over coverages {}..={} ({:?})",
        spec.ploidy(),
        config.coverages.start(),
        config.coverages.end(),
        config.metric
    );

    let mut cells = Vec::new();
    for coverage in config.coverages.clone() {
        for &genotype in &config.genotypes {
            let metric = evaluate_cell(spec, model, config, genotype, coverage, rng)?;
            log::debug!("genotype={} coverage={} metric={:.4}", genotype, coverage, metric);
            cells.push((genotype, metric));
        }
    }

    Ok(assemble_report(config, cells))
}

fn cell_seed(seed: u64, genotype: u32, coverage: u32) -> u64 {
    seed.wrapping_mul(0x9E37_79B9_7F4A_7C15) ^ (((genotype as u64) << 32) | coverage as u64)
}

/// Sweep all cells in parallel. Each cell draws from its own generator seeded from
/// `config.seed`, so results do not depend on scheduling.
pub fn evaluate_par(
    spec: &PloidySpec,
    model: &ModelConfig,
    config: &EvaluationConfig,
) -> DosageResult<EvaluationReport> {
    validate_evaluation_config(spec, config)?;
    log::info!(
        "Evaluating ploidy {} over coverages {}..={} ({:?}, parallel)",
        spec.ploidy(),
        config.coverages.start(),
        config.coverages.end(),
        config.metric
    );

    let cells: Vec<(u32, u32)> = config
        .coverages
        .clone()
        .flat_map(|coverage| config.genotypes.iter().map(move |&g| (g, coverage)))
        .collect();

    let metrics: Result<Vec<(u32, f64)>, DosageError> = cells
        .into_par_iter()
        .map(|(genotype, coverage)| {
            let mut rng = Xoshiro256PlusPlus::seed_from_u64(cell_seed(config.seed, genotype, coverage));
            evaluate_cell(spec, model, config, genotype, coverage, &mut rng)
                .map(|metric| (genotype, metric))
        })
        .collect();

    Ok(assemble_report(config, metrics?))
}
