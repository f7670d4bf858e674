//! Binomial dosage likelihoods and their normalization into a distribution

use crate::{ploidy::PloidySpec, ModelConfig, ReadObservation};
use num_bigint::BigUint;
use num_traits::{One, ToPrimitive};

/// Posterior-like probabilities over the dosage classes of a ploidy level, in class order
#[derive(Debug, Clone, PartialEq)]
pub struct DosageDistribution {
    probabilities: Vec<f64>,
}

impl DosageDistribution {
    /// Probability assigned to a class, zero for a class the ploidy does not have
    pub fn probability(&self, class: u32) -> f64 {
        self.probabilities.get(class as usize).copied().unwrap_or(0.0)
    }

    /// `(class, probability)` pairs in increasing class order
    pub fn iter(&self) -> impl Iterator<Item = (u32, f64)> + '_ {
        self.probabilities
            .iter()
            .enumerate()
            .map(|(class, &p)| (class as u32, p))
    }

    pub fn len(&self) -> usize {
        self.probabilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.probabilities.is_empty()
    }

    pub fn total(&self) -> f64 {
        self.probabilities.iter().sum()
    }

    /// Maximum-a-posteriori class. Ties go to the lowest class.
    pub fn map_call(&self) -> u32 {
        let mut best = 0;
        for (class, p) in self.iter() {
            if p > self.probability(best) {
                best = class;
            }
        }
        best
    }
}

/// Outcome of a single inference call
#[derive(Debug, Clone, PartialEq)]
pub enum Inference {
    Distribution(DosageDistribution),
    /// Zero total reads, nothing to infer from
    NoReads,
    /// Every class likelihood was zero after clamping
    ZeroLikelihood,
}

impl Inference {
    pub fn is_degenerate(&self) -> bool {
        !matches!(self, Inference::Distribution(_))
    }

    pub fn distribution(&self) -> Option<&DosageDistribution> {
        match self {
            Inference::Distribution(dist) => Some(dist),
            _ => None,
        }
    }

    pub fn into_distribution(self) -> Option<DosageDistribution> {
        match self {
            Inference::Distribution(dist) => Some(dist),
            _ => None,
        }
    }
}

/// Exact binomial coefficient `C(n, k)`
pub fn binomial_coefficient(n: u64, k: u64) -> BigUint {
    if k > n {
        return BigUint::from(0u32);
    }
    let k = k.min(n - k);
    let mut result = BigUint::one();
    for i in 0..k {
        // result == C(n, i) here, so the division is exact
        result = result * (n - i) / (i + 1);
    }
    result
}

/// Natural log of a big integer, from its top 64 bits and the shift that drops the rest
fn ln_biguint(value: &BigUint) -> f64 {
    let shift = value.bits().saturating_sub(64);
    let top = (value >> shift).to_f64().unwrap_or(0.0);
    top.ln() + shift as f64 * std::f64::consts::LN_2
}

/// `count * ln(prob)`, zero when the event never happens
fn ln_term(count: u64, prob: f64) -> f64 {
    if count == 0 {
        0.0
    } else {
        count as f64 * prob.ln()
    }
}

/// Log of the binomial mass of `k` successes in `n` trials, given `ln C(n, k)`.
///
/// Success probabilities outside `[0, 1]` and masses above 1 map to `-inf`.
fn ln_binomial_mass(ln_coefficient: f64, n: u64, k: u64, p: f64) -> f64 {
    if !(0.0..=1.0).contains(&p) {
        return f64::NEG_INFINITY;
    }
    let ln_mass = ln_coefficient + ln_term(k, p) + ln_term(n - k, 1.0 - p);
    if ln_mass.is_nan() || ln_mass > 1e-9 {
        f64::NEG_INFINITY
    } else {
        ln_mass.min(0.0)
    }
}

/// Log-likelihood of the observation under each dosage class, `-inf` where clamped
pub fn class_log_likelihoods(
    observation: &ReadObservation,
    spec: &PloidySpec,
    config: &ModelConfig,
) -> Vec<f64> {
    let n = observation.total();
    let k = observation.ref_count as u64;
    let ln_coefficient = ln_biguint(&binomial_coefficient(n, k));

    spec.dosage_classes()
        .map(|class| {
            let p = config.success_probability(spec.ideal_fraction(class));
            ln_binomial_mass(ln_coefficient, n, k, p)
        })
        .collect()
}

/// Unnormalized likelihood of the observation under each dosage class.
///
/// Values outside `[0, 1]` (including NaN) are clamped to zero. At high depth every
/// entry may underflow; `infer` normalizes in log space and is not affected.
pub fn class_likelihoods(
    observation: &ReadObservation,
    spec: &PloidySpec,
    config: &ModelConfig,
) -> Vec<f64> {
    class_log_likelihoods(observation, spec, config)
        .into_iter()
        .map(f64::exp)
        .collect()
}

/// Infer the dosage distribution for one read observation
pub fn infer(observation: &ReadObservation, spec: &PloidySpec, config: &ModelConfig) -> Inference {
    if observation.is_empty() {
        return Inference::NoReads;
    }

    let log_likelihoods = class_log_likelihoods(observation, spec, config);
    let max = log_likelihoods
        .iter()
        .copied()
        .fold(f64::NEG_INFINITY, f64::max);
    if !max.is_finite() {
        log::debug!(
            "All class likelihoods vanished for ref={} alt={} at ploidy {}",
            observation.ref_count,
            observation.alt_count,
            spec.ploidy()
        );
        return Inference::ZeroLikelihood;
    }

    // log-sum-exp: the best class scales to 1, so the sum is at least 1
    let scaled: Vec<f64> = log_likelihoods.iter().map(|l| (l - max).exp()).collect();
    let total: f64 = scaled.iter().sum();

    Inference::Distribution(DosageDistribution {
        probabilities: scaled.into_iter().map(|l| l / total).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorModel;
    use approx::assert_relative_eq;
    use statrs::distribution::{Binomial, Discrete};

    fn infer_default(a: u32, b: u32, spec: &PloidySpec) -> DosageDistribution {
        infer(&ReadObservation::new(a, b), spec, &ModelConfig::default())
            .into_distribution()
            .unwrap()
    }

    #[test]
    fn test_binomial_coefficient_small() {
        assert_eq!(binomial_coefficient(10, 3), BigUint::from(120u32));
        assert_eq!(binomial_coefficient(5, 0), BigUint::one());
        assert_eq!(binomial_coefficient(5, 5), BigUint::one());
        assert_eq!(binomial_coefficient(3, 4), BigUint::from(0u32));
        assert_eq!(
            binomial_coefficient(100, 50),
            "100891344545564193334812497256".parse::<BigUint>().unwrap()
        );
    }

    #[test]
    fn test_binomial_coefficient_exact_at_depth_1000() {
        let n = 1000;
        let row: Vec<BigUint> = (0..=n).map(|k| binomial_coefficient(n, k)).collect();
        let row_sum: BigUint = row.iter().sum();
        assert_eq!(row_sum, BigUint::one() << 1000usize);

        for k in [1, 7, 250, 500, 999] {
            assert_eq!(
                binomial_coefficient(n, k),
                binomial_coefficient(n - 1, k - 1) + binomial_coefficient(n - 1, k)
            );
            assert_eq!(row[k as usize], row[(n - k) as usize]);
        }
    }

    #[test]
    fn test_class_likelihoods_match_binomial_pmf() {
        let spec = PloidySpec::tetraploid();
        let config = ModelConfig::default();
        let obs = ReadObservation::new(12, 18);
        let likelihoods = class_likelihoods(&obs, &spec, &config);

        for (class, &l) in likelihoods.iter().enumerate() {
            let p = config.success_probability(spec.ideal_fraction(class as u32));
            let expected = Binomial::new(p, 30).unwrap().pmf(12);
            assert_relative_eq!(l, expected, max_relative = 1e-9);
        }
    }

    #[test]
    fn test_normalization() {
        for spec in [PloidySpec::tetraploid(), PloidySpec::hexaploid()] {
            for (a, b) in [(1, 0), (0, 1), (3, 9), (40, 40), (250, 3), (17, 120)] {
                let dist = infer_default(a, b, &spec);
                assert_eq!(dist.len(), spec.num_classes());
                assert_relative_eq!(dist.total(), 1.0, epsilon = 1e-9);
                assert!(dist.iter().all(|(_, p)| (0.0..=1.0).contains(&p)));
            }
        }
    }

    #[test]
    fn test_symmetry_under_allele_swap() {
        let spec = PloidySpec::tetraploid();
        for (a, b) in [(1, 50), (7, 3), (20, 20), (0, 12)] {
            let forward = infer_default(a, b, &spec);
            let swapped = infer_default(b, a, &spec);
            for class in spec.dosage_classes() {
                assert_relative_eq!(
                    forward.probability(class),
                    swapped.probability(spec.mirror(class)),
                    epsilon = 1e-9
                );
            }
        }
    }

    #[test]
    fn test_no_reads() {
        let inference = infer(
            &ReadObservation::new(0, 0),
            &PloidySpec::tetraploid(),
            &ModelConfig::default(),
        );
        assert_eq!(inference, Inference::NoReads);
        assert!(inference.is_degenerate());
        assert!(inference.distribution().is_none());
    }

    #[test]
    fn test_extreme_observations() {
        let spec = PloidySpec::tetraploid();
        assert!(infer_default(50, 0, &spec).probability(0) >= 0.99);
        assert!(infer_default(0, 50, &spec).probability(4) >= 0.99);

        let hexa = PloidySpec::hexaploid();
        assert!(infer_default(50, 0, &hexa).probability(0) >= 0.99);
        assert!(infer_default(0, 50, &hexa).probability(6) >= 0.99);
        assert_eq!(infer_default(0, 50, &hexa).map_call(), 6);
    }

    #[test]
    fn test_near_zero_reference_fraction() {
        let dist = infer_default(1, 50, &PloidySpec::tetraploid());
        assert!(dist.probability(4) > 0.9);
        assert_eq!(dist.map_call(), 4);
    }

    #[test]
    fn test_balanced_reads_call_duplex() {
        let dist = infer_default(30, 30, &PloidySpec::tetraploid());
        assert_eq!(dist.map_call(), 2);
        let dist = infer_default(45, 15, &PloidySpec::tetraploid());
        assert_eq!(dist.map_call(), 1);
    }

    #[test]
    fn test_map_call_tie_break() {
        let dist = DosageDistribution {
            probabilities: vec![0.1, 0.4, 0.4, 0.1],
        };
        assert_eq!(dist.map_call(), 1);
    }

    #[test]
    fn test_zero_error_rate_without_support() {
        // With no error the homozygous classes cannot explain mixed reads
        let config = ModelConfig::new(0.0, ErrorModel::Symmetric).unwrap();
        let spec = PloidySpec::tetraploid();
        let dist = infer(&ReadObservation::new(5, 5), &spec, &config)
            .into_distribution()
            .unwrap();
        assert_eq!(dist.probability(0), 0.0);
        assert_eq!(dist.probability(4), 0.0);
        assert_relative_eq!(dist.total(), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_additive_model_clamps_invalid_probabilities() {
        // 5/6 + 0.2 > 1, so class 1 of a hexaploid has no valid likelihood
        let config = ModelConfig::new(0.2, ErrorModel::Additive).unwrap();
        let spec = PloidySpec::hexaploid();
        let likelihoods = class_likelihoods(&ReadObservation::new(8, 3), &spec, &config);
        assert_eq!(likelihoods[1], 0.0);
        assert!(likelihoods.iter().all(|l| (0.0..=1.0).contains(l)));

        let dist = infer(&ReadObservation::new(8, 3), &spec, &config)
            .into_distribution()
            .unwrap();
        assert_relative_eq!(dist.total(), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_well_formed_model_never_vanishes() {
        let spec = PloidySpec::hexaploid();
        let config = ModelConfig::default();
        for n in [1, 10, 100, 500, 1031, 2000, 5000] {
            for a in [0, n / 3, n / 2, n] {
                let inference = infer(&ReadObservation::new(a, n - a), &spec, &config);
                assert!(!inference.is_degenerate(), "ref={} alt={}", a, n - a);
            }
        }
    }

    #[test]
    fn test_balanced_reads_at_high_depth() {
        let spec = PloidySpec::tetraploid();
        for n in [1000, 2000, 5000] {
            let dist = infer_default(n / 2, n - n / 2, &spec);
            assert_eq!(dist.map_call(), 2, "depth {}", n);
            assert!(dist.probability(2) > 0.999);
            assert_relative_eq!(dist.total(), 1.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_log_likelihoods_match_binomial_at_high_depth() {
        let spec = PloidySpec::tetraploid();
        let config = ModelConfig::default();
        let obs = ReadObservation::new(1000, 1000);
        let log_likelihoods = class_log_likelihoods(&obs, &spec, &config);

        for (class, &l) in log_likelihoods.iter().enumerate() {
            let p = config.success_probability(spec.ideal_fraction(class as u32));
            let expected = Binomial::new(p, 2000).unwrap().ln_pmf(1000);
            assert_relative_eq!(l, expected, max_relative = 1e-9);
        }
    }

    #[test]
    fn test_ln_biguint() {
        assert_eq!(ln_biguint(&BigUint::one()), 0.0);
        assert_relative_eq!(ln_biguint(&BigUint::from(86_493_225u32)), 86_493_225f64.ln());
        let big = binomial_coefficient(2000, 1000);
        let expected: f64 = (1..=1000u32)
            .map(|i| ((1000 + i) as f64).ln() - (i as f64).ln())
            .sum();
        assert_relative_eq!(ln_biguint(&big), expected, max_relative = 1e-12);
    }

    #[test]
    fn test_total_beyond_u32_range() {
        let obs = ReadObservation::new(u32::MAX, 1);
        let inference = infer(&obs, &PloidySpec::tetraploid(), &ModelConfig::default());
        let dist = inference.into_distribution().unwrap();
        assert_eq!(dist.map_call(), 0);
        assert_relative_eq!(dist.total(), 1.0, epsilon = 1e-9);
    }
}
