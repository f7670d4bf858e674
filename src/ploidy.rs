//! Dosage classes and ideal reference fractions for a ploidy level

use crate::{DosageError, DosageResult};

/// Dosage classes `0..=ploidy` of a polyploid locus. Class `d` carries `d` copies of the
/// alternate allele, so its ideal reference fraction is `(ploidy - d) / ploidy`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PloidySpec {
    ploidy: u32,
}

impl PloidySpec {
    pub fn new(ploidy: u32) -> DosageResult<Self> {
        if ploidy < 2 || ploidy % 2 != 0 {
            return Err(DosageError::InvalidConfig(format!(
                "ploidy must be even and at least 2, got {}",
                ploidy
            )));
        }
        Ok(Self { ploidy })
    }

    pub fn tetraploid() -> Self {
        Self { ploidy: 4 }
    }

    pub fn hexaploid() -> Self {
        Self { ploidy: 6 }
    }

    pub fn ploidy(&self) -> u32 {
        self.ploidy
    }

    /// Number of dosage classes, `ploidy + 1`
    pub fn num_classes(&self) -> usize {
        self.ploidy as usize + 1
    }

    /// Dosage classes in increasing order
    pub fn dosage_classes(&self) -> impl Iterator<Item = u32> + '_ {
        0..=self.ploidy
    }

    pub fn contains(&self, class: u32) -> bool {
        class <= self.ploidy
    }

    pub fn validate_class(&self, class: u32) -> DosageResult<()> {
        if !self.contains(class) {
            return Err(DosageError::InvalidConfig(format!(
                "dosage class {} is outside 0..={} for ploidy {}",
                class, self.ploidy, self.ploidy
            )));
        }
        Ok(())
    }

    /// Expected reference-read fraction of a class under zero sequencing error
    pub fn ideal_fraction(&self, class: u32) -> f64 {
        debug_assert!(self.contains(class));
        (self.ploidy - class) as f64 / self.ploidy as f64
    }

    /// Class with the mirrored allele composition
    pub fn mirror(&self, class: u32) -> u32 {
        self.ploidy - class
    }

    /// Genotype written as allele letters, e.g. class 1 of a tetraploid is `AAAB`
    pub fn label(&self, class: u32) -> String {
        let alt = class.min(self.ploidy) as usize;
        let reference = self.ploidy as usize - alt;
        format!("{}{}", "A".repeat(reference), "B".repeat(alt))
    }
}
