//! Utility functions shared by the command line tools

use crate::{DosageError, DosageResult, ReadObservation};
use std::path::Path;

/// Get the number of CPU cores, with a fallback default
pub fn get_num_cpus() -> usize {
    std::thread::available_parallelism()
        .map(|p| p.get())
        .unwrap_or(1)
}

/// Parse a `ref,alt` read-count pair such as `12,30`
pub fn parse_observation(text: &str) -> DosageResult<ReadObservation> {
    let (ref_text, alt_text) = text
        .split_once(',')
        .ok_or_else(|| DosageError::InvalidObservation(format!("expected 'ref,alt', got '{}'", text)))?;

    let parse = |s: &str| {
        s.trim()
            .parse::<u32>()
            .map_err(|_| DosageError::InvalidObservation(format!("invalid read count: '{}'", s.trim())))
    };

    Ok(ReadObservation::new(parse(ref_text)?, parse(alt_text)?))
}

/// Parse a comma-separated list of dosage classes such as `0,1,2`
pub fn parse_class_list(text: &str) -> DosageResult<Vec<u32>> {
    text.split(',')
        .filter(|s| !s.trim().is_empty())
        .map(|s| {
            s.trim()
                .parse::<u32>()
                .map_err(|_| DosageError::InvalidConfig(format!("invalid dosage class: '{}'", s.trim())))
        })
        .collect()
}

/// Create parent directories if they don't exist
pub fn ensure_parent_dirs<P: AsRef<Path>>(path: P) -> DosageResult<()> {
    if let Some(parent) = path.as_ref().parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Timer utility for measuring execution time
pub struct Timer {
    start: std::time::Instant,
    name: String,
}

impl Timer {
    pub fn new(name: &str) -> Self {
        log::info!("Starting timer: {}", name);
        Timer {
            start: std::time::Instant::now(),
            name: name.to_string(),
        }
    }

    pub fn elapsed(&self) -> std::time::Duration {
        self.start.elapsed()
    }

    pub fn log_elapsed(&self) {
        let duration = self.elapsed();
        log::info!("Timer '{}' elapsed: {:.2?}", self.name, duration);
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        self.log_elapsed();
    }
}
