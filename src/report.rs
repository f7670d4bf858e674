//! Text and TSV rendering of inference and evaluation results

use crate::{
    evaluate::EvaluationReport, likelihood::Inference, ploidy::PloidySpec, DosageResult,
};
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;

#[derive(Debug, Serialize)]
struct CurveRow<'a> {
    #[serde(rename = "Genotype")]
    genotype: u32,
    #[serde(rename = "Label")]
    label: &'a str,
    #[serde(rename = "Coverage")]
    coverage: u32,
    #[serde(rename = "Metric")]
    metric: f64,
}

/// One line per dosage class, or a single `No reads.` line for a degenerate result
pub fn format_distribution(spec: &PloidySpec, inference: &Inference) -> String {
    match inference {
        Inference::Distribution(dist) => dist
            .iter()
            .map(|(class, p)| {
                format!(
                    "Dosage = {} ({}): Probability = {:.4}",
                    class,
                    spec.label(class),
                    p
                )
            })
            .collect::<Vec<_>>()
            .join("\n"),
        Inference::NoReads => "No reads.".to_string(),
        Inference::ZeroLikelihood => "No dosage class explains the reads.".to_string(),
    }
}

/// Write the accuracy curves to a TSV file, gzip-compressed when the path ends in `.gz`
pub fn write_curves(
    report: &EvaluationReport,
    spec: &PloidySpec,
    output_path: &Path,
) -> DosageResult<()> {
    let file = File::create(output_path)?;
    let writer: Box<dyn Write> = if output_path.extension().and_then(|s| s.to_str()) == Some("gz") {
        Box::new(GzEncoder::new(file, Compression::default()))
    } else {
        Box::new(file)
    };

    let mut csv_writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_writer(writer);

    for result in report.results() {
        let label = spec.label(result.genotype);
        csv_writer.serialize(CurveRow {
            genotype: result.genotype,
            label: &label,
            coverage: result.coverage,
            metric: result.metric,
        })?;
    }
    csv_writer.flush()?;

    Ok(())
}
