//! CLI binary for inferring the dosage of a single marker from its read counts

use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Env;
use polydose_rs::{
    likelihood::infer, ploidy::PloidySpec, report::format_distribution, utils::parse_observation,
    ErrorModel, ModelConfig, ReadObservation,
};

#[derive(Parser)]
#[command(name = "dosage")]
#[command(about = "Infer the allele dosage of a polyploid marker from reference/alternate read counts")]
#[command(long_about = "
Computes the binomial likelihood of the observed reference and alternate read
counts under every dosage class of the given ploidy, corrected for a fixed
sequencing error rate, and prints the normalized probability of each class.

Class d carries d copies of the alternate allele (B), so for a tetraploid
class 0 is AAAA and class 4 is BBBB.
")]
struct Args {
    /// Number of reads supporting the reference allele
    #[arg(long = "ref", value_name = "COUNT", required_unless_present = "reads")]
    ref_count: Option<u32>,

    /// Number of reads supporting the alternate allele
    #[arg(long = "alt", value_name = "COUNT", required_unless_present = "reads")]
    alt_count: Option<u32>,

    /// Read counts given as 'ref,alt'
    #[arg(long, value_name = "REF,ALT", conflicts_with_all = ["ref_count", "alt_count"])]
    reads: Option<String>,

    /// Ploidy of the organism (even, e.g. 4 or 6)
    #[arg(long, default_value = "4")]
    ploidy: u32,

    /// Assumed sequencing error rate
    #[arg(long, default_value = "0.001")]
    error_rate: f64,

    /// Error model: 'symmetric' or 'additive'
    #[arg(long, default_value = "symmetric")]
    error_model: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level))
        .format_timestamp_secs()
        .init();

    let observation = match (&args.reads, args.ref_count, args.alt_count) {
        (Some(reads), _, _) => parse_observation(reads).context("Failed to parse --reads")?,
        (None, Some(ref_count), Some(alt_count)) => ReadObservation::new(ref_count, alt_count),
        _ => anyhow::bail!("Both --ref and --alt are required unless --reads is given"),
    };

    let spec = PloidySpec::new(args.ploidy).context("Invalid --ploidy")?;
    let error_model: ErrorModel = args.error_model.parse().context("Invalid --error-model")?;
    let config = ModelConfig::new(args.error_rate, error_model).context("Invalid --error-rate")?;

    log::debug!(
        "ref={} alt={} ploidy={} error_rate={} model={:?}",
        observation.ref_count,
        observation.alt_count,
        spec.ploidy(),
        config.error_rate,
        config.error_model
    );

    let inference = infer(&observation, &spec, &config);
    println!("{}", format_distribution(&spec, &inference));

    if let Some(dist) = inference.distribution() {
        let call = dist.map_call();
        println!(
            "Call = {} ({}): Probability = {:.4}",
            call,
            spec.label(call),
            dist.probability(call)
        );
    }

    Ok(())
}
