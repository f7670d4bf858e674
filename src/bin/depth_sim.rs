//! CLI binary for simulating dosage-call accuracy across sequencing depths

use clap::Parser;
use env_logger::Env;
use polydose_rs::{
    evaluate::{evaluate_par, validate_evaluation_config, EvaluationConfig, Metric},
    ploidy::PloidySpec,
    report::write_curves,
    utils::{ensure_parent_dirs, get_num_cpus, parse_class_list, Timer},
    DosageError, DosageResult, ErrorModel, ModelConfig,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "depth_sim")]
#[command(about = "Simulate how dosage inference accuracy scales with sequencing depth")]
#[command(long_about = "
For every coverage in the requested range and every genotype, this tool
generates synthetic reference/alternate read counts, runs dosage inference on
them and records either the probability assigned to the true genotype
(noiseless reads) or the fraction of correct calls over repeated noisy draws.

The output is a TSV file with one row per genotype and coverage. The smallest
coverage at which every genotype reaches the reliability threshold is printed.
Output paths ending in .gz are gzip-compressed.
")]
struct Args {
    /// Path to the output TSV file
    #[arg(long, value_name = "FILE")]
    output: PathBuf,

    /// Ploidy of the organism (even, e.g. 4 or 6)
    #[arg(long, default_value = "4")]
    ploidy: u32,

    /// Assumed sequencing error rate
    #[arg(long, default_value = "0.001")]
    error_rate: f64,

    /// Error model used for inference: 'symmetric' or 'additive'
    #[arg(long, default_value = "symmetric")]
    error_model: String,

    /// Metric: 'probability' (noiseless reads) or 'accuracy' (repeated noisy draws)
    #[arg(long, default_value = "probability")]
    metric: String,

    /// Smallest coverage to simulate
    #[arg(long, default_value = "1")]
    min_coverage: u32,

    /// Largest coverage to simulate
    #[arg(long, default_value = "100")]
    max_coverage: u32,

    /// Noisy draws per genotype and coverage (accuracy metric only)
    #[arg(long, default_value = "100")]
    repetitions: u32,

    /// Comma-separated genotypes to simulate (default: all but the all-alternate class)
    #[arg(long, value_name = "LIST")]
    genotypes: Option<String>,

    /// Metric value every genotype must reach to count a coverage as reliable
    #[arg(long, default_value = "0.99")]
    threshold: f64,

    /// Seed for the random read generator
    #[arg(long, default_value = "0")]
    seed: u64,

    /// Number of threads to use for parallel processing
    #[arg(long, default_value_t = get_num_cpus())]
    threads: usize,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

fn run() -> DosageResult<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.debug {
        "debug"
    } else if args.verbose {
        "info"
    } else {
        "warn"
    };

    env_logger::Builder::from_env(Env::default().default_filter_or(log_level))
        .format_timestamp_secs()
        .init();

    rayon::ThreadPoolBuilder::new()
        .num_threads(args.threads)
        .build_global()
        .map_err(|e| DosageError::InvalidConfig(format!("cannot build thread pool: {}", e)))?;

    let spec = PloidySpec::new(args.ploidy)?;
    let error_model: ErrorModel = args.error_model.parse()?;
    let model = ModelConfig::new(args.error_rate, error_model)?;

    let metric: Metric = args.metric.parse()?;
    let genotypes = match &args.genotypes {
        Some(list) => parse_class_list(list)?,
        None => EvaluationConfig::for_spec(&spec).genotypes,
    };
    let config = EvaluationConfig {
        coverages: args.min_coverage..=args.max_coverage,
        repetitions: args.repetitions,
        metric,
        genotypes,
        threshold: args.threshold,
        seed: args.seed,
    };
    validate_evaluation_config(&spec, &config)?;

    log::info!("Starting depth simulation");
    log::info!("Output file: {:?}", args.output);
    log::info!(
        "Configuration: ploidy={}, error_rate={}, error_model={:?}, metric={:?}",
        spec.ploidy(),
        model.error_rate,
        model.error_model,
        config.metric
    );
    log::info!("Genotypes: {:?}", config.genotypes);
    log::info!("Number of threads: {}", args.threads);

    ensure_parent_dirs(&args.output)?;

    let timer = Timer::new("Simulating coverage sweep");
    let report = evaluate_par(&spec, &model, &config)?;
    drop(timer);

    log::info!("Results summary:");
    for (genotype, curve) in &report.curves {
        let last = curve.last().copied().unwrap_or(0.0);
        log::info!(
            "  {} ({}): {:.4} at {}x",
            spec.label(*genotype),
            genotype,
            last,
            config.coverages.end()
        );
    }
    match report.min_reliable_coverage {
        Some(coverage) => println!(
            "Minimum reliable coverage: {}x (all genotypes >= {})",
            coverage,
            config.threshold
        ),
        None => println!(
            "Minimum reliable coverage: none (no coverage in {}..={} brings every genotype to {})",
            config.coverages.start(),
            config.coverages.end(),
            config.threshold
        ),
    }

    let _timer = Timer::new("Writing results");
    write_curves(&report, &spec, &args.output)?;
    log::info!("Results written to: {:?}", args.output);

    Ok(())
}

/// Handle application errors and provide user-friendly messages
fn handle_error(error: DosageError) -> ! {
    match error {
        DosageError::InvalidConfig(msg) => {
            eprintln!("Error: Invalid configuration: {}", msg);
            eprintln!("Please check the ploidy, error rate, coverage range and genotypes.");
        }
        DosageError::InvalidObservation(msg) => {
            eprintln!("Error: Invalid read counts: {}", msg);
        }
        DosageError::Io(ref e) => {
            eprintln!("Error: I/O error: {}", e);
            eprintln!("Please check file permissions and disk space.");
        }
        DosageError::Csv(ref e) => {
            eprintln!("Error: TSV writing error: {}", e);
            eprintln!("Please check the output file path.");
        }
    }
    std::process::exit(1);
}

fn main() {
    if let Err(e) = run() {
        handle_error(e);
    }
}
