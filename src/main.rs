use anyhow::{bail, Result};
use clap::Parser;
use groove_analyzer::analysis::NativeBackend;
use groove_analyzer::batch::{default_output_path, Capabilities, DEFAULT_EXTENSIONS};
use groove_analyzer::validation::validate_artifact;
use groove_analyzer::{AnalysisCoordinator, AnalyzerConfig, ReportMode};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "analyze")]
#[command(about = "Analyze BPM, key and drum patterns of audio files", long_about = None)]
struct Args {
    /// Audio file or folder of audio files
    path: String,

    /// Write a click track (<name>_debug.wav) next to each analyzed file
    #[arg(long)]
    debug: bool,

    /// Results file (default: music_analysis.json in the analyzed folder)
    #[arg(short = 'o', long)]
    output: Option<String>,

    /// Number of files analyzed in parallel
    #[arg(short = 'j', long, default_value = "1")]
    jobs: usize,

    /// Include energy, loudness, danceability and spectral statistics
    #[arg(long)]
    extended: bool,

    /// Emit null energy/loudness/danceability even if they can be computed
    #[arg(long)]
    no_descriptors: bool,

    /// Recognized extension (can be specified multiple times)
    #[arg(long = "ext")]
    extensions: Vec<String>,

    /// Verbose logging
    #[arg(short = 'v', long)]
    verbose: bool,

    /// Only validate the existing results file (don't analyze)
    #[arg(long)]
    validate: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    // Expand ~ in paths
    let input = PathBuf::from(shellexpand::tilde(&args.path).as_ref());
    if !input.exists() {
        bail!("Invalid path: {:?} does not exist", input);
    }

    let output = match &args.output {
        Some(path) => PathBuf::from(shellexpand::tilde(path).as_ref()),
        None => default_output_path(&input)?,
    };

    // If validate-only mode, just validate and exit
    if args.validate {
        log::info!("Validation mode - checking existing results...");
        let summary = validate_artifact(&output)?;
        log::info!("Validation passed: {} records", summary.records);
        return Ok(());
    }

    let mut capabilities = Capabilities::detect();
    if args.no_descriptors {
        capabilities.descriptors = false;
    }
    let report_mode = if args.extended {
        ReportMode::Extended
    } else {
        ReportMode::Basic
    };

    let mut config = AnalyzerConfig::new(output)
        .with_debug(args.debug)
        .with_jobs(args.jobs)
        .with_report_mode(report_mode)
        .with_capabilities(capabilities);

    if report_mode == ReportMode::Extended && !config.wants_descriptors() {
        log::warn!(
            "Descriptor backend unavailable - energy, loudness and danceability will be null"
        );
    }

    if !args.extensions.is_empty() {
        config = config.with_extensions(&args.extensions);
    }
    log::debug!(
        "Extensions: {:?} (defaults: {:?})",
        config.extensions,
        DEFAULT_EXTENSIONS
    );

    let coordinator = AnalysisCoordinator::new(config, NativeBackend::new());
    let report = coordinator.run(&input)?;

    log::info!(
        "Analyzed {} new files, skipped {}, failed {}",
        report.analyzed.len(),
        report.skipped.len(),
        report.failed.len()
    );
    log::info!("Analysis complete! Results saved to {:?}", report.output_path);

    Ok(())
}
