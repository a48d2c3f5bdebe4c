/// CLI for running voltammetry experiments described in TOML
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use voltammetry_sim::experiment::{ExperimentConfig, ExperimentOutcome};
use voltammetry_sim::io;
use voltammetry_sim::observe::{CollectingObserver, LogObserver, SimEvent, SimObserver};
use voltammetry_sim::SimResult;

const DEFAULT_OUTPUT_DIR: &str = "voltammetry_results";

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_usage();
        return ExitCode::FAILURE;
    }

    let result = match args[1].as_str() {
        "run" => run_experiment(&args[2..]),
        "template" => write_template(&args[2..]),
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        other => {
            println!("Unknown command: {}", other);
            print_usage();
            return ExitCode::FAILURE;
        }
    };

    #[cfg(feature = "profiling")]
    voltammetry_sim::PROFILER.lock().log_and_clear();

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn print_usage() {
    println!("\nvoltammetry_sim - surface-confined redox voltammetry\n");
    println!("Usage: voltammetry_sim <command> [options]\n");
    println!("Commands:");
    println!("  run <experiment.toml> [output_dir]   Run an experiment and export its arrays");
    println!("  template <experiment.toml>           Write an example experiment file\n");
    println!("Examples:");
    println!("  voltammetry_sim template swv.toml");
    println!("  voltammetry_sim run swv.toml results/swv\n");
    println!("Set RUST_LOG=debug for per-stage diagnostics.");
}

fn write_template(args: &[String]) -> SimResult<()> {
    let Some(path) = args.first() else {
        println!("Usage: voltammetry_sim template <experiment.toml>");
        return Ok(());
    };
    ExperimentConfig::example().to_file(path)?;
    log::info!("example experiment written to {path}");
    Ok(())
}

/// Forwards events to the log while keeping them for the summary.
struct Tee {
    log: LogObserver,
    kept: CollectingObserver,
}

impl SimObserver for Tee {
    fn record(&self, event: &SimEvent) {
        self.log.record(event);
        self.kept.record(event);
    }
}

fn run_experiment(args: &[String]) -> SimResult<()> {
    let Some(path) = args.first() else {
        println!("Usage: voltammetry_sim run <experiment.toml> [output_dir]");
        return Ok(());
    };
    let config = ExperimentConfig::load_from_file(path)?;
    let output_dir = args
        .get(1)
        .map(PathBuf::from)
        .or_else(|| config.output.directory.clone())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR));

    let tee = Arc::new(Tee {
        log: LogObserver,
        kept: CollectingObserver::new(),
    });
    let layer = config.build_layer(tee.clone())?;
    if let Some(layer) = &layer {
        if let Some(reduction) = tee.kept.metric("matrix_size_reduction_pct") {
            log::info!(
                "surface: {} sites kept, {:.1}% removed by the loading cutoff",
                layer.compressed().len(),
                reduction
            );
        }
        io::export_surface(&output_dir, layer)?;
    }

    let outcome = config.run_on(layer.as_ref(), tee.clone())?;
    match &outcome {
        ExperimentOutcome::Cv(cv) => log::info!("CV: {} samples", cv.sequence.len()),
        ExperimentOutcome::Swv(swv) => log::info!(
            "SWV: {} samples, {} differential points",
            swv.sequence.len(),
            swv.differential_current.len()
        ),
        ExperimentOutcome::VfSwv(vf) => {
            let (rows, cols) = vf.matrix.dim();
            log::info!("VF-SWV: {rows} frequencies x {cols} potentials");
        }
    }
    io::export_result(&output_dir, &outcome)?;
    Ok(())
}
