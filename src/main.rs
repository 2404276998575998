//! Ising temperature-scan command-line interface
//!
//! Runs a temperature scan over a 2D Ising lattice from a YAML
//! configuration, optionally locating the critical temperature at the
//! susceptibility peak.

use std::fs::File;
use std::path::Path;
use std::sync::Mutex;

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use tracing::info;

use ising_mc::config::ScanConfig;
use ising_mc::scan::{
    find_critical_temperature, scan_temperature, CriticalTemperatureEstimate, ScanParams,
    ScanResult,
};

/// Temperature scan defaults of the critical-temperature mode: a narrower
/// range around the transition and longer sampling.
const TC_T_MIN: f64 = 1.5;
const TC_T_MAX: f64 = 3.5;
const TC_T_STEPS: usize = 30;
const TC_EQUILIBRATION_STEPS: usize = 3000;
const TC_MEASUREMENT_STEPS: usize = 1500;

/// 2D Ising model temperature scans with YAML configuration
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the YAML configuration file
    #[arg(short, long, default_value = "scan.yaml")]
    config_file: String,

    /// Locate the critical temperature instead of reporting the raw scan
    #[arg(long)]
    critical_temperature: bool,

    /// Override lattice size
    #[arg(long)]
    size: Option<usize>,

    /// Override exchange coupling J
    #[arg(long)]
    coupling: Option<f64>,

    /// Override external field B
    #[arg(long)]
    field: Option<f64>,

    /// Override lowest scanned temperature
    #[arg(long)]
    t_min: Option<f64>,

    /// Override highest scanned temperature
    #[arg(long)]
    t_max: Option<f64>,

    /// Override number of temperature points
    #[arg(long)]
    t_steps: Option<usize>,

    /// Override burn-in trials per temperature point
    #[arg(long)]
    equilibration_steps: Option<usize>,

    /// Override measured trials per temperature point
    #[arg(long)]
    measurement_steps: Option<usize>,

    /// Seed for deterministic runs
    #[arg(long)]
    seed: Option<u64>,

    /// Write results as JSON to this file
    #[arg(long)]
    results: Option<String>,

    /// Override output file for logs (default stdout)
    #[arg(short, long)]
    output: Option<String>,
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Args::parse();
    setup_output(args.output.as_ref());

    let mut params = load_params(&args)?;
    apply_overrides(&mut params, &args);

    if args.critical_temperature {
        let estimate = find_critical_temperature(&params)
            .wrap_err("critical-temperature estimation failed")?;
        print_estimate(&estimate);
        write_results(args.results.as_ref(), &estimate)?;
    } else {
        let result = scan_temperature(&params).wrap_err("temperature scan failed")?;
        print_scan(&result);
        write_results(args.results.as_ref(), &result)?;
    }

    Ok(())
}

/// Setup output logging to file or stdout
fn setup_output(output_path: Option<&String>) {
    match output_path {
        Some(path) => {
            if let Ok(log) = File::create(path) {
                tracing_subscriber::fmt()
                    .with_writer(Mutex::new(log))
                    .with_ansi(false)
                    .init();
            } else {
                eprintln!("Could not create output file: {}", path);
            }
        }
        None => {
            tracing_subscriber::fmt().init();
        }
    }
}

/// Resolve scan parameters from the configuration file.
///
/// A missing file falls back to the stock defaults; the
/// critical-temperature mode swaps in its own range and sampling lengths
/// before command-line overrides are applied.
fn load_params(args: &Args) -> Result<ScanParams> {
    let config = if Path::new(&args.config_file).exists() {
        info!("Reading configuration from: {}", args.config_file);
        ScanConfig::from_file(&args.config_file)
            .wrap_err_with(|| format!("Unable to load configuration: {}", args.config_file))?
    } else {
        info!(
            "Configuration file {} not found, using defaults",
            args.config_file
        );
        let mut config = ScanConfig::default();
        if args.critical_temperature {
            config.scan.t_min = TC_T_MIN;
            config.scan.t_max = TC_T_MAX;
            config.scan.t_steps = TC_T_STEPS;
            config.sampling.equilibration_steps = TC_EQUILIBRATION_STEPS;
            config.sampling.measurement_steps = TC_MEASUREMENT_STEPS;
        }
        config
    };

    Ok(config.params())
}

fn apply_overrides(params: &mut ScanParams, args: &Args) {
    if let Some(size) = args.size {
        info!("Overriding lattice size with: {}", size);
        params.size = size;
    }
    if let Some(coupling) = args.coupling {
        info!("Overriding coupling with: {}", coupling);
        params.coupling = coupling;
    }
    if let Some(field) = args.field {
        info!("Overriding field with: {}", field);
        params.field = field;
    }
    if let Some(t_min) = args.t_min {
        params.t_min = t_min;
    }
    if let Some(t_max) = args.t_max {
        params.t_max = t_max;
    }
    if let Some(t_steps) = args.t_steps {
        params.t_steps = t_steps;
    }
    if let Some(equilibration_steps) = args.equilibration_steps {
        params.equilibration_steps = equilibration_steps;
    }
    if let Some(measurement_steps) = args.measurement_steps {
        params.measurement_steps = measurement_steps;
    }
    if let Some(seed) = args.seed {
        params.seed = Some(seed);
    }
}

fn print_scan(result: &ScanResult) {
    println!("┌──────────┬──────────┬──────────┬──────────┬──────────┬──────────┐");
    println!("│    T     │  <|m|>   │  std(m)  │    χ     │    c     │  <E>/N   │");
    println!("├──────────┼──────────┼──────────┼──────────┼──────────┼──────────┤");
    for point in &result.points {
        println!(
            "│ {:8.4} │ {:8.4} │ {:8.4} │ {:8.4} │ {:8.4} │ {:8.4} │",
            point.temperature,
            point.mean_abs_magnetization,
            point.magnetization_std_dev,
            point.susceptibility,
            point.specific_heat,
            point.mean_energy
        );
    }
    println!("└──────────┴──────────┴──────────┴──────────┴──────────┴──────────┘");
}

fn print_estimate(estimate: &CriticalTemperatureEstimate) {
    print_scan(&estimate.scan);
    println!();
    println!("Critical temperature from susceptibility peak:");
    println!("  T_c (experimental) = {:.4}", estimate.t_c_experimental);
    println!("  chi at peak        = {:.4}", estimate.chi_max);
    println!("  T_c (theoretical)  = {:.4}", estimate.t_c_theoretical);
    println!("  relative error     = {:.2}%", estimate.error_percent);
}

fn write_results<T: serde::Serialize>(path: Option<&String>, results: &T) -> Result<()> {
    if let Some(path) = path {
        let file = File::create(path)
            .wrap_err_with(|| format!("Unable to create results file: {}", path))?;
        serde_json::to_writer_pretty(file, results).wrap_err("Failed to serialize results")?;
        info!("Results written to: {}", path);
    }
    Ok(())
}
