//! Delegate Scenario CLI Application
//!
//! Command-line front end for the delegate-core library. It binds catalog
//! functions and methods to delegates and checks their results:
//! - Simple mode: bind one target and call it with inputs from the command line
//! - Config mode: run every scenario of a TOML file and write a report
//! - Catalog listing

use anyhow::{bail, Result};
use clap::Parser;
use std::path::{Path, PathBuf};

mod config;
mod report;
mod runner;
mod targets;

use config::{AppConfig, InstanceConfig, OutputFormat, ScenarioConfig};

/// Delegate CLI - Bind functions and methods to delegates and call them
#[derive(Parser, Debug)]
#[command(name = "delegate-cli")]
#[command(about = "Bind functions and methods to delegates and check their results", long_about = None)]
#[command(version)]
struct Args {
    /// Target to bind: "<function>" or "register.<method>"
    #[arg(short, long, value_name = "TARGET")]
    target: Option<String>,

    /// Input value passed to the target (can be repeated)
    #[arg(short, long, value_name = "N", allow_negative_numbers = true)]
    input: Vec<i64>,

    /// Value of the "register" instance used by method targets
    #[arg(long, value_name = "N", default_value_t = 0, allow_negative_numbers = true)]
    value: i64,

    /// Path to scenario file (scenarios.toml)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Report format, overrides the scenario file
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// Report file, overrides the scenario file (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// List bindable functions and methods
    #[arg(long)]
    list: bool,

    /// Verbosity level (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging
    init_logging(args.verbose, args.quiet);

    log::info!("Delegate CLI v{}", env!("CARGO_PKG_VERSION"));
    log::info!("Using delegate-core v{}", delegate_core::VERSION);

    if args.list {
        list_catalog();
    } else if let Some(target) = &args.target {
        simple_mode(target, &args)?;
    } else if let Some(config_path) = &args.config {
        config_mode(config_path, &args)?;
    } else {
        // No arguments - show help
        println!("Delegate CLI - No input specified");
        println!("\nQuick Start:");
        println!("  delegate-cli --target double --input 21");
        println!("  delegate-cli --target register.add --value 5 --input 10");
        println!("\nFor scenario files:");
        println!("  delegate-cli --config scenarios.toml");
        println!("\nUse --list to show bindable targets, --help for more options");
    }

    Ok(())
}

fn list_catalog() {
    println!("Free functions  (i64) -> i64:");
    for name in targets::FUNCTIONS {
        println!("  {}", name);
    }
    println!("\nRegister methods  (&Register, i64) -> i64:");
    for name in targets::METHODS {
        println!("  <instance>.{}", name);
    }
}

/// Simple mode - bind one target on a default "register" instance and call it
fn simple_mode(target: &str, args: &Args) -> Result<()> {
    let scenario = ScenarioConfig {
        name: target.to_string(),
        target: target.to_string(),
        inputs: args.input.clone(),
        expect: None,
        rebind: None,
        expect_rebind: None,
    };
    let config = AppConfig {
        instances: vec![InstanceConfig {
            name: "register".to_string(),
            value: args.value,
        }],
        scenarios: vec![scenario],
        ..AppConfig::default()
    };
    config.validate()?;

    let outcome = runner::run_scenario(&config.scenarios[0], &config.instances);
    if let Some(error) = &outcome.error {
        bail!("{}", error);
    }

    for pass in &outcome.passes {
        for (input, output) in outcome.inputs.iter().zip(&pass.outputs) {
            println!("{}({}) = {}", pass.target, input, output);
        }
    }
    Ok(())
}

/// Config mode - run every scenario of the file and write a report
fn config_mode(config_path: &Path, args: &Args) -> Result<()> {
    log::info!("Loading configuration from: {:?}", config_path);
    let config = config::load_config(config_path)?;
    log::debug!(
        "Configuration loaded: {} instance(s), {} scenario(s)",
        config.instances.len(),
        config.scenarios.len()
    );

    let outcomes = runner::run_all(&config);
    let report = report::RunReport::new(outcomes);

    let format = args.format.unwrap_or(config.run.format);
    let output = args.output.as_deref().or(config.run.output.as_deref());
    report::write_report(&report, format, output)?;

    if !report.all_passed() {
        bail!("{} of {} scenario(s) failed", report.failed, report.scenarios.len());
    }
    Ok(())
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;
    use std::io::Write;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}
