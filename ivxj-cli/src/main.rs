//! IVXJ CLI: estimate predictive slopes on panel tables and simulate panels.
//!
//! Commands:
//! - `estimate`: load a CSV/Parquet panel and report the IVXJ estimate
//! - `simulate`: write a synthetic unbalanced panel as CSV

mod export;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use ivxj_core::simulate::random_lengths;
use ivxj_core::{
    dataset_hash, load_panel, ColumnRef, ColumnRole, EstimatorConfig, IvxjEstimator, PanelDgp,
};

use export::{build_report, export_json, export_panel_csv, export_text, unit_labels};

#[derive(Parser)]
#[command(
    name = "ivxj",
    about = "IVXJ: bias-corrected IVX estimation on unbalanced panels",
    version
)]
struct Cli {
    /// Log verbosity level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "warn")]
    log_level: tracing::Level,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Estimate the predictive slope from a long-format panel table.
    Estimate {
        /// Input table (.csv or .parquet).
        #[arg(long)]
        input: PathBuf,

        /// Instrument persistence. Overrides the config file (default 0.95).
        #[arg(long, allow_negative_numbers = true)]
        rhoz: Option<f64>,

        /// TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Unit identity column (name or zero-based position).
        #[arg(long)]
        id: Option<String>,

        /// Time column (name or zero-based position).
        #[arg(long)]
        time: Option<String>,

        /// Dependent variable column (name or zero-based position).
        #[arg(long)]
        y: Option<String>,

        /// Regressor column (name or zero-based position).
        #[arg(long)]
        x: Option<String>,

        /// Run the jackknife on the calling thread.
        #[arg(long, default_value_t = false)]
        sequential: bool,

        /// Print the report as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,

        /// Write the report to this file instead of stdout.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Simulate an unbalanced panel and write it as CSV (id,time,y,x).
    Simulate {
        /// Number of units.
        #[arg(long)]
        units: usize,

        /// Shortest unit length.
        #[arg(long)]
        min_periods: usize,

        /// Longest unit length.
        #[arg(long)]
        max_periods: usize,

        /// AR coefficient of the regressor.
        #[arg(long, default_value_t = 0.9, allow_negative_numbers = true)]
        rho: f64,

        /// Predictive slope.
        #[arg(long, default_value_t = 0.5, allow_negative_numbers = true)]
        beta: f64,

        /// Correlation of the innovations.
        #[arg(long, default_value_t = -0.5, allow_hyphen_values = true)]
        correlation: f64,

        /// Burn-in periods discarded per unit.
        #[arg(long, default_value_t = 50)]
        burn_in: usize,

        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Output CSV file.
        #[arg(long)]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(cli.log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Estimate {
            input,
            rhoz,
            config,
            id,
            time,
            y,
            x,
            sequential,
            json,
            output,
        } => {
            let overrides = ColumnOverrides { id, time, y, x };
            let config = resolve_config(config.as_deref(), rhoz, overrides, sequential)?;
            run_estimate(&input, &config, json, output.as_deref())
        }
        Commands::Simulate {
            units,
            min_periods,
            max_periods,
            rho,
            beta,
            correlation,
            burn_in,
            seed,
            output,
        } => {
            let dgp = PanelDgp::new(rho, beta, correlation).with_burn_in(burn_in);
            run_simulate(&dgp, units, min_periods, max_periods, seed, &output)
        }
    }
}

struct ColumnOverrides {
    id: Option<String>,
    time: Option<String>,
    y: Option<String>,
    x: Option<String>,
}

/// Config file (or defaults) with command-line flags applied on top.
fn resolve_config(
    path: Option<&Path>,
    rhoz: Option<f64>,
    columns: ColumnOverrides,
    sequential: bool,
) -> Result<EstimatorConfig> {
    let mut config = match path {
        Some(path) => EstimatorConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => EstimatorConfig::default(),
    };

    if let Some(rhoz) = rhoz {
        config.rhoz = rhoz;
    }
    if sequential {
        config.parallel = false;
    }

    let flags = [
        (ColumnRole::Identity, columns.id),
        (ColumnRole::Time, columns.time),
        (ColumnRole::Dependent, columns.y),
        (ColumnRole::Independent, columns.x),
    ];
    for (role, value) in flags {
        if let Some(value) = value {
            config.columns = config.columns.with(role, ColumnRef::parse(&value));
        }
    }

    config.validate()?;
    Ok(config)
}

fn run_estimate(
    input: &Path,
    config: &EstimatorConfig,
    json: bool,
    output: Option<&Path>,
) -> Result<()> {
    let frame = load_panel(input, &config.columns)
        .with_context(|| format!("failed to load panel from {}", input.display()))?;
    let hash = dataset_hash(frame.panel());

    let result = IvxjEstimator::new()
        .with_parallelism(config.parallel)
        .estimate(frame.panel(), config.rhoz)
        .context("estimation failed")?;

    let report = build_report(
        &input.display().to_string(),
        &frame,
        hash,
        config.rhoz,
        result,
    )?;
    let rendered = if json {
        export_json(&report)?
    } else {
        export_text(&report)
    };

    match output {
        Some(path) => {
            std::fs::write(path, rendered)
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!(path = %path.display(), "report written");
        }
        None => print!("{rendered}"),
    }
    Ok(())
}

fn run_simulate(
    dgp: &PanelDgp,
    units: usize,
    min_periods: usize,
    max_periods: usize,
    seed: u64,
    output: &Path,
) -> Result<()> {
    if units == 0 {
        bail!("--units must be at least 1");
    }
    if min_periods == 0 || min_periods > max_periods {
        bail!("need 1 <= --min-periods <= --max-periods, got {min_periods}..{max_periods}");
    }

    let lengths = random_lengths(units, min_periods, max_periods, seed)?;
    let panel = dgp.generate(&lengths, seed)?;
    let csv = export_panel_csv(&panel, &unit_labels(units))?;
    std::fs::write(output, csv).with_context(|| format!("failed to write {}", output.display()))?;

    info!(
        units,
        observations = panel.observations(),
        path = %output.display(),
        "simulated panel written"
    );
    println!(
        "Wrote {} units ({} observations) to {}",
        units,
        panel.observations(),
        output.display()
    );
    Ok(())
}
