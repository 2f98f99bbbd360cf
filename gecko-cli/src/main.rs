//! Gecko CLI - Command line interface
//!
//! Loads a project file, builds it on the simulated hardware and runs the
//! tick loop.

use clap::Parser;
use std::path::PathBuf;
use std::process;

mod config;
mod logging;
mod platform;

use crate::config::{parse_log_level, parse_phase_level, LogConfig};
use crate::logging::{LogFormat, TracingSink};
use crate::platform::{print_error, print_summary};
use gecko_api::gecko_log::Logger;
use gecko_api::{Phase, Project};

#[derive(Parser)]
#[command(
    name = "gecko",
    about = "Gecko control loop - run a project on simulated hardware",
    version = "0.1.0"
)]
struct Cli {
    /// Project file path (default: ./gecko.json)
    #[arg(value_name = "PROJECT", default_value = "gecko.json")]
    project: PathBuf,

    /// Stop after this many ticks (overrides the project)
    #[arg(long)]
    ticks: Option<u64>,

    /// Tick period in milliseconds (overrides the project)
    #[arg(long)]
    interval_ms: Option<u64>,

    /// Stop at the first tick that reports an error
    #[arg(long)]
    stop_on_error: bool,

    /// 日志级别: silent, error, warn, info, debug, trace
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Per-phase level, e.g. `--phase-level bus=trace` (repeatable)
    #[arg(long = "phase-level", value_name = "PHASE=LEVEL", value_parser = parse_phase_level)]
    phase_levels: Vec<(Phase, tracing::Level)>,

    #[arg(long, value_enum, default_value_t = LogFormat::Pretty)]
    log_format: LogFormat,

    /// Also append logs to this file
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Print the run summary as JSON
    #[arg(long)]
    json: bool,
}

fn main() {
    let cli = Cli::parse();

    let log_config = match build_log_config(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(2);
        }
    };
    if let Err(e) = logging::init(&log_config, cli.log_format, cli.log_file.as_deref()) {
        eprintln!("Error: {}", e);
        process::exit(2);
    }

    let logger = Logger::new(log_config.runtime_level()).with_sink(TracingSink);

    let mut project = match Project::load(&cli.project) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error: cannot load '{}'", cli.project.display());
            print_error(&e);
            process::exit(1);
        }
    };
    if let Some(ticks) = cli.ticks {
        project.tick.max_ticks = Some(ticks);
    }
    if let Some(interval) = cli.interval_ms {
        project.tick.interval_ms = interval;
    }

    let mut run_config = project.run_config(logger);
    run_config.stop_on_error = cli.stop_on_error;
    tracing::debug!(target: "gecko::build", config = ?run_config, "building {}", cli.project.display());

    let mut session = match project.build(run_config) {
        Ok(s) => s,
        Err(e) => {
            print_error(&e);
            process::exit(1);
        }
    };

    let summary = session.run();
    print_summary(&summary, cli.json);
    if !summary.is_ok() {
        process::exit(1);
    }
}

fn build_log_config(cli: &Cli) -> Result<LogConfig, String> {
    let global = parse_log_level(&cli.log_level)
        .ok_or_else(|| format!("unknown log level '{}'", cli.log_level))?;
    let mut config = LogConfig::new(global);
    for (phase, level) in &cli.phase_levels {
        config.set_phase(*phase, *level);
    }
    Ok(config)
}
