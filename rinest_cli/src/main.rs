#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
//! `rinest`: run the internal-resistance estimator against simulated or recorded telemetry.

mod cli;
mod error_fmt;
mod run;
mod sink;

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;
use eyre::WrapErr;
use rinest_config::{Config, Logging};
use rinest_core::EstimatorError;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

use crate::cli::{Cli, Commands, FILE_GUARD, JSON_MODE};
use crate::error_fmt::{exit_code_for_error, format_error_json, humanize};

fn main() {
    if let Err(e) = color_eyre::install() {
        eprintln!("failed to install error reporter: {e}");
    }
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);

    if let Err(err) = real_main(cli) {
        tracing::error!(error = %format!("{err:#}"), "run failed");
        if JSON_MODE.get().copied().unwrap_or(false) {
            println!("{}", format_error_json(&err));
        } else {
            println!("{}", humanize(&err));
        }
        std::process::exit(exit_code_for_error(&err));
    }
}

fn real_main(cli: Cli) -> eyre::Result<()> {
    let cfg = load_config(cli.config.as_deref())?;
    init_tracing(&cli, &cfg.logging)?;
    tracing::debug!(config = ?cli.config, "configuration loaded");

    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let flag = Arc::clone(&shutdown);
        if let Err(e) = ctrlc::set_handler(move || flag.store(true, Ordering::Relaxed)) {
            tracing::warn!(
                error = %e,
                "Ctrl-C handler not installed; interrupt will not stop cleanly"
            );
        }
    }

    match cli.cmd {
        Commands::Simulate {
            seconds,
            current,
            pulse,
            pulse_period,
            duty,
            r_series,
            noise,
            seed,
            run: opts,
        } => {
            let sim = run::SimSettings {
                seconds,
                current,
                pulse,
                pulse_period,
                duty,
                r_series,
                noise,
                seed,
            };
            run::simulate(&cfg, &sim, &opts, shutdown, cli.json)?;
        }
        Commands::Replay { input, run: opts } => {
            run::replay(&cfg, &input, &opts, shutdown, cli.json)?;
        }
        Commands::SelfCheck => run::self_check(&cfg, cli.json)?,
    }
    Ok(())
}

/// Read and validate the config; without `--config` the nominal defaults apply.
fn load_config(path: Option<&Path>) -> eyre::Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let text = std::fs::read_to_string(path).map_err(|e| {
        eyre::Report::new(EstimatorError::Config(format!("read {}: {e}", path.display())))
    })?;
    let cfg = rinest_config::load_toml(&text).map_err(|e| {
        eyre::Report::new(EstimatorError::Config(format!("parse {}: {e}", path.display())))
    })?;
    cfg.validate()
        .map_err(|e| eyre::Report::new(EstimatorError::Config(format!("{e:#}"))))?;
    Ok(cfg)
}

/// Console logs go to stderr so stdout carries only results. `RUST_LOG`
/// overrides `--log-level`. An optional JSON log file follows `[logging]`.
fn init_tracing(cli: &Cli, logging: &Logging) -> eyre::Result<()> {
    let console_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cli.log_level))
        .wrap_err_with(|| format!("invalid log level {:?}", cli.log_level))?;

    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();
    if cli.json {
        layers.push(
            fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_filter(console_filter)
                .boxed(),
        );
    } else {
        layers.push(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_filter(console_filter)
                .boxed(),
        );
    }

    if let Some(file) = logging.file.as_deref() {
        let path = Path::new(file);
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let name = path
            .file_name()
            .ok_or_else(|| eyre::eyre!("logging.file {file:?} has no file name"))?;
        let appender = match logging.rotation.as_deref().unwrap_or("never") {
            "daily" => tracing_appender::rolling::daily(dir, name),
            "hourly" => tracing_appender::rolling::hourly(dir, name),
            _ => tracing_appender::rolling::never(dir, name),
        };
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let _ = FILE_GUARD.set(guard);
        let file_filter = EnvFilter::try_new(logging.level.as_deref().unwrap_or("info"))
            .wrap_err("invalid logging.level")?;
        layers.push(
            fmt::layer()
                .json()
                .with_ansi(false)
                .with_writer(writer)
                .with_filter(file_filter)
                .boxed(),
        );
    }

    tracing_subscriber::registry()
        .with(layers)
        .try_init()
        .wrap_err("initialize logging")?;
    Ok(())
}
