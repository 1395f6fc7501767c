// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Printquote CLI

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use printquote::batch::{run_batch, BatchOptions};
use printquote::cli::Reporter;
use printquote::io::MeshFormat;
use printquote::{check_request, LocalObjectStore, QuoteConfig, QuoteEngine, QuoteRequest};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "printquote")]
#[command(version, about = "Instant 3D-printing quotes for STL, 3MF and OBJ files", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (defaults to ./printquote.toml when present)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only print errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Quote a single model file
    Quote {
        /// Model file (.stl, .3mf, .obj)
        file: PathBuf,

        /// Material key (PLA, PETG, TPU)
        #[arg(short, long, default_value = "PLA")]
        material: String,

        /// Uniform scale factor
        #[arg(short, long, default_value_t = 1.0)]
        scale: f64,

        /// Print the quote as JSON
        #[arg(long)]
        json: bool,

        /// Store a copy of the file in this directory
        #[arg(long, value_name = "DIR")]
        store_dir: Option<PathBuf>,
    },

    /// Quote every model file under the given paths
    Batch {
        /// Files or directories
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Material key (PLA, PETG, TPU)
        #[arg(short, long, default_value = "PLA")]
        material: String,

        /// Uniform scale factor
        #[arg(short, long, default_value_t = 1.0)]
        scale: f64,

        /// Output directory for report.json and report.md
        #[arg(short, long, default_value = "quotes")]
        out: PathBuf,
    },

    /// Decode, repair and measure a file without pricing it
    Inspect {
        file: PathBuf,

        /// Uniform scale factor
        #[arg(short, long, default_value_t = 1.0)]
        scale: f64,
    },

    /// List available materials
    Materials,

    /// Show the effective configuration
    Config {
        /// Write it to this file instead of printing
        #[arg(long, value_name = "FILE")]
        write: Option<PathBuf>,
    },
}

fn init_tracing(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        let level = match verbose {
            0 => "warn",
            1 => "printquote=info",
            2 => "printquote=debug",
            _ => "trace",
        };
        EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .with(filter)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let config = QuoteConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Quote {
            file,
            material,
            scale,
            json,
            store_dir,
        } => quote_command(config, &file, &material, scale, json, store_dir),
        Commands::Batch {
            paths,
            material,
            scale,
            out,
        } => batch_command(config, &paths, material, scale, &out, cli.quiet),
        Commands::Inspect { file, scale } => inspect_command(config, &file, scale),
        Commands::Materials => {
            Reporter::report_materials();
            Ok(())
        }
        Commands::Config { write } => config_command(&config, write.as_deref()),
    }
}

fn quote_command(
    config: QuoteConfig,
    file: &Path,
    material: &str,
    scale: f64,
    json: bool,
    store_dir: Option<PathBuf>,
) -> Result<()> {
    let mut engine = QuoteEngine::new(config);
    if let Some(dir) = store_dir {
        engine = engine.with_store(Arc::new(LocalObjectStore::new(dir)));
    }

    if let Err(e) = check_request(&file_name(file), material, Some(scale)) {
        Reporter::report_error(&format!("{} ({})", e, e.kind()));
        std::process::exit(2);
    }

    let request = QuoteRequest::from_path(file, material)
        .with_context(|| format!("Failed to read {}", file.display()))?
        .with_scale(scale);

    let start = Instant::now();
    match engine.quote(&request) {
        Ok(quote) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&quote)?);
            } else {
                Reporter::report_quote(&quote, start.elapsed());
            }
            Ok(())
        }
        Err(e) => {
            Reporter::report_error(&format!("{} ({})", e, e.kind()));
            std::process::exit(if e.is_request_error() { 2 } else { 1 });
        }
    }
}

fn batch_command(
    config: QuoteConfig,
    paths: &[PathBuf],
    material: String,
    scale: f64,
    out: &Path,
    quiet: bool,
) -> Result<()> {
    let engine = QuoteEngine::new(config);
    let options = BatchOptions {
        material,
        scale: Some(scale),
        progress: !quiet,
    };

    let start = Instant::now();
    let report = run_batch(&engine, paths, &options, out)?;
    Reporter::report_batch(&report, start.elapsed());
    Reporter::success(&format!("Reports written to {}", out.display()));

    if !report.errors.is_empty() {
        std::process::exit(1);
    }
    Ok(())
}

fn inspect_command(config: QuoteConfig, file: &Path, scale: f64) -> Result<()> {
    let filename = file_name(file);
    if let Err(e) = MeshFormat::from_filename(&filename) {
        Reporter::report_error(&format!("{} ({})", e, e.kind()));
        std::process::exit(2);
    }

    let bytes = std::fs::read(file).with_context(|| format!("Failed to read {}", file.display()))?;

    match QuoteEngine::new(config).inspect(&bytes, &filename, Some(scale)) {
        Ok(inspection) => {
            Reporter::report_inspection(&filename, &inspection);
            Ok(())
        }
        Err(e) => {
            Reporter::report_error(&format!("{} ({})", e, e.kind()));
            std::process::exit(1);
        }
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn config_command(config: &QuoteConfig, write: Option<&Path>) -> Result<()> {
    match write {
        Some(path) => {
            config.save(path)?;
            Reporter::success(&format!("Configuration written to {}", path.display()));
        }
        None => Reporter::report_config(&config.to_toml_string()?, config),
    }
    Ok(())
}
