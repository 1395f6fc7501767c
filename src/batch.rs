// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Batch quoting over directories of model files
//!
//! Files are quoted in parallel, one engine invocation per worker, and the
//! results are gathered into a [`BatchReport`] written as JSON and Markdown.

use crate::engine::{check_request, Quote, QuoteEngine, QuoteRequest};
use crate::error::ErrorKind;
use crate::io::MeshFormat;
use anyhow::{Context, Result};
use chrono::Utc;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

/// Options shared by every file of a batch
#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub material: String,
    pub scale: Option<f64>,
    pub progress: bool,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            material: "PLA".to_string(),
            scale: None,
            progress: false,
        }
    }
}

/// A file that could not be quoted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchError {
    pub file: String,
    /// `None` when the file could not be read at all
    pub kind: Option<ErrorKind>,
    pub message: String,
}

/// Result of a batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub timestamp: String,
    pub material: String,
    pub total_files: usize,
    pub quotes: Vec<Quote>,
    pub errors: Vec<BatchError>,
    pub total_price: f64,
}

impl BatchReport {
    pub fn new(material: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            material: material.into(),
            total_files: 0,
            quotes: Vec::new(),
            errors: Vec::new(),
            total_price: 0.0,
        }
    }

    pub fn add_quote(&mut self, quote: Quote) {
        self.total_files += 1;
        self.total_price += quote.final_price();
        self.quotes.push(quote);
    }

    pub fn add_error(&mut self, error: BatchError) {
        self.total_files += 1;
        self.errors.push(error);
    }

    pub fn success_rate(&self) -> f64 {
        if self.total_files == 0 {
            0.0
        } else {
            self.quotes.len() as f64 / self.total_files as f64 * 100.0
        }
    }

    /// Write JSON report
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).with_context(|| format!("Failed to write {:?}", path))?;
        Ok(())
    }

    /// Write Markdown report
    pub fn write_markdown(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_markdown()).with_context(|| format!("Failed to write {:?}", path))?;
        Ok(())
    }

    pub fn to_markdown(&self) -> String {
        let mut md = String::new();

        md.push_str(&format!("# Print Quote Report ({})\n\n", self.material));

        md.push_str("## Summary\n\n");
        md.push_str(&format!("- **Files**: {}\n", self.total_files));
        md.push_str(&format!(
            "- **Quoted**: {} ({:.1}%)\n",
            self.quotes.len(),
            self.success_rate()
        ));
        md.push_str(&format!("- **Errors**: {}\n", self.errors.len()));
        md.push_str(&format!("- **Total Price**: {:.2}\n\n", self.total_price));

        if !self.quotes.is_empty() {
            md.push_str("## Quotes\n\n");
            md.push_str("| File | Volume (cm³) | Weight (g) | Print Time | Size (mm) | Watertight | Price |\n");
            md.push_str("|------|--------------|------------|------------|-----------|------------|-------|\n");

            for quote in &self.quotes {
                let b = &quote.breakdown;
                let e = &quote.metrics.extents_mm;
                md.push_str(&format!(
                    "| {} | {:.2} | {:.1} | {} | {:.1} × {:.1} × {:.1} | {} | {:.2} |\n",
                    quote.file_name,
                    b.bulk_volume_cm3,
                    b.weight_g,
                    b.print_time_label,
                    e.x,
                    e.y,
                    e.z,
                    if b.watertight { "✅" } else { "❌" },
                    b.final_price
                ));
            }

            let warnings: Vec<_> = self
                .quotes
                .iter()
                .flat_map(|q| q.breakdown.warnings.iter().map(move |w| (&q.file_name, w)))
                .collect();
            if !warnings.is_empty() {
                md.push_str("\n## Bed Warnings\n\n");
                for (file, warning) in warnings {
                    md.push_str(&format!("- ⚠️ **{}**: {}\n", file, warning));
                }
            }
        }

        if !self.errors.is_empty() {
            md.push_str("\n## Errors\n\n");
            for error in &self.errors {
                let kind = error.kind.map(|k| k.as_str()).unwrap_or("io_error");
                md.push_str(&format!("- ❌ **{}** (`{}`): {}\n", error.file, kind, error.message));
            }
        }

        md.push_str(&format!("\n---\n\n*Generated on {}*\n", self.timestamp));
        md
    }
}

/// Find quotable model files under the given paths, sorted
///
/// Explicit file arguments are kept only if their extension is supported.
pub fn discover_models(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut models = Vec::new();

    for path in paths {
        if path.is_file() {
            if is_model_file(path) {
                models.push(path.clone());
            }
        } else if path.is_dir() {
            for entry in WalkDir::new(path)
                .follow_links(true)
                .into_iter()
                .filter_map(|e| e.ok())
            {
                let entry_path = entry.path();
                if entry_path.is_file() && is_model_file(entry_path) {
                    models.push(entry_path.to_path_buf());
                }
            }
        }
    }

    models.sort();
    models.dedup();
    models
}

fn is_model_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| MeshFormat::from_extension(e).is_ok())
}

/// Quote every file in parallel
pub fn quote_files(engine: &QuoteEngine, files: &[PathBuf], options: &BatchOptions) -> BatchReport {
    let progress = if options.progress {
        let pb = ProgressBar::new(files.len() as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
        {
            pb.set_style(style.progress_chars("#>-"));
        }
        Some(pb)
    } else {
        None
    };

    let results: Vec<Result<Quote, BatchError>> = files
        .par_iter()
        .map(|path| {
            let result = quote_file(engine, path, options);
            if let Some(ref pb) = progress {
                pb.inc(1);
            }
            result
        })
        .collect();

    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    let mut report = BatchReport::new(options.material.trim().to_ascii_uppercase());
    for result in results {
        match result {
            Ok(quote) => report.add_quote(quote),
            Err(error) => {
                warn!("Failed to quote {}: {}", error.file, error.message);
                report.add_error(error);
            }
        }
    }
    report
}

fn quote_file(engine: &QuoteEngine, path: &Path, options: &BatchOptions) -> Result<Quote, BatchError> {
    let file = path.display().to_string();
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    check_request(&filename, &options.material, options.scale).map_err(|e| BatchError {
        file: file.clone(),
        kind: Some(e.kind()),
        message: e.to_string(),
    })?;

    let mut request = QuoteRequest::from_path(path, options.material.clone()).map_err(|e| BatchError {
        file: file.clone(),
        kind: None,
        message: e.to_string(),
    })?;
    request.scale = options.scale;

    engine.quote(&request).map_err(|e| BatchError {
        file,
        kind: Some(e.kind()),
        message: e.to_string(),
    })
}

/// Discover, quote, and write `report.json` and `report.md` into `output_dir`
pub fn run_batch(
    engine: &QuoteEngine,
    paths: &[PathBuf],
    options: &BatchOptions,
    output_dir: &Path,
) -> Result<BatchReport> {
    let files = discover_models(paths);
    let report = quote_files(engine, &files, options);

    fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create output directory {:?}", output_dir))?;
    report.write_json(&output_dir.join("report.json"))?;
    report.write_markdown(&output_dir.join("report.md"))?;

    Ok(report)
}
