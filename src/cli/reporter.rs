// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! CLI output reporter with colored formatting

use crate::batch::BatchReport;
use crate::engine::{Inspection, Quote};
use crate::geometry::RepairReport;
use crate::pricing::{Material, QuoteConfig};
use colored::*;
use std::time::Duration;

/// CLI reporter for formatted output
pub struct Reporter;

impl Reporter {
    /// Report a single quote
    pub fn report_quote(quote: &Quote, duration: Duration) {
        let b = &quote.breakdown;
        let e = &quote.metrics.extents_mm;

        println!("\n{}", "━".repeat(60).bright_black());
        println!("{} {}", "File:".bold(), quote.file_name.cyan());
        println!("{}", "━".repeat(60).bright_black());

        println!(
            "  {} {} | {} {} | {} {}",
            "Format:".bright_black(),
            quote.format.to_string().cyan(),
            "Material:".bright_black(),
            quote.material.to_string().cyan(),
            "Scale:".bright_black(),
            quote.scale
        );

        println!("\n{}", "Geometry:".bold());
        Self::print_row("Volume", &format!("{:.2} cm³", b.bulk_volume_cm3));
        Self::print_row("Surface", &format!("{:.2} cm²", quote.metrics.area_cm2));
        Self::print_row("Size", &format!("{:.1} × {:.1} × {:.1} mm", e.x, e.y, e.z));
        Self::print_watertight(b.watertight, &quote.repair);

        println!("\n{}", "Print:".bold());
        Self::print_row("Printed volume", &format!("{:.2} cm³", b.printed_volume_cm3));
        Self::print_row("Weight", &format!("{:.1} g", b.weight_g));
        Self::print_row("Print time", &b.print_time_label);
        Self::print_row("Bed occupancy", &format!("{:.1}%", b.bed_occupancy * 100.0));

        println!("\n{}", "Cost:".bold());
        Self::print_row("Material", &format!("{:.2}", b.material_cost));
        Self::print_row("Machine", &format!("{:.2}", b.machine_cost));
        if b.bed_surcharge > 0.0 {
            Self::print_row("Bed surcharge", &format!("{:.2}", b.bed_surcharge));
        }
        println!(
            "  {} {}",
            "Price:".bold(),
            format!("{:.2}", b.final_price).green().bold()
        );

        for warning in &b.warnings {
            Self::report_warning(&warning.to_string());
        }

        if let Some(ref storage) = quote.storage_ref {
            Self::print_row("Stored", storage.as_str());
        }

        println!(
            "\n  {} {}",
            "Time:".bright_black(),
            Self::format_duration(duration).yellow()
        );
        println!("{}", "━".repeat(60).bright_black());
    }

    /// Report geometry without pricing
    pub fn report_inspection(file: &str, inspection: &Inspection) {
        println!("{} {} ({})", "Inspecting:".bold(), file.cyan(), inspection.format);
        if inspection.fragments > 1 {
            Self::report_info(&format!("merged {} mesh fragments", inspection.fragments));
        }
        inspection.metrics.print();
        Self::print_watertight(inspection.metrics.watertight, &inspection.repair);
    }

    /// Report batch summary
    pub fn report_batch(report: &BatchReport, duration: Duration) {
        println!("\n{}", "━".repeat(60).bright_black());
        println!("{} {}", "Batch:".bold(), report.material.cyan());
        println!("{}", "━".repeat(60).bright_black());

        for quote in &report.quotes {
            let marker = if quote.breakdown.warnings.is_empty() {
                "✅".green()
            } else {
                "⚠️".yellow()
            };
            println!(
                "  {} {:<40} {:>10}",
                marker,
                quote.file_name,
                format!("{:.2}", quote.final_price()).green()
            );
        }
        for error in &report.errors {
            println!("  {} {:<40} {}", "❌".red(), error.file, error.message.red());
        }

        println!(
            "\n  {} {}/{} | {} {} | {} {}",
            "Quoted:".bright_black(),
            report.quotes.len(),
            report.total_files,
            "Total:".bright_black(),
            format!("{:.2}", report.total_price).green().bold(),
            "Time:".bright_black(),
            Self::format_duration(duration).yellow()
        );
        println!("{}", "━".repeat(60).bright_black());
    }

    /// Print the material table
    pub fn report_materials() {
        println!(
            "{:<6} {:>14} {:>12} {:>18}",
            "Key".bold(),
            "Density g/cm³".bold(),
            "Price €/kg".bold(),
            "Extrusion mm³/s".bold()
        );
        for material in Material::ALL {
            let p = material.profile();
            println!(
                "{:<6} {:>14.2} {:>12.2} {:>18.1}",
                material.key().cyan(),
                p.density_g_cm3,
                p.price_per_kg,
                p.extrusion_rate_mm3_s
            );
        }
    }

    /// Print effective configuration as TOML
    pub fn report_config(toml: &str, config: &QuoteConfig) {
        println!(
            "{} {:.0} × {:.0} × {:.0} mm",
            "# bed:".bright_black(),
            config.bed.max_x_mm,
            config.bed.max_y_mm,
            config.bed.max_z_mm
        );
        print!("{}", toml);
    }

    /// Report error
    pub fn report_error(message: &str) {
        eprintln!("\n{} {}", "❌ Error:".red().bold(), message);
    }

    /// Report warning
    pub fn report_warning(message: &str) {
        println!("{} {}", "⚠️  Warning:".yellow().bold(), message);
    }

    /// Report info
    pub fn report_info(message: &str) {
        println!("{} {}", "ℹ️".bright_blue(), message);
    }

    /// Print success message
    pub fn success(message: &str) {
        println!("{} {}", "✅".green(), message.green());
    }

    fn print_row(name: &str, value: &str) {
        println!("  {} {}", format!("{}:", name).bright_black(), value);
    }

    fn print_watertight(watertight: bool, repair: &RepairReport) {
        let status = if watertight { "yes".green() } else { "no".red() };
        let detail = Self::repair_summary(repair);
        println!(
            "  {} {} {}",
            "Watertight:".bright_black(),
            status,
            detail.bright_black()
        );
    }

    fn repair_summary(repair: &RepairReport) -> String {
        if !repair.attempted {
            return String::new();
        }
        let mut parts = Vec::new();
        if repair.vertices_welded > 0 {
            parts.push(format!("{} vertices welded", repair.vertices_welded));
        }
        parts.push(format!("{} faces flipped", repair.faces_flipped));
        parts.push(format!("{} holes filled", repair.holes_filled));
        format!("(repaired: {})", parts.join(", "))
    }

    /// Format duration for display
    fn format_duration(duration: Duration) -> String {
        let micros = duration.as_micros();

        if micros < 1_000 {
            format!("{}µs", micros)
        } else if micros < 1_000_000 {
            format!("{:.2}ms", micros as f64 / 1_000.0)
        } else {
            format!("{:.2}s", micros as f64 / 1_000_000.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(
            Reporter::format_duration(Duration::from_micros(500)),
            "500µs"
        );
        assert_eq!(
            Reporter::format_duration(Duration::from_millis(5)),
            "5.00ms"
        );
        assert_eq!(Reporter::format_duration(Duration::from_secs(2)), "2.00s");
    }

    #[test]
    fn test_repair_summary() {
        assert_eq!(Reporter::repair_summary(&RepairReport::default()), "");
        let repaired = RepairReport {
            attempted: true,
            vertices_welded: 0,
            faces_flipped: 1,
            holes_filled: 2,
        };
        assert_eq!(
            Reporter::repair_summary(&repaired),
            "(repaired: 1 faces flipped, 2 holes filled)"
        );
        let welded = RepairReport {
            vertices_welded: 28,
            ..repaired
        };
        assert_eq!(
            Reporter::repair_summary(&welded),
            "(repaired: 28 vertices welded, 1 faces flipped, 2 holes filled)"
        );
    }
}
