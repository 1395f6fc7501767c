// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Cost model
//!
//! Maps measured geometry, a material profile, the bed spec and the pricing
//! constants to a [`CostBreakdown`]. Intermediate values stay unrounded; only
//! the final price is rounded for presentation.

use super::config::{PricingConstants, PrintBedSpec, MAX_PRICE_DECIMALS};
use super::material::{Material, MaterialProfile};
use crate::geometry::GeometryMetrics;
use serde::{Deserialize, Serialize};
use std::fmt;

const MM3_PER_CM3: f64 = 1000.0;
const GRAMS_PER_KG: f64 = 1000.0;
const SECONDS_PER_HOUR: f64 = 3600.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Axis::X => "X",
            Axis::Y => "Y",
            Axis::Z => "Z",
        };
        f.write_str(name)
    }
}

/// A part extent that does not fit the printer bed
///
/// Informational only; pricing continues.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BedWarning {
    pub axis: Axis,
    pub size_mm: f64,
    pub limit_mm: f64,
}

impl fmt::Display for BedWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} axis: {:.1} mm exceeds bed limit {:.1} mm",
            self.axis, self.size_mm, self.limit_mm
        )
    }
}

/// Priced result for one part
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostBreakdown {
    pub material: Material,
    /// Enclosed volume in cm³
    pub bulk_volume_cm3: f64,
    /// Surface area × shell thickness, in cm³
    pub shell_volume_cm3: f64,
    /// Bulk × infill plus shell, in cm³
    pub printed_volume_cm3: f64,
    pub weight_g: f64,
    pub material_cost: f64,
    pub machine_cost: f64,
    /// Flat surcharge applied (zero when the footprint is small)
    pub bed_surcharge: f64,
    /// Rounded price, never below the floor
    pub final_price: f64,
    pub print_time_seconds: f64,
    pub print_time_hours: f64,
    /// e.g. `"2h06m"`
    pub print_time_label: String,
    /// Footprint over bed area
    pub bed_occupancy: f64,
    pub warnings: Vec<BedWarning>,
    pub watertight: bool,
}

impl CostBreakdown {
    /// Margin-adjusted price before the floor and rounding
    pub fn raw_price(&self, constants: &PricingConstants) -> f64 {
        (self.material_cost + self.machine_cost + self.bed_surcharge) * constants.margin_multiplier
    }

    pub fn fits_bed(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// Price a measured part
pub fn price(
    metrics: &GeometryMetrics,
    profile: &MaterialProfile,
    bed: &PrintBedSpec,
    constants: &PricingConstants,
) -> CostBreakdown {
    let warnings = bed_warnings(metrics, bed);

    let shell_volume_cm3 = metrics.area_cm2 * constants.shell_thickness_cm;
    let printed_volume_cm3 = metrics.volume_cm3 * constants.infill_fraction + shell_volume_cm3;
    let weight_g = printed_volume_cm3 * profile.density_g_cm3;

    let print_time_seconds = printed_volume_cm3 * MM3_PER_CM3 / profile.extrusion_rate_mm3_s;
    let print_time_hours = print_time_seconds / SECONDS_PER_HOUR;

    let footprint_mm2 = metrics.extents_mm.x * metrics.extents_mm.y;
    let bed_occupancy = footprint_mm2 / bed.area_mm2();
    let bed_surcharge = if bed_occupancy > constants.bed_surcharge_threshold {
        constants.bed_surcharge
    } else {
        0.0
    };

    let material_cost = weight_g / GRAMS_PER_KG * profile.price_per_kg;
    let machine_cost = print_time_hours * constants.machine_hourly_rate;

    let raw = (material_cost + machine_cost + bed_surcharge) * constants.margin_multiplier;
    let final_price = final_price(raw, constants);

    CostBreakdown {
        material: profile.material,
        bulk_volume_cm3: metrics.volume_cm3,
        shell_volume_cm3,
        printed_volume_cm3,
        weight_g,
        material_cost,
        machine_cost,
        bed_surcharge,
        final_price,
        print_time_seconds,
        print_time_hours,
        print_time_label: format_print_time(print_time_seconds),
        bed_occupancy,
        warnings,
        watertight: metrics.watertight,
    }
}

/// Warnings for every axis whose scaled extent exceeds the bed, in X, Y, Z order
pub fn bed_warnings(metrics: &GeometryMetrics, bed: &PrintBedSpec) -> Vec<BedWarning> {
    Axis::ALL
        .into_iter()
        .zip(metrics.extents_mm.iter().copied())
        .zip(bed.limits())
        .filter(|((_, size), limit)| size > limit)
        .map(|((axis, size_mm), limit_mm)| BedWarning {
            axis,
            size_mm,
            limit_mm,
        })
        .collect()
}

/// Format seconds as `"{h}h{mm}m"`, rounded to the nearest minute
pub fn format_print_time(seconds: f64) -> String {
    let minutes = if seconds.is_finite() && seconds > 0.0 {
        (seconds / 60.0).round() as u64
    } else {
        0
    };
    format!("{}h{:02}m", minutes / 60, minutes % 60)
}

fn final_price(raw: f64, constants: &PricingConstants) -> f64 {
    let floor = constants.price_floor;
    let rounded = round_to(raw.max(floor), constants.price_decimals);
    // NaN from a degenerate profile also ends here
    if rounded >= floor {
        rounded
    } else {
        floor
    }
}

fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals.min(MAX_PRICE_DECIMALS) as i32);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{analyze, fixtures::cube};
    use approx::assert_relative_eq;
    use nalgebra::Vector3;

    fn metrics_with_extents(x: f64, y: f64, z: f64) -> GeometryMetrics {
        let mut metrics = analyze(&cube(20.0), 1.0).unwrap();
        metrics.extents_mm = Vector3::new(x, y, z);
        metrics
    }

    #[test]
    fn test_cube_in_pla() {
        let metrics = analyze(&cube(20.0), 1.0).unwrap();
        let cost = price(
            &metrics,
            &Material::Pla.profile(),
            &PrintBedSpec::default(),
            &PricingConstants::default(),
        );

        assert_relative_eq!(cost.bulk_volume_cm3, 8.0, epsilon = 1e-9);
        assert_relative_eq!(cost.shell_volume_cm3, 2.88, epsilon = 1e-9);
        assert_relative_eq!(cost.printed_volume_cm3, 5.28, epsilon = 1e-9);
        assert_relative_eq!(cost.weight_g, 6.5472, epsilon = 1e-9);
        assert_relative_eq!(cost.material_cost, 0.16368, epsilon = 1e-9);
        assert_relative_eq!(cost.print_time_seconds, 528.0, epsilon = 1e-6);
        assert_relative_eq!(cost.bed_occupancy, 0.0064, epsilon = 1e-12);
        assert_eq!(cost.print_time_label, "0h09m");
        assert_eq!(cost.bed_surcharge, 0.0);
        assert!(cost.warnings.is_empty());
        assert!(cost.watertight);

        // raw ≈ 1.60, below the floor
        assert!(cost.raw_price(&PricingConstants::default()) < 5.0);
        assert_eq!(cost.final_price, 5.0);
    }

    #[test]
    fn test_margin_applies_above_floor() {
        let metrics = analyze(&cube(100.0), 1.0).unwrap();
        let constants = PricingConstants::default();
        let cost = price(&metrics, &Material::Petg.profile(), &PrintBedSpec::default(), &constants);

        let raw = cost.raw_price(&constants);
        assert!(raw > constants.price_floor);
        assert_relative_eq!(cost.final_price, raw, epsilon = 0.005 + 1e-12);
        assert_eq!(cost.final_price, (cost.final_price * 100.0).round() / 100.0);
    }

    #[test]
    fn test_surcharge_boundary() {
        let bed = PrintBedSpec::default();
        let constants = PricingConstants::default();
        let profile = Material::Pla.profile();

        // exactly half the bed footprint: 125 × 250 / 62500 = 0.5
        let at_threshold = price(&metrics_with_extents(125.0, 250.0, 10.0), &profile, &bed, &constants);
        assert_eq!(at_threshold.bed_occupancy, 0.5);
        assert_eq!(at_threshold.bed_surcharge, 0.0);

        let above = price(&metrics_with_extents(126.0, 250.0, 10.0), &profile, &bed, &constants);
        assert_eq!(above.bed_surcharge, constants.bed_surcharge);
    }

    #[test]
    fn test_warnings_per_axis() {
        let bed = PrintBedSpec::default();
        let metrics = metrics_with_extents(250.0, 251.0, 312.0);
        let warnings = bed_warnings(&metrics, &bed);

        assert_eq!(warnings.len(), 2);
        assert_eq!(warnings[0].axis, Axis::Y);
        assert_eq!(warnings[1].axis, Axis::Z);
        assert_eq!(
            warnings[1].to_string(),
            "Z axis: 312.0 mm exceeds bed limit 250.0 mm"
        );

        let cost = price(&metrics, &Material::Tpu.profile(), &bed, &PricingConstants::default());
        assert!(!cost.fits_bed());
        assert!(cost.final_price >= 5.0);
    }

    #[test]
    fn test_synthetic_constants() {
        let metrics = analyze(&cube(10.0), 1.0).unwrap();
        let profile = MaterialProfile {
            material: Material::Pla,
            density_g_cm3: 1.0,
            price_per_kg: 1000.0,
            extrusion_rate_mm3_s: 1.0,
        };
        let constants = PricingConstants {
            infill_fraction: 1.0,
            shell_thickness_cm: 0.0,
            machine_hourly_rate: 0.0,
            margin_multiplier: 1.0,
            price_floor: 0.0,
            bed_surcharge_threshold: 0.0,
            bed_surcharge: 10.0,
            price_decimals: 0,
        };
        let cost = price(&metrics, &profile, &PrintBedSpec::new(100.0, 100.0, 100.0), &constants);

        // 1 cm³ → 1 g → 1.0 material, plus 10.0 surcharge
        assert_relative_eq!(cost.material_cost, 1.0, epsilon = 1e-9);
        assert_eq!(cost.bed_surcharge, 10.0);
        assert_eq!(cost.final_price, 11.0);
        assert_eq!(cost.print_time_label, "0h17m");
    }

    #[test]
    fn test_near_zero_mesh_gets_floor() {
        let metrics = analyze(&cube(0.001), 1.0).unwrap();
        for material in Material::ALL {
            let cost = price(
                &metrics,
                &material.profile(),
                &PrintBedSpec::default(),
                &PricingConstants::default(),
            );
            assert_eq!(cost.final_price, 5.0);
        }
    }

    #[test]
    fn test_print_time_label() {
        assert_eq!(format_print_time(528.0), "0h09m");
        assert_eq!(format_print_time(7530.0), "2h06m");
        assert_eq!(format_print_time(29.0), "0h00m");
        assert_eq!(format_print_time(3599.0), "1h00m");
        assert_eq!(format_print_time(f64::NAN), "0h00m");
    }

    #[test]
    fn test_floor_survives_rounding() {
        let constants = PricingConstants {
            price_floor: 4.999,
            price_decimals: 2,
            ..PricingConstants::default()
        };
        // 4.999 rounds to 5.00, which is still above the floor
        assert_eq!(final_price(1.0, &constants), 5.0);

        let constants = PricingConstants {
            price_floor: 4.994,
            ..constants
        };
        // 4.994 would round down to 4.99
        assert_eq!(final_price(1.0, &constants), 4.994);
    }

    #[test]
    fn test_excess_decimals_still_round() {
        let constants = PricingConstants {
            price_floor: 0.0,
            price_decimals: 400,
            ..PricingConstants::default()
        };
        assert_eq!(final_price(12.345, &constants), 12.345);
        assert_eq!(round_to(0.123456789012345, u32::MAX), 0.1234567890);
    }
}
