// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Quote configuration: bed spec and pricing constants
//!
//! Values are built once (defaults, TOML file, environment overrides) and
//! then passed explicitly into the cost model.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default configuration file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "printquote.toml";

/// Most decimal places a price may be rounded to
pub const MAX_PRICE_DECIMALS: u32 = 10;

/// Printable volume in millimeters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PrintBedSpec {
    pub max_x_mm: f64,
    pub max_y_mm: f64,
    pub max_z_mm: f64,
}

impl PrintBedSpec {
    pub fn new(max_x_mm: f64, max_y_mm: f64, max_z_mm: f64) -> Self {
        Self {
            max_x_mm,
            max_y_mm,
            max_z_mm,
        }
    }

    pub fn limits(&self) -> [f64; 3] {
        [self.max_x_mm, self.max_y_mm, self.max_z_mm]
    }

    /// Printable footprint in mm²
    pub fn area_mm2(&self) -> f64 {
        self.max_x_mm * self.max_y_mm
    }

    /// Parse `"XxYxZ"`, e.g. `"250x210x220"`
    pub fn parse(spec: &str) -> Result<Self> {
        let parts: Vec<f64> = spec
            .split(['x', 'X'])
            .map(|p| p.trim().parse::<f64>())
            .collect::<std::result::Result<_, _>>()
            .with_context(|| format!("Invalid bed spec: {spec:?}"))?;
        match parts.as_slice() {
            [x, y, z] => Ok(Self::new(*x, *y, *z)),
            _ => bail!("Bed spec must have three dimensions, got {spec:?}"),
        }
    }
}

impl Default for PrintBedSpec {
    fn default() -> Self {
        Self::new(250.0, 250.0, 250.0)
    }
}

/// Constants of the pricing formula
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingConstants {
    /// Fraction of the bulk volume filled by infill
    pub infill_fraction: f64,
    /// Wall thickness in cm used to approximate the shell volume
    pub shell_thickness_cm: f64,
    /// Machine cost per print hour
    pub machine_hourly_rate: f64,
    /// Markup applied to the raw cost
    pub margin_multiplier: f64,
    /// Absolute minimum price
    pub price_floor: f64,
    /// Bed occupancy above which the surcharge applies
    pub bed_surcharge_threshold: f64,
    /// Flat surcharge for large footprints
    pub bed_surcharge: f64,
    /// Decimal places of the presented price
    pub price_decimals: u32,
}

impl Default for PricingConstants {
    fn default() -> Self {
        Self {
            infill_fraction: 0.30,
            shell_thickness_cm: 0.12,
            machine_hourly_rate: 2.0,
            margin_multiplier: 3.5,
            price_floor: 5.0,
            bed_surcharge_threshold: 0.5,
            bed_surcharge: 3.0,
            price_decimals: 2,
        }
    }
}

/// Complete quote configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuoteConfig {
    pub bed: PrintBedSpec,
    pub pricing: PricingConstants,
}

impl QuoteConfig {
    /// Load configuration from file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;
        let config: QuoteConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path.as_ref()))?;
        Ok(config)
    }

    /// Load configuration with environment variable overrides
    ///
    /// Reads `explicit` if given, else `printquote.toml` when present, else defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => Self::from_file(path)?,
            None if PathBuf::from(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(DEFAULT_CONFIG_FILE)?
            }
            None => Self::default(),
        };

        config.apply_overrides(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `PRINTQUOTE_*` overrides from a variable lookup
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        let number = |name: &str| -> Result<Option<f64>> {
            lookup(name)
                .map(|v| {
                    v.trim()
                        .parse::<f64>()
                        .with_context(|| format!("Invalid value for {name}: {v:?}"))
                })
                .transpose()
        };

        if let Some(margin) = number("PRINTQUOTE_MARGIN")? {
            self.pricing.margin_multiplier = margin;
        }
        if let Some(floor) = number("PRINTQUOTE_PRICE_FLOOR")? {
            self.pricing.price_floor = floor;
        }
        if let Some(rate) = number("PRINTQUOTE_MACHINE_RATE")? {
            self.pricing.machine_hourly_rate = rate;
        }
        if let Some(bed) = lookup("PRINTQUOTE_BED") {
            self.bed = PrintBedSpec::parse(&bed)?;
        }

        Ok(())
    }

    /// Reject values the cost model cannot use
    pub fn validate(&self) -> Result<()> {
        let bed = &self.bed;
        if bed.limits().iter().any(|&l| !l.is_finite() || l <= 0.0) {
            bail!("Bed limits must be positive, got {:?}", bed.limits());
        }

        let p = &self.pricing;
        if !(p.infill_fraction > 0.0 && p.infill_fraction <= 1.0) {
            bail!("infill_fraction must be in (0, 1], got {}", p.infill_fraction);
        }
        if !(p.margin_multiplier.is_finite() && p.margin_multiplier > 0.0) {
            bail!("margin_multiplier must be positive, got {}", p.margin_multiplier);
        }
        if p.price_decimals > MAX_PRICE_DECIMALS {
            bail!(
                "price_decimals must be at most {MAX_PRICE_DECIMALS}, got {}",
                p.price_decimals
            );
        }
        for (name, value) in [
            ("shell_thickness_cm", p.shell_thickness_cm),
            ("machine_hourly_rate", p.machine_hourly_rate),
            ("price_floor", p.price_floor),
            ("bed_surcharge_threshold", p.bed_surcharge_threshold),
            ("bed_surcharge", p.bed_surcharge),
        ] {
            if !value.is_finite() || value < 0.0 {
                bail!("{name} must be a non-negative number, got {value}");
            }
        }

        Ok(())
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }

    /// Save configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = self.to_toml_string()?;
        std::fs::write(path.as_ref(), content)
            .with_context(|| format!("Failed to write config file: {:?}", path.as_ref()))?;
        Ok(())
    }
}
