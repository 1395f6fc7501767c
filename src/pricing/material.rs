// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Material table

use crate::error::{QuoteError, QuoteResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Printable materials (closed set)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Material {
    Pla,
    Petg,
    Tpu,
}

/// Physical and commercial properties of a material
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MaterialProfile {
    pub material: Material,
    /// Density in g/cm³
    pub density_g_cm3: f64,
    /// Filament price per kilogram
    pub price_per_kg: f64,
    /// Volumetric extrusion rate in mm³/s
    pub extrusion_rate_mm3_s: f64,
}

impl Material {
    pub const ALL: [Material; 3] = [Material::Pla, Material::Petg, Material::Tpu];

    pub fn key(&self) -> &'static str {
        match self {
            Material::Pla => "PLA",
            Material::Petg => "PETG",
            Material::Tpu => "TPU",
        }
    }

    pub fn profile(&self) -> MaterialProfile {
        let (density_g_cm3, price_per_kg, extrusion_rate_mm3_s) = match self {
            Material::Pla => (1.24, 25.0, 10.0),
            Material::Petg => (1.27, 28.0, 8.0),
            Material::Tpu => (1.20, 35.0, 3.5),
        };
        MaterialProfile {
            material: *self,
            density_g_cm3,
            price_per_kg,
            extrusion_rate_mm3_s,
        }
    }

    /// Look up a material key, ignoring case and surrounding whitespace
    pub fn from_key(key: &str) -> QuoteResult<Self> {
        let normalized = key.trim().to_ascii_uppercase();
        Material::ALL
            .into_iter()
            .find(|m| m.key() == normalized)
            .ok_or_else(|| QuoteError::UnknownMaterial {
                key: key.to_string(),
            })
    }
}

impl FromStr for Material {
    type Err = QuoteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Material::from_key(s)
    }
}

impl fmt::Display for Material {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}
