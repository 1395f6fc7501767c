// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Pricing: materials, configuration and the cost model

mod config;
mod cost;
mod material;

pub use config::{
    PricingConstants, PrintBedSpec, QuoteConfig, DEFAULT_CONFIG_FILE, MAX_PRICE_DECIMALS,
};
pub use cost::{bed_warnings, format_print_time, price, Axis, BedWarning, CostBreakdown};
pub use material::{Material, MaterialProfile};
